//! Provider reply classification.
//!
//! The provider answers update requests with a plain-text body whose first
//! whitespace-delimited token is a status code (`"good 203.0.113.5"` →
//! `"good"`). The classifier maps that token through the configured status
//! table to a process exit code.

use crate::error::{Error, Result};
use crate::settings::ResponseMapping;

/// Exit code reserved for replies with no matching table entry.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Maps raw provider replies to exit codes.
///
/// Built once from the validated settings. Lookup is a case-sensitive
/// exact match on the status token; the first matching entry in table
/// order wins.
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    mappings: Vec<ResponseMapping>,
}

impl ResponseClassifier {
    /// Build a classifier from an ordered status table.
    pub fn new(mappings: Vec<ResponseMapping>) -> Self {
        Self { mappings }
    }

    /// Find the table entry for a status token.
    pub fn lookup(&self, status: &str) -> Option<&ResponseMapping> {
        self.mappings.iter().find(|m| m.status == status)
    }

    /// Classify a raw provider reply into an exit code.
    ///
    /// Unknown statuses map to [`UNKNOWN_EXIT_CODE`]. Empty replies are a
    /// hard failure upstream and must not reach this point; they fail with
    /// [`Error::InvalidInput`].
    pub fn classify(&self, raw_response: &str) -> Result<i32> {
        let Some(status) = raw_response.split_whitespace().next() else {
            return Err(Error::invalid_input("cannot classify an empty provider reply"));
        };

        match self.lookup(status) {
            Some(mapping) => {
                tracing::debug!("mapped status '{}' to exit code {}", status, mapping.exit_code);
                Ok(mapping.exit_code)
            }
            None => {
                tracing::warn!("unrecognized provider status '{}'", status);
                Ok(UNKNOWN_EXIT_CODE)
            }
        }
    }
}
