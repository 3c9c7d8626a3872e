//! Public-IP discovery interface.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for public-IP discovery services.
///
/// Implementations perform exactly one lookup per call and own their
/// transport configuration, timeouts included; the core enforces no
/// deadline of its own. Failures are reported as
/// [`Error::Discovery`](crate::Error::Discovery).
///
/// # Thread Safety
///
/// Implementations must be usable across async tasks.
#[async_trait]
pub trait IpDiscovery: Send + Sync {
    /// Fetch the caller's current public IP address literal.
    ///
    /// The returned string is handed to the orchestrator as-is; structural
    /// validation against the configured address-family policy happens
    /// there, not here.
    async fn discover(&self) -> Result<String>;

    /// Name of the discovery service, for logging.
    fn source_name(&self) -> &'static str;
}
