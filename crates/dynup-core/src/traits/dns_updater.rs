//! DNS update endpoint interface.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for DNS provider update endpoints.
///
/// One call performs one update request; retry policy belongs to whoever
/// schedules runs, never to an implementation. The raw plain-text reply
/// body is returned for both success and error HTTP statuses, because the
/// provider's status token rides in the body either way; interpretation is
/// owned by the orchestrator. Transport failures are reported as
/// [`Error::Update`](crate::Error::Update) carrying the underlying cause.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Request a DNS update of `hostname` to `ip`, returning the raw reply
    /// body.
    async fn update(&self, hostname: &str, ip: &str) -> Result<String>;

    /// Name of the provider, for logging.
    fn provider_name(&self) -> &'static str;
}
