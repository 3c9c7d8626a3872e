// # HTTP IP Discovery
//
// HTTP-based public-IP discovery for the updater.
//
// Performs one GET against an ipify-style endpoint returning a small JSON
// document (`{"ip": "203.0.113.5"}`) and hands the raw literal back to the
// core workflow, which owns validation against the configured
// address-family policy.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use dynup_core::error::{Error, Result};
use dynup_core::traits::IpDiscovery;

/// Default discovery endpoint
pub const DEFAULT_DISCOVERY_URL: &str = "https://api.ipify.org/?format=json";

/// HTTP timeout for the discovery call
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Response document returned by the discovery endpoint
#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    ip: String,
}

/// Public-IP discovery over HTTP
pub struct HttpIpDiscovery {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpDiscovery {
    /// Create a discovery source for the default endpoint.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_DISCOVERY_URL)
    }

    /// Create a discovery source for a custom endpoint.
    ///
    /// The endpoint must answer GET with a JSON document carrying an `ip`
    /// string field.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpIpDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpDiscovery for HttpIpDiscovery {
    async fn discover(&self) -> Result<String> {
        tracing::debug!("fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::discovery(format!("request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::discovery(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body: DiscoveryResponse = response.json().await.map_err(|e| {
            Error::discovery(format!("failed to parse response from {}: {}", self.url, e))
        })?;

        Ok(body.ip)
    }

    fn source_name(&self) -> &'static str {
        "ipify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_targets_ipify() {
        let discovery = HttpIpDiscovery::new();
        assert_eq!(discovery.url, DEFAULT_DISCOVERY_URL);
        assert_eq!(discovery.source_name(), "ipify");
    }

    #[test]
    fn custom_url_is_kept() {
        let discovery = HttpIpDiscovery::with_url("https://ip.example.com/json");
        assert_eq!(discovery.url, "https://ip.example.com/json");
    }

    #[test]
    fn parses_discovery_document() {
        let body: DiscoveryResponse = serde_json::from_str(r#"{"ip": "203.0.113.5"}"#).unwrap();
        assert_eq!(body.ip, "203.0.113.5");
    }

    #[test]
    fn rejects_document_without_ip_field() {
        let result: std::result::Result<DiscoveryResponse, _> =
            serde_json::from_str(r#"{"address": "203.0.113.5"}"#);
        assert!(result.is_err());
    }
}
