// # No-IP Update Client
//
// Update collaborator for No-IP's dynamic update protocol.
//
// One call performs one `GET /nic/update?hostname=..&ip=..` with HTTP
// Basic authentication and the account's User-Agent header (No-IP requires
// a `Name/Version contact` agent string and may disable clients that omit
// it). The plain-text reply body is returned to the core workflow for
// classification — including on error HTTP statuses, because replies like
// `badauth` arrive with a 401.
//
// No retry, no backoff, no caching: scheduling is owned by whoever invokes
// the run (typically cron).

use std::time::Duration;

use async_trait::async_trait;

use dynup_core::error::{Error, Result};
use dynup_core::settings::Settings;
use dynup_core::traits::DnsUpdater;

/// No-IP dynamic update API base URL
pub const NOIP_API_BASE: &str = "https://dynupdate.no-ip.com";

/// HTTP timeout for update requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the No-IP dynamic update endpoint
pub struct NoipClient {
    /// Update endpoint base URL
    base_url: String,

    /// Account user name (Basic auth)
    user_name: String,

    /// Resolved account password (Basic auth)
    password: String,

    /// User-Agent header value
    user_agent: String,

    /// HTTP client
    client: reqwest::Client,
}

// The account password never appears in Debug output
impl std::fmt::Debug for NoipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoipClient")
            .field("base_url", &self.base_url)
            .field("user_name", &self.user_name)
            .field("password", &"<REDACTED>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl NoipClient {
    /// Create a client for the production No-IP endpoint.
    pub fn new(
        user_name: impl Into<String>,
        password: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            base_url: NOIP_API_BASE.to_string(),
            user_name: user_name.into(),
            password: password.into(),
            user_agent: user_agent.into(),
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Build a client from resolved settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.user_name,
            &settings.password,
            &settings.user_agent,
        )
    }

    /// Point the client at a different endpoint (tests, API mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl DnsUpdater for NoipClient {
    async fn update(&self, hostname: &str, ip: &str) -> Result<String> {
        let url = format!("{}/nic/update", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("hostname", hostname), ("ip", ip)])
            .basic_auth(&self.user_name, Some(&self.password))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| Error::update(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::update(format!("failed to read reply from {}: {}", url, e)))?;

        tracing::debug!("update request completed with HTTP status {}", status);

        // The status token rides in the body on error statuses too; hand
        // it to the classifier either way.
        Ok(body)
    }

    fn provider_name(&self) -> &'static str {
        "no-ip"
    }
}
