//! One-shot update workflow.
//!
//! The [`Updater`] drives a single run:
//!
//! ```text
//! resolve config → discover IP → validate protocol → invoke update → classify reply
//! ```
//!
//! Configuration resolution happens before the updater exists (the
//! collaborators are built from the resolved settings); everything from
//! discovery onward lives here. Each external call happens at most once
//! per run, strictly sequentially, with no retry. Calls are timed and the
//! elapsed duration logged; timing never affects control flow.

use std::time::Instant;

use tracing::{info, warn};

use crate::classify::ResponseClassifier;
use crate::error::{Error, Result};
use crate::ip;
use crate::settings::{IpProtocol, Settings};
use crate::traits::{DnsUpdater, IpDiscovery};

/// Single-run update orchestrator.
///
/// Holds the resolved settings and the classifier built from their status
/// table. One `Updater` performs at most one update per [`run`] or
/// [`update`] call.
///
/// [`run`]: Updater::run
/// [`update`]: Updater::update
pub struct Updater {
    settings: Settings,
    classifier: ResponseClassifier,
}

impl Updater {
    /// Build an updater from resolved, validated settings.
    pub fn new(settings: Settings) -> Self {
        let classifier = ResponseClassifier::new(settings.response_mappings.clone());
        Self {
            settings,
            classifier,
        }
    }

    /// The settings this updater runs with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Discover the current public IP and update the configured hostname.
    ///
    /// Returns the exit code classified from the provider reply. An empty
    /// discovered address is a terminal [`Error::Discovery`]; no update
    /// request is attempted in that case.
    pub async fn run(
        &self,
        discovery: &dyn IpDiscovery,
        provider: &dyn DnsUpdater,
    ) -> Result<i32> {
        info!(
            "retrieving current public IP address from {}",
            discovery.source_name()
        );
        let started = Instant::now();
        let discovered = discovery.discover().await?;
        info!(
            "retrieved IP address '{}' from {} in {}ms",
            discovered,
            discovery.source_name(),
            started.elapsed().as_millis()
        );

        let discovered = discovered.trim();
        if discovered.is_empty() {
            return Err(Error::discovery(format!(
                "{} returned an empty IP address",
                discovery.source_name()
            )));
        }

        self.update(provider, discovered).await
    }

    /// Update the configured hostname to a caller-supplied IP address.
    ///
    /// Entry point for callers that already know the target address:
    /// enforces the address-family policy, issues exactly one update
    /// request and classifies the reply.
    pub async fn update(&self, provider: &dyn DnsUpdater, ip: &str) -> Result<i32> {
        self.check_protocol(ip)?;

        info!(
            "updating hostname '{}' to IP address '{}'",
            self.settings.host_name, ip
        );

        let started = Instant::now();
        let reply = match provider.update(&self.settings.host_name, ip).await {
            Ok(reply) => {
                info!(
                    "{} update request completed in {}ms",
                    provider.provider_name(),
                    started.elapsed().as_millis()
                );
                reply
            }
            Err(e) => {
                warn!(
                    "{} update request failed after {}ms",
                    provider.provider_name(),
                    started.elapsed().as_millis()
                );
                return Err(e);
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(Error::update(format!(
                "empty response from {} for hostname '{}'",
                provider.provider_name(),
                self.settings.host_name
            )));
        }
        info!(
            "{} response for hostname '{}': {}",
            provider.provider_name(),
            self.settings.host_name,
            reply
        );

        let exit_code = self.classifier.classify(reply)?;
        // reply is non-empty, so a first token exists
        let status = reply.split_whitespace().next().unwrap_or_default();
        match self.classifier.lookup(status) {
            Some(mapping) if mapping.successful => {
                info!("update status '{}': {}", status, mapping.description)
            }
            Some(mapping) => warn!("update status '{}': {}", status, mapping.description),
            None => warn!("unrecognized update status '{}'", status),
        }
        Ok(exit_code)
    }

    /// Enforce the configured address-family policy on `ip`.
    fn check_protocol(&self, ip: &str) -> Result<()> {
        let accepted = match self.settings.ip_protocol {
            IpProtocol::Ipv4 => ip::is_ipv4(ip),
            IpProtocol::Ipv6 => ip::is_ipv6(ip),
            IpProtocol::Dual => ip::is_ipv4(ip) || ip::is_ipv6(ip),
        };
        if accepted {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "IP '{}' is not a valid address for protocol '{}'",
                ip, self.settings.ip_protocol
            )))
        }
    }
}
