//! Test doubles and common utilities for update workflow tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dynup_core::error::{Error, Result};
use dynup_core::settings::{IpProtocol, ResponseMapping, Settings};
use dynup_core::traits::{DnsUpdater, IpDiscovery};

/// A discovery source that returns a fixed outcome and counts calls
pub struct MockDiscovery {
    outcome: std::result::Result<String, String>,
    call_count: Arc<AtomicUsize>,
}

impl MockDiscovery {
    pub fn returning(ip: &str) -> Self {
        Self {
            outcome: Ok(ip.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times discover() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpDiscovery for MockDiscovery {
    async fn discover(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(ip) => Ok(ip.clone()),
            Err(message) => Err(Error::discovery(message.clone())),
        }
    }

    fn source_name(&self) -> &'static str {
        "mock-discovery"
    }
}

/// A DNS updater that replies with a fixed body and records requests
pub struct MockDnsUpdater {
    outcome: std::result::Result<String, String>,
    call_count: Arc<AtomicUsize>,
    requests: Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

impl MockDnsUpdater {
    pub fn replying(body: &str) -> Self {
        Self {
            outcome: Ok(body.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Number of times update() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Recorded (hostname, ip) pairs from update calls
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsUpdater for MockDnsUpdater {
    async fn update(&self, hostname: &str, ip: &str) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((hostname.to_string(), ip.to_string()));
        match &self.outcome {
            Ok(body) => Ok(body.clone()),
            Err(message) => Err(Error::update(message.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock-provider"
    }
}

/// Helper to build resolved settings for workflow tests
pub fn test_settings(ip_protocol: IpProtocol) -> Settings {
    Settings {
        user_name: "alice".to_string(),
        password: "hunter2".to_string(),
        host_name: "home.example.com".to_string(),
        user_agent: "Test Client/1.0 admin@example.com".to_string(),
        ip_protocol,
        response_mappings: vec![
            mapping("good", 0, true),
            mapping("nochg", 1, true),
            mapping("badauth", 3, false),
        ],
    }
}

pub fn mapping(status: &str, exit_code: i32, successful: bool) -> ResponseMapping {
    ResponseMapping {
        status: status.to_string(),
        exit_code,
        description: format!("{} reply", status),
        successful,
    }
}
