//! Test doubles for provider contract tests
//!
//! The recording provider keeps an ordered log of every call so tests can
//! assert on sequencing without a real backend.

use rosdns_core::error::{Error, Result};
use rosdns_core::{AppliedRecord, DnsProvider, Endpoint};
use std::sync::{Arc, Mutex};

/// One call observed by [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Apply(String),
    Remove(String),
}

/// A mock DnsProvider that records calls and can fail on demand
pub struct RecordingProvider {
    /// Ordered call log
    calls: Arc<Mutex<Vec<Call>>>,
    /// Name whose apply/remove should fail
    fail_on: Option<String>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: None,
        }
    }

    /// Fail any call touching `name`
    pub fn failing_on(name: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Some(name.to_string()),
        }
    }

    /// Snapshot of the calls made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self, endpoint: &Endpoint) -> Result<()> {
        match &self.fail_on {
            Some(name) if *name == endpoint.name => {
                Err(Error::request("PUT", "ip/dns/static", 500, "injected failure"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn list_owned(&self, _name: &str) -> Result<Vec<Endpoint>> {
        Ok(Vec::new())
    }

    async fn apply(&self, endpoint: &Endpoint) -> Result<Vec<AppliedRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Apply(endpoint.name.clone()));
        self.check(endpoint)?;

        Ok(endpoint
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| AppliedRecord {
                id: format!("*{}", i + 1),
                name: endpoint.name.clone(),
                kind: endpoint.kind,
                target: target.clone(),
            })
            .collect())
    }

    async fn remove(&self, endpoint: &Endpoint) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Remove(endpoint.name.clone()));
        self.check(endpoint)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Shorthand for a single-target A endpoint
pub fn a_record(name: &str, address: &str) -> Endpoint {
    Endpoint::new(name, rosdns_core::RecordKind::A, [address])
}
