//! In-memory gateway for local runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

use super::{Gateway, GatewayError, PingLog, SecurityEvent, WaitlistRecord};

/// Gateway backed by process memory. Used when no store is configured in
/// tests, and as the stand-in store for integration suites.
#[derive(Default)]
pub struct MemoryGateway {
    records: DashMap<String, WaitlistRecord>,
    events: Mutex<Vec<SecurityEvent>>,
    pings: Mutex<Vec<PingLog>>,
    fail_inserts: AtomicBool,
    fail_events: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `insert` calls fail, to exercise the 5xx path.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `record_event` calls fail; audit must swallow these.
    pub fn fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::Relaxed);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, email: &str) -> Option<WaitlistRecord> {
        self.records.get(email).map(|r| r.value().clone())
    }

    pub fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    pub fn pings(&self) -> Vec<PingLog> {
        self.pings.lock().expect("pings mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Gateway for MemoryGateway {
    async fn exists(&self, email: &str) -> Result<bool, GatewayError> {
        Ok(self.records.contains_key(email))
    }

    async fn insert(&self, record: &WaitlistRecord) -> Result<(), GatewayError> {
        if self.fail_inserts.load(Ordering::Relaxed) {
            return Err(GatewayError::Unavailable);
        }
        self.records.insert(record.email.clone(), record.clone());
        Ok(())
    }

    async fn record_event(&self, event: &SecurityEvent) -> Result<(), GatewayError> {
        if self.fail_events.load(Ordering::Relaxed) {
            return Err(GatewayError::Unavailable);
        }
        self.events
            .lock()
            .expect("events mutex poisoned")
            .push(event.clone());
        Ok(())
    }

    async fn count(&self) -> Result<u64, GatewayError> {
        Ok(self.records.len() as u64)
    }

    async fn log_ping(&self, log: &PingLog) -> Result<(), GatewayError> {
        self.pings
            .lock()
            .expect("pings mutex poisoned")
            .push(log.clone());
        Ok(())
    }
}
