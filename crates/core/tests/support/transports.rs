//! Fake [`LookupTransport`] implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::lookup::LookupTransport;
use catalog_domain::{LookupError, ResourceSnapshot};
use parking_lot::Mutex;

use super::CATEGORIES;

/// Canned HTTP-like answer for an id
#[derive(Clone, Debug)]
pub enum Reply {
    Ok(ResourceSnapshot),
    NotFound,
    Status(u16),
    ReadTimeout,
}

/// Transport answering from a per-id table and counting attempts
#[derive(Default)]
pub struct TableTransport {
    replies: Mutex<HashMap<String, Reply>>,
    attempts: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    latency: Duration,
}

impl TableTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call for `latency` so calls overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reply(self, id: &str, reply: Reply) -> Self {
        self.replies.lock().insert(id.to_string(), reply);
        self
    }

    pub fn set_reply(&self, id: &str, reply: Reply) {
        self.replies.lock().insert(id.to_string(), reply);
    }

    pub fn attempts(&self, id: &str) -> usize {
        self.attempts.lock().get(id).copied().unwrap_or(0)
    }

    pub fn total_attempts(&self) -> usize {
        self.attempts.lock().values().sum()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LookupTransport for TableTransport {
    fn namespace(&self) -> &str {
        CATEGORIES
    }

    async fn get_by_id(&self, id: &str) -> Result<ResourceSnapshot, LookupError> {
        *self.attempts.lock().entry(id.to_string()).or_default() += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self.replies.lock().get(id).cloned().unwrap_or(Reply::NotFound);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let (dependency, id) = (CATEGORIES.to_string(), id.to_string());
        match reply {
            Reply::Ok(snapshot) => Ok(snapshot),
            Reply::NotFound => Err(LookupError::NotFound { dependency, id }),
            Reply::Status(status) => Err(LookupError::UpstreamFailure { dependency, id, status }),
            Reply::ReadTimeout => Err(LookupError::ReadTimeout { dependency, id }),
        }
    }
}
