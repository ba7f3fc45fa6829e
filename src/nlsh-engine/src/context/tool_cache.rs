//! Tool availability cache with an explicit expiry.

use std::time::{Duration, Instant};

/// Detected tools and the instant after which they must be detected again.
#[derive(Debug, Clone)]
pub struct ToolCache {
    ttl: Duration,
    entry: Option<(Vec<String>, Instant)>,
}

impl ToolCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Cached tools, if still fresh at `now`.
    pub fn get(&self, now: Instant) -> Option<&[String]> {
        match &self.entry {
            Some((tools, expires_at)) if now < *expires_at => Some(tools),
            _ => None,
        }
    }

    /// Store tools detected at `now`.
    pub fn store(&mut self, tools: Vec<String>, now: Instant) {
        self.entry = Some((tools, now + self.ttl));
    }

    /// Expiry of the current entry.
    pub fn expires_at(&self) -> Option<Instant> {
        self.entry.as_ref().map(|(_, at)| *at)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
