//! Page budget and per-origin politeness pacing
//!
//! This module handles:
//! - Counting fetch attempts against the configured page budget
//! - Per-origin pacing between requests, with optional random jitter

use crate::config::CrawlerConfig;
use crate::state::OriginState;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Hard cap on fetch attempts in one crawl run
///
/// The counter only grows, and never past `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    fetched: u32,
    max: u32,
}

impl CrawlBudget {
    pub fn new(max: u32) -> Self {
        Self { fetched: 0, max }
    }

    /// Reserves one fetch; returns `false` once the budget is spent
    pub fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.fetched += 1;
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.fetched >= self.max
    }

    pub fn used(&self) -> u32 {
        self.fetched
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.fetched)
    }
}

/// Enforces the politeness delay separately for each origin
///
/// An origin that has never been requested is ready immediately. Otherwise
/// the next request waits until `delay` plus a random share of `jitter` has
/// passed since the previous request to that origin completed.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    jitter: Duration,
    origins: HashMap<String, OriginState>,
}

impl Pacer {
    pub fn new(delay: Duration, jitter: Duration) -> Self {
        Self {
            delay,
            jitter,
            origins: HashMap::new(),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.politeness_delay(), config.politeness_jitter())
    }

    /// Delay for the next request, jitter included
    fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let extra = fastrand::u64(0..=self.jitter.as_millis() as u64);
        self.delay + Duration::from_millis(extra)
    }

    /// Time to wait before `origin` may be requested at `now`
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_ready(&self, origin: &str, now: Instant) -> Option<Duration> {
        self.origins
            .get(origin)
            .and_then(|state| state.time_until_next_request(self.next_delay(), now))
    }

    /// Records that a request to `origin` completed at `now`
    pub fn record_request_at(&mut self, origin: &str, now: Instant) {
        self.origins
            .entry(origin.to_string())
            .or_insert_with(OriginState::new)
            .record_request(now);
    }

    /// Records that a request to `origin` just completed
    pub fn record_request(&mut self, origin: &str) {
        self.record_request_at(origin, Instant::now());
    }

    /// Number of completed requests to `origin`
    pub fn request_count(&self, origin: &str) -> u32 {
        self.origins.get(origin).map_or(0, |s| s.request_count)
    }
}
