use std::time::{Duration, Instant};

/// Tracks pacing for one origin during crawling
///
/// The politeness delay is measured from the moment the previous request
/// to this origin completed, not from when it started.
#[derive(Debug, Clone, Default)]
pub struct OriginState {
    /// Number of completed requests to this origin in the current crawl
    pub request_count: u32,

    /// When the last request to this origin completed
    pub last_request_time: Option<Instant>,
}

impl OriginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can be made to this origin at `now`
    pub fn can_request(&self, delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(delay, now).is_none()
    }

    /// Records that a request to this origin completed
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
