//! Breadth-first crawl frontier with a visited-set guard
//!
//! The pending queue and the visited set are only reachable through the
//! methods below, so the two can never drift apart. Every pending URL is in
//! the visited set, and nothing is ever removed from the visited set.

use crate::url::normalize_parsed;
use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, oldest first
    pending: VecDeque<Url>,

    /// Normalized form of every URL ever enqueued
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding only `seed`
    pub fn seeded(seed: Url) -> Self {
        let mut frontier = Self::new();
        frontier.try_enqueue(seed);
        frontier
    }

    /// Appends `url` to the tail of the queue unless an equivalent URL was
    /// enqueued before
    ///
    /// The URL is normalized first. Returns `true` when it was added; URLs
    /// that cannot be normalized are rejected.
    pub fn try_enqueue(&mut self, url: Url) -> bool {
        let normalized = match normalize_parsed(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Not enqueueing unnormalizable URL: {}", e);
                return false;
            }
        };

        if !self.visited.insert(normalized.as_str().to_string()) {
            return false;
        }
        self.pending.push_back(normalized);
        true
    }

    /// Pops the oldest pending URL
    pub fn dequeue(&mut self) -> Option<Url> {
        self.pending.pop_front()
    }

    /// Puts a dequeued URL back at the head of the queue
    ///
    /// Only URLs already in the visited set are accepted, so this can never
    /// admit a URL that `try_enqueue` would have rejected.
    pub fn restore(&mut self, url: Url) -> bool {
        if !self.has_visited(&url) {
            return false;
        }
        self.pending.push_front(url);
        true
    }

    /// Records `url` as seen without queueing it
    ///
    /// Used for redirect targets, which were fetched in place of the URL
    /// that was dequeued. Returns `false` when an equivalent URL was already
    /// seen or the URL cannot be normalized.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        match normalize_parsed(url.clone()) {
            Ok(normalized) => self.visited.insert(normalized.as_str().to_string()),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Whether an equivalent URL has ever been enqueued
    pub fn has_visited(&self, url: &Url) -> bool {
        normalize_parsed(url.clone())
            .map(|n| self.visited.contains(n.as_str()))
            .unwrap_or(false)
    }
}
