//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: lifecycle of a crawl run (idle, running, draining, budget exhausted, done)
//! - `OriginState`: per-origin request timing used for politeness pacing

mod crawl_state;
mod origin_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use origin_state::OriginState;
