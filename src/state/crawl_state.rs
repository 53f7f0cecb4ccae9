use crate::SpiderError;
use std::fmt;

/// Lifecycle states of one crawl run
///
/// `Idle → Running → (Draining | BudgetExhausted) → Done`. `Running` is
/// re-entered once per loop iteration; cancellation moves straight from
/// `Running` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Created, nothing fetched yet
    Idle,

    /// Actively processing the frontier
    Running,

    /// The frontier ran dry before the budget did
    Draining,

    /// The page budget is spent; remaining frontier entries are discarded
    BudgetExhausted,

    /// Terminal; frontier and visited set may be dropped
    Done,
}

impl CrawlState {
    /// Returns true if this state can move to `next`
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Running, Running)
                | (Running, Draining)
                | (Running, BudgetExhausted)
                | (Running, Done)
                | (Draining, Done)
                | (BudgetExhausted, Done)
        )
    }

    /// Validated transition
    pub fn transition(self, next: CrawlState) -> Result<CrawlState, SpiderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(SpiderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::BudgetExhausted => "budget_exhausted",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
