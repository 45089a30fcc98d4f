use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counts down the time a player has to answer the pending question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTimer {
    #[serde(with = "crate::serde_duration")]
    elapsed: Duration,
    #[serde(with = "crate::serde_duration")]
    limit: Duration,
}

impl AnswerTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    pub fn is_up(&self) -> bool {
        self.elapsed >= self.limit
    }

    /// Advances by `dt`; stops accumulating once the limit is reached.
    pub fn tick(self, dt: Duration) -> Self {
        if self.is_up() {
            return self;
        }
        Self {
            elapsed: self.elapsed.saturating_add(dt).min(self.limit),
            limit: self.limit,
        }
    }
}
