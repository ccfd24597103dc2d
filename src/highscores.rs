//! Best score tracking
//!
//! The persisted best only ever moves up, and only when a round strictly
//! beats it.

use serde::{Deserialize, Serialize};

/// The all-time best score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BestScore {
    value: u64,
}

impl BestScore {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Check if a score would replace the best
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.value
    }

    /// Record a finished round's score.
    /// Returns true if it became the new best.
    pub fn record(&mut self, score: u64) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        log::info!("New best score: {} (was {})", score, self.value);
        self.value = score;
        true
    }
}

/// Scoreboard label, e.g. "Best Score: 12"
pub fn format_best(best: u64) -> String {
    format!("Best Score: {best}")
}
