//! Outcome of one task execution attempt
//!
//! The external API capability classifies every attempt into one of three
//! variants; the scheduler interprets them but never inspects the API's
//! own error model.

use serde_json::Value;
use tokio::time::Instant;

/// Classified result of executing a task once against one credential
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The task completed; the payload's result data
    Success(Value),

    /// The credential hit its rate window; usable again at `reset_at`
    RateLimited { reset_at: Instant },

    /// The attempt failed; `retryable` decides backoff-and-retry vs
    /// immediate exhaustion
    Failure { error: String, retryable: bool },
}

impl Outcome {
    /// Check if this is a rate limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Outcome::RateLimited { .. })
    }

    /// Check if this outcome allows another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Outcome::Success(_) => false,
            Outcome::RateLimited { .. } => true,
            Outcome::Failure { retryable, .. } => *retryable,
        }
    }

    /// Get the reset time if this is a rate limit signal
    pub fn reset_at(&self) -> Option<Instant> {
        match self {
            Outcome::RateLimited { reset_at } => Some(*reset_at),
            _ => None,
        }
    }
}
