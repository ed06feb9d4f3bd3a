//! Per-credential slot state

use tokio::time::Instant;

use crate::domain::Credential;

/// Availability state of one credential slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Eligible for acquisition
    Available,

    /// Serving exactly one in-flight task
    InUse,

    /// Rate window exhausted; usable again once `reset_at` passes
    RateLimited { reset_at: Instant },

    /// Terminal. Entered after repeated fatal failures, never auto-recovers
    Disabled,
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::InUse => write!(f, "in-use"),
            Self::RateLimited { .. } => write!(f, "rate-limited"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

/// One credential plus its live state
///
/// The fatal streak counts consecutive non-retryable failures and resets
/// only on success; transient failures and rate limits leave it untouched.
#[derive(Debug, Clone)]
pub struct CredentialSlot {
    credential: Credential,
    state: SlotState,
    consecutive_fatals: u32,
}

impl CredentialSlot {
    /// Wrap a credential in a fresh, available slot
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            state: SlotState::Available,
            consecutive_fatals: 0,
        }
    }

    /// Get the wrapped credential
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Get the current state
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Check if the slot can be acquired
    pub fn is_available(&self) -> bool {
        self.state == SlotState::Available
    }

    /// Check if the slot is permanently out of service
    pub fn is_disabled(&self) -> bool {
        self.state == SlotState::Disabled
    }

    pub(crate) fn set_state(&mut self, state: SlotState) {
        self.state = state;
    }

    pub(crate) fn bump_fatal_streak(&mut self) -> u32 {
        self.consecutive_fatals += 1;
        self.consecutive_fatals
    }

    pub(crate) fn clear_fatal_streak(&mut self) {
        self.consecutive_fatals = 0;
    }

    /// Reset time if currently rate limited
    pub fn reset_at(&self) -> Option<Instant> {
        match self.state {
            SlotState::RateLimited { reset_at } => Some(reset_at),
            _ => None,
        }
    }
}
