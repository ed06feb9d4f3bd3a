//! CredentialPool implementation

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{Credential, CredentialId, Outcome};

use super::slot::{CredentialSlot, SlotState};

/// Result of an acquisition attempt
#[derive(Debug)]
pub enum Acquire {
    /// An available slot, now marked InUse
    Slot(SlotHandle),

    /// Nothing eligible right now (slots in use or rate limited); a wait
    /// condition, not an error
    Busy,

    /// Every slot is Disabled. Unrecoverable
    Exhausted,
}

/// Handle to an acquired slot
///
/// Holds the slot index and a clone of the credential so the executor can
/// run without touching pool state. Must be given back via `release` or
/// `release_unused`; the pool keeps the slot InUse until then.
#[derive(Debug)]
pub struct SlotHandle {
    index: usize,
    credential: Credential,
}

impl SlotHandle {
    /// Get the credential to execute with
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Identifier of the underlying credential
    pub fn credential_id(&self) -> &str {
        self.credential.id()
    }
}

/// Per-slot view for status reporting
#[derive(Debug, Clone)]
pub struct SlotStatus {
    pub credential_id: CredentialId,
    pub state: String,
    /// Time until the rate window clears, when rate limited
    pub resets_in: Option<Duration>,
}

/// Owns all credential slots and selects them round-robin
///
/// The rotation cursor lives here and is only touched by `acquire`, so
/// there is no shared "current key index" anywhere else.
#[derive(Debug)]
pub struct CredentialPool {
    slots: Vec<CredentialSlot>,
    /// Index of the slot returned by the previous `acquire`
    cursor: usize,
    /// Consecutive fatal failures before a slot is Disabled
    disable_after_fatals: u32,
}

impl CredentialPool {
    /// Build a pool from an ordered set of credentials
    pub fn new(credentials: Vec<Credential>, disable_after_fatals: u32) -> Self {
        debug!(count = credentials.len(), "CredentialPool::new: called");
        Self {
            slots: credentials.into_iter().map(CredentialSlot::new).collect(),
            cursor: 0,
            disable_after_fatals: disable_after_fatals.max(1),
        }
    }

    /// Number of slots, regardless of state
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently acquirable
    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_available()).count()
    }

    /// Check if every slot is Disabled (pool exhaustion)
    pub fn all_disabled(&self) -> bool {
        self.slots.iter().all(|s| s.is_disabled())
    }

    /// Acquire the next available slot, round-robin
    ///
    /// Scans starting after the last-returned index so consecutive
    /// acquisitions spread across credentials. The returned slot is
    /// atomically marked InUse.
    pub fn acquire(&mut self) -> Acquire {
        debug!("CredentialPool::acquire: called");
        if self.all_disabled() {
            debug!("CredentialPool::acquire: pool exhausted");
            return Acquire::Exhausted;
        }

        let n = self.slots.len();
        for offset in 1..=n {
            let index = (self.cursor + offset) % n;
            if self.slots[index].is_available() {
                self.slots[index].set_state(SlotState::InUse);
                self.cursor = index;
                let credential = self.slots[index].credential().clone();
                debug!(credential_id = %credential.id(), index, "CredentialPool::acquire: slot acquired");
                return Acquire::Slot(SlotHandle { index, credential });
            }
        }

        debug!("CredentialPool::acquire: no eligible slot");
        Acquire::Busy
    }

    /// Release a slot based on the outcome of the task it served
    pub fn release(&mut self, handle: SlotHandle, outcome: &Outcome) {
        debug!(credential_id = %handle.credential_id(), "CredentialPool::release: called");
        let slot = &mut self.slots[handle.index];

        match outcome {
            Outcome::Success(_) => {
                slot.clear_fatal_streak();
                slot.set_state(SlotState::Available);
            }
            Outcome::RateLimited { reset_at } => {
                debug!(credential_id = %handle.credential_id(), "CredentialPool::release: rate limited");
                slot.set_state(SlotState::RateLimited {
                    reset_at: *reset_at,
                });
            }
            Outcome::Failure { error, retryable } => {
                if *retryable {
                    // Transient; the slot itself is fine
                    slot.set_state(SlotState::Available);
                } else {
                    let streak = slot.bump_fatal_streak();
                    if streak >= self.disable_after_fatals {
                        warn!(
                            credential_id = %handle.credential_id(),
                            streak,
                            error,
                            "Disabling credential after repeated fatal failures"
                        );
                        slot.set_state(SlotState::Disabled);
                    } else {
                        debug!(
                            credential_id = %handle.credential_id(),
                            streak,
                            "CredentialPool::release: fatal failure, slot kept"
                        );
                        slot.set_state(SlotState::Available);
                    }
                }
            }
        }
    }

    /// Return an acquired slot that was never used (no eligible task)
    pub fn release_unused(&mut self, handle: SlotHandle) {
        debug!(credential_id = %handle.credential_id(), "CredentialPool::release_unused: called");
        self.slots[handle.index].set_state(SlotState::Available);
    }

    /// Transition rate-limited slots whose window has cleared back to
    /// Available. Returns the earliest reset among slots still limited.
    pub fn sweep(&mut self, now: Instant) -> Option<Instant> {
        let mut next_reset = None;
        for slot in &mut self.slots {
            if let Some(reset_at) = slot.reset_at() {
                if reset_at <= now {
                    info!(credential_id = %slot.credential().id(), "Rate window cleared");
                    slot.set_state(SlotState::Available);
                } else {
                    next_reset = Some(next_reset.map_or(reset_at, |t: Instant| t.min(reset_at)));
                }
            }
        }
        next_reset
    }

    /// Earliest pending reset among rate-limited slots, without sweeping
    pub fn next_reset(&self) -> Option<Instant> {
        self.slots
            .iter()
            .filter_map(|s| s.reset_at())
            .min()
    }

    /// Per-slot states for status reporting
    pub fn snapshot(&self, now: Instant) -> Vec<SlotStatus> {
        self.slots
            .iter()
            .map(|slot| SlotStatus {
                credential_id: slot.credential().id().to_string(),
                state: slot.state().to_string(),
                resets_in: slot
                    .reset_at()
                    .map(|at| at.saturating_duration_since(now)),
            })
            .collect()
    }
}
