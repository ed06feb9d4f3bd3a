//! Credential pool
//!
//! Pairs each credential with its live rate-limit/availability state and
//! hands slots out round-robin so load spreads evenly across credentials.

mod core;
mod slot;

pub use core::{Acquire, CredentialPool, SlotHandle, SlotStatus};
pub use slot::{CredentialSlot, SlotState};
