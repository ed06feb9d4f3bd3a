//! Domain types for keymux
//!
//! Core domain types: Credential, Task, Outcome, Priority.
//! The scheduler owns and mutates Tasks; Credentials are immutable once
//! loaded and their secret material is never logged.

mod credential;
mod outcome;
mod priority;
mod task;

pub use credential::{Credential, CredentialId};
pub use outcome::Outcome;
pub use priority::Priority;
pub use task::{Task, TaskId, TaskPayload, TaskResult};
