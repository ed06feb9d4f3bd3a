//! Executor adapter over the external API capability
//!
//! The capability is an opaque collaborator: given a credential and a task
//! payload it produces a classified [`Outcome`]. The executor's only added
//! behavior is mapping unclassified errors to a retryable failure, so an
//! unknown fault never silently drops data. It holds no scheduler state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{Credential, Outcome, TaskPayload};

/// The external API execution capability
///
/// Implementations wrap the real API client (wire protocol, auth, parsing
/// of rate-limit headers into `RateLimited { reset_at }`). Returning `Err`
/// means the failure could not be classified at all.
#[async_trait]
pub trait ApiCapability: Send + Sync {
    async fn execute(&self, credential: &Credential, payload: &TaskPayload) -> eyre::Result<Outcome>;
}

/// Runs one task attempt against one credential
#[derive(Clone)]
pub struct Executor {
    capability: Arc<dyn ApiCapability>,
}

impl Executor {
    /// Create an executor over the given capability
    pub fn new(capability: Arc<dyn ApiCapability>) -> Self {
        Self { capability }
    }

    /// Execute the payload with the credential and classify the result
    pub async fn execute(&self, credential: &Credential, payload: &TaskPayload) -> Outcome {
        debug!(credential_id = %credential.id(), kind = %payload.kind, "Executor::execute: called");
        match self.capability.execute(credential, payload).await {
            Ok(outcome) => outcome,
            Err(error) => {
                // Unclassified failures are treated as transient
                warn!(kind = %payload.kind, %error, "Unclassified capability error, treating as retryable");
                Outcome::Failure {
                    error: error.to_string(),
                    retryable: true,
                }
            }
        }
    }
}
