//! Credential type
//!
//! One set of access keys enabling calls to the external API. Immutable
//! once loaded. The secret is redacted from Debug and Display output and
//! must never reach a log line.

use serde::Deserialize;

/// Opaque credential identifier, unique within a pool
pub type CredentialId = String;

/// One credential for the external API
///
/// Deserializable so external loaders can read credential files; deliberately
/// not serializable, so the secret cannot round-trip into output.
#[derive(Clone, Deserialize)]
pub struct Credential {
    /// Identifier used in logs and status views
    id: CredentialId,

    /// Secret material (token, key pair blob, etc.) - opaque to the core
    secret: String,
}

impl Credential {
    /// Create a new credential
    pub fn new(id: impl Into<CredentialId>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    /// Get the credential identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the secret material (for the API capability only)
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

// Manual impl so the secret cannot leak through `{:?}` in a log line
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
