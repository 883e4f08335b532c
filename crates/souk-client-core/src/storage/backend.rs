//! Storage backend trait and errors.

use async_trait::async_trait;

/// Failure of an underlying storage operation. Never escapes the fail-soft
/// facade; the session layer observes it through the fallible methods.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Which backend the capability probe selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// File per key with hardened permissions.
    ProtectedFile,
    /// File per key, no permission hardening available.
    PlainFile,
    /// Process-local map; values do not survive a restart.
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProtectedFile => "protected-file",
            Self::PlainFile => "plain-file",
            Self::Memory => "memory",
        }
    }
}

/// One key-value backend. Implementations report real errors; the
/// fail-soft policy lives in the facade, not here.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
    fn kind(&self) -> BackendKind;
}

/// Keys are used as file names, so restrict them to a safe alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
