//! Persistent key-value storage for credentials and preferences.
//!
//! One `CredentialBackend` trait, three implementations (protected file,
//! plain file, in-memory), selected once by [`SecureKeyValueStore::detect`]
//! at composition time. The facade is fail-soft: callers that can tolerate
//! a lost value use [`save`](SecureKeyValueStore::save) /
//! [`get`](SecureKeyValueStore::get) /
//! [`delete`](SecureKeyValueStore::delete) and never see an error; the
//! session layer, which must react to persistence failures, uses the
//! `try_` variants.

mod backend;
mod file;
mod memory;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

pub use backend::{BackendKind, CredentialBackend, StorageError};
pub use file::FileBackend;
pub use memory::MemoryBackend;

/// The fixed set of persisted keys.
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const APP_LANG: &str = "app_lang";
    pub const APP_THEME: &str = "app_theme";
}

/// Fail-soft facade over the selected backend.
///
/// Losing a non-critical value must never crash a caller: the plain
/// operations swallow backend errors, log them, and return a safe default.
#[derive(Clone)]
pub struct SecureKeyValueStore {
    backend: Arc<dyn CredentialBackend>,
}

impl SecureKeyValueStore {
    /// Probe the data directory once and pick the best available backend:
    /// hardened files where supported, plain files where writable, and the
    /// in-memory map as the last resort.
    pub fn detect(data_dir: &Path) -> Self {
        let backend: Arc<dyn CredentialBackend> = match probe_capabilities(data_dir) {
            BackendKind::ProtectedFile => Arc::new(FileBackend::protected(data_dir.to_path_buf())),
            BackendKind::PlainFile => Arc::new(FileBackend::plain(data_dir.to_path_buf())),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        info!(backend = backend.kind().as_str(), "selected credential storage backend");
        Self { backend }
    }

    /// Wrap an explicit backend (used by tests and embedders).
    pub fn with_backend(backend: Arc<dyn CredentialBackend>) -> Self {
        Self { backend }
    }

    /// Which backend the probe selected.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Store a value; on failure the value is dropped and a warning logged.
    pub async fn save(&self, key: &str, value: &str) {
        if let Err(error) = self.try_save(key, value).await {
            warn!(key, %error, "storage save failed; value dropped");
        }
    }

    /// Read a value; any backend failure reads as absence.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "storage read failed; treating as absent");
                None
            }
        }
    }

    /// Delete a value; failures are logged and ignored.
    pub async fn delete(&self, key: &str) {
        if let Err(error) = self.try_delete(key).await {
            warn!(key, %error, "storage delete failed");
        }
    }

    /// Fallible save, for callers that must observe persistence failures.
    pub async fn try_save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.save(key, value).await
    }

    /// Fallible read.
    pub async fn try_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key).await
    }

    /// Fallible delete.
    pub async fn try_delete(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key).await
    }
}

/// Composition-time capability probe: create the directory, write a probe
/// file, attempt permission hardening, clean up. Never fails; the worst
/// outcome is the memory fallback.
fn probe_capabilities(dir: &Path) -> BackendKind {
    if std::fs::create_dir_all(dir).is_err() {
        return BackendKind::Memory;
    }

    let probe = dir.join(".probe");
    if std::fs::write(&probe, b"probe").is_err() {
        return BackendKind::Memory;
    }

    let hardened = file::harden_permissions(&probe).is_ok();
    let _ = std::fs::remove_file(&probe);

    if hardened {
        BackendKind::ProtectedFile
    } else {
        BackendKind::PlainFile
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl CredentialBackend for FailingBackend {
        async fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("test".to_string()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("test".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("test".to_string()))
        }

        fn kind(&self) -> BackendKind {
            BackendKind::Memory
        }
    }

    #[tokio::test]
    async fn facade_is_fail_soft() {
        let store = SecureKeyValueStore::with_backend(Arc::new(FailingBackend));

        // None of these may panic or propagate an error.
        store.save(keys::AUTH_TOKEN, "t").await;
        assert_eq!(store.get(keys::AUTH_TOKEN).await, None);
        store.delete(keys::AUTH_TOKEN).await;

        // The fallible surface still reports the failure.
        assert!(store.try_save(keys::AUTH_TOKEN, "t").await.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn probe_selects_protected_files_on_unix() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecureKeyValueStore::detect(&dir.path().join("souk"));
        assert_eq!(store.backend_kind(), BackendKind::ProtectedFile);
    }

    #[test]
    fn probe_falls_back_to_memory_for_unwritable_dir() {
        // A path under a regular file can never be created as a directory.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let store = SecureKeyValueStore::detect(&blocker.join("nested"));
        assert_eq!(store.backend_kind(), BackendKind::Memory);
    }

    #[tokio::test]
    async fn detect_store_roundtrips_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = SecureKeyValueStore::detect(dir.path());

        store.save(keys::APP_LANG, "fa").await;
        assert_eq!(store.get(keys::APP_LANG).await.as_deref(), Some("fa"));
    }
}
