//! Process-local fallback backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::backend::{BackendKind, CredentialBackend, StorageError, validate_key};

/// In-memory map used when no writable storage directory exists. Values
/// are lost on restart, which callers must tolerate anyway.
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialBackend for MemoryBackend {
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let values = self
            .values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        values.remove(key);
        Ok(())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_get_delete_roundtrip() {
        let backend = MemoryBackend::new();
        backend.save("auth_token", "t1").await.unwrap();
        assert_eq!(backend.get("auth_token").await.unwrap().as_deref(), Some("t1"));

        backend.delete("auth_token").await.unwrap();
        assert_eq!(backend.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_of_missing_key_is_ok() {
        let backend = MemoryBackend::new();
        backend.delete("refresh_token").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unsafe_keys() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.save("../escape", "v").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            backend.get("").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
