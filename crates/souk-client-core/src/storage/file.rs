//! File-backed credential storage.
//!
//! One file per key under the app data directory. On Unix the protected
//! variant hardens each file to 0600 (owner read/write only); elsewhere the
//! plain variant stores without hardening.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::backend::{BackendKind, CredentialBackend, StorageError, validate_key};

const FILE_EXT: &str = "cred";

pub struct FileBackend {
    dir: PathBuf,
    harden: bool,
}

impl FileBackend {
    /// Backend that hardens file permissions after every write.
    pub fn protected(dir: PathBuf) -> Self {
        Self { dir, harden: true }
    }

    /// Backend without permission hardening.
    pub fn plain(dir: PathBuf) -> Self {
        Self { dir, harden: false }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{FILE_EXT}"))
    }
}

#[async_trait]
impl CredentialBackend for FileBackend {
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).await?;

        let path = self.path(key);
        fs::write(&path, value).await?;
        if self.harden {
            harden_permissions(&path)?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        match fs::read_to_string(self.path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn kind(&self) -> BackendKind {
        if self.harden {
            BackendKind::ProtectedFile
        } else {
            BackendKind::PlainFile
        }
    }
}

/// Restrict a credential file to the owning user.
#[cfg(unix)]
pub(crate) fn harden_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(0o600);
    std::fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn harden_permissions(_path: &Path) -> Result<(), StorageError> {
    Err(StorageError::Unavailable(
        "permission hardening not supported on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_get_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::protected(dir.path().join("creds"));

        backend.save("auth_token", "jwt-value").await.unwrap();
        assert_eq!(
            backend.get("auth_token").await.unwrap().as_deref(),
            Some("jwt-value")
        );

        backend.delete("auth_token").await.unwrap();
        assert_eq!(backend.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_key_reads_as_none_and_deletes_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::plain(dir.path().to_path_buf());

        assert_eq!(backend.get("refresh_token").await.unwrap(), None);
        backend.delete("refresh_token").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn protected_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::protected(dir.path().to_path_buf());
        backend.save("auth_token", "secret").await.unwrap();

        let mode = std::fs::metadata(dir.path().join("auth_token.cred"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::protected(dir.path().to_path_buf());
        assert!(matches!(
            backend.save("../outside", "v").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
