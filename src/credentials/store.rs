//! Credential store abstraction and the non-keyring backends.
//!
//! A store holds exactly one secret entry and is read without any query
//! filter. "No entry" is a normal answer ([`StoredSecret::Unavailable`]),
//! not an error.

// Rust guideline compliant 2026-02

use std::fmt;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Result of reading the secure store.
pub enum StoredSecret {
    /// The raw combined secret.
    Secret(Zeroizing<String>),
    /// The store has no entry or reports it as not available.
    Unavailable,
}

impl StoredSecret {
    /// Wrap a raw secret string.
    pub fn secret(raw: impl Into<String>) -> Self {
        Self::Secret(Zeroizing::new(raw.into()))
    }
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secret(_) => f.write_str("Secret(<redacted>)"),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Categorized store access errors for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store is locked and requires user interaction to unlock.
    #[error("credential store locked: {0}")]
    Locked(String),
    /// Access denied, e.g. after a binary signature change.
    #[error("credential store access denied: {0}")]
    AccessDenied(String),
    /// Data exists but is unreadable.
    #[error("credential store data corrupted: {0}")]
    Corrupted(String),
    /// Filesystem failure in the file-backed store.
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Other/unknown error.
    #[error("credential store error: {0}")]
    Other(String),
}

/// A secure store holding the single combined credential entry.
#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// Read the stored entry.
    async fn fetch(&self) -> Result<StoredSecret, StoreError>;

    /// Replace the stored entry.
    async fn set(&self, secret: &str) -> Result<(), StoreError>;

    /// Remove the stored entry. Removing a missing entry succeeds.
    async fn clear(&self) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process store, for hosts that manage the secret themselves and for tests.
#[derive(Default)]
pub struct MemoryStore {
    secret: Mutex<Option<Zeroizing<String>>>,
    failure: Option<String>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    /// Store holding `secret`.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Mutex::new(Some(Zeroizing::new(secret.into()))),
            ..Self::default()
        }
    }

    /// Store with no entry.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Store whose reads always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Number of `fetch` calls served so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Zeroizing<String>>> {
        // A poisoned lock still holds a valid Option.
        self.secret.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("has_secret", &self.slot().is_some())
            .field("failure", &self.failure)
            .field("fetches", &self.fetches())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn fetch(&self) -> Result<StoredSecret, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(StoreError::Other(message.clone()));
        }
        let current = self.slot().clone();
        Ok(match current {
            Some(secret) => StoredSecret::Secret(secret),
            None => StoredSecret::Unavailable,
        })
    }

    async fn set(&self, secret: &str) -> Result<(), StoreError> {
        *self.slot() = Some(Zeroizing::new(secret.to_string()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot() = None;
        Ok(())
    }
}

// ============================================================================
// File store (test mode)
// ============================================================================

/// On-disk layout of the file-backed entry.
#[derive(Serialize, Deserialize)]
struct FileEntry {
    password: String,
}

/// JSON file store used instead of the OS keyring in test environments.
///
/// The file is written with owner-only permissions on Unix.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn fetch(&self) -> Result<StoredSecret, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Zeroizing::new(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredSecret::Unavailable);
            }
            Err(e) => return Err(e.into()),
        };

        let entry: FileEntry = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupted(format!("JSON parse error: {e}")))?;
        log::debug!("[Credentials] Loaded credential from file (test mode)");
        Ok(StoredSecret::secret(entry.password))
    }

    async fn set(&self, secret: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entry = FileEntry {
            password: secret.to_string(),
        };
        let json = Zeroizing::new(
            serde_json::to_string_pretty(&entry).map_err(|e| StoreError::Other(e.to_string()))?,
        );
        tokio::fs::write(&self.path, json.as_bytes()).await?;

        #[cfg(unix)]
        tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;

        log::debug!("[Credentials] Saved credential to file (test mode)");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
