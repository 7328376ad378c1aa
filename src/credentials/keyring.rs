//! OS keyring backend for the combined credential.
//!
//! The raw `"token, serverURL"` string is stored as the password of a single
//! keyring entry. The `keyring` API is blocking, so every call runs on
//! Tokio's blocking pool.
//!
//! # Error categories
//!
//! macOS keychain may block access when the binary signature changes, and
//! Secret Service may be locked. Errors are mapped to [`StoreError`] so the
//! logs say which of these happened:
//! - Entry missing (normal before login) → [`StoredSecret::Unavailable`]
//! - Keyring locked → [`StoreError::Locked`]
//! - Access denied → [`StoreError::AccessDenied`]

use async_trait::async_trait;
use keyring::Entry;

use super::store::{CredentialStore, StoreError, StoredSecret};

/// Credential store backed by one OS keyring entry.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    account: String,
}

impl KeyringStore {
    /// Store for the entry `service/account`.
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry, StoreError> {
        Entry::new(&self.service, &self.account)
            .map_err(|e| StoreError::Other(format!("Failed to create entry: {e:?}")))
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, StoreError> + Send + 'static,
    {
        let entry = self.entry()?;
        tokio::task::spawn_blocking(move || op(entry))
            .await
            .map_err(|e| StoreError::Other(format!("Keyring task failed: {e}")))?
    }
}

/// Map a keyring error to a store error, or `None` when the entry is missing.
fn categorize_keyring_error(err: &keyring::Error) -> Option<StoreError> {
    match err {
        keyring::Error::NoEntry => return None,
        keyring::Error::BadEncoding(_) => {
            return Some(StoreError::Corrupted("stored secret is not UTF-8".to_string()));
        }
        _ => {}
    }

    let msg = format!("{err:?}");
    let msg_lower = msg.to_lowercase();

    // Common macOS keychain error patterns
    if msg_lower.contains("no password") || msg_lower.contains("nopassword") {
        return None;
    }

    if msg_lower.contains("locked")
        || msg_lower.contains("user interaction")
        || msg_lower.contains("user canceled")
    {
        return Some(StoreError::Locked(msg));
    }

    if msg_lower.contains("denied")
        || msg_lower.contains("codesign")
        || msg_lower.contains("authorization")
        || msg_lower.contains("not allowed")
        || matches!(err, keyring::Error::NoStorageAccess(_))
    {
        return Some(StoreError::AccessDenied(msg));
    }

    Some(StoreError::Other(msg))
}

#[async_trait]
impl CredentialStore for KeyringStore {
    async fn fetch(&self) -> Result<StoredSecret, StoreError> {
        self.run_blocking(|entry| match entry.get_password() {
            Ok(raw) => {
                log::debug!("[Credentials] Loaded credential from keyring");
                Ok(StoredSecret::secret(raw))
            }
            Err(e) => categorize_keyring_error(&e).map_or(Ok(StoredSecret::Unavailable), Err),
        })
        .await
    }

    async fn set(&self, secret: &str) -> Result<(), StoreError> {
        let secret = zeroize::Zeroizing::new(secret.to_string());
        self.run_blocking(move |entry| {
            entry.set_password(&secret).map_err(|e| {
                categorize_keyring_error(&e)
                    .unwrap_or_else(|| StoreError::Other(format!("Failed to store credential: {e:?}")))
            })?;
            log::info!("[Credentials] Saved credential to OS keyring");
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.run_blocking(|entry| match entry.delete_credential() {
            Ok(()) => {
                log::info!("[Credentials] Deleted credential from OS keyring");
                Ok(())
            }
            Err(e) => categorize_keyring_error(&e).map_or(Ok(()), Err),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entry_is_not_an_error() {
        assert!(categorize_keyring_error(&keyring::Error::NoEntry).is_none());
    }

    #[test]
    fn test_bad_encoding_is_corrupted() {
        let err = categorize_keyring_error(&keyring::Error::BadEncoding(vec![0xff]));
        assert!(matches!(err, Some(StoreError::Corrupted(_))));
    }

    #[test]
    fn test_platform_failure_patterns() {
        let locked = keyring::Error::PlatformFailure("User interaction is not allowed".into());
        assert!(matches!(
            categorize_keyring_error(&locked),
            Some(StoreError::Locked(_))
        ));

        let denied = keyring::Error::PlatformFailure("codesign check failed".into());
        assert!(matches!(
            categorize_keyring_error(&denied),
            Some(StoreError::AccessDenied(_))
        ));

        let other = keyring::Error::PlatformFailure("dbus went away".into());
        assert!(matches!(categorize_keyring_error(&other), Some(StoreError::Other(_))));
    }

    #[test]
    fn test_no_storage_access_is_denied() {
        let err = keyring::Error::NoStorageAccess("no secret service".into());
        assert!(matches!(
            categorize_keyring_error(&err),
            Some(StoreError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_store_error_display() {
        let locked = StoreError::Locked("user canceled".to_string());
        assert!(locked.to_string().contains("locked"));

        let denied = StoreError::AccessDenied("codesign".to_string());
        assert!(denied.to_string().contains("access denied"));

        let corrupted = StoreError::Corrupted("bad".to_string());
        assert!(corrupted.to_string().contains("corrupted"));
    }
}
