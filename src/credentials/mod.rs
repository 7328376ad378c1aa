//! Credential resolution for receipt delivery.
//!
//! The backend token and server URL are stored together as one secret,
//! `"token, serverURL"`, under a single entry in the secure store. This
//! module reads that entry and parses it into a [`Credential`].
//!
//! # Storage
//!
//! Production: OS keyring entry `{keyring_service}/{keyring_account}`.
//! Test mode: File at `{config_dir}/credentials.json`.
//!
//! # Absence
//!
//! A missing entry, an unavailable store, or a secret that does not split
//! into exactly two parts all resolve to [`Resolution::Absent`]. Callers
//! must not attempt delivery in that case.

pub mod keyring;
pub mod store;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use self::keyring::KeyringStore;
pub use self::store::{CredentialStore, FileStore, MemoryStore, StoreError, StoredSecret};

use crate::config::Config;

/// File name used by the file-backed store.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Backend token and server URL parsed from the stored secret.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    token: String,
    server_url: String,
}

impl Credential {
    /// Create a credential from its two parts.
    pub fn new(token: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            server_url: server_url.into(),
        }
    }

    /// Bearer token for the backend.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Base URL of the backend server.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Encode as the combined secret written to the store.
    pub fn to_secret(&self) -> String {
        format!("{}, {}", self.token, self.server_url)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &redact(&self.token))
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Short token prefix that is safe to log.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}…")
}

/// Parse the combined `"token, serverURL"` secret.
///
/// The secret is split on a comma followed by any number of spaces. Trailing
/// empty segments are discarded before counting, so `"abc,"` has a single
/// part. Returns `None` unless exactly two parts remain.
pub fn parse_secret(raw: &str) -> Option<Credential> {
    let mut parts: Vec<&str> = raw
        .split(',')
        .enumerate()
        .map(|(i, part)| if i == 0 { part } else { part.trim_start_matches(' ') })
        .collect();

    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    match parts.as_slice() {
        [token, server_url] => Some(Credential::new(*token, *server_url)),
        _ => None,
    }
}

/// Outcome of a credential lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A well-formed credential was found.
    Resolved(Credential),
    /// No usable credential; delivery must be skipped.
    Absent,
}

/// Fetches and parses the stored credential on every call.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Read the stored secret and parse it.
    ///
    /// Store failures are logged and reported as [`Resolution::Absent`].
    pub async fn resolve(&self) -> Resolution {
        match self.store.fetch().await {
            Ok(StoredSecret::Secret(raw)) => match parse_secret(&raw) {
                Some(credential) => Resolution::Resolved(credential),
                None => {
                    log::debug!("[Credentials] Stored secret is malformed, treating as absent");
                    Resolution::Absent
                }
            },
            Ok(StoredSecret::Unavailable) => {
                log::debug!("[Credentials] No stored credential");
                Resolution::Absent
            }
            Err(e) => {
                log::warn!("[Credentials] Credential store read failed: {e}");
                Resolution::Absent
            }
        }
    }
}

/// Pick the credential store for this process.
///
/// Any test environment uses the file store in the config directory so the
/// OS keyring is never touched; otherwise the keyring entry named by `config`.
pub fn default_store(config: &Config) -> Result<Arc<dyn CredentialStore>> {
    if crate::env::should_skip_keyring() {
        let path = Config::config_dir()?.join(CREDENTIALS_FILE);
        log::debug!("[Credentials] Using file store at {}", path.display());
        return Ok(Arc::new(FileStore::new(path)));
    }

    Ok(Arc::new(KeyringStore::new(
        config.keyring_service.clone(),
        config.keyring_account.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_space() {
        let cred = parse_secret("abc123, https://chat.example.com/").unwrap();
        assert_eq!(cred.token(), "abc123");
        assert_eq!(cred.server_url(), "https://chat.example.com/");
    }

    #[test]
    fn test_parse_without_space() {
        let cred = parse_secret("abc123,https://chat.example.com").unwrap();
        assert_eq!(cred.token(), "abc123");
        assert_eq!(cred.server_url(), "https://chat.example.com");
    }

    #[test]
    fn test_parse_many_spaces() {
        let cred = parse_secret("tok,    https://h").unwrap();
        assert_eq!(cred.server_url(), "https://h");
    }

    #[test]
    fn test_parse_rejects_wrong_part_counts() {
        for raw in ["", "false", "onlyonepart", "a, b, c", "a,b,c,d", "abc,", "abc, "] {
            assert!(parse_secret(raw).is_none(), "expected {raw:?} to be rejected");
        }
    }

    #[test]
    fn test_parse_keeps_empty_leading_token() {
        // Two parts; the empty token is rejected later by the sender.
        let cred = parse_secret(", https://h").unwrap();
        assert_eq!(cred.token(), "");
        assert_eq!(cred.server_url(), "https://h");
    }

    #[test]
    fn test_to_secret_parses_back() {
        let cred = Credential::new("tok", "https://h/");
        assert_eq!(cred.to_secret(), "tok, https://h/");
        assert_eq!(parse_secret(&cred.to_secret()), Some(cred));
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("supersecrettoken", "https://h");
        let dbg = format!("{cred:?}");
        assert!(!dbg.contains("supersecrettoken"));
        assert!(dbg.contains("supe"));
        assert!(dbg.contains("https://h"));
    }

    #[tokio::test]
    async fn test_resolve_well_formed() {
        let store = Arc::new(MemoryStore::with_secret("abc123, https://chat.example.com/"));
        let resolver = CredentialResolver::new(store);
        assert_eq!(
            resolver.resolve().await,
            Resolution::Resolved(Credential::new("abc123", "https://chat.example.com/"))
        );
    }

    #[tokio::test]
    async fn test_resolve_unavailable_is_absent() {
        let resolver = CredentialResolver::new(Arc::new(MemoryStore::unavailable()));
        assert_eq!(resolver.resolve().await, Resolution::Absent);
    }

    #[tokio::test]
    async fn test_resolve_malformed_is_absent() {
        let resolver = CredentialResolver::new(Arc::new(MemoryStore::with_secret("onlyonepart")));
        assert_eq!(resolver.resolve().await, Resolution::Absent);
    }

    #[tokio::test]
    async fn test_resolve_store_error_is_absent() {
        let store = Arc::new(MemoryStore::failing("keychain locked"));
        let resolver = CredentialResolver::new(store);
        assert_eq!(resolver.resolve().await, Resolution::Absent);
    }

    #[tokio::test]
    async fn test_resolve_reads_store_every_time() {
        let store = Arc::new(MemoryStore::with_secret("t, https://h"));
        let resolver = CredentialResolver::new(Arc::clone(&store) as Arc<dyn CredentialStore>);

        resolver.resolve().await;
        store.set("t2, https://other").await.unwrap();
        let second = resolver.resolve().await;

        assert_eq!(store.fetches(), 2);
        assert_eq!(second, Resolution::Resolved(Credential::new("t2", "https://other")));
    }
}
