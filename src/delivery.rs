//! Best-effort delivery of push notification receipts.
//!
//! [`ReceiptSender::send`] resolves the stored credential, builds a
//! [`ReceiptAck`] and POSTs it to the server exactly once. Nothing is
//! reported back to the caller: a receipt is telemetry, so every failure is
//! logged and dropped.
//!
//! # Flow
//!
//! ```text
//! send(ack_id, type)
//!     ↓
//! CredentialResolver::resolve()   (await, store read)
//!     ↓ Resolved(credential)       Absent → done
//! execute()
//!     ↓ token/server URL present   missing → done
//! ReceiptAck::new()               (timestamp taken here)
//!     ↓
//! POST {server}/api/v4/notifications/ack
//!     ↓ any status / transport error
//! done
//! ```

// Rust guideline compliant 2026-02

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tokio::task::JoinHandle;

use crate::credentials::{redact, Credential, CredentialResolver, CredentialStore, Resolution};
use crate::receipt::{ack_url, ReceiptAck};

/// Reasons a receipt was not delivered.
///
/// HTTP error statuses are not listed: any response counts as delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No stored credential, or the stored secret is malformed.
    #[error("no usable stored credential")]
    CredentialAbsent,
    /// The credential parsed but one of its parts is empty.
    #[error("stored credential has no {0}")]
    CredentialFieldMissing(&'static str),
    /// The JSON body could not be built.
    #[error("failed to build receipt payload: {0}")]
    PayloadBuild(#[from] serde_json::Error),
    /// Connection, TLS or timeout failure.
    #[error("receipt request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Sends receipt acknowledgements using the stored credential.
///
/// Cheap to clone; clones share the HTTP connection pool and the store.
/// Concurrent sends are independent of each other.
#[derive(Debug, Clone)]
pub struct ReceiptSender {
    resolver: CredentialResolver,
    client: Client,
}

impl ReceiptSender {
    /// Sender reading credentials from `store`, with a default HTTP client.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_client(store, Client::new())
    }

    /// Sender with a caller-provided HTTP client (for shared pools or custom TLS).
    pub fn with_client(store: Arc<dyn CredentialStore>, client: Client) -> Self {
        Self {
            resolver: CredentialResolver::new(store),
            client,
        }
    }

    /// Deliver one receipt. Never fails; outcomes are only logged.
    pub async fn send(&self, ack_id: &str, kind: &str) {
        match self.deliver(ack_id, kind).await {
            Ok(status) => {
                log::debug!("[Receipt] ACK={} TYPE={} delivered, server answered {}", ack_id, kind, status);
            }
            Err(e @ (DeliveryError::CredentialAbsent | DeliveryError::CredentialFieldMissing(_))) => {
                log::debug!("[Receipt] Skipping ACK={}: {}", ack_id, e);
            }
            Err(e @ DeliveryError::PayloadBuild(_)) => {
                log::error!("[Receipt] Receipt delivery failed to build json payload: {}", e);
            }
            Err(e @ DeliveryError::Transport(_)) => {
                log::error!("[Receipt] Receipt delivery failed to send: {}", e);
            }
        }
    }

    /// Run [`send`](Self::send) in the background on the current Tokio runtime.
    ///
    /// The handle may be dropped; the task still runs to completion.
    pub fn spawn_send(&self, ack_id: impl Into<String>, kind: impl Into<String>) -> JoinHandle<()> {
        let sender = self.clone();
        let ack_id = ack_id.into();
        let kind = kind.into();
        tokio::spawn(async move { sender.send(&ack_id, &kind).await })
    }

    /// Resolve the credential and deliver, reporting why delivery did not happen.
    ///
    /// Returns the response status on any HTTP response, including 4xx/5xx.
    pub async fn deliver(&self, ack_id: &str, kind: &str) -> Result<StatusCode, DeliveryError> {
        match self.resolver.resolve().await {
            Resolution::Resolved(credential) => self.execute(&credential, ack_id, kind).await,
            Resolution::Absent => Err(DeliveryError::CredentialAbsent),
        }
    }

    /// Build the payload and issue the POST with an already-resolved credential.
    pub async fn execute(
        &self,
        credential: &Credential,
        ack_id: &str,
        kind: &str,
    ) -> Result<StatusCode, DeliveryError> {
        if credential.token().is_empty() {
            return Err(DeliveryError::CredentialFieldMissing("token"));
        }
        if credential.server_url().is_empty() {
            return Err(DeliveryError::CredentialFieldMissing("server URL"));
        }

        let body = ReceiptAck::new(ack_id, kind).to_json()?;
        let url = ack_url(credential.server_url());

        log::info!(
            "[Receipt] Send receipt delivery ACK={} TYPE={} to URL={} with TOKEN={}",
            ack_id,
            kind,
            url,
            redact(credential.token())
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", credential.token()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        Ok(response.status())
    }
}
