//! Receipt acknowledgement payload and endpoint.

use serde::{Deserialize, Serialize};

/// Platform reported in every acknowledgement.
pub const PLATFORM: &str = "android";

/// Path of the acknowledgement endpoint, relative to the server URL.
pub const ACK_PATH: &str = "/api/v4/notifications/ack";

/// Body of a receipt acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAck {
    /// Acknowledgement id from the push notification.
    pub id: String,
    /// Epoch milliseconds at which the payload was built.
    pub received_at: i64,
    /// Client platform, always [`PLATFORM`].
    pub platform: String,
    /// Notification category, e.g. `"message"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ReceiptAck {
    /// Build an acknowledgement stamped with the current time.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            received_at: chrono::Utc::now().timestamp_millis(),
            platform: PLATFORM.to_string(),
            kind: kind.into(),
        }
    }

    /// Serialize to the JSON request body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Acknowledgement endpoint for `server_url`, with all trailing slashes removed
/// from the base before the path is appended.
pub fn ack_url(server_url: &str) -> String {
    format!("{}{}", server_url.trim_end_matches('/'), ACK_PATH)
}
