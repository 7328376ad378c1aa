//! Receipt delivery - push notification receipt acknowledgements.
//!
//! When a push notification arrives, the client tells the backend it was
//! received. This crate reads the backend token and server URL from secure
//! storage and sends one acknowledgement request, ignoring any failure.
//!
//! # Modules
//!
//! - [`credentials`] - Secure store backends and credential parsing
//! - [`receipt`] - Acknowledgement payload and endpoint
//! - [`delivery`] - The fire-and-forget sender
//! - [`config`] - Configuration loading/saving
//! - [`env`] - Runtime environment detection
//!
//! # Usage
//!
//! ```ignore
//! let config = Config::load()?;
//! let sender = ReceiptSender::new(credentials::default_store(&config)?);
//! sender.spawn_send(ack_id, "message");
//! ```

pub mod config;
pub mod credentials;
pub mod delivery;
pub mod env;
pub mod receipt;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credential, CredentialResolver, CredentialStore, Resolution};
pub use delivery::{DeliveryError, ReceiptSender};
pub use receipt::ReceiptAck;
