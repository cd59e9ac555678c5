//! Rotation Adapters - HTTP implementations of the rotation capabilities
//!
//! - [`GoogleWorkspace`]: Sheets v4 and Drive v3 REST as a [`StorageBackend`]
//! - [`AuthorizedUserToken`]: OAuth access tokens from an authorized-user file
//! - [`GraphQlStateClient`]: the remote state service as a [`RemoteState`]
//! - [`WebhookNotifier`]: failure reports posted to a chat webhook
//!
//! [`StorageBackend`]: rotation_core::StorageBackend
//! [`RemoteState`]: rotation_core::RemoteState

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod google;
pub mod state;
pub mod webhook;

#[cfg(test)]
mod test_server;

pub use google::auth::{AuthorizedUserFile, AuthorizedUserToken, TokenSource, TOKEN_ENDPOINT};
pub use google::GoogleWorkspace;
pub use state::{ClientCredentials, GraphQlStateClient};
pub use webhook::WebhookNotifier;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
