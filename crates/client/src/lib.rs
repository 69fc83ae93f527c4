//! Blocking client for the signal-cli-rest-api messaging gateway.
//!
//! Wraps the gateway's HTTP endpoints behind one client type: sending
//! messages (with version negotiation between the v1 and v2 send formats),
//! group management, receiving envelopes, profile updates, and attachment
//! handling. Fully synchronous; every operation issues a bounded number of
//! blocking calls and surfaces the first failure as [`Error`].

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use {
    auth::{AuthProvider, HttpBasicAuth},
    client::SignalRestClient,
    error::{Error, Result},
    types::{ApiInfo, Group, OutboundMessage},
};
