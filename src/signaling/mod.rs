//! Signaling for WebRTC connection establishment.
//!
//! One HTTP round trip: the local offer plus the bridge parameters go out as
//! a JSON POST, the remote answer comes back as JSON.
//!
//! - `params`: caller-supplied bridge values and the request body
//! - `client`: the request/response exchange

pub mod client;
pub mod params;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::*;
pub use params::*;

use std::time::Duration;

use thiserror::Error;

/// Errors from building or performing the signaling exchange
#[derive(Error, Debug)]
pub enum SignalingError {
    #[error("invalid signaling endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("missing bridge parameter: {0}")]
    MissingParameter(&'static str),

    #[error("failed to build signaling request: {0}")]
    Request(String),

    #[error("signaling request failed: {0}")]
    Transport(String),

    #[error("signaling endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed remote description: {0}")]
    MalformedAnswer(#[from] serde_json::Error),

    #[error("signaling exchange timed out after {0:?}")]
    Timeout(Duration),
}

impl SignalingError {
    /// Text shown to the user: the endpoint's own body when it rejected us
    pub fn notice(&self) -> String {
        match self {
            SignalingError::Rejected { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}
