//! Out-of-band metadata delivered over the data channel.
//!
//! The bridge sends one JSON object per channel message, e.g.
//! `{"Type": "metadata", "Message": "h264"}`.

pub mod feed;
pub mod handler;

pub use feed::*;
pub use handler::*;

use serde_json::Value;
use thiserror::Error;

use crate::config::MetadataFieldNames;

/// Metadata payload errors
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("malformed metadata payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("metadata payload is not a JSON object")]
    NotAnObject,

    #[error("metadata payload has no string field '{0}'")]
    MissingField(String),
}

/// One parsed metadata message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMessage {
    pub kind: String,
    pub message: String,
}

impl MetadataMessage {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Parse a channel payload using the configured field names
    pub fn parse(payload: &[u8], fields: &MetadataFieldNames) -> Result<Self, MetadataError> {
        let value: Value = serde_json::from_slice(payload)?;
        let object = value.as_object().ok_or(MetadataError::NotAnObject)?;

        let field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| MetadataError::MissingField(name.to_string()))
        };

        Ok(Self {
            kind: field(&fields.kind)?,
            message: field(&fields.message)?,
        })
    }

    /// Display line: type padded to 8 columns, then the message
    pub fn render(&self) -> String {
        format!("{:<8}: {}", self.kind, self.message)
    }
}
