//! Bridge connection parameters.

use serde_json::{Map, Value};

use super::SignalingError;
use crate::config::SignalingFieldNames;
use crate::peer::SessionDescription;

/// Values the caller supplies for one session: where the bridge should pull
/// the stream from. Checked for presence only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub host: String,
    pub port: String,
    pub stream_id: String,
}

impl BridgeRequest {
    pub fn new(host: impl Into<String>, port: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            stream_id: stream_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), SignalingError> {
        if self.host.is_empty() {
            return Err(SignalingError::MissingParameter("host"));
        }
        if self.port.is_empty() {
            return Err(SignalingError::MissingParameter("port"));
        }
        if self.stream_id.is_empty() {
            return Err(SignalingError::MissingParameter("stream id"));
        }
        Ok(())
    }
}

/// Everything sent in one signaling request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub request: BridgeRequest,
    pub offer: SessionDescription,
}

impl ConnectionParameters {
    pub fn new(request: BridgeRequest, offer: SessionDescription) -> Self {
        Self { request, offer }
    }

    /// Request body using the configured field names
    pub fn to_body(&self, fields: &SignalingFieldNames) -> Value {
        let mut body = Map::new();
        body.insert(fields.host.clone(), Value::String(self.request.host.clone()));
        body.insert(fields.port.clone(), Value::String(self.request.port.clone()));
        body.insert(fields.stream_id.clone(), Value::String(self.request.stream_id.clone()));
        body.insert(
            fields.offer.clone(),
            serde_json::json!({ "type": self.offer.kind, "sdp": self.offer.sdp }),
        );
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_presence() {
        assert!(BridgeRequest::new("bridge", "40052", "live").validate().is_ok());
        assert!(matches!(
            BridgeRequest::new("", "40052", "live").validate(),
            Err(SignalingError::MissingParameter("host"))
        ));
        assert!(matches!(
            BridgeRequest::new("bridge", "", "live").validate(),
            Err(SignalingError::MissingParameter("port"))
        ));
        assert!(matches!(
            BridgeRequest::new("bridge", "40052", "").validate(),
            Err(SignalingError::MissingParameter("stream id"))
        ));
        // format is not checked
        assert!(BridgeRequest::new("not a host", "port?", "x").validate().is_ok());
    }

    #[test]
    fn test_body_default_fields() {
        let params = ConnectionParameters::new(
            BridgeRequest::new("srt.local", "40052", "live001"),
            SessionDescription::offer("v=0\r\n"),
        );
        let body = params.to_body(&SignalingFieldNames::default());
        assert_eq!(
            body,
            serde_json::json!({
                "srtHost": "srt.local",
                "srtPort": "40052",
                "srtStreamId": "live001",
                "offer": { "type": "offer", "sdp": "v=0\r\n" }
            })
        );
    }

    #[test]
    fn test_body_custom_fields() {
        let fields = SignalingFieldNames {
            host: "bridgeAddress".to_string(),
            port: "bridgePort".to_string(),
            stream_id: "bridgeStreamId".to_string(),
            offer: "offer".to_string(),
        };
        let params = ConnectionParameters::new(BridgeRequest::new("a", "1", "s"), SessionDescription::offer("v=0"));
        let body = params.to_body(&fields);
        assert_eq!(body["bridgeAddress"], "a");
        assert_eq!(body["bridgeStreamId"], "s");
        assert_eq!(body["offer"]["type"], "offer");
        assert!(body.get("srtHost").is_none());
    }
}
