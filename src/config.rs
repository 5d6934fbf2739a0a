//! Session configuration.
//!
//! Every point where the two deployed viewers diverge (ICE servers, track
//! filtering, trickle logging, wire field names) is a named option here.

use std::str::FromStr;
use std::time::Duration;

use crate::ice::{self, IceServerConfig};

/// Default signaling base URL (the bridge's HTTP server)
pub const DEFAULT_SIGNALING_URL: &str = "http://127.0.0.1:8080";
/// Path of the offer/answer endpoint on the bridge
pub const DEFAULT_SIGNALING_PATH: &str = "/doSignaling";
/// Label of the proactively created data channel
pub const METADATA_CHANNEL_LABEL: &str = "metadata";

/// Which inbound track kinds get a rendering attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackFilter {
    /// Attach every arriving track
    #[default]
    All,
    /// Attach video only; audio arrivals are still logged
    VideoOnly,
}

impl FromStr for TrackFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TrackFilter::All),
            "video-only" | "video_only" | "videoonly" => Ok(TrackFilter::VideoOnly),
            other => Err(format!("unknown track filter '{}'", other)),
        }
    }
}

/// JSON field names of the signaling request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingFieldNames {
    pub host: String,
    pub port: String,
    pub stream_id: String,
    pub offer: String,
}

impl Default for SignalingFieldNames {
    fn default() -> Self {
        Self {
            host: "srtHost".to_string(),
            port: "srtPort".to_string(),
            stream_id: "srtStreamId".to_string(),
            offer: "offer".to_string(),
        }
    }
}

/// JSON field names of a metadata channel message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFieldNames {
    pub kind: String,
    pub message: String,
}

impl MetadataFieldNames {
    /// Caption cues (`{"Type": "captions", "Text": ...}`)
    pub fn captions() -> Self {
        Self {
            kind: "Type".to_string(),
            message: "Text".to_string(),
        }
    }
}

impl Default for MetadataFieldNames {
    fn default() -> Self {
        Self {
            kind: "Type".to_string(),
            message: "Message".to_string(),
        }
    }
}

/// How an attached track is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    pub controls: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            autoplay: true,
            controls: true,
        }
    }
}

/// Configuration for one receive-only bridge session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the signaling server
    pub signaling_url: String,
    /// Offer/answer path joined onto `signaling_url`
    pub signaling_path: String,
    /// ICE servers for NAT traversal
    pub ice_servers: Vec<IceServerConfig>,
    pub track_filter: TrackFilter,
    /// Log each trickled local candidate (never transmitted)
    pub trickle_ice_logging: bool,
    pub signaling_fields: SignalingFieldNames,
    pub metadata_fields: MetadataFieldNames,
    pub data_channel_label: String,
    pub presentation: Presentation,
    /// Wait (bounded) for ICE gathering before the exchange and send the
    /// candidate-bearing description. `None` sends the committed offer as is.
    pub gather_before_exchange: Option<Duration>,
    /// Abandon a signaling exchange that takes longer than this
    pub exchange_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_url: DEFAULT_SIGNALING_URL.to_string(),
            signaling_path: DEFAULT_SIGNALING_PATH.to_string(),
            ice_servers: ice::default_stun_servers(),
            track_filter: TrackFilter::All,
            trickle_ice_logging: false,
            signaling_fields: SignalingFieldNames::default(),
            metadata_fields: MetadataFieldNames::default(),
            data_channel_label: METADATA_CHANNEL_LABEL.to_string(),
            presentation: Presentation::default(),
            gather_before_exchange: None,
            exchange_timeout: None,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `BRIDGE_*` environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("BRIDGE_SIGNALING_URL") {
            self.signaling_url = url;
        }
        if let Some(list) = lookup("BRIDGE_ICE_SERVERS") {
            self.ice_servers = ice::parse_stun_list(&list);
        }
        if let Some(filter) = lookup("BRIDGE_TRACK_FILTER").and_then(|v| v.parse().ok()) {
            self.track_filter = filter;
        }
        if let Some(flag) = lookup("BRIDGE_TRICKLE_LOG") {
            self.trickle_ice_logging = matches!(flag.trim(), "1" | "true" | "on" | "yes");
        }
        self
    }

    pub fn with_signaling_url(mut self, url: impl Into<String>) -> Self {
        self.signaling_url = url.into();
        self
    }

    pub fn with_ice_servers(mut self, servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = servers;
        self
    }

    pub fn with_track_filter(mut self, filter: TrackFilter) -> Self {
        self.track_filter = filter;
        self
    }

    pub fn with_trickle_ice_logging(mut self, enabled: bool) -> Self {
        self.trickle_ice_logging = enabled;
        self
    }

    pub fn with_signaling_fields(mut self, fields: SignalingFieldNames) -> Self {
        self.signaling_fields = fields;
        self
    }

    pub fn with_metadata_fields(mut self, fields: MetadataFieldNames) -> Self {
        self.metadata_fields = fields;
        self
    }

    pub fn with_gather_before_exchange(mut self, limit: Option<Duration>) -> Self {
        self.gather_before_exchange = limit;
        self
    }

    pub fn with_exchange_timeout(mut self, limit: Option<Duration>) -> Self {
        self.exchange_timeout = limit;
        self
    }
}
