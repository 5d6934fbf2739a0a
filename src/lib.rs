//! bridge-receiver - receive-only WebRTC sessions against an SRT bridge
//!
//! The bridge pulls an SRT stream and republishes it over WebRTC. This crate
//! is the viewing side of that hop.
//!
//! Features:
//! - Receive-only offer (one video, one audio transceiver, one data channel)
//! - Single HTTP POST offer/answer exchange with the bridge
//! - Inbound track attachment with an optional video-only filter
//! - Deduplicated metadata delivery over the data channel
//! - Timestamped event log, newest first
//!
//! Media never flows from this side; the bridge is the only producer.

pub mod config;
pub mod event_log;
pub mod ice;
pub mod metadata;
pub mod peer;
pub mod session;
pub mod signaling;
pub mod stream;

pub use config::{
    MetadataFieldNames, Presentation, SessionConfig, SignalingFieldNames, TrackFilter,
    DEFAULT_SIGNALING_PATH, DEFAULT_SIGNALING_URL, METADATA_CHANNEL_LABEL,
};
pub use event_log::{EventLog, LogEntry, LogLevel, LogPayload};
pub use ice::{default_stun_servers, google_stun_servers, IceServerConfig};
pub use metadata::{Delivery, MetadataChannelHandler, MetadataError, MetadataFeed, MetadataMessage, MetadataSink};
pub use peer::{PeerTransport, SdpKind, SessionDescription, TransportError, TransportEvent, WebRtcTransport};
pub use session::{NegotiationSession, ObservedState, SessionError, SessionPhase};
pub use signaling::{
    BridgeRequest, ConnectionParameters, FailureNotifier, RemoteDescriptionClient, SignalingError,
};
pub use stream::{InboundTrack, MediaTrackSink, RenderSurface, StatsSurface, TrackAttachment, TrackKind};
