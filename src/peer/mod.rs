//! Peer connection abstraction for WebRTC.
//!
//! `PeerTransport` is the seam between the negotiation state machine and the
//! webrtc-rs peer connection; observers surface as `TransportEvent`s.

pub mod connection;
pub mod sdp;

pub use connection::*;
pub use sdp::*;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

use crate::stream::InboundTrack;

/// Errors raised by the underlying peer connection
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("peer connection setup failed: {0}")]
    Setup(String),

    #[error("failed to create offer: {0}")]
    CreateOffer(String),

    #[error("failed to set local description: {0}")]
    SetLocalDescription(String),

    #[error("failed to set remote description: {0}")]
    SetRemoteDescription(String),

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error("failed to close peer connection: {0}")]
    Close(String),
}

/// ICE candidate for signaling
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IceCandidateInfo {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

/// Everything the peer connection reports after construction.
///
/// Delivered in arrival order on one channel; the session is the only
/// consumer.
#[derive(Debug)]
pub enum TransportEvent {
    Track(InboundTrack),
    DataChannel { label: String },
    DataChannelOpen { label: String },
    ChannelMessage { label: String, data: Bytes },
    IceCandidate(IceCandidateInfo),
    IceConnectionState(RTCIceConnectionState),
    IceGatheringState(RTCIceGathererState),
    SignalingState(RTCSignalingState),
    PeerConnectionState(RTCPeerConnectionState),
}

/// Local negotiation primitive used by `NegotiationSession`
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<(), TransportError>;

    /// Current local description, including candidates gathered so far
    async fn local_description(&self) -> Option<SessionDescription>;

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
