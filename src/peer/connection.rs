//! webrtc-rs binding of `PeerTransport`.
//!
//! Builds a receive-only RTCPeerConnection and turns every observer into a
//! `TransportEvent` on one unbounded channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_remote::TrackRemote;

use super::{IceCandidateInfo, PeerTransport, SdpKind, SessionDescription, TransportError, TransportEvent};
use crate::config::SessionConfig;
use crate::stream::{InboundTrack, TrackKind};

type EventSender = mpsc::UnboundedSender<TransportEvent>;

/// Receive-only peer connection with a proactively created data channel
pub struct WebRtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    /// Kept alive so the channel survives until the connection closes
    _data_channel: Arc<RTCDataChannel>,
}

impl WebRtcTransport {
    /// Build the peer connection, register observers, and create the data
    /// channel. Events start flowing on the returned receiver immediately.
    pub async fn open(
        config: &SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>), TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| TransportError::Setup(format!("failed to register codecs: {}", e)))?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| TransportError::Setup(format!("failed to register interceptors: {}", e)))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(|s| s.to_rtc_ice_server()).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| TransportError::Setup(format!("failed to create peer connection: {}", e)))?,
        );

        // One inbound video and one inbound audio; nothing is ever sent
        for kind in [RTPCodecType::Video, RTPCodecType::Audio] {
            peer_connection
                .add_transceiver_from_kind(
                    kind,
                    Some(RTCRtpTransceiverInit {
                        direction: RTCRtpTransceiverDirection::Recvonly,
                        send_encodings: vec![],
                    }),
                )
                .await
                .map_err(|e| {
                    TransportError::Setup(format!("failed to add {} transceiver: {}", TrackKind::from(kind), e))
                })?;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        register_observers(&peer_connection, &tx);

        let data_channel = peer_connection
            .create_data_channel(&config.data_channel_label, None)
            .await
            .map_err(|e| TransportError::Setup(format!("failed to create data channel: {}", e)))?;
        watch_channel(&data_channel, &tx);

        Ok((
            Self {
                peer_connection,
                _data_channel: data_channel,
            },
            rx,
        ))
    }

    /// Underlying webrtc-rs connection, for stats and inspection
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }
}

fn register_observers(pc: &Arc<RTCPeerConnection>, tx: &EventSender) {
    let events = tx.clone();
    pc.on_track(Box::new(
        move |track: Arc<TrackRemote>, _receiver: Arc<RTCRtpReceiver>, _transceiver: Arc<RTCRtpTransceiver>| {
            let _ = events.send(TransportEvent::Track(InboundTrack::from_remote(track)));
            Box::pin(async {})
        },
    ));

    // Channels opened by the remote side
    let events = tx.clone();
    pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
        let _ = events.send(TransportEvent::DataChannel {
            label: dc.label().to_string(),
        });
        watch_channel(&dc, &events);
        Box::pin(async {})
    }));

    let events = tx.clone();
    pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
        // None marks the end of gathering and is reported as a gathering state
        if let Some(info) = candidate.and_then(|c| c.to_json().ok()) {
            let _ = events.send(TransportEvent::IceCandidate(IceCandidateInfo {
                candidate: info.candidate,
                sdp_mid: info.sdp_mid,
                sdp_mline_index: info.sdp_mline_index,
            }));
        }
        Box::pin(async {})
    }));

    let events = tx.clone();
    pc.on_ice_connection_state_change(Box::new(move |state: RTCIceConnectionState| {
        let _ = events.send(TransportEvent::IceConnectionState(state));
        Box::pin(async {})
    }));

    let events = tx.clone();
    pc.on_ice_gathering_state_change(Box::new(move |state: RTCIceGathererState| {
        let _ = events.send(TransportEvent::IceGatheringState(state));
        Box::pin(async {})
    }));

    let events = tx.clone();
    pc.on_signaling_state_change(Box::new(move |state: RTCSignalingState| {
        let _ = events.send(TransportEvent::SignalingState(state));
        Box::pin(async {})
    }));

    let events = tx.clone();
    pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
        let _ = events.send(TransportEvent::PeerConnectionState(state));
        Box::pin(async {})
    }));
}

/// Forward open and message events of one data channel
fn watch_channel(dc: &Arc<RTCDataChannel>, tx: &EventSender) {
    let label = dc.label().to_string();

    let events = tx.clone();
    let open_label = label.clone();
    dc.on_open(Box::new(move || {
        let _ = events.send(TransportEvent::DataChannelOpen { label: open_label });
        Box::pin(async {})
    }));

    let events = tx.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let _ = events.send(TransportEvent::ChannelMessage {
            label: label.clone(),
            data: msg.data,
        });
        Box::pin(async {})
    }));
}

fn to_rtc(desc: &SessionDescription) -> Result<RTCSessionDescription, TransportError> {
    let sdp = desc.sdp.clone();
    let parsed = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(sdp),
        SdpKind::Answer => RTCSessionDescription::answer(sdp),
        SdpKind::Pranswer => RTCSessionDescription::pranswer(sdp),
        SdpKind::Rollback => {
            return Err(TransportError::InvalidDescription(
                "rollback is not supported".to_string(),
            ))
        }
    };
    parsed.map_err(|e| TransportError::InvalidDescription(e.to_string()))
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription, TransportError> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        other => {
            return Err(TransportError::InvalidDescription(format!(
                "unexpected description type {:?}",
                other
            )))
        }
    };
    Ok(SessionDescription { kind, sdp: desc.sdp })
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| TransportError::CreateOffer(e.to_string()))?;
        from_rtc(offer)
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<(), TransportError> {
        let desc = to_rtc(desc)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .map_err(|e| TransportError::SetLocalDescription(e.to_string()))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.peer_connection.local_description().await?;
        from_rtc(desc).ok()
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<(), TransportError> {
        let desc = to_rtc(desc)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| TransportError::SetRemoteDescription(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection
            .close()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}
