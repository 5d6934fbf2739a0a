//! Receive-only negotiation session.
//!
//! Flow:
//! 1. Create a receive-only offer and commit it locally
//! 2. Optionally wait (bounded) for ICE gathering to complete
//! 3. Exchange the offer for the bridge's answer over HTTP
//! 4. Commit the answer exactly once
//!
//! Transport events keep being handled while the exchange is in flight, so
//! tracks and metadata may arrive before the answer is committed. Every
//! failure is logged and leaves the session `Abandoned`; nothing is retried.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_gatherer_state::RTCIceGathererState;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

use crate::config::SessionConfig;
use crate::event_log::EventLog;
use crate::metadata::{MetadataChannelHandler, MetadataFeed, MetadataSink};
use crate::peer::{
    IceCandidateInfo, PeerTransport, SessionDescription, TransportError, TransportEvent, WebRtcTransport,
};
use crate::signaling::{BridgeRequest, ConnectionParameters, RemoteDescriptionClient, SignalingError};
use crate::stream::{MediaTrackSink, RenderSurface, StatsSurface};

/// Session-level errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("local offer already created for this session")]
    OfferAlreadyCreated,

    #[error("no local offer has been committed")]
    NoLocalOffer,

    #[error("remote description already applied")]
    RemoteAlreadyApplied,

    #[error("local offer declares an outbound media direction")]
    SendDirectionDeclared,

    #[error("session was abandoned")]
    Abandoned,
}

/// Where the negotiation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    New,
    HaveLocalOffer,
    Established,
    Abandoned,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::New => "new",
            SessionPhase::HaveLocalOffer => "have-local-offer",
            SessionPhase::Established => "established",
            SessionPhase::Abandoned => "abandoned",
        })
    }
}

/// Last reported transport states. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedState {
    pub signaling: Option<RTCSignalingState>,
    pub ice_connection: Option<RTCIceConnectionState>,
    pub ice_gathering: Option<RTCIceGathererState>,
    pub peer_connection: Option<RTCPeerConnectionState>,
}

/// One negotiation attempt against one bridge.
///
/// Single consumer of the transport's event channel: the dedup set, the
/// track sink and the observed state are only touched from here.
pub struct NegotiationSession<T: PeerTransport> {
    transport: T,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    events_closed: bool,
    config: SessionConfig,
    log: EventLog,
    phase: SessionPhase,
    local_offer: Option<SessionDescription>,
    remote_answer: Option<SessionDescription>,
    observed: ObservedState,
    /// Local candidates; logged when trickle logging is on, never sent
    candidates: Vec<IceCandidateInfo>,
    tracks: MediaTrackSink,
    metadata: MetadataChannelHandler,
}

impl NegotiationSession<WebRtcTransport> {
    /// Open a webrtc-rs transport and wrap it in a new session
    pub async fn open(config: SessionConfig, log: EventLog) -> Result<Self, SessionError> {
        let (transport, events) = WebRtcTransport::open(&config).await.map_err(|e| {
            log.error(format!("transport setup failed: {}", e));
            e
        })?;
        Ok(Self::new(transport, events, config, log))
    }
}

impl<T: PeerTransport> NegotiationSession<T> {
    pub fn new(
        transport: T,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        config: SessionConfig,
        log: EventLog,
    ) -> Self {
        let tracks = MediaTrackSink::new(
            config.track_filter,
            config.presentation,
            Box::new(StatsSurface::new()),
            log.clone(),
        );
        let metadata =
            MetadataChannelHandler::new(config.metadata_fields.clone(), Box::new(MetadataFeed::new()), log.clone());

        Self {
            transport,
            events,
            events_closed: false,
            config,
            log,
            phase: SessionPhase::New,
            local_offer: None,
            remote_answer: None,
            observed: ObservedState::default(),
            candidates: Vec::new(),
            tracks,
            metadata,
        }
    }

    pub fn with_surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.tracks.set_surface(Box::new(surface));
        self
    }

    pub fn with_metadata_sink(mut self, sink: impl MetadataSink + 'static) -> Self {
        self.metadata.set_sink(Box::new(sink));
        self
    }

    /// Run one full attempt: validate, negotiate, exchange, commit.
    ///
    /// Never fails outward; the returned phase is the outcome and the log
    /// holds the reason.
    pub async fn start(&mut self, request: &BridgeRequest, client: &RemoteDescriptionClient) -> SessionPhase {
        if let Err(e) = request.validate() {
            self.log.error(format!("cannot start session: {}", e));
            return self.phase;
        }

        let offer = match self.negotiate().await {
            Ok(offer) => offer,
            Err(_) => return self.phase,
        };

        let params = ConnectionParameters::new(request.clone(), offer);
        match self.exchange(client, &params).await {
            Some(answer) => {
                let _ = self.apply_remote_answer(answer).await;
            }
            None => {
                self.log.error("negotiation failed: no remote description, abandoning attempt");
                self.phase = SessionPhase::Abandoned;
            }
        }
        self.phase
    }

    /// Create and commit the local receive-only offer.
    ///
    /// Returns the description to send: the committed offer, or with
    /// `gather_before_exchange` set, the local description after gathering.
    pub async fn negotiate(&mut self) -> Result<SessionDescription, SessionError> {
        match self.phase {
            SessionPhase::New => {}
            SessionPhase::Abandoned => return Err(self.reject(SessionError::Abandoned)),
            _ => return Err(self.reject(SessionError::OfferAlreadyCreated)),
        }

        self.log.info("creating local offer");
        let offer = match self.transport.create_offer().await {
            Ok(offer) => offer,
            Err(e) => return Err(self.abandon(e.into())),
        };

        if !offer.is_receive_only() {
            return Err(self.abandon(SessionError::SendDirectionDeclared));
        }

        if let Err(e) = self.transport.set_local_description(&offer).await {
            return Err(self.abandon(e.into()));
        }

        self.phase = SessionPhase::HaveLocalOffer;
        self.local_offer = Some(offer.clone());
        self.log.info(format!("local description committed ({})", offer.kind));

        let Some(limit) = self.config.gather_before_exchange else {
            return Ok(offer);
        };

        self.wait_for_gathering(limit).await;
        Ok(self.transport.local_description().await.unwrap_or(offer))
    }

    /// Commit the remote answer. Allowed exactly once, after the local offer.
    pub async fn apply_remote_answer(&mut self, answer: SessionDescription) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::HaveLocalOffer => {}
            SessionPhase::New => return Err(self.reject(SessionError::NoLocalOffer)),
            SessionPhase::Established => return Err(self.reject(SessionError::RemoteAlreadyApplied)),
            SessionPhase::Abandoned => return Err(self.reject(SessionError::Abandoned)),
        }

        if let Err(e) = self.transport.set_remote_description(&answer).await {
            return Err(self.abandon(e.into()));
        }

        self.log.info(format!("remote description committed ({})", answer.kind));
        self.remote_answer = Some(answer);
        self.phase = SessionPhase::Established;
        Ok(())
    }

    /// Handle one transport event. Only tracks and channel messages have
    /// effects; state changes are logged and remembered.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Track(track) => {
                self.tracks.on_track(track);
            }
            TransportEvent::DataChannel { label } => {
                self.log.info(format!("ondatachannel : {}", label));
            }
            TransportEvent::DataChannelOpen { label } => {
                self.log.info(format!("data channel '{}' open", label));
            }
            TransportEvent::ChannelMessage { data, .. } => {
                self.metadata.on_message(&data);
            }
            TransportEvent::IceCandidate(candidate) => {
                if self.config.trickle_ice_logging {
                    self.log.info(format!("ICE candidate: {}", candidate.candidate));
                }
                self.candidates.push(candidate);
            }
            TransportEvent::IceConnectionState(state) => {
                self.observed.ice_connection = Some(state);
                self.log.info(format!("ICE connection state: {}", state));
            }
            TransportEvent::IceGatheringState(state) => {
                self.observed.ice_gathering = Some(state);
                self.log.info(format!("ICE gathering state: {}", state));
            }
            TransportEvent::SignalingState(state) => {
                self.observed.signaling = Some(state);
                self.log.info(format!("signaling state: {}", state));
            }
            TransportEvent::PeerConnectionState(state) => {
                self.observed.peer_connection = Some(state);
                self.log.info(format!("peer connection state: {}", state));
            }
        }
    }

    /// Wait for and handle the next event. `false` once the transport is gone.
    pub async fn process_next(&mut self) -> bool {
        if self.events_closed {
            return false;
        }
        match self.events.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => {
                self.events_closed = true;
                false
            }
        }
    }

    /// Handle everything already queued without waiting
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Handle events for up to `window`
    pub async fn pump_for(&mut self, window: Duration) -> usize {
        let mut handled = 0;
        let _ = tokio::time::timeout(window, async {
            while self.process_next().await {
                handled += 1;
            }
        })
        .await;
        handled
    }

    /// Tear the transport down
    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.transport.close().await.map_err(|e| {
            self.log.error(format!("close failed: {}", e));
            SessionError::from(e)
        })?;
        self.log.info(format!("session closed ({})", self.phase));
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_offer(&self) -> Option<&SessionDescription> {
        self.local_offer.as_ref()
    }

    pub fn remote_answer(&self) -> Option<&SessionDescription> {
        self.remote_answer.as_ref()
    }

    pub fn observed(&self) -> ObservedState {
        self.observed
    }

    pub fn gathered_candidates(&self) -> &[IceCandidateInfo] {
        &self.candidates
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn tracks(&self) -> &MediaTrackSink {
        &self.tracks
    }

    pub fn metadata(&self) -> &MetadataChannelHandler {
        &self.metadata
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the exchange while still handling transport events
    async fn exchange(
        &mut self,
        client: &RemoteDescriptionClient,
        params: &ConnectionParameters,
    ) -> Option<SessionDescription> {
        let exchange = client.exchange(params);
        tokio::pin!(exchange);

        loop {
            tokio::select! {
                answer = &mut exchange => return answer,
                event = self.events.recv(), if !self.events_closed => match event {
                    Some(event) => self.handle_event(event),
                    None => self.events_closed = true,
                },
            }
        }
    }

    async fn wait_for_gathering(&mut self, limit: Duration) {
        if self.observed.ice_gathering == Some(RTCIceGathererState::Complete) {
            return;
        }

        let completed = tokio::time::timeout(limit, async {
            while !self.events_closed {
                match self.events.recv().await {
                    Some(event) => {
                        let done = matches!(event, TransportEvent::IceGatheringState(RTCIceGathererState::Complete));
                        self.handle_event(event);
                        if done {
                            return true;
                        }
                    }
                    None => self.events_closed = true,
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        if !completed {
            self.log.info(format!(
                "ICE gathering incomplete after {:?}, sending {} candidates",
                limit,
                self.candidates.len()
            ));
        }
    }

    /// Log a failure that ends the attempt
    fn abandon(&mut self, err: SessionError) -> SessionError {
        self.log.error(format!("negotiation failed: {}", err));
        self.phase = SessionPhase::Abandoned;
        err
    }

    /// Log a misuse that leaves the phase unchanged
    fn reject(&self, err: SessionError) -> SessionError {
        self.log.error(format!("rejected: {}", err));
        err
    }
}
