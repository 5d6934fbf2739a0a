//! Inbound media tracks and where they are rendered.
//!
//! - `MediaTrackSink`: logs every arrival, applies the track filter
//! - `RenderSurface`: receives attachments (`StatsSurface` by default)

pub mod surface;
pub mod track_sink;

pub use surface::*;
pub use track_sink::*;

use std::fmt;
use std::sync::Arc;

use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Media kind of an inbound track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
    Unknown,
}

impl From<RTPCodecType> for TrackKind {
    fn from(kind: RTPCodecType) -> Self {
        match kind {
            RTPCodecType::Audio => TrackKind::Audio,
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Unknown,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
            TrackKind::Unknown => "unknown",
        })
    }
}

/// A track announced by the remote side
#[derive(Clone)]
pub struct InboundTrack {
    pub kind: TrackKind,
    /// Track id, shown as the track label
    pub id: String,
    pub stream_id: String,
    /// Negotiated codec mime type, empty when unknown
    pub codec: String,
    remote: Option<Arc<TrackRemote>>,
}

impl InboundTrack {
    /// Wrap a live webrtc-rs remote track
    pub fn from_remote(track: Arc<TrackRemote>) -> Self {
        Self {
            kind: track.kind().into(),
            id: track.id(),
            stream_id: track.stream_id(),
            codec: track.codec().capability.mime_type,
            remote: Some(track),
        }
    }

    /// A track descriptor with no RTP source behind it
    pub fn detached(kind: TrackKind, id: &str, stream_id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            stream_id: stream_id.to_string(),
            codec: String::new(),
            remote: None,
        }
    }

    pub fn remote(&self) -> Option<&Arc<TrackRemote>> {
        self.remote.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.remote.is_some()
    }
}

impl fmt::Debug for InboundTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundTrack")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("codec", &self.codec)
            .field("live", &self.is_live())
            .finish()
    }
}
