//! Rendering surfaces for attached tracks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use webrtc::track::track_remote::TrackRemote;

use super::{InboundTrack, TrackKind};
use crate::config::Presentation;

/// A track bound to a presentation area
#[derive(Debug, Clone)]
pub struct TrackAttachment {
    pub track: InboundTrack,
    pub presentation: Presentation,
}

/// Where admitted tracks end up
pub trait RenderSurface: Send {
    fn attach(&self, attachment: TrackAttachment);
}

/// Received media counters (atomic, lock-free)
#[derive(Default)]
pub struct SurfaceStats {
    pub audio_packets_received: AtomicU64,
    pub audio_bytes_received: AtomicU64,
    pub video_packets_received: AtomicU64,
    pub video_bytes_received: AtomicU64,
    pub read_errors: AtomicU64,
}

/// Attachment as recorded by `StatsSurface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    pub kind: TrackKind,
    pub id: String,
    pub stream_id: String,
    pub presentation: Presentation,
}

/// Default surface: records attachments and drains live tracks into counters.
#[derive(Clone, Default)]
pub struct StatsSurface {
    attachments: Arc<Mutex<Vec<AttachmentRecord>>>,
    pub stats: Arc<SurfaceStats>,
}

impl StatsSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attachments in arrival order
    pub fn attachments(&self) -> Vec<AttachmentRecord> {
        self.attachments.lock().clone()
    }

    pub fn attached_count(&self, kind: TrackKind) -> usize {
        self.attachments.lock().iter().filter(|a| a.kind == kind).count()
    }
}

impl RenderSurface for StatsSurface {
    fn attach(&self, attachment: TrackAttachment) {
        let TrackAttachment { track, presentation } = attachment;

        self.attachments.lock().push(AttachmentRecord {
            kind: track.kind,
            id: track.id.clone(),
            stream_id: track.stream_id.clone(),
            presentation,
        });

        let Some(remote) = track.remote().cloned() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let stats = self.stats.clone();
                handle.spawn(read_track(remote, track.kind, stats));
            }
            Err(_) => log::warn!("no runtime to drain {} track {}", track.kind, track.id),
        }
    }
}

/// Read RTP until the track ends, counting what arrives
async fn read_track(track: Arc<TrackRemote>, kind: TrackKind, stats: Arc<SurfaceStats>) {
    let (packets, bytes) = match kind {
        TrackKind::Video => (&stats.video_packets_received, &stats.video_bytes_received),
        _ => (&stats.audio_packets_received, &stats.audio_bytes_received),
    };

    loop {
        match track.read_rtp().await {
            Ok((rtp_packet, _attributes)) => {
                let payload = rtp_packet.payload.as_ref();
                if payload.is_empty() {
                    continue;
                }
                packets.fetch_add(1, Ordering::Relaxed);
                bytes.fetch_add(payload.len() as u64, Ordering::Relaxed);
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                // Expected on shutdown
                if err_str.contains("eof")
                    || err_str.contains("closed")
                    || err_str.contains("nil")
                    || err_str.contains("must not be")
                {
                    break;
                }
                stats.read_errors.fetch_add(1, Ordering::Relaxed);
                log::warn!("{} track RTP read error: {}", kind, e);
            }
        }
    }
    log::debug!("{} track reader finished", kind);
}
