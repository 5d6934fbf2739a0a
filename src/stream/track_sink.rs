//! Track arrival handling.

use super::{InboundTrack, RenderSurface, TrackAttachment, TrackKind};
use crate::config::{Presentation, TrackFilter};
use crate::event_log::EventLog;

impl TrackFilter {
    /// Whether a track of `kind` gets a rendering attachment
    pub fn admits(self, kind: TrackKind) -> bool {
        match self {
            TrackFilter::All => true,
            TrackFilter::VideoOnly => kind == TrackKind::Video,
        }
    }
}

/// Attaches inbound tracks to a render surface according to the filter
pub struct MediaTrackSink {
    filter: TrackFilter,
    presentation: Presentation,
    surface: Box<dyn RenderSurface>,
    log: EventLog,
    arrived: usize,
    attached: usize,
}

impl MediaTrackSink {
    pub fn new(
        filter: TrackFilter,
        presentation: Presentation,
        surface: Box<dyn RenderSurface>,
        log: EventLog,
    ) -> Self {
        Self {
            filter,
            presentation,
            surface,
            log,
            arrived: 0,
            attached: 0,
        }
    }

    pub fn set_surface(&mut self, surface: Box<dyn RenderSurface>) {
        self.surface = surface;
    }

    /// Log the arrival and attach it if the filter admits its kind.
    /// Returns whether an attachment was made.
    pub fn on_track(&mut self, track: InboundTrack) -> bool {
        self.arrived += 1;
        self.log.info(format!("ontrack : {} label {}", track.kind, track.id));

        if !self.filter.admits(track.kind) {
            self.log.info(format!("not rendering {} track {}", track.kind, track.id));
            return false;
        }

        self.surface.attach(TrackAttachment {
            track,
            presentation: self.presentation,
        });
        self.attached += 1;
        true
    }

    pub fn arrived(&self) -> usize {
        self.arrived
    }

    pub fn attached(&self) -> usize {
        self.attached
    }
}
