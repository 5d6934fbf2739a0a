//! Session descriptions as exchanged with the signaling endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Offer/answer discriminator, serialized lowercase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

impl fmt::Display for SdpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SdpKind::Offer => "offer",
            SdpKind::Pranswer => "pranswer",
            SdpKind::Answer => "answer",
            SdpKind::Rollback => "rollback",
        };
        f.write_str(s)
    }
}

/// A local offer or remote answer: `{"type": "...", "sdp": "..."}`.
///
/// Never mutated once produced, only superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

/// Direction attribute of one media section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl MediaDirection {
    pub fn sends(self) -> bool {
        matches!(self, MediaDirection::SendRecv | MediaDirection::SendOnly)
    }
}

/// `m=` section summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSection {
    /// `audio`, `video` or `application`
    pub media: String,
    pub direction: MediaDirection,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }

    /// Media sections in order. A section without a direction attribute
    /// inherits the session-level one, which defaults to `sendrecv`.
    pub fn media_sections(&self) -> Vec<MediaSection> {
        let mut session_direction = MediaDirection::SendRecv;
        let mut sections: Vec<MediaSection> = Vec::new();
        // per section: (media, explicit direction)
        let mut current: Option<(String, Option<MediaDirection>)> = None;

        for line in self.sdp.lines() {
            let line = line.trim_end();
            if let Some(rest) = line.strip_prefix("m=") {
                if let Some((media, dir)) = current.take() {
                    sections.push(MediaSection {
                        media,
                        direction: dir.unwrap_or(session_direction),
                    });
                }
                let media = rest.split_whitespace().next().unwrap_or_default().to_string();
                current = Some((media, None));
                continue;
            }

            if let Some(dir) = parse_direction(line) {
                match current.as_mut() {
                    Some((_, slot)) => *slot = Some(dir),
                    None => session_direction = dir,
                }
            }
        }

        if let Some((media, dir)) = current {
            sections.push(MediaSection {
                media,
                direction: dir.unwrap_or(session_direction),
            });
        }
        sections
    }

    /// True when no audio or video section declares an outbound direction
    pub fn is_receive_only(&self) -> bool {
        self.media_sections()
            .iter()
            .filter(|s| s.media == "audio" || s.media == "video")
            .all(|s| !s.direction.sends())
    }
}

fn parse_direction(line: &str) -> Option<MediaDirection> {
    match line {
        "a=sendrecv" => Some(MediaDirection::SendRecv),
        "a=sendonly" => Some(MediaDirection::SendOnly),
        "a=recvonly" => Some(MediaDirection::RecvOnly),
        "a=inactive" => Some(MediaDirection::Inactive),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECV_ONLY: &str = "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\na=mid:0\r\na=recvonly\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:1\r\na=recvonly\r\n\
m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\na=mid:2\r\n";

    #[test]
    fn test_wire_format() {
        let desc = SessionDescription::offer("v=0\r\n");
        let json = serde_json::to_string(&desc).unwrap();
        assert_eq!(json, r#"{"type":"offer","sdp":"v=0\r\n"}"#);

        let parsed: SessionDescription = serde_json::from_str(r#"{"type":"answer","sdp":"v=0"}"#).unwrap();
        assert_eq!(parsed, SessionDescription::answer("v=0"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<SessionDescription>(r#"{"type":"bogus","sdp":""}"#).is_err());
    }

    #[test]
    fn test_media_sections() {
        let sections = SessionDescription::offer(RECV_ONLY).media_sections();
        let media: Vec<_> = sections.iter().map(|s| s.media.as_str()).collect();
        assert_eq!(media, vec!["video", "audio", "application"]);
        assert_eq!(sections[0].direction, MediaDirection::RecvOnly);
        // datachannel section has no attribute and falls back to sendrecv
        assert_eq!(sections[2].direction, MediaDirection::SendRecv);
        assert!(SessionDescription::offer(RECV_ONLY).is_receive_only());
    }

    #[test]
    fn test_send_direction_detected() {
        let sdp = RECV_ONLY.replacen("a=mid:1\r\na=recvonly", "a=mid:1\r\na=sendrecv", 1);
        assert!(!SessionDescription::offer(sdp).is_receive_only());

        // missing attribute means sendrecv
        let sdp = RECV_ONLY.replacen("a=mid:0\r\na=recvonly\r\n", "a=mid:0\r\n", 1);
        assert!(!SessionDescription::offer(sdp).is_receive_only());
    }

    #[test]
    fn test_session_level_direction_inherited() {
        let sdp = "v=0\r\na=recvonly\r\nm=video 9 RTP/AVP 96\r\n";
        let sections = SessionDescription::offer(sdp).media_sections();
        assert_eq!(sections[0].direction, MediaDirection::RecvOnly);
    }
}
