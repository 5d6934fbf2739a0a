//! Deduplicated delivery of inbound metadata messages.

use std::collections::HashSet;

use super::{MetadataMessage, MetadataSink};
use crate::config::MetadataFieldNames;
use crate::event_log::{EventLog, LogPayload};

/// What happened to one inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Forwarded,
    /// Message text already seen; dropped without logging
    Duplicate,
    /// Payload could not be parsed; logged and dropped
    Dropped,
}

/// Parses channel payloads and forwards each distinct message text once.
///
/// The seen set is keyed on the message text alone, so two types sharing
/// the same text collide. It lives as long as the handler, i.e. one session.
pub struct MetadataChannelHandler {
    fields: MetadataFieldNames,
    seen: HashSet<String>,
    sink: Box<dyn MetadataSink>,
    log: EventLog,
}

impl MetadataChannelHandler {
    pub fn new(fields: MetadataFieldNames, sink: Box<dyn MetadataSink>, log: EventLog) -> Self {
        Self {
            fields,
            seen: HashSet::new(),
            sink,
            log,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn MetadataSink>) {
        self.sink = sink;
    }

    pub fn on_message(&mut self, payload: &[u8]) -> Delivery {
        let message = match MetadataMessage::parse(payload, &self.fields) {
            Ok(message) => message,
            Err(e) => {
                self.log.error(LogPayload::fault(&e));
                return Delivery::Dropped;
            }
        };

        if self.seen.contains(&message.message) {
            return Delivery::Duplicate;
        }

        self.sink.present(&message);
        self.seen.insert(message.message);
        Delivery::Forwarded
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::LogLevel;
    use crate::metadata::MetadataFeed;

    fn handler() -> (MetadataChannelHandler, MetadataFeed, EventLog) {
        let feed = MetadataFeed::new();
        let log = EventLog::new();
        let handler = MetadataChannelHandler::new(MetadataFieldNames::default(), Box::new(feed.clone()), log.clone());
        (handler, feed, log)
    }

    #[test]
    fn test_duplicates_forwarded_once() {
        let (mut handler, feed, log) = handler();

        assert_eq!(handler.on_message(br#"{"Type":"metadata","Message":"h264"}"#), Delivery::Forwarded);
        assert_eq!(handler.on_message(br#"{"Type":"metadata","Message":"h264"}"#), Delivery::Duplicate);
        // same text under a different type is still a duplicate
        assert_eq!(handler.on_message(br#"{"Type":"captions","Message":"h264"}"#), Delivery::Duplicate);

        assert_eq!(feed.len(), 1);
        assert_eq!(handler.seen_count(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_most_recent_first() {
        let (mut handler, feed, _log) = handler();
        for text in ["m1", "m2", "m3"] {
            let payload = format!(r#"{{"Type":"metadata","Message":"{}"}}"#, text);
            handler.on_message(payload.as_bytes());
        }
        handler.on_message(br#"{"Type":"metadata","Message":"m2"}"#);

        let order: Vec<_> = feed.messages().into_iter().map(|m| m.message).collect();
        assert_eq!(order, vec!["m3", "m2", "m1"]);
        assert_eq!(feed.lines()[0], "metadata: m3");
    }

    #[test]
    fn test_malformed_payload_logged_and_dropped() {
        let (mut handler, feed, log) = handler();

        assert_eq!(handler.on_message(b"\xff not json"), Delivery::Dropped);
        assert!(feed.is_empty());
        assert_eq!(handler.seen_count(), 0);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert!(entries[0].text.contains("malformed metadata payload"));

        // the handler keeps working afterwards
        assert_eq!(handler.on_message(br#"{"Type":"metadata","Message":"aac"}"#), Delivery::Forwarded);
    }
}
