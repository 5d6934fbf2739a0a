//! Metadata rendering sinks.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::MetadataMessage;

/// Receives each unique metadata message once
pub trait MetadataSink: Send {
    fn present(&self, message: &MetadataMessage);
}

/// Default sink: keeps forwarded messages, most recent first.
#[derive(Clone, Default)]
pub struct MetadataFeed {
    messages: Arc<Mutex<VecDeque<MetadataMessage>>>,
}

impl MetadataFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first
    pub fn messages(&self) -> Vec<MetadataMessage> {
        self.messages.lock().iter().cloned().collect()
    }

    /// Rendered lines, newest first
    pub fn lines(&self) -> Vec<String> {
        self.messages.lock().iter().map(MetadataMessage::render).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MetadataSink for MetadataFeed {
    fn present(&self, message: &MetadataMessage) {
        self.messages.lock().push_front(message.clone());
    }
}
