//! Events published to the UI layer
//!
//! Failures never tear the session down; they arrive here as events the UI
//! can show as a toast or banner.

use crate::model::filter::TimeFilter;
use crossbeam_channel::Sender;

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Success(msg) | Self::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A snapshot was applied to the store
    ReportsUpdated { count: usize, filter: TimeFilter },
    /// A response arrived for a filter that is no longer selected, or after
    /// the response to a later request
    PollDiscarded { filter: TimeFilter },
    /// A poll failed; the store was left as it was
    PollFailed { message: String },
    Notice(Notice),
}

/// Optional event sink; a disconnected receiver is not an error
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<Sender<ClientEvent>>);

impl EventSink {
    pub fn new(tx: Sender<ClientEvent>) -> Self {
        Self(Some(tx))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, event: ClientEvent) {
        if let Some(ref tx) = self.0 {
            if tx.send(event).is_err() {
                log::trace!("event receiver dropped");
            }
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.emit(ClientEvent::Notice(notice));
    }
}
