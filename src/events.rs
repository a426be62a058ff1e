//! Event bus for loading-sequence notifications
//!
//! Diagnostic events and the one-shot completion announcement go out on a
//! broadcast channel so any number of listeners can subscribe. The
//! completion flag is mirrored into a watch channel so a listener that
//! subscribes late can still await it.

use crate::sequencer::resources::{ResourceKind, Settlement};
use crate::sequencer::state::CompletionCause;
use std::fmt;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// Broadcast buffer; slow listeners lag rather than block the sequencer
const EVENT_CAPACITY: usize = 256;

/// Loading lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// Sequence started with this many tracked resources
    Started { sequence_id: Uuid, resources: usize },

    /// Displayed percentage changed (whole-number granularity)
    Progress { percent: u32 },

    /// A resource loaded or failed
    ResourceSettled {
        kind: ResourceKind,
        outcome: Settlement,
        settled: usize,
        total: usize,
    },

    /// The completion path was entered
    CompletionTriggered { cause: CompletionCause },

    /// Page content is visible
    ContentRevealed,

    /// Loading finished; carries no payload and is sent once
    Complete,
}

impl fmt::Display for LoaderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderEvent::Started { resources, .. } => {
                write!(f, "started ({} resources)", resources)
            }
            LoaderEvent::Progress { percent } => write!(f, "progress {}%", percent),
            LoaderEvent::ResourceSettled {
                kind,
                outcome,
                settled,
                total,
            } => write!(f, "{} {:?} ({}/{})", kind, outcome, settled, total),
            LoaderEvent::CompletionTriggered { cause } => {
                write!(f, "completing ({})", cause.as_str())
            }
            LoaderEvent::ContentRevealed => write!(f, "content revealed"),
            LoaderEvent::Complete => write!(f, "loader complete"),
        }
    }
}

/// Publisher for loader events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LoaderEvent>,
    completed: watch::Sender<bool>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        let (completed, _) = watch::channel(false);
        EventBus { sender, completed }
    }

    /// Subscribe to all subsequent events
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.sender.subscribe()
    }

    /// Publish a diagnostic event; no listeners is fine
    pub fn emit(&self, event: LoaderEvent) {
        let _ = self.sender.send(event);
    }

    /// Announce completion; only the first call broadcasts
    pub fn emit_complete(&self) -> bool {
        let first = self.completed.send_if_modified(|done| {
            if *done {
                false
            } else {
                *done = true;
                true
            }
        });
        if first {
            self.emit(LoaderEvent::Complete);
        }
        first
    }

    pub fn is_complete(&self) -> bool {
        *self.completed.borrow()
    }

    /// Resolve once completion has been announced, even if that was earlier
    pub async fn wait_complete(&self) {
        let mut rx = self.completed.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|done| *done).await;
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
