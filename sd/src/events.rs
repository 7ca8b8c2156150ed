//! Session event bus
//!
//! The orchestrator emits warnings and tips here; front ends subscribe and
//! render them. State itself is published separately as snapshots.

use tokio::sync::broadcast;
use tracing::debug;

use crate::session::Warning;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Something the user should see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A recovered failure
    Warning(Warning),
    /// Advice text arrived while images are generating
    Tips(String),
    /// Loading finished; tips are no longer shown
    TipsCleared,
}

impl SessionEvent {
    /// Short name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Warning(_) => "warning",
            Self::Tips(_) => "tips",
            Self::TipsCleared => "tips_cleared",
        }
    }
}

/// Broadcast bus for session events
///
/// Fire-and-forget: events with no subscriber are dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: SessionEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn warn(&self, warning: Warning) {
        tracing::warn!(%warning, "session warning");
        self.emit(SessionEvent::Warning(warning));
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
