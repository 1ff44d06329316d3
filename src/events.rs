//! Event bus - the observer seam between the reconciler and renderers

use crate::domain::Flow;
use tokio::sync::broadcast;

/// Mutation lifecycle events.
///
/// `FlowsUpdated` is emitted after every local mutation (optimistic apply,
/// rollback, push commit, reload) and carries the complete current flow
/// list; subscribers render it and never mutate it.
#[derive(Debug, Clone)]
pub enum Event {
    /// The flow list changed; render this snapshot
    FlowsUpdated { flows: Vec<Flow> },

    /// A flow was published to the remote authority
    FlowPushed { flow_id: i64 },

    /// The session store was rebuilt from the remote authority
    Reloaded { flow_count: usize, offer_count: usize },
}

/// Broadcast bus for mutation events
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: Event) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
