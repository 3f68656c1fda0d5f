use crate::{ConnectionId, NodeId};

/// The event surface a [`crate::Flow`] exposes to host code.
///
/// Every variant fires *after* the corresponding mutation is complete and
/// the flow's invariants hold again.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
    ConnectionRequestValid(bool),
    NodesCreatedFromData(Vec<NodeId>),
    ConnectionsCreatedFromData(Vec<ConnectionId>),
    AlgorithmModeChanged(&'static str),
}

/// A plain subscriber list. Kept deliberately dumb (no filtering, no
/// priorities) — hosts that need more structure build it on top of this.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn FnMut(&FlowEvent)>>,
}

impl EventBus {
    pub fn subscribe<F: FnMut(&FlowEvent) + 'static>(&mut self, listener: F) {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: FlowEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
