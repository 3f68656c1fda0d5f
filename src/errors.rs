use crate::{ConnectionId, InputPortId, NodeId, OutputPortId};

/// Failure kinds for the port-level activation protocol.
///
/// Setting a value on an exec port, or exec'ing a data port, is a
/// programmer error: it is reported here rather than corrupting port
/// state or panicking.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKindMismatch {
    #[error("cannot set a value on exec output port")]
    SetValOnExecOutput(OutputPortId),
    #[error("cannot read a cached value from exec input port")]
    GetValOnExecInput(InputPortId),
    #[error("cannot exec a data output port")]
    ExecOnDataOutput(OutputPortId),
}

/// Failures from [`crate::Flow::connect_nodes`] and friends.
///
/// `check_connection_validity` itself never fails; it returns `bool`. This
/// enum only covers operations downstream of a port id that turned out not
/// to resolve, which is a caller bug rather than a legality question.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    #[error("node {0:?} is still connected, disconnect before removing it")]
    NodeStillConnected(NodeId),
    #[error("node {0:?} does not exist in this flow")]
    UnknownNode(NodeId),
    #[error("connection {0:?} does not exist in this flow")]
    UnknownConnection(ConnectionId),
    #[error("input port {0:?} does not exist")]
    UnknownInputPort(InputPortId),
    #[error("output port {0:?} does not exist")]
    UnknownOutputPort(OutputPortId),
}

/// Raised by the node-class registry when an `identifier` from a persisted
/// project can't be resolved against the visible/invisible class lists.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no registered node class for identifier `{0}`")]
pub struct UnknownNodeIdentifier(pub String);

/// Raised by [`crate::Flow::load`] when node construction fails partway
/// through; the flow is left with whatever nodes were created before the
/// failing record, rather than attempting a best-effort partial load.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    UnknownNodeIdentifier(#[from] UnknownNodeIdentifier),
    #[error("connection record referenced node index {0} out of range")]
    NodeIndexOutOfRange(usize),
    #[error("connection record referenced input port index {0} out of range")]
    InputPortIndexOutOfRange(usize),
    #[error("connection record referenced output port index {0} out of range")]
    OutputPortIndexOutOfRange(usize),
}
