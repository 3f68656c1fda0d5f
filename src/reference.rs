//! Typed port references, resolved against a [`crate::Flow`].
//!
//! Callers write `node.input(0)` or `node.output("out")` and get back
//! something that resolves to a concrete port id without having to look
//! the id up by hand first.

use crate::{Flow, InputPortId, Node, NodeId, OutputPortId, PortRef};

pub trait NodeInputIdentifier<'a> {
    type Reference: InputPortReference;

    fn combine(self, node_id: NodeId) -> Self::Reference;
}

pub trait NodeOutputIdentifier<'a> {
    type Reference: OutputPortReference;

    fn combine(self, node_id: NodeId) -> Self::Reference;
}

impl<'a> NodeInputIdentifier<'a> for usize {
    type Reference = NodeInputIndexReference;

    fn combine(self, node_id: NodeId) -> Self::Reference {
        NodeInputIndexReference(node_id, self)
    }
}

impl<'a> NodeOutputIdentifier<'a> for usize {
    type Reference = NodeOutputIndexReference;

    fn combine(self, node_id: NodeId) -> Self::Reference {
        NodeOutputIndexReference(node_id, self)
    }
}

impl<'a> NodeInputIdentifier<'a> for &'a str {
    type Reference = NodeInputNameReference<'a>;

    fn combine(self, node_id: NodeId) -> Self::Reference {
        NodeInputNameReference(node_id, self)
    }
}

impl<'a> NodeOutputIdentifier<'a> for &'a str {
    type Reference = NodeOutputNameReference<'a>;

    fn combine(self, node_id: NodeId) -> Self::Reference {
        NodeOutputNameReference(node_id, self)
    }
}

pub trait InputPortReference: Copy {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<InputPortId>;
}

impl InputPortReference for InputPortId {
    fn resolve<N: Node>(&self, _flow: &Flow<N>) -> Option<InputPortId> {
        Some(*self)
    }
}

pub trait OutputPortReference: Copy {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<OutputPortId>;
}

impl OutputPortReference for OutputPortId {
    fn resolve<N: Node>(&self, _flow: &Flow<N>) -> Option<OutputPortId> {
        Some(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInputIndexReference(pub NodeId, pub usize);

impl InputPortReference for NodeInputIndexReference {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<InputPortId> {
        flow.input_port_at(self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOutputIndexReference(pub NodeId, pub usize);

impl OutputPortReference for NodeOutputIndexReference {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<OutputPortId> {
        flow.output_port_at(self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInputNameReference<'a>(pub NodeId, pub &'a str);

impl<'a> InputPortReference for NodeInputNameReference<'a> {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<InputPortId> {
        flow.input_port_named(self.0, self.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOutputNameReference<'a>(pub NodeId, pub &'a str);

impl<'a> OutputPortReference for NodeOutputNameReference<'a> {
    fn resolve<N: Node>(&self, flow: &Flow<N>) -> Option<OutputPortId> {
        flow.output_port_named(self.0, self.1)
    }
}

/// Anything `connect_nodes`/`check_connection_validity` can resolve against
/// a flow: a bare port id, or one of the ergonomic index/name references
/// above. Implemented per concrete type rather than blanket over
/// `InputPortReference`/`OutputPortReference`, since both traits could in
/// principle be implemented by the same type and a blanket impl would
/// conflict.
pub trait ResolvePort<N: Node> {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef>;
}

impl<N: Node> ResolvePort<N> for PortRef {
    fn resolve_port(&self, _flow: &Flow<N>) -> Option<PortRef> {
        Some(*self)
    }
}

impl<N: Node> ResolvePort<N> for InputPortId {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        InputPortReference::resolve(self, flow).map(PortRef::Input)
    }
}

impl<N: Node> ResolvePort<N> for OutputPortId {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        OutputPortReference::resolve(self, flow).map(PortRef::Output)
    }
}

impl<N: Node> ResolvePort<N> for NodeInputIndexReference {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        self.resolve(flow).map(PortRef::Input)
    }
}

impl<N: Node> ResolvePort<N> for NodeOutputIndexReference {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        self.resolve(flow).map(PortRef::Output)
    }
}

impl<'a, N: Node> ResolvePort<N> for NodeInputNameReference<'a> {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        self.resolve(flow).map(PortRef::Input)
    }
}

impl<'a, N: Node> ResolvePort<N> for NodeOutputNameReference<'a> {
    fn resolve_port(&self, flow: &Flow<N>) -> Option<PortRef> {
        self.resolve(flow).map(PortRef::Output)
    }
}

pub trait NodeIdExt {
    fn input<'a, I: NodeInputIdentifier<'a>>(&self, identifier: I) -> I::Reference;
    fn output<'a, I: NodeOutputIdentifier<'a>>(&self, identifier: I) -> I::Reference;
}

impl NodeIdExt for NodeId {
    fn input<'a, I: NodeInputIdentifier<'a>>(&self, identifier: I) -> I::Reference {
        identifier.combine(*self)
    }

    fn output<'a, I: NodeOutputIdentifier<'a>>(&self, identifier: I) -> I::Reference {
        identifier.combine(*self)
    }
}
