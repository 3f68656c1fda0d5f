//! Runtime core of a visual dataflow / execution-flow graph engine.
//!
//! A [`Flow`] owns a mutable directed graph of [`Node`]s connected by typed
//! [`Connection`]s, and propagates activations through it under one of
//! three evaluation policies (see [`algorithm::AlgorithmMode`]). The graph
//! is modeled as an arena: nodes, ports and connections all live in
//! `slotmap` stores and are addressed by stable handles rather than
//! pointers, so removal is a simple arena operation instead of a pointer
//! cycle to untangle.

pub mod algorithm;
pub mod data;
pub mod errors;
pub mod events;
pub mod macros;
pub mod reference;
pub mod registry;

use std::fmt::Debug;

use itertools::Itertools;
use serde::Serialize;
use serde::de::DeserializeOwned;
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::algorithm::{AlgorithmMode, DataOptCache};
use crate::data::NodeRecord;
use crate::errors::{FlowError, PortKindMismatch};
use crate::events::{EventBus, FlowEvent};
use crate::reference::ResolvePort;
use crate::registry::Session;

pub(crate) const INVALID_STATE: &str = "Flow is in invalid state, this is a bug";

new_key_type! { pub struct NodeId; }
new_key_type! { pub struct ConnectionId; }
new_key_type! { pub struct InputPortId; }
new_key_type! { pub struct OutputPortId; }

/// Opaque handle to the host's owning script object. The core never
/// inspects it; it only carries it along so host code can get back to the
/// right script from a `Flow` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Data,
    Exec,
}

/// A reference to either side of a prospective connection; `connect_nodes`
/// accepts either order (input-first or output-first) and figures out
/// which is which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRef {
    Input(InputPortId),
    Output(OutputPortId),
}

impl From<InputPortId> for PortRef {
    fn from(id: InputPortId) -> Self {
        Self::Input(id)
    }
}

impl From<OutputPortId> for PortRef {
    fn from(id: OutputPortId) -> Self {
        Self::Output(id)
    }
}

#[derive(Debug, Clone)]
pub struct InputPort<V> {
    pub node: NodeId,
    pub label: String,
    pub kind: PortKind,
    pub dtype: Option<String>,
    pub value: Option<V>,
    pub connections: Vec<ConnectionId>,
}

impl<V> InputPort<V> {
    fn new(node: NodeId, label: String, kind: PortKind, dtype: Option<String>, value: Option<V>) -> Self {
        Self {
            node,
            label,
            kind,
            dtype,
            value,
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputPort<V> {
    pub node: NodeId,
    pub label: String,
    pub kind: PortKind,
    pub value: Option<V>,
    pub connections: Vec<ConnectionId>,
}

impl<V> OutputPort<V> {
    fn new(node: NodeId, label: String, kind: PortKind) -> Self {
        Self {
            node,
            label,
            kind,
            value: None,
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Connection {
    pub out: OutputPortId,
    pub inp: InputPortId,
    pub kind: PortKind,
    pub gid: u64,
}

#[derive(Debug, Clone, Default)]
struct NodeEntry {
    identifier: String,
    version: Option<String>,
    inputs: Vec<InputPortId>,
    outputs: Vec<OutputPortId>,
    block_updates: bool,
    block_init_updates: bool,
    gid: u64,
}

/// The initial, ordered port layout a freshly-constructed [`Node`] wants.
/// `inputs` carries an optional default cached value for data inputs; exec
/// inputs always pass `None`.
#[derive(Debug, Clone)]
pub struct InitialPorts<V> {
    pub inputs: Vec<(&'static str, PortKind, Option<V>)>,
    pub outputs: Vec<(&'static str, PortKind)>,
}

impl<V> Default for InitialPorts<V> {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Context handed to [`Node::update_event`] and [`Node::place_event`]; the
/// node-facing half of the activation protocol. The operations a hook can
/// perform on its own node (`input`, `set_output_val`, `exec_output`) are
/// exposed here rather than as free functions, since a hook only ever acts
/// on its own node.
pub struct UpdateContext<'a, N: Node> {
    flow: &'a mut Flow<N>,
    node: NodeId,
}

impl<'a, N: Node> UpdateContext<'a, N> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn flow(&self) -> &Flow<N> {
        self.flow
    }

    pub fn flow_mut(&mut self) -> &mut Flow<N> {
        self.flow
    }

    pub fn input(&mut self, index: usize) -> Result<N::Value, PortKindMismatch> {
        self.flow.input(self.node, index)
    }

    pub fn set_output_val(&mut self, index: usize, value: N::Value) -> Result<(), PortKindMismatch> {
        self.flow.set_output_val(self.node, index, value)
    }

    pub fn exec_output(&mut self, index: usize) -> Result<(), PortKindMismatch> {
        self.flow.exec_output(self.node, index)
    }
}

/// The capability set a user node type implements. Every hook has a no-op
/// default: port bookkeeping hooks (`input_port_created`,
/// `output_connection_added`, …) and lifecycle hooks
/// (`update_event`/`place_event`/…) only need overriding where a node type
/// actually cares.
pub trait Node: Debug + Sized + 'static {
    type Value: Clone + Debug + Serialize + DeserializeOwned + 'static;

    fn initial_ports(&self) -> InitialPorts<Self::Value> {
        Default::default()
    }

    fn input_port_created(&mut self, name: &str, kind: PortKind, id: InputPortId) {
        let _ = (name, kind, id);
    }

    fn output_port_created(&mut self, name: &str, kind: PortKind, id: OutputPortId) {
        let _ = (name, kind, id);
    }

    fn input_connection_added(&mut self, port: InputPortId, connection: ConnectionId) {
        let _ = (port, connection);
    }

    fn input_connection_removed(&mut self, port: InputPortId, connection: ConnectionId) {
        let _ = (port, connection);
    }

    fn output_connection_added(&mut self, port: OutputPortId, connection: ConnectionId) {
        let _ = (port, connection);
    }

    fn output_connection_removed(&mut self, port: OutputPortId, connection: ConnectionId) {
        let _ = (port, connection);
    }

    /// Called when an input received a signal, or when some node requested
    /// data of an output in exec mode. `input` is `None` for a
    /// manually-triggered update (spec's `inp=-1` sentinel).
    fn update_event(&mut self, ctx: &mut UpdateContext<'_, Self>, input: Option<usize>) {
        let _ = (ctx, input);
    }

    /// Called once the node has been fully constructed and placed in the
    /// flow. Runs *before* load-time connections are built. Runs every
    /// time the node is (re-)placed, which can happen more than once for
    /// the same object across undo/redo.
    fn place_event(&mut self, ctx: &mut UpdateContext<'_, Self>) {
        let _ = ctx;
    }

    /// Called once host-side view/GUI content for the node exists, if any.
    fn view_place_event(&mut self) {}

    /// Called when the node is removed from the flow.
    fn remove_event(&mut self) {}

    fn get_state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn set_state(&mut self, data: serde_json::Value, version: Option<&str>) {
        let _ = (data, version);
    }

    fn additional_data(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn load_additional_data(&mut self, data: serde_json::Value) {
        let _ = data;
    }
}

/// The mutable directed multigraph plus its event surface.
pub struct Flow<N: Node> {
    pub session: Session<N>,
    pub script: ScriptId,

    node_data: SlotMap<NodeId, NodeEntry>,
    nodes: SecondaryMap<NodeId, N>,
    node_order: Vec<NodeId>,

    connections: SlotMap<ConnectionId, Connection>,
    connection_order: Vec<ConnectionId>,

    input_ports: SlotMap<InputPortId, InputPort<N::Value>>,
    output_ports: SlotMap<OutputPortId, OutputPort<N::Value>>,

    /// Derived index from source node to the multiset of destination nodes
    /// over data connections. Duplicates allowed — one entry per
    /// connection.
    successors: SecondaryMap<NodeId, Vec<NodeId>>,

    alg_mode: AlgorithmMode,
    running_with_executor: bool,
    executor: Option<DataOptCache>,

    gid_counter: u64,
    events: EventBus,
}

impl<N: Node> Flow<N> {
    pub fn new(session: Session<N>, script: ScriptId) -> Self {
        Self {
            session,
            script,
            node_data: SlotMap::with_key(),
            nodes: SecondaryMap::new(),
            node_order: Vec::new(),
            connections: SlotMap::with_key(),
            connection_order: Vec::new(),
            input_ports: SlotMap::with_key(),
            output_ports: SlotMap::with_key(),
            successors: SecondaryMap::new(),
            alg_mode: AlgorithmMode::Data,
            running_with_executor: false,
            executor: None,
            gid_counter: 0,
            events: EventBus::default(),
        }
    }

    fn next_gid(&mut self) -> u64 {
        let gid = self.gid_counter;
        self.gid_counter += 1;
        gid
    }

    pub fn on_event<F: FnMut(&FlowEvent) + 'static>(&mut self, listener: F) {
        self.events.subscribe(listener);
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connection_order
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(id)
    }

    pub fn node_inputs(&self, node: NodeId) -> &[InputPortId] {
        self.node_data
            .get(node)
            .map_or(&[][..], |entry| entry.inputs.as_slice())
    }

    pub fn node_outputs(&self, node: NodeId) -> &[OutputPortId] {
        self.node_data
            .get(node)
            .map_or(&[][..], |entry| entry.outputs.as_slice())
    }

    pub fn input_port_at(&self, node: NodeId, index: usize) -> Option<InputPortId> {
        self.node_data.get(node)?.inputs.get(index).copied()
    }

    pub fn output_port_at(&self, node: NodeId, index: usize) -> Option<OutputPortId> {
        self.node_data.get(node)?.outputs.get(index).copied()
    }

    pub fn input_port_named(&self, node: NodeId, label: &str) -> Option<InputPortId> {
        let entry = self.node_data.get(node)?;
        entry
            .inputs
            .iter()
            .find(|&&id| self.input_ports[id].label == label)
            .copied()
    }

    pub fn output_port_named(&self, node: NodeId, label: &str) -> Option<OutputPortId> {
        let entry = self.node_data.get(node)?;
        entry
            .outputs
            .iter()
            .find(|&&id| self.output_ports[id].label == label)
            .copied()
    }

    pub fn input_port(&self, id: InputPortId) -> Option<&InputPort<N::Value>> {
        self.input_ports.get(id)
    }

    pub fn output_port(&self, id: OutputPortId) -> Option<&OutputPort<N::Value>> {
        self.output_ports.get(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn successors(&self, node: NodeId) -> &[NodeId] {
        self.successors.get(node).map_or(&[][..], Vec::as_slice)
    }

    /// A node is "active" in the exec-flow sense if any of its ports is an
    /// exec port.
    pub fn node_is_active(&self, node: NodeId) -> bool {
        let Some(entry) = self.node_data.get(node) else {
            return false;
        };
        entry.inputs.iter().any(|&id| self.input_ports[id].kind == PortKind::Exec)
            || entry.outputs.iter().any(|&id| self.output_ports[id].kind == PortKind::Exec)
    }

    pub fn algorithm_mode_str(&self) -> &'static str {
        self.alg_mode.as_str()
    }

    pub fn running_with_executor(&self) -> bool {
        self.running_with_executor
    }

    /// Sets the flow's algorithm mode. Only the three canonical spellings
    /// (`"data"`, `"data opt"`, `"exec"`) are accepted; unknown strings —
    /// including the legacy `"data flow"`/`"exec flow"` forms, which
    /// `Flow::load` translates before calling this — leave state unchanged
    /// and return `false`.
    pub fn set_algorithm_mode(&mut self, mode: &str) -> bool {
        let Some(new_mode) = AlgorithmMode::from_str(mode) else {
            return false;
        };

        self.alg_mode = new_mode;
        self.running_with_executor = matches!(new_mode, AlgorithmMode::DataOpt);
        self.executor = self.running_with_executor.then(DataOptCache::fresh);

        let canonical = self.alg_mode.as_str();
        self.events.emit(FlowEvent::AlgorithmModeChanged(canonical));

        true
    }

    fn flow_changed(&mut self) {
        if let Some(cache) = &mut self.executor {
            cache.mark_dirty();
        }
    }

    // ---- structural mutation -------------------------------------------------

    /// Adds a freshly-constructed node with its `initial_ports()` layout,
    /// places it, and emits `node_added`.
    pub fn add_node(&mut self, mut node: N, identifier: impl Into<String>) -> NodeId {
        let initial = node.initial_ports();
        let identifier = identifier.into();

        let id = self.node_data.insert(NodeEntry {
            identifier,
            ..Default::default()
        });

        self.setup_ports(id, &mut node, initial);
        self.finish_add_node(id, node)
    }

    /// Adds a node constructed from a persisted [`NodeRecord`] — ports,
    /// version and identifier come from the record rather than
    /// `initial_ports()`.
    fn add_node_from_record(&mut self, mut node: N, record: &NodeRecord<N::Value>, block_init_updates: bool) -> NodeId {
        let id = self.node_data.insert(NodeEntry {
            identifier: record.identifier.clone(),
            version: record.version.clone(),
            block_init_updates,
            ..Default::default()
        });

        for input in &record.inputs {
            let port_id = self.input_ports.insert(InputPort::new(
                id,
                input.label.clone(),
                input.kind,
                input.dtype.clone(),
                input.val.clone(),
            ));
            self.node_data[id].inputs.push(port_id);
            node.input_port_created(&input.label, input.kind, port_id);
        }

        for output in &record.outputs {
            let port_id = self.output_ports.insert(OutputPort::new(id, output.label.clone(), output.kind));
            self.node_data[id].outputs.push(port_id);
            node.output_port_created(&output.label, output.kind, port_id);
        }

        node.load_additional_data(record.additional_data.clone());
        node.set_state(record.state_data.clone(), record.version.as_deref());

        self.finish_add_node(id, node)
    }

    fn setup_ports(&mut self, id: NodeId, node: &mut N, initial: InitialPorts<N::Value>) {
        for (label, kind, default) in initial.inputs {
            let port_id = self.input_ports.insert(InputPort::new(id, label.to_string(), kind, None, default));
            self.node_data[id].inputs.push(port_id);
            node.input_port_created(label, kind, port_id);
        }
        for (label, kind) in initial.outputs {
            let port_id = self.output_ports.insert(OutputPort::new(id, label.to_string(), kind));
            self.node_data[id].outputs.push(port_id);
            node.output_port_created(label, kind, port_id);
        }
    }

    fn finish_add_node(&mut self, id: NodeId, mut node: N) -> NodeId {
        self.node_data[id].gid = self.next_gid();
        self.node_order.push(id);
        self.successors.insert(id, Vec::new());

        {
            let mut ctx = UpdateContext { flow: self, node: id };
            node.place_event(&mut ctx);
        }

        self.nodes.insert(id, node);
        self.flow_changed();
        self.events.emit(FlowEvent::NodeAdded(id));

        id
    }

    /// Called once host-side view content for `node` has been built.
    pub fn node_view_placed(&mut self, node: NodeId) {
        if let Some(mut n) = self.nodes.remove(node) {
            n.view_place_event();
            self.nodes.insert(node, n);
        }
    }

    /// Removes a node. The node must already be disconnected — the core
    /// does not auto-disconnect on removal: callers disconnect first, or
    /// this fails loudly rather than silently leaving dangling successor/
    /// connection entries.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), FlowError> {
        let entry = self.node_data.get(node).ok_or(FlowError::UnknownNode(node))?;

        let still_connected = entry.inputs.iter().any(|&id| !self.input_ports[id].connections.is_empty())
            || entry.outputs.iter().any(|&id| !self.output_ports[id].connections.is_empty());
        if still_connected {
            return Err(FlowError::NodeStillConnected(node));
        }

        let entry = self.node_data.remove(node).expect(INVALID_STATE);
        for id in entry.inputs {
            self.input_ports.remove(id);
        }
        for id in entry.outputs {
            self.output_ports.remove(id);
        }

        if let Some(mut n) = self.nodes.remove(node) {
            n.remove_event();
        }

        self.node_order.retain(|&id| id != node);
        self.successors.remove(node);
        self.flow_changed();
        self.events.emit(FlowEvent::NodeRemoved(node));

        Ok(())
    }

    /// A pair is legal iff distinct owning nodes, opposite `io_pos`, and
    /// identical `kind` hold — order of `p1`/`p2` is immaterial. Emits
    /// `connection_request_valid`. A reference that fails to resolve
    /// against this flow (stale id, out-of-range index/name) is simply
    /// invalid, the same as a type mismatch.
    pub fn check_connection_validity(&mut self, p1: impl ResolvePort<N>, p2: impl ResolvePort<N>) -> bool {
        let valid = match (p1.resolve_port(self), p2.resolve_port(self)) {
            (Some(p1), Some(p2)) => self.connection_validity(p1, p2),
            _ => false,
        };
        self.events.emit(FlowEvent::ConnectionRequestValid(valid));
        valid
    }

    fn connection_validity(&self, p1: PortRef, p2: PortRef) -> bool {
        let (node1, kind1, is_output1) = self.port_identity(p1);
        let (node2, kind2, is_output2) = self.port_identity(p2);
        node1 != node2 && is_output1 != is_output2 && kind1 == kind2
    }

    fn port_identity(&self, port: PortRef) -> (NodeId, PortKind, bool) {
        match port {
            PortRef::Input(id) => {
                let p = &self.input_ports[id];
                (p.node, p.kind, false)
            }
            PortRef::Output(id) => {
                let p = &self.output_ports[id];
                (p.node, p.kind, true)
            }
        }
    }

    /// Connects two ports, or — if they're already connected — disconnects
    /// them. A single connect/disconnect toggle, not two separate
    /// operations.
    pub fn connect_nodes(&mut self, p1: impl ResolvePort<N>, p2: impl ResolvePort<N>) -> Option<ConnectionId> {
        let (Some(p1), Some(p2)) = (p1.resolve_port(self), p2.resolve_port(self)) else {
            self.events.emit(FlowEvent::ConnectionRequestValid(false));
            return None;
        };

        if !self.check_connection_validity(p1, p2) {
            return None;
        }

        let (out, inp) = match (p1, p2) {
            (PortRef::Output(out), PortRef::Input(inp)) => (out, inp),
            (PortRef::Input(inp), PortRef::Output(out)) => (out, inp),
            _ => unreachable!("connection_validity rejects same-direction pairs"),
        };

        if let Some(&existing) = self.output_ports[out]
            .connections
            .iter()
            .find(|&&id| self.connections[id].inp == inp)
        {
            self.remove_connection(existing);
            return None;
        }

        let kind = self.output_ports[out].kind;
        let gid = self.next_gid();
        let id = self.connections.insert(Connection { out, inp, kind, gid });
        self.connection_order.push(id);

        self.add_connection(id, out, inp);

        Some(id)
    }

    fn add_connection(&mut self, id: ConnectionId, out: OutputPortId, inp: InputPortId) {
        self.output_ports[out].connections.push(id);
        self.input_ports[inp].connections.push(id);

        let out_node = self.output_ports[out].node;
        let inp_node = self.input_ports[inp].node;

        if let Some(mut n) = self.nodes.remove(out_node) {
            n.output_connection_added(out, id);
            self.nodes.insert(out_node, n);
        }
        if let Some(mut n) = self.nodes.remove(inp_node) {
            n.input_connection_added(inp, id);
            self.nodes.insert(inp_node, n);
        }

        self.successors.entry(out_node).expect(INVALID_STATE).or_default().push(inp_node);

        self.flow_changed();
        self.events.emit(FlowEvent::ConnectionAdded(id));
    }

    /// Removes a connection without deleting its endpoints.
    pub fn remove_connection(&mut self, id: ConnectionId) {
        let Some(conn) = self.connections.remove(id) else {
            return;
        };
        self.connection_order.retain(|&c| c != id);

        let out_ports = &mut self.output_ports[conn.out].connections;
        if let Some(pos) = out_ports.iter().position(|&c| c == id) {
            out_ports.remove(pos);
        }
        let in_ports = &mut self.input_ports[conn.inp].connections;
        if let Some(pos) = in_ports.iter().position(|&c| c == id) {
            in_ports.remove(pos);
        }

        let out_node = self.output_ports[conn.out].node;
        let inp_node = self.input_ports[conn.inp].node;

        if let Some(mut n) = self.nodes.remove(out_node) {
            n.output_connection_removed(conn.out, id);
            self.nodes.insert(out_node, n);
        }
        if let Some(mut n) = self.nodes.remove(inp_node) {
            n.input_connection_removed(conn.inp, id);
            self.nodes.insert(inp_node, n);
        }

        if let Some(succ) = self.successors.get_mut(out_node) {
            if let Some(pos) = succ.iter().position(|&n| n == inp_node) {
                succ.remove(pos);
            }
        }

        self.flow_changed();
        self.events.emit(FlowEvent::ConnectionRemoved(id));
    }

    // ---- port helpers -----------------------------------------------------

    /// Creates and appends (or inserts at `insert`) a new input port.
    pub fn create_input(
        &mut self,
        node: NodeId,
        label: impl Into<String>,
        kind: PortKind,
        default: Option<N::Value>,
        insert: Option<usize>,
    ) -> InputPortId {
        let label = label.into();
        let id = self.input_ports.insert(InputPort::new(node, label.clone(), kind, None, default));
        let entry_inputs = &mut self.node_data[node].inputs;
        match insert {
            Some(index) => entry_inputs.insert(index, id),
            None => entry_inputs.push(id),
        }
        if let Some(mut n) = self.nodes.remove(node) {
            n.input_port_created(&label, kind, id);
            self.nodes.insert(node, n);
        }
        self.flow_changed();
        id
    }

    pub fn create_input_dt(
        &mut self,
        node: NodeId,
        dtype: impl Into<String>,
        label: impl Into<String>,
        default: Option<N::Value>,
        insert: Option<usize>,
    ) -> InputPortId {
        let label = label.into();
        let id = self
            .input_ports
            .insert(InputPort::new(node, label.clone(), PortKind::Data, Some(dtype.into()), default));
        let entry_inputs = &mut self.node_data[node].inputs;
        match insert {
            Some(index) => entry_inputs.insert(index, id),
            None => entry_inputs.push(id),
        }
        if let Some(mut n) = self.nodes.remove(node) {
            n.input_port_created(&label, PortKind::Data, id);
            self.nodes.insert(node, n);
        }
        self.flow_changed();
        id
    }

    pub fn create_output(
        &mut self,
        node: NodeId,
        label: impl Into<String>,
        kind: PortKind,
        insert: Option<usize>,
    ) -> OutputPortId {
        let label = label.into();
        let id = self.output_ports.insert(OutputPort::new(node, label.clone(), kind));
        let entry_outputs = &mut self.node_data[node].outputs;
        match insert {
            Some(index) => entry_outputs.insert(index, id),
            None => entry_outputs.push(id),
        }
        if let Some(mut n) = self.nodes.remove(node) {
            n.output_port_created(&label, kind, id);
            self.nodes.insert(node, n);
        }
        self.flow_changed();
        id
    }

    pub fn rename_input(&mut self, port: InputPortId, label: impl Into<String>) {
        if let Some(p) = self.input_ports.get_mut(port) {
            p.label = label.into();
        }
    }

    pub fn rename_output(&mut self, port: OutputPortId, label: impl Into<String>) {
        if let Some(p) = self.output_ports.get_mut(port) {
            p.label = label.into();
        }
    }

    /// Breaks every incident connection, then removes the port.
    pub fn delete_input(&mut self, port: InputPortId) {
        let Some(p) = self.input_ports.get(port) else {
            return;
        };
        let node = p.node;
        for &conn_id in p.connections.clone().iter() {
            let out = self.connections[conn_id].out;
            self.connect_nodes(out, port);
        }
        self.input_ports.remove(port);
        self.node_data[node].inputs.retain(|&id| id != port);
    }

    pub fn delete_output(&mut self, port: OutputPortId) {
        let Some(p) = self.output_ports.get(port) else {
            return;
        };
        let node = p.node;
        for &conn_id in p.connections.clone().iter() {
            let inp = self.connections[conn_id].inp;
            self.connect_nodes(port, inp);
        }
        self.output_ports.remove(port);
        self.node_data[node].outputs.retain(|&id| id != port);
    }

    // ---- activation protocol ------------------------------------------------

    /// "Activates" the node, causing `update_event`. Suppressed (and
    /// logged) if `block_updates` is set.
    pub fn update(&mut self, node: NodeId, input: Option<usize>) {
        let Some(entry) = self.node_data.get(node) else {
            return;
        };
        if entry.block_updates {
            tracing::trace!(?node, "update suppressed: block_updates is set");
            return;
        }

        if self.running_with_executor {
            self.executor_update_node(node, input);
            return;
        }

        self.direct_update_event(node, input);
    }

    fn direct_update_event(&mut self, node: NodeId, input: Option<usize>) {
        let Some(mut n) = self.nodes.remove(node) else {
            // Re-entrant activation of a node currently mid-update (e.g. a
            // self-loop): skip with a warning instead of deadlocking or
            // re-entering the same node's state.
            tracing::warn!(?node, "update skipped: node is already active higher on the call stack");
            return;
        };

        let mut ctx = UpdateContext { flow: self, node };
        n.update_event(&mut ctx, input);

        self.nodes.insert(node, n);
    }

    /// Returns the value of a data input: the connected output's cached
    /// value if connected, else the input's own cached/default value. In
    /// `Exec` mode this first pulls by calling `update` on the upstream
    /// node.
    pub fn input(&mut self, node: NodeId, index: usize) -> Result<N::Value, PortKindMismatch> {
        let Some(port_id) = self.input_port_at(node, index) else {
            return Err(PortKindMismatch::GetValOnExecInput(InputPortId::default()));
        };

        if self.input_ports[port_id].kind != PortKind::Data {
            return Err(PortKindMismatch::GetValOnExecInput(port_id));
        }

        if self.alg_mode == AlgorithmMode::Exec {
            if let Some(&conn_id) = self.input_ports[port_id].connections.first() {
                let upstream_node = self.output_ports[self.connections[conn_id].out].node;
                self.update(upstream_node, None);
            }
        }

        Ok(self.read_input_value(port_id))
    }

    fn read_input_value(&self, port_id: InputPortId) -> N::Value {
        let port = &self.input_ports[port_id];
        if let Some(&conn_id) = port.connections.first() {
            let out_id = self.connections[conn_id].out;
            if let Some(value) = &self.output_ports[out_id].value {
                return value.clone();
            }
        }
        port.value.clone().expect("disconnected data input has no cached value")
    }

    /// Sets the value of a data output. In `Data`/`DataOpt` mode this
    /// causes `update` on every connected input, in connection order. In
    /// `Exec` mode it only writes the value.
    pub fn set_output_val(&mut self, node: NodeId, index: usize, value: N::Value) -> Result<(), PortKindMismatch> {
        let Some(port_id) = self.output_port_at(node, index) else {
            return Err(PortKindMismatch::SetValOnExecOutput(OutputPortId::default()));
        };

        if self.output_ports[port_id].kind != PortKind::Data {
            return Err(PortKindMismatch::SetValOnExecOutput(port_id));
        }

        self.output_ports[port_id].value = Some(value);

        match self.alg_mode {
            AlgorithmMode::Exec => {}
            AlgorithmMode::Data => {
                for &conn_id in self.output_ports[port_id].connections.clone().iter() {
                    let conn = self.connections[conn_id];
                    let inp_node = self.input_ports[conn.inp].node;
                    let inp_index = self.node_data[inp_node]
                        .inputs
                        .iter()
                        .position(|&id| id == conn.inp)
                        .expect(INVALID_STATE);
                    self.update(inp_node, Some(inp_index));
                }
            }
            AlgorithmMode::DataOpt => self.executor_set_output_val(port_id),
        }

        Ok(())
    }

    /// Executes an exec output, activating every connection on it. A no-op
    /// with a logged mismatch outside `Exec` mode — pure data-flow graphs
    /// have no meaningful exec-output semantics.
    pub fn exec_output(&mut self, node: NodeId, index: usize) -> Result<(), PortKindMismatch> {
        let Some(port_id) = self.output_port_at(node, index) else {
            return Err(PortKindMismatch::ExecOnDataOutput(OutputPortId::default()));
        };

        if self.output_ports[port_id].kind != PortKind::Exec {
            return Err(PortKindMismatch::ExecOnDataOutput(port_id));
        }

        if self.alg_mode != AlgorithmMode::Exec {
            tracing::warn!(?node, index, "exec_output is a no-op outside Exec mode");
            return Ok(());
        }

        for &conn_id in self.output_ports[port_id].connections.clone().iter() {
            let conn = self.connections[conn_id];
            let inp_node = self.input_ports[conn.inp].node;
            let inp_index = self.node_data[inp_node]
                .inputs
                .iter()
                .position(|&id| id == conn.inp)
                .expect(INVALID_STATE);
            self.update(inp_node, Some(inp_index));
        }

        Ok(())
    }

    pub fn set_block_updates(&mut self, node: NodeId, block: bool) {
        if let Some(entry) = self.node_data.get_mut(node) {
            entry.block_updates = block;
        }
    }

    pub fn block_updates(&self, node: NodeId) -> bool {
        self.node_data.get(node).is_some_and(|e| e.block_updates)
    }

    pub fn identifier(&self, node: NodeId) -> Option<&str> {
        self.node_data.get(node).map(|e| e.identifier.as_str())
    }

    // ---- DataOpt executor ------------------------------------------------------

    fn executor_update_node(&mut self, node: NodeId, input: Option<usize>) {
        // DataOpt is functionally equivalent to Data for `update` itself;
        // only `set_output_val`'s push path consults the cache.
        self.direct_update_event(node, input);
    }

    fn ensure_executor_fresh(&mut self) {
        let dirty = self.executor.as_ref().is_some_and(|c| c.dirty);
        if !dirty {
            return;
        }

        let mut targets: SecondaryMap<OutputPortId, Vec<(NodeId, usize)>> = SecondaryMap::new();
        for (output_id, output) in self.output_ports.iter() {
            if output.kind != PortKind::Data {
                continue;
            }
            let mut resolved = Vec::with_capacity(output.connections.len());
            for &conn_id in &output.connections {
                let conn = self.connections[conn_id];
                let inp_node = self.input_ports[conn.inp].node;
                let inp_index = self.node_data[inp_node]
                    .inputs
                    .iter()
                    .position(|&id| id == conn.inp)
                    .expect(INVALID_STATE);
                resolved.push((inp_node, inp_index));
            }
            targets.insert(output_id, resolved);
        }

        if let Some(cache) = &mut self.executor {
            cache.targets = targets;
            cache.dirty = false;
            tracing::trace!("rebuilt DataOpt successor cache");
        }
    }

    fn executor_set_output_val(&mut self, port_id: OutputPortId) {
        self.ensure_executor_fresh();
        let targets = self
            .executor
            .as_ref()
            .and_then(|c| c.targets.get(port_id))
            .cloned()
            .unwrap_or_default();

        for (node, index) in targets {
            self.update(node, Some(index));
        }
    }
}

impl<N: Node + PartialEq> Flow<N> {
    pub fn find<'a>(&'a self, node: &'a N) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes.iter().filter_map(move |(id, other)| (other == node).then_some(id))
    }
}

impl<N: Node> Debug for Flow<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("nodes", &self.node_order.len())
            .field("connections", &self.connection_order.len())
            .field("alg_mode", &self.alg_mode)
            .finish()
    }
}

// Keep `itertools` load-bearing: successor lists can carry duplicate
// targets (spec invariant 2, one entry per connection); dedup is used when
// reporting the distinct set of downstream nodes to hosts that don't care
// about multiplicity.
impl<N: Node> Flow<N> {
    pub fn distinct_successors(&self, node: NodeId) -> Vec<NodeId> {
        self.successors(node).iter().copied().unique().collect()
    }
}
