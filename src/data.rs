//! The persisted project format and the `Flow::data()` / `Flow::load()`
//! round trip.

use serde::{Deserialize, Serialize};

use crate::errors::LoadError;
use crate::events::FlowEvent;
use crate::{Flow, Node, PortKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "V: Serialize",
    deserialize = "V: Deserialize<'de>"
))]
pub struct InputPortRecord<V> {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: PortKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
    #[serde(
        default,
        rename = "dtype state",
        skip_serializing_if = "Option::is_none"
    )]
    pub dtype_state: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<V>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPortRecord {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: PortKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord<V> {
    pub identifier: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "state data", default)]
    pub state_data: serde_json::Value,
    #[serde(rename = "additional data", default)]
    pub additional_data: serde_json::Value,
    pub inputs: Vec<InputPortRecord<V>>,
    pub outputs: Vec<OutputPortRecord>,
    #[serde(rename = "GID")]
    pub gid: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(rename = "GID")]
    pub gid: u64,
    #[serde(rename = "parent node index")]
    pub parent_node_index: usize,
    #[serde(rename = "output port index")]
    pub output_port_index: usize,
    #[serde(rename = "connected node")]
    pub connected_node: Option<usize>,
    #[serde(rename = "connected input port index")]
    pub connected_input_port_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord<V> {
    #[serde(rename = "algorithm mode")]
    pub algorithm_mode: String,
    pub nodes: Vec<NodeRecord<V>>,
    pub connections: Vec<ConnectionRecord>,
    #[serde(rename = "GID")]
    pub gid: u64,
}

impl<N: Node> Flow<N> {
    /// Serializes the whole flow, in node-list order.
    pub fn data(&self) -> FlowRecord<N::Value> {
        FlowRecord {
            algorithm_mode: self.algorithm_mode_str().to_string(),
            nodes: self.gen_nodes_data(&self.node_order.clone()),
            connections: self.gen_conns_data(&self.node_order.clone()),
            gid: self.gid_counter,
        }
    }

    /// Returns the `data()` dicts for exactly the nodes given, in the order
    /// given (used both by `data()` and for serializing selections).
    pub fn gen_nodes_data(&self, nodes: &[crate::NodeId]) -> Vec<NodeRecord<N::Value>> {
        nodes.iter().map(|&id| self.node_data_record(id)).collect()
    }

    fn node_data_record(&self, id: crate::NodeId) -> NodeRecord<N::Value> {
        let entry = &self.node_data[id];
        let node = &self.nodes[id];

        let inputs = entry
            .inputs
            .iter()
            .map(|&port_id| {
                let port = &self.input_ports[port_id];
                InputPortRecord {
                    label: port.label.clone(),
                    kind: port.kind,
                    dtype: port.dtype.clone(),
                    dtype_state: None,
                    val: port.value.clone(),
                }
            })
            .collect();

        let outputs = entry
            .outputs
            .iter()
            .map(|&port_id| {
                let port = &self.output_ports[port_id];
                OutputPortRecord {
                    label: port.label.clone(),
                    kind: port.kind,
                }
            })
            .collect();

        NodeRecord {
            identifier: entry.identifier.clone(),
            version: entry.version.clone(),
            state_data: node.get_state(),
            additional_data: node.additional_data(),
            inputs,
            outputs,
            gid: entry.gid,
        }
    }

    /// Generates connection records between and relative to the nodes
    /// passed, skipping any connection whose other endpoint lies outside
    /// the list. Deliberately a function of the caller-provided node list,
    /// not of the whole flow, so callers can serialize an arbitrary
    /// selection.
    pub fn gen_conns_data(&self, nodes: &[crate::NodeId]) -> Vec<ConnectionRecord> {
        let mut out = Vec::new();

        for (i, &node_id) in nodes.iter().enumerate() {
            let entry = &self.node_data[node_id];
            for (j, &output_id) in entry.outputs.iter().enumerate() {
                let output = &self.output_ports[output_id];
                for &conn_id in &output.connections {
                    let conn = &self.connections[conn_id];
                    let connected_port = &self.input_ports[conn.inp];
                    let connected_node = connected_port.node;

                    let Some(connected_index) = nodes.iter().position(|&n| n == connected_node) else {
                        continue;
                    };

                    let connected_entry = &self.node_data[connected_node];
                    let input_index = connected_entry
                        .inputs
                        .iter()
                        .position(|&p| p == conn.inp)
                        .expect(crate::INVALID_STATE);

                    out.push(ConnectionRecord {
                        gid: conn.gid,
                        parent_node_index: i,
                        output_port_index: j,
                        connected_node: Some(connected_index),
                        connected_input_port_index: input_index,
                    });
                }
            }
        }

        out
    }

    /// Rebuilds the flow from a previously-serialized record. Algorithm
    /// mode is applied first, then nodes are created, then
    /// init-update-blocked classes are muted for the duration of wiring
    /// connections so that reconnecting a loaded graph doesn't re-fire
    /// their initial updates.
    pub fn load(&mut self, data: &FlowRecord<N::Value>) -> Result<(), LoadError> {
        // Old project files may still spell the mode "data flow"/"exec
        // flow"; translate to the canonical form before handing it to
        // set_algorithm_mode, which only accepts canonical spellings. An
        // unrecognized mode string leaves the flow's current algorithm
        // mode untouched, per set_algorithm_mode's failure contract.
        let canonical = match data.algorithm_mode.as_str() {
            "data flow" => "data",
            "exec flow" => "exec",
            other => other,
        };
        self.set_algorithm_mode(canonical);

        let new_nodes = self.create_nodes_from_data(&data.nodes)?;

        let blocked: Vec<crate::NodeId> = new_nodes
            .iter()
            .copied()
            .filter(|&id| self.node_data[id].block_init_updates)
            .collect();
        for &id in &blocked {
            self.node_data[id].block_updates = true;
        }

        self.connect_nodes_from_data(&new_nodes, &data.connections)?;

        for &id in &blocked {
            self.node_data[id].block_updates = false;
        }

        Ok(())
    }

    fn create_nodes_from_data(
        &mut self,
        nodes_data: &[NodeRecord<N::Value>],
    ) -> Result<Vec<crate::NodeId>, LoadError> {
        let mut nodes = Vec::with_capacity(nodes_data.len());

        for record in nodes_data {
            let class = self.session.node_from_identifier(&record.identifier)?;
            let node = class.construct(Some(record));
            let block_init_updates = class.block_init_updates;
            let id = self.add_node_from_record(node, record, block_init_updates);
            nodes.push(id);
        }

        self.events
            .emit(FlowEvent::NodesCreatedFromData(nodes.clone()));

        Ok(nodes)
    }

    fn connect_nodes_from_data(
        &mut self,
        nodes: &[crate::NodeId],
        data: &[ConnectionRecord],
    ) -> Result<Vec<crate::ConnectionId>, LoadError> {
        let mut connections = Vec::new();

        for record in data {
            let Some(connected_index) = record.connected_node else {
                // Paste fragments reference a node outside the pasted
                // selection; skip rather than fail.
                continue;
            };

            let parent = *nodes
                .get(record.parent_node_index)
                .ok_or(LoadError::NodeIndexOutOfRange(record.parent_node_index))?;
            let connected = *nodes
                .get(connected_index)
                .ok_or(LoadError::NodeIndexOutOfRange(connected_index))?;

            let output_id = *self.node_data[parent]
                .outputs
                .get(record.output_port_index)
                .ok_or(LoadError::OutputPortIndexOutOfRange(record.output_port_index))?;
            let input_id = *self.node_data[connected]
                .inputs
                .get(record.connected_input_port_index)
                .ok_or(LoadError::InputPortIndexOutOfRange(
                    record.connected_input_port_index,
                ))?;

            if let Some(conn) = self.connect_nodes(output_id, input_id) {
                connections.push(conn);
            }
        }

        self.events
            .emit(FlowEvent::ConnectionsCreatedFromData(connections.clone()));

        Ok(connections)
    }
}
