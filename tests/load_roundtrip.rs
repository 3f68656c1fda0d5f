mod common;

use common::Sample;
use flowgraph::data::FlowRecord;
use flowgraph::reference::NodeIdExt;
use flowgraph::registry::{NodeClass, Session};
use flowgraph::{Flow, ScriptId};

fn session_with_through_blocked() -> Session<Sample> {
    let mut session = Session::new();
    session.visible.push(
        NodeClass::new("test.through", |_| Sample::through()).with_block_init_updates(true),
    );
    session.visible.push(NodeClass::new("test.source", |record| {
        let value = record
            .and_then(|r| r.state_data.get("value").and_then(serde_json::Value::as_i64))
            .unwrap_or(0);
        Sample::Source(value)
    }));
    session
}

#[test]
fn load_suppresses_init_updates() {
    let mut source_flow = Flow::new(session_with_through_blocked(), ScriptId(0));
    let a = source_flow.add_node(Sample::through(), "test.through");
    let b = source_flow.add_node(Sample::through(), "test.through");
    source_flow.connect_nodes(a.output(0), b.input(0));

    let record = source_flow.data();

    let mut loaded = Flow::new(session_with_through_blocked(), ScriptId(0));
    loaded.load(&record).unwrap();

    for &node in loaded.nodes() {
        assert_eq!(loaded.node(node).unwrap().update_count(), 0);
    }

    let first = loaded.nodes()[0];
    loaded.update(first, None);
    assert_eq!(loaded.node(first).unwrap().update_count(), 1);
}

#[test]
fn round_trip_preserves_structure() {
    let mut original = Flow::new(session_with_through_blocked(), ScriptId(0));
    let a = original.add_node(Sample::Source(5), "test.source");
    let b = original.add_node(Sample::through(), "test.through");
    let c = original.add_node(Sample::through(), "test.through");
    original.connect_nodes(a.output(0), b.input(0));
    original.connect_nodes(b.output(0), c.input(0));

    let first_record = original.data();

    let mut restored = Flow::new(session_with_through_blocked(), ScriptId(0));
    restored.load(&first_record).unwrap();
    let second_record = restored.data();

    assert_eq!(first_record.nodes.len(), second_record.nodes.len());
    assert_eq!(first_record.connections.len(), second_record.connections.len());
    for (left, right) in first_record.nodes.iter().zip(&second_record.nodes) {
        assert_eq!(left.identifier, right.identifier);
        assert_eq!(left.inputs.len(), right.inputs.len());
        assert_eq!(left.outputs.len(), right.outputs.len());
    }

    // gen_conns_data on a sublist keeps connections within it and omits
    // the one reaching the node outside the sublist (b -> c).
    let nodes = original.nodes().to_vec();
    let sublist = vec![nodes[0], nodes[1]];
    let partial = original.gen_conns_data(&sublist);
    assert_eq!(partial.len(), 1);
}

#[test]
fn load_translates_legacy_mode_spellings_to_canonical_form() {
    let mut flow = Flow::new(session_with_through_blocked(), ScriptId(0));
    let record = FlowRecord {
        algorithm_mode: "exec flow".to_string(),
        nodes: Vec::new(),
        connections: Vec::new(),
        gid: 0,
    };

    flow.load(&record).unwrap();
    assert_eq!(flow.algorithm_mode_str(), "exec");

    let record = FlowRecord {
        algorithm_mode: "data flow".to_string(),
        nodes: Vec::new(),
        connections: Vec::new(),
        gid: 0,
    };
    flow.load(&record).unwrap();
    assert_eq!(flow.algorithm_mode_str(), "data");
}
