mod common;

use common::Sample;
use flowgraph::errors::FlowError;
use flowgraph::reference::NodeIdExt;
use flowgraph::registry::Session;
use flowgraph::{Flow, ScriptId};

fn flow() -> Flow<Sample> {
    Flow::new(Session::new(), ScriptId(0))
}

#[test]
fn remove_node_requires_disconnection_first() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(3), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    flow.connect_nodes(a.output(0), b.input(0));

    assert!(matches!(flow.remove_node(a), Err(FlowError::NodeStillConnected(id)) if id == a));

    flow.connect_nodes(a.output(0), b.input(0));
    assert!(flow.remove_node(a).is_ok());
    assert!(flow.node(a).is_none());
    assert!(flow.successors(b).is_empty());
}

#[test]
fn remove_unknown_node_fails() {
    let mut flow = flow();
    let node = flow.add_node(Sample::Source(1), "test.source");
    flow.remove_node(node).unwrap();

    assert!(matches!(flow.remove_node(node), Err(FlowError::UnknownNode(id)) if id == node));
}

#[test]
fn rename_ports() {
    let mut flow = flow();
    let node = flow.add_node(Sample::through(), "test.through");
    let input = flow.input_port_at(node, 0).unwrap();
    let output = flow.output_port_at(node, 0).unwrap();

    flow.rename_input(input, "value");
    flow.rename_output(output, "result");

    assert_eq!(flow.input_port(input).unwrap().label, "value");
    assert_eq!(flow.output_port(output).unwrap().label, "result");
    assert_eq!(flow.input_port_named(node, "value"), Some(input));
    assert_eq!(flow.output_port_named(node, "result"), Some(output));
}

#[test]
fn deleting_a_port_breaks_its_connections() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(5), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    flow.connect_nodes(a.output(0), b.input(0));
    assert_eq!(flow.connections().len(), 1);

    let input = flow.input_port_at(b, 0).unwrap();
    flow.delete_input(input);

    assert_eq!(flow.connections().len(), 0);
    assert!(flow.node_inputs(b).is_empty());
}

#[test]
fn node_is_active_reflects_presence_of_an_exec_port() {
    let mut flow = flow();
    let pure_data = flow.add_node(Sample::through(), "test.through");
    let mixed = flow.add_node(Sample::exec_relay(), "test.exec_relay");

    assert!(!flow.node_is_active(pure_data));
    assert!(flow.node_is_active(mixed));
}
