mod common;

use common::Sample;
use flowgraph::reference::NodeIdExt;
use flowgraph::registry::Session;
use flowgraph::{Flow, ScriptId};

fn flow() -> Flow<Sample> {
    Flow::new(Session::new(), ScriptId(0))
}

#[test]
fn data_mode_propagates_on_set_output_val() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(2), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    flow.connect_nodes(a.output(0), b.input(0));

    assert_eq!(flow.algorithm_mode_str(), "data");
    flow.set_output_val(a, 0, 9).unwrap();
    assert_eq!(flow.node(b).unwrap().update_count(), 1);
}

#[test]
fn data_opt_mode_has_same_observable_propagation() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(2), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    flow.connect_nodes(a.output(0), b.input(0));

    assert!(flow.set_algorithm_mode("data opt"));
    assert!(flow.running_with_executor());

    flow.set_output_val(a, 0, 11).unwrap();
    assert_eq!(flow.node(b).unwrap().update_count(), 1);

    // Structural changes invalidate the precomputed cache; a second node
    // connected after the first push must still be reached.
    let c = flow.add_node(Sample::through(), "test.through");
    flow.connect_nodes(a.output(0), c.input(0));
    flow.set_output_val(a, 0, 12).unwrap();
    assert_eq!(flow.node(b).unwrap().update_count(), 2);
    assert_eq!(flow.node(c).unwrap().update_count(), 1);
}

#[test]
fn exec_mode_requires_explicit_exec_output() {
    let mut flow = flow();
    let a = flow.add_node(Sample::exec_relay(), "test.exec_relay");
    let b = flow.add_node(Sample::exec_relay(), "test.exec_relay");
    flow.connect_nodes(a.output(0), b.input(0));

    assert!(flow.set_algorithm_mode("exec"));
    assert_eq!(flow.node(b).unwrap().update_count(), 0);

    flow.exec_output(a, 0).unwrap();
    assert_eq!(flow.node(b).unwrap().update_count(), 1);
}

#[test]
fn legacy_mode_strings_are_rejected_by_set_algorithm_mode_directly() {
    let mut flow = flow();
    assert!(!flow.set_algorithm_mode("exec flow"));
    assert!(!flow.set_algorithm_mode("data flow"));
    assert_eq!(flow.algorithm_mode_str(), "data");

    assert!(!flow.set_algorithm_mode("nonsense"));
    assert_eq!(flow.algorithm_mode_str(), "data");
}
