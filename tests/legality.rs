mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::Sample;
use flowgraph::events::FlowEvent;
use flowgraph::reference::NodeIdExt;
use flowgraph::registry::Session;
use flowgraph::{Flow, ScriptId};

fn flow() -> Flow<Sample> {
    Flow::new(Session::new(), ScriptId(0))
}

#[test]
fn toggle_legality() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(1), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");

    let conn = flow.connect_nodes(a.output(0), b.input(0));
    assert!(conn.is_some());
    assert_eq!(flow.connections().len(), 1);
    assert_eq!(flow.successors(a), &[b]);

    let conn = flow.connect_nodes(a.output(0), b.input(0));
    assert!(conn.is_none());
    assert_eq!(flow.connections().len(), 0);
    assert!(flow.successors(a).is_empty());
}

#[test]
fn type_mismatch_is_rejected() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(1), "test.source");
    let b = flow.add_node(Sample::exec_relay(), "test.exec_relay");

    assert!(!flow.check_connection_validity(a.output(0), b.input(0)));
    assert!(flow.connect_nodes(a.output(0), b.input(0)).is_none());
    assert_eq!(flow.connections().len(), 0);
}

#[test]
fn same_node_rejection() {
    let mut flow = flow();
    let n = flow.add_node(Sample::through(), "test.through");

    assert!(flow.connect_nodes(n.output(0), n.input(0)).is_none());
    assert_eq!(flow.connections().len(), 0);
}

#[test]
fn connect_nodes_emits_connection_request_valid() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(1), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    let c = flow.add_node(Sample::exec_relay(), "test.exec_relay");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&seen);
    flow.on_event(move |event| {
        if let FlowEvent::ConnectionRequestValid(valid) = *event {
            recorder.borrow_mut().push(valid);
        }
    });

    // A legal pair fires `ConnectionRequestValid(true)`.
    assert!(flow.connect_nodes(a.output(0), b.input(0)).is_some());
    assert_eq!(*seen.borrow(), vec![true]);

    // A type-mismatched pair fires `ConnectionRequestValid(false)`.
    assert!(flow.connect_nodes(a.output(0), c.input(0)).is_none());
    assert_eq!(*seen.borrow(), vec![true, false]);
}
