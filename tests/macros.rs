mod common;

use common::Sample;
use flowgraph::reference::NodeIdExt;
use flowgraph::registry::Session;
use flowgraph::{connect, connect_all, Flow, ScriptId};

fn flow() -> Flow<Sample> {
    Flow::new(Session::new(), ScriptId(0))
}

#[test]
fn connect_macro_wires_each_pair() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(1), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    let c = flow.add_node(Sample::through(), "test.through");

    connect! { flow;
        a.output(0) => b.input(0);
        a.output(0) => c.input(0);
    }

    assert_eq!(flow.connections().len(), 2);
    assert_eq!(flow.successors(a).len(), 2);
}

#[test]
fn connect_all_macro_chains_ports() {
    let mut flow = flow();
    let a = flow.add_node(Sample::Source(1), "test.source");
    let b = flow.add_node(Sample::through(), "test.through");
    let c = flow.add_node(Sample::through(), "test.through");

    connect_all! { flow;
        a.output(0) => b.input(0) => b.output(0) => c.input(0);
    }

    assert_eq!(flow.connections().len(), 2);
    assert_eq!(flow.successors(a), &[b]);
    assert_eq!(flow.successors(b), &[c]);
}
