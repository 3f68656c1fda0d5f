//! A tiny data-flow graph: two constants feed a multiply node, which feeds
//! a print node. Kept here as a runnable reference rather than under
//! `[[example]]`, since `cargo`'s own `examples/` directory name is taken
//! by the retrieval pack this crate was built against.

use flowgraph::reference::NodeIdExt;
use flowgraph::registry::Session;
use flowgraph::{Flow, InitialPorts, Node, PortKind, ScriptId, UpdateContext};

#[derive(Debug, Clone, Copy)]
enum MyNode {
    Constant(f64),
    Multiply,
    Print,
}

impl Node for MyNode {
    type Value = f64;

    fn initial_ports(&self) -> InitialPorts<f64> {
        match self {
            Self::Constant(_) => InitialPorts {
                inputs: vec![],
                outputs: vec![("value", PortKind::Data)],
            },
            Self::Multiply => InitialPorts {
                inputs: vec![("a", PortKind::Data, None), ("b", PortKind::Data, None)],
                outputs: vec![("result", PortKind::Data)],
            },
            Self::Print => InitialPorts {
                inputs: vec![("value", PortKind::Data, None)],
                outputs: vec![],
            },
        }
    }

    fn update_event(&mut self, ctx: &mut UpdateContext<'_, Self>, _input: Option<usize>) {
        match self {
            Self::Constant(value) => {
                ctx.set_output_val(0, *value).unwrap();
            }
            Self::Multiply => {
                let a = ctx.input(0).unwrap();
                let b = ctx.input(1).unwrap();
                ctx.set_output_val(0, a * b).unwrap();
            }
            Self::Print => {
                println!("{}", ctx.input(0).unwrap());
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let session: Session<MyNode> = Session::new();
    let mut flow = Flow::new(session, ScriptId(0));

    let constant_1 = flow.add_node(MyNode::Constant(5.0), "demo.constant");
    let constant_2 = flow.add_node(MyNode::Constant(7.0), "demo.constant");
    let multiply = flow.add_node(MyNode::Multiply, "demo.multiply");
    let print = flow.add_node(MyNode::Print, "demo.print");

    flow.connect_nodes(constant_1.output(0), multiply.input("a"));
    flow.connect_nodes(constant_2.output(0), multiply.input("b"));
    flow.connect_nodes(multiply.output(0), print.input(0));

    flow.update(constant_1, None);
    flow.update(constant_2, None);
}
