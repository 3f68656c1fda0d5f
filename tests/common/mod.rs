#![allow(dead_code)]

use flowgraph::{InitialPorts, Node, PortKind, UpdateContext};

/// A small fixture node covering the shapes the tests need: a constant data
/// source, a pass-through data node that tallies activations, and an exec
/// relay with one exec input/output and one data input.
#[derive(Debug, Clone)]
pub enum Sample {
    Source(i64),
    Through { update_count: u32 },
    ExecRelay { update_count: u32 },
}

impl Sample {
    pub const fn through() -> Self {
        Self::Through { update_count: 0 }
    }

    pub const fn exec_relay() -> Self {
        Self::ExecRelay { update_count: 0 }
    }

    pub fn update_count(&self) -> u32 {
        match self {
            Self::Through { update_count } | Self::ExecRelay { update_count } => *update_count,
            Self::Source(_) => 0,
        }
    }
}

impl Node for Sample {
    type Value = i64;

    fn initial_ports(&self) -> InitialPorts<i64> {
        match self {
            Self::Source(_) => InitialPorts {
                inputs: vec![],
                outputs: vec![("out", PortKind::Data)],
            },
            Self::Through { .. } => InitialPorts {
                inputs: vec![("in", PortKind::Data, Some(0))],
                outputs: vec![("out", PortKind::Data)],
            },
            Self::ExecRelay { .. } => InitialPorts {
                inputs: vec![("in", PortKind::Exec, None), ("data", PortKind::Data, Some(0))],
                outputs: vec![("out", PortKind::Exec)],
            },
        }
    }

    fn update_event(&mut self, ctx: &mut UpdateContext<'_, Self>, _input: Option<usize>) {
        match self {
            Self::Source(value) => {
                let value = *value;
                ctx.set_output_val(0, value).unwrap();
            }
            Self::Through { update_count } => {
                *update_count += 1;
                let value = ctx.input(0).unwrap();
                ctx.set_output_val(0, value).unwrap();
            }
            Self::ExecRelay { update_count } => {
                *update_count += 1;
                ctx.exec_output(0).unwrap();
            }
        }
    }

    fn get_state(&self) -> serde_json::Value {
        match self {
            Self::Source(value) => serde_json::json!({ "value": value }),
            _ => serde_json::Value::Null,
        }
    }

    fn set_state(&mut self, data: serde_json::Value, _version: Option<&str>) {
        if let Self::Source(value) = self {
            if let Some(v) = data.get("value").and_then(serde_json::Value::as_i64) {
                *value = v;
            }
        }
    }
}
