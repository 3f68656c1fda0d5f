//! The pluggable execution algorithm.
//!
//! `Data` and `Exec` are direct-dispatch: `Flow`'s activation methods
//! interpret them inline, without any extra state. `DataOpt` is the one
//! mode with actual executor state — a cache, keyed by output port, of the
//! `(downstream node, downstream input index)` pairs a push would need to
//! visit. It is rebuilt lazily whenever the flow's structure changed since
//! the cache was last read.

use slotmap::SecondaryMap;

use crate::{NodeId, OutputPortId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmMode {
    Data,
    Exec,
    DataOpt,
}

impl AlgorithmMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Exec => "exec",
            Self::DataOpt => "data opt",
        }
    }

    /// Accepts only the three canonical spellings. Legacy `"data flow"` /
    /// `"exec flow"` project-file spellings are translated to their
    /// canonical form by `Flow::load` before this is ever called; calling
    /// `Flow::set_algorithm_mode` directly with a legacy spelling is
    /// rejected like any other unrecognized string.
    pub fn from_str(mode: &str) -> Option<Self> {
        match mode {
            "data" => Some(Self::Data),
            "data opt" => Some(Self::DataOpt),
            "exec" => Some(Self::Exec),
            _ => None,
        }
    }
}

/// Precomputed push targets for `DataOpt`, amortizing the per-event cost of
/// resolving a connection's input port down to `(owning node, input index)`.
#[derive(Debug, Default)]
pub struct DataOptCache {
    pub(crate) dirty: bool,
    pub(crate) targets: SecondaryMap<OutputPortId, Vec<(NodeId, usize)>>,
}

impl DataOptCache {
    pub fn fresh() -> Self {
        Self {
            dirty: true,
            targets: SecondaryMap::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
