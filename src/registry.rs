use std::sync::Arc;

use crate::Node;
use crate::data::NodeRecord;
use crate::errors::UnknownNodeIdentifier;

/// Computes a node class's stable `identifier` string:
///
/// `identifier := (prefix + ".")? + (explicit_id or class_name)`
///
/// Called once, at class registration time.
pub fn build_identifier(prefix: Option<&str>, explicit_id: Option<&str>, class_name: &str) -> String {
    let base = explicit_id.unwrap_or(class_name);
    match prefix {
        Some(prefix) => format!("{prefix}.{base}"),
        None => base.to_string(),
    }
}

/// A registered node class: identifier, compatibility aliases, the
/// `block_init_updates` opt-in, and a constructor closure that rebuilds an
/// `N` instance from a persisted [`NodeRecord`].
pub struct NodeClass<N: Node> {
    pub identifier: String,
    pub identifier_compat: Vec<String>,
    pub block_init_updates: bool,
    construct: Arc<dyn Fn(Option<&NodeRecord<N::Value>>) -> N + Send + Sync>,
}

impl<N: Node> NodeClass<N> {
    pub fn new(
        identifier: impl Into<String>,
        construct: impl Fn(Option<&NodeRecord<N::Value>>) -> N + Send + Sync + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            identifier_compat: Vec::new(),
            block_init_updates: false,
            construct: Arc::new(construct),
        }
    }

    /// Like [`Self::new`], but computes `identifier` via [`build_identifier`]
    /// instead of taking a pre-built string: `prefix` namespaces the class,
    /// `explicit_id` overrides `class_name` when the class needs a stable
    /// identifier independent of its Rust type name.
    pub fn new_with_prefix(
        prefix: Option<&str>,
        explicit_id: Option<&str>,
        class_name: &str,
        construct: impl Fn(Option<&NodeRecord<N::Value>>) -> N + Send + Sync + 'static,
    ) -> Self {
        Self::new(build_identifier(prefix, explicit_id, class_name), construct)
    }

    #[must_use]
    pub fn with_compat(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.identifier_compat = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_block_init_updates(mut self, block: bool) -> Self {
        self.block_init_updates = block;
        self
    }

    pub fn construct(&self, record: Option<&NodeRecord<N::Value>>) -> N {
        (self.construct)(record)
    }

    fn matches(&self, identifier: &str) -> bool {
        self.identifier == identifier || self.identifier_compat.iter().any(|alias| alias == identifier)
    }
}

impl<N: Node> std::fmt::Debug for NodeClass<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClass")
            .field("identifier", &self.identifier)
            .field("identifier_compat", &self.identifier_compat)
            .field("block_init_updates", &self.block_init_updates)
            .finish()
    }
}

/// Holds the two lists of registered node classes, visible and invisible.
/// A `node_from_identifier` lookup scans `visible` then `invisible`,
/// matching on `identifier` or any `identifier_compat` alias.
#[derive(Default)]
pub struct Session<N: Node> {
    pub visible: Vec<NodeClass<N>>,
    pub invisible: Vec<NodeClass<N>>,
}

impl<N: Node> Session<N> {
    pub fn new() -> Self {
        Self {
            visible: Vec::new(),
            invisible: Vec::new(),
        }
    }

    pub fn node_from_identifier(&self, identifier: &str) -> Result<&NodeClass<N>, UnknownNodeIdentifier> {
        self.visible
            .iter()
            .chain(self.invisible.iter())
            .find(|class| class.matches(identifier))
            .ok_or_else(|| UnknownNodeIdentifier(identifier.to_string()))
    }
}

impl<N: Node> std::fmt::Debug for Session<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("visible", &self.visible)
            .field("invisible", &self.invisible)
            .finish()
    }
}
