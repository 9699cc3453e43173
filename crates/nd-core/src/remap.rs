//! Old-id → new-id tables for additive import and paste.
//!
//! Nodes and groups get fresh identities from an [`IdGenerator`]. Ports are
//! never looked up in a table: their new id is re-derived from the new node
//! id and the port name, which is why port ids must always be
//! `{nodeId}-{name}`.

use crate::id::{Id, IdGenerator};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct IdRemap {
    nodes: HashMap<Id, Id>,
    groups: HashMap<Id, Id>,
}

impl IdRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and mint its replacement.
    pub fn map_node(&mut self, old: Id, ids: &mut dyn IdGenerator) -> Id {
        *self.nodes.entry(old).or_insert_with(|| ids.next_id())
    }

    /// Register a group and mint its replacement.
    pub fn map_group(&mut self, old: Id, ids: &mut dyn IdGenerator) -> Id {
        *self.groups.entry(old).or_insert_with(|| ids.next_id())
    }

    pub fn node(&self, old: Id) -> Option<Id> {
        self.nodes.get(&old).copied()
    }

    pub fn group(&self, old: Id) -> Option<Id> {
        self.groups.get(&old).copied()
    }

    pub fn has_node(&self, old: Id) -> bool {
        self.nodes.contains_key(&old)
    }

    /// Re-derive a connection endpoint port id against the new owner.
    ///
    /// `name` is the port's name when the caller could find the port record;
    /// otherwise the name is recovered by stripping the old node prefix.
    pub fn port(&self, old_node: Id, old_port: Id, name: Option<&str>) -> Option<Id> {
        let new_node = self.node(old_node)?;
        let name = name.or_else(|| old_port.port_name(old_node))?;
        Some(Id::port(new_node, name))
    }
}
