//! Multi-select model.
//!
//! Nodes and groups are tracked in two independent sets; one member of
//! either set is the *primary* selection shown in the property panel. A
//! selected connection is exclusive with both sets.

use indexmap::IndexSet;
use nd_core::{EntityRef, Id, SceneGraph};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    nodes: IndexSet<Id>,
    groups: IndexSet<Id>,
    connection: Option<Id>,
    primary: Option<EntityRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn nodes(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.iter().copied()
    }

    pub fn groups(&self) -> impl Iterator<Item = Id> + '_ {
        self.groups.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn connection(&self) -> Option<Id> {
        self.connection
    }

    pub fn primary(&self) -> Option<EntityRef> {
        self.primary
    }

    pub fn primary_node(&self) -> Option<Id> {
        match self.primary {
            Some(EntityRef::Node(id)) => Some(id),
            _ => None,
        }
    }

    pub fn primary_group(&self) -> Option<Id> {
        match self.primary {
            Some(EntityRef::Group(id)) => Some(id),
            _ => None,
        }
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Node(id) => self.nodes.contains(&id),
            EntityRef::Group(id) => self.groups.contains(&id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty() && self.connection.is_none()
    }

    fn set_mut(&mut self, entity: EntityRef) -> &mut IndexSet<Id> {
        match entity {
            EntityRef::Node(_) => &mut self.nodes,
            EntityRef::Group(_) => &mut self.groups,
        }
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Apply a pointer click on `target`.
    ///
    /// - plain click on an unselected target: select only it;
    /// - plain click on a selected target: keep the set, make it primary;
    /// - additive click: toggle membership in its kind's set.
    pub fn click(&mut self, target: EntityRef, additive: bool) {
        self.connection = None;
        if additive {
            if self.contains(target) {
                self.set_mut(target).shift_remove(&target.id());
                if self.primary == Some(target) {
                    self.primary = self.last_member();
                }
            } else {
                self.set_mut(target).insert(target.id());
                self.primary = Some(target);
            }
            return;
        }
        if !self.contains(target) {
            self.nodes.clear();
            self.groups.clear();
            self.set_mut(target).insert(target.id());
        }
        self.primary = Some(target);
    }

    /// Most recently added member, preferring nodes.
    fn last_member(&self) -> Option<EntityRef> {
        self.nodes
            .last()
            .map(|&id| EntityRef::Node(id))
            .or_else(|| self.groups.last().map(|&id| EntityRef::Group(id)))
    }

    /// Select a single connection, dropping node and group selections.
    pub fn select_connection(&mut self, id: Id) {
        self.nodes.clear();
        self.groups.clear();
        self.primary = None;
        self.connection = Some(id);
    }

    /// Add entities without removing any (area select, paste).
    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Id>, groups: impl IntoIterator<Item = Id>) {
        self.connection = None;
        self.nodes.extend(nodes);
        self.groups.extend(groups);
        if self.primary.is_none() {
            self.primary = self
                .nodes
                .first()
                .map(|&id| EntityRef::Node(id))
                .or_else(|| self.groups.first().map(|&id| EntityRef::Group(id)));
        }
    }

    /// Replace the selection with exactly these entities. The first node
    /// (or, failing that, the first group) becomes primary.
    pub fn replace(&mut self, nodes: impl IntoIterator<Item = Id>, groups: impl IntoIterator<Item = Id>) {
        self.clear();
        self.extend(nodes, groups);
    }

    pub fn select_all(&mut self, scene: &SceneGraph) {
        self.replace(scene.nodes.keys().copied(), scene.groups.keys().copied());
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Forget ids that no longer exist in the scene (after delete, undo,
    /// load).
    pub fn retain_live(&mut self, scene: &SceneGraph) {
        self.nodes.retain(|id| scene.nodes.contains_key(id));
        self.groups.retain(|id| scene.groups.contains_key(id));
        if self.connection.is_some_and(|id| !scene.connections.contains_key(&id)) {
            self.connection = None;
        }
        if self.primary.is_some_and(|p| !self.contains(p)) {
            self.primary = self.last_member();
        }
    }
}
