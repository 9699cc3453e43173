//! Scene graph manager.
//!
//! `SceneGraph` is the sole owner of the node, group and connection
//! collections. Collection order is draw order (later = on top). Every
//! mutation that touches group membership goes through here so the two
//! sides of the parent/child relation never disagree:
//!
//! - a child's `parent` names group G **iff** G's `children` lists it;
//! - the group containment relation is acyclic.

use crate::geometry::{self, Anchor};
use crate::id::Id;
use crate::model::*;
use indexmap::IndexMap;
use kurbo::{Point, Rect};

pub const DEFAULT_TITLE: &str = "ネットワーク構成図";

/// Outcome of [`SceneGraph::set_parent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reparent {
    /// The child already had that parent; membership was re-asserted.
    Unchanged,
    /// The child now belongs to the new parent (or to the root).
    Moved,
    /// The move would create a containment cycle or named a missing entity.
    /// Nothing was mutated.
    Rejected,
}

/// The complete diagram: three id-keyed collections plus the title.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub title: String,
    pub nodes: IndexMap<Id, Node>,
    pub groups: IndexMap<Id, Group>,
    pub connections: IndexMap<Id, Connection>,
    /// Monotonic counter behind element ids (`{nodeId}-e{n}`).
    element_seq: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a new empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            nodes: IndexMap::new(),
            groups: IndexMap::new(),
            connections: IndexMap::new(),
            element_seq: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty() && self.connections.is_empty()
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: Id) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn group(&self, id: Id) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: Id) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    pub fn connection(&self, id: Id) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connection_mut(&mut self, id: Id) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Stored parent of a node or group.
    pub fn parent_of(&self, entity: EntityRef) -> Option<Id> {
        match entity {
            EntityRef::Node(id) => self.node(id).and_then(|n| n.parent),
            EntityRef::Group(id) => self.group(id).and_then(|g| g.parent),
        }
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Node(id) => self.nodes.contains_key(&id),
            EntityRef::Group(id) => self.groups.contains_key(&id),
        }
    }

    pub fn bounds_of(&self, entity: EntityRef) -> Option<Rect> {
        match entity {
            EntityRef::Node(id) => self.node(id).map(Node::bounds),
            EntityRef::Group(id) => self.group(id).map(Group::bounds),
        }
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Insert a node. A `parent` naming a live group is registered in that
    /// group's children; any other parent is cleared.
    pub fn add_node(&mut self, mut node: Node) -> Id {
        let id = node.id;
        node.update_height();
        let parent = node.parent.take();
        self.nodes.insert(id, node);
        if let Some(parent) = parent {
            self.attach(EntityRef::Node(id), parent);
        }
        id
    }

    /// Insert a group, registering it with its parent as for nodes.
    /// Children listed on the incoming group are kept as-is.
    pub fn add_group(&mut self, mut group: Group) -> Id {
        let id = group.id;
        let parent = group.parent.take();
        self.groups.insert(id, group);
        if let Some(parent) = parent {
            self.attach(EntityRef::Group(id), parent);
        }
        id
    }

    pub fn add_connection(&mut self, conn: Connection) -> Id {
        let id = conn.id;
        self.connections.insert(id, conn);
        id
    }

    /// Link two ports. No duplicate or type validation; only self-links
    /// (both ends on one node) are refused.
    pub fn connect(&mut self, id: Id, from: Endpoint, to: Endpoint) -> Option<Id> {
        if from.node == to.node {
            return None;
        }
        log::debug!("connect {}:{} -> {}:{}", from.node, from.port, to.node, to.port);
        Some(self.add_connection(Connection::new(id, from, to)))
    }

    /// Append `child` to `parent` and point the child at it. Silently skips
    /// a missing parent (the child stays at root).
    fn attach(&mut self, child: EntityRef, parent: Id) {
        let Some(group) = self.groups.get_mut(&parent) else {
            log::warn!("parent group {parent} not found; {:?} stays at root", child);
            return;
        };
        group.push_child(child);
        self.set_parent_field(child, Some(parent));
    }

    fn set_parent_field(&mut self, child: EntityRef, parent: Option<Id>) {
        match child {
            EntityRef::Node(id) => {
                if let Some(n) = self.nodes.get_mut(&id) {
                    n.parent = parent;
                }
            }
            EntityRef::Group(id) => {
                if let Some(g) = self.groups.get_mut(&id) {
                    g.parent = parent;
                }
            }
        }
    }

    // ─── Removal ─────────────────────────────────────────────────────────

    /// Remove a node, its membership entry, and every connection that
    /// touches it.
    pub fn remove_node(&mut self, id: Id) -> Option<Node> {
        let node = self.nodes.shift_remove(&id)?;
        if let Some(parent) = node.parent
            && let Some(g) = self.groups.get_mut(&parent)
        {
            g.remove_child(EntityRef::Node(id));
        }
        let before = self.connections.len();
        self.connections.retain(|_, c| !c.touches(id));
        log::debug!(
            "removed node {id} and {} connection(s)",
            before - self.connections.len()
        );
        Some(node)
    }

    /// Remove a group without touching its members. Direct children are
    /// moved to the root so no parent pointer dangles.
    pub fn remove_group(&mut self, id: Id) -> Option<Group> {
        let group = self.groups.shift_remove(&id)?;
        if let Some(parent) = group.parent
            && let Some(g) = self.groups.get_mut(&parent)
        {
            g.remove_child(EntityRef::Group(id));
        }
        for child in &group.children {
            if self.parent_of(*child) == Some(id) {
                self.set_parent_field(*child, None);
            }
        }
        log::debug!("removed group {id}; {} child(ren) moved to root", group.children.len());
        Some(group)
    }

    pub fn remove_connection(&mut self, id: Id) -> Option<Connection> {
        self.connections.shift_remove(&id)
    }

    /// Drop everything, keeping the element counter monotonic.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.groups.clear();
        self.connections.clear();
    }

    // ─── Hierarchy ───────────────────────────────────────────────────────

    /// Number of ancestor hops from `group` to the root.
    ///
    /// Stops at a missing parent; a corrupted cyclic chain is cut off after
    /// visiting every group once.
    pub fn container_depth(&self, group: Id) -> usize {
        self.ancestors(group).count()
    }

    /// Parent chain of a group, nearest first.
    pub fn ancestors(&self, group: Id) -> impl Iterator<Item = Id> + '_ {
        let limit = self.groups.len();
        let mut current = self.group(group).and_then(|g| g.parent);
        std::iter::from_fn(move || {
            let id = current?;
            let g = self.group(id)?;
            current = g.parent;
            Some(id)
        })
        .take(limit)
    }

    /// True if `ancestor` is `group` itself or appears on its parent chain.
    pub fn is_self_or_descendant(&self, group: Id, ancestor: Id) -> bool {
        group == ancestor || self.ancestors(group).any(|a| a == ancestor)
    }

    /// Move `child` under `new_parent` (or to the root when `None`).
    ///
    /// Rejected without mutation when the child is a group and `new_parent`
    /// is that group or one of its descendants, or when either side is
    /// missing.
    pub fn set_parent(&mut self, child: EntityRef, new_parent: Option<Id>) -> Reparent {
        if !self.contains(child) {
            return Reparent::Rejected;
        }
        if let Some(p) = new_parent {
            if !self.groups.contains_key(&p) {
                log::debug!("reparent {child:?}: target group {p} missing");
                return Reparent::Rejected;
            }
            if let EntityRef::Group(g) = child
                && self.is_self_or_descendant(p, g)
            {
                log::debug!("reparent {child:?} under {p} rejected: containment cycle");
                return Reparent::Rejected;
            }
        }

        let old_parent = self.parent_of(child);
        if old_parent == new_parent {
            if let Some(p) = new_parent
                && let Some(g) = self.groups.get_mut(&p)
            {
                g.push_child(child);
            }
            return Reparent::Unchanged;
        }

        // Stale membership anywhere else goes too.
        for g in self.groups.values_mut() {
            g.remove_child(child);
        }
        self.set_parent_field(child, None);
        if let Some(p) = new_parent {
            self.attach(child, p);
        }
        log::debug!("reparent {child:?}: {old_parent:?} -> {new_parent:?}");
        Reparent::Moved
    }

    /// The group at `point` with the most ancestors. Among equal depths the
    /// one latest in draw order wins.
    ///
    /// When `exclude` names a group, that group and its whole subtree are
    /// skipped so a dragged group never lands inside itself.
    pub fn deepest_container_at(&self, point: Point, exclude: Option<EntityRef>) -> Option<Id> {
        let excluded = |id: Id| match exclude {
            Some(EntityRef::Group(g)) => self.is_self_or_descendant(id, g),
            _ => false,
        };
        let mut best: Option<(Id, usize)> = None;
        for group in self.groups.values().rev() {
            if !group.contains_point(point) || excluded(group.id) {
                continue;
            }
            let depth = self.container_depth(group.id);
            if best.is_none_or(|(_, d)| depth > d) {
                best = Some((group.id, depth));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Every node and group below `group`, depth first. Only children whose
    /// stored parent agrees with the membership entry are followed.
    pub fn descendants(&self, group: Id) -> Vec<EntityRef> {
        let mut out = Vec::new();
        let mut stack = vec![group];
        while let Some(gid) = stack.pop() {
            let Some(g) = self.group(gid) else { continue };
            for child in &g.children {
                if self.parent_of(*child) != Some(gid) || out.contains(child) {
                    continue;
                }
                out.push(*child);
                if let EntityRef::Group(sub) = child {
                    stack.push(*sub);
                }
            }
        }
        out
    }

    // ─── Movement ────────────────────────────────────────────────────────

    pub fn translate_node(&mut self, id: Id, dx: f64, dy: f64) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.translate(dx, dy);
        }
    }

    /// Move a group together with everything it contains.
    pub fn translate_group(&mut self, id: Id, dx: f64, dy: f64) {
        if let Some(g) = self.groups.get_mut(&id) {
            g.translate(dx, dy);
            self.translate_subtree(id, dx, dy);
        }
    }

    /// Move the members of `group` (not the group itself), recursing into
    /// nested groups. Entries whose stored parent is not `group` are stale
    /// and skipped.
    pub fn translate_subtree(&mut self, group: Id, dx: f64, dy: f64) {
        for child in self.descendants(group) {
            match child {
                EntityRef::Node(id) => self.translate_node(id, dx, dy),
                EntityRef::Group(id) => {
                    if let Some(g) = self.groups.get_mut(&id) {
                        g.translate(dx, dy);
                    }
                }
            }
        }
    }

    /// Fit a group around its direct children plus [`GROUP_PADDING`].
    /// Returns false (and changes nothing) when it has no live children.
    pub fn auto_resize_group(&mut self, id: Id) -> bool {
        let Some(group) = self.group(id) else {
            return false;
        };
        let fitted = group
            .children
            .iter()
            .filter_map(|c| self.bounds_of(*c))
            .reduce(|a, b| a.union(b));
        let (Some(fitted), Some(group)) = (fitted, self.groups.get_mut(&id)) else {
            return false;
        };
        let padded = fitted.inflate(GROUP_PADDING, GROUP_PADDING);
        group.x = padded.x0;
        group.y = padded.y0;
        group.width = padded.width();
        group.height = padded.height();
        true
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Resolve both ends of a connection. `None` when either node or port is
    /// gone; such connections are inert.
    pub fn connection_anchors(&self, conn: &Connection) -> Option<(Anchor, Anchor)> {
        let from = geometry::port_position(self.node(conn.from.node)?, conn.from.port)?;
        let to = geometry::port_position(self.node(conn.to.node)?, conn.to.port)?;
        Some((from, to))
    }

    /// Label position of a connection (curve midpoint).
    pub fn connection_label_position(&self, conn: &Connection) -> Option<Point> {
        self.connection_anchors(conn)
            .map(|(from, to)| geometry::curve_midpoint(from, to))
    }

    // ─── Elements & ports ────────────────────────────────────────────────

    /// Mint the next element id for `node`, skipping any sequence number a
    /// loaded document already used on that node.
    pub fn next_element_id(&mut self, node: Id) -> Id {
        loop {
            self.element_seq += 1;
            let id = Id::element(node, self.element_seq);
            let taken = self
                .node(node)
                .is_some_and(|n| n.elements.iter().any(|e| e.id == id));
            if !taken {
                return id;
            }
        }
    }

    pub fn add_element(&mut self, node: Id, name: Option<&str>) -> Option<Id> {
        if !self.nodes.contains_key(&node) {
            return None;
        }
        let id = self.next_element_id(node);
        self.nodes.get_mut(&node).map(|n| n.add_element(id, name))
    }

    pub(crate) fn element_seq(&self) -> u64 {
        self.element_seq
    }

    pub(crate) fn restore_element_seq(&mut self, seq: u64) {
        self.element_seq = self.element_seq.max(seq);
    }

    pub fn add_port(&mut self, node: Id, side: Side) -> Option<Id> {
        self.nodes.get_mut(&node).map(|n| n.add_port(side))
    }

    /// Rename a port. Its id is re-derived from the new name and every
    /// connection end that used the old id follows along. A name already
    /// used by another port on the node is rejected.
    pub fn rename_port(&mut self, node: Id, side: Side, index: usize, name: &str) -> Option<Id> {
        let n = self.nodes.get_mut(&node)?;
        let old = n.ports(side).get(index)?.id;
        let new = Id::port(node, name);
        if new != old && n.port(new).is_some() {
            log::debug!("port name {name:?} already taken on {node}");
            return None;
        }
        let port = n.ports_mut(side).get_mut(index)?;
        port.name = name.to_string();
        port.id = new;
        for conn in self.connections.values_mut() {
            for end in [&mut conn.from, &mut conn.to] {
                if end.node == node && end.port == old {
                    end.port = new;
                }
            }
        }
        Some(new)
    }

    // ─── Attribute contract ──────────────────────────────────────────────

    pub fn set_node_attr(&mut self, id: Id, attr: NodeAttr) -> bool {
        self.node_mut(id).map(|n| attr.apply(n)).is_some()
    }

    pub fn set_group_attr(&mut self, id: Id, attr: GroupAttr) -> bool {
        self.group_mut(id).map(|g| attr.apply(g)).is_some()
    }

    pub fn set_connection_attr(&mut self, id: Id, attr: ConnectionAttr) -> bool {
        self.connection_mut(id).map(|c| attr.apply(c)).is_some()
    }

    pub fn set_element_attr(&mut self, node: Id, index: usize, attr: ElementAttr) -> bool {
        self.node_mut(node)
            .and_then(|n| n.elements.get_mut(index))
            .map(|e| attr.apply(e))
            .is_some()
    }

    pub fn set_port_attr(&mut self, node: Id, side: Side, index: usize, attr: PortAttr) -> bool {
        self.node_mut(node)
            .and_then(|n| n.ports_mut(side).get_mut(index))
            .map(|p| attr.apply(p))
            .is_some()
    }
}
