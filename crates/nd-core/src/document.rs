//! The persisted document: export, full load and additive import.
//!
//! The JSON shape is the one external contract of the editor; keys are
//! camelCase and group children are a plain id list. Records here are the
//! wire form; [`SceneGraph`] is the live form. Conversion happens only at
//! this boundary.
//!
//! - **Load** replaces the scene wholesale and trusts ids.
//! - **Import** (and clipboard paste) adds a copy with fresh ids, remapping
//!   parent links and connection endpoints through an [`IdRemap`].

use crate::error::{DocumentError, Result};
use crate::id::{Id, IdGenerator};
use crate::lint::lint_document;
use crate::model::*;
use crate::remap::IdRemap;
use crate::scene::SceneGraph;
use kurbo::Vec2;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// ─── Field defaults ──────────────────────────────────────────────────────

/// `null` or absent arrays read as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Empty, `null` or mistyped strings fall back to `default`.
fn or_fallback<'de, D: Deserializer<'de>>(
    deserializer: D,
    default: &str,
) -> std::result::Result<String, D::Error> {
    let value: String = lenient(deserializer)?;
    Ok(if value.is_empty() { default.to_string() } else { value })
}

fn classification<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    or_fallback(d, DEFAULT_CLASSIFICATION)
}

fn background<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    or_fallback(d, DEFAULT_GROUP_BACKGROUND)
}

fn connection_color<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    or_fallback(d, DEFAULT_CONNECTION_COLOR)
}

fn default_node_width() -> f64 {
    DEFAULT_NODE_WIDTH
}
fn default_node_color() -> String {
    DEFAULT_NODE_COLOR.to_string()
}
fn default_classification() -> String {
    DEFAULT_CLASSIFICATION.to_string()
}
fn default_group_width() -> f64 {
    DEFAULT_GROUP_WIDTH
}
fn default_group_height() -> f64 {
    DEFAULT_GROUP_HEIGHT
}
fn default_group_color() -> String {
    DEFAULT_GROUP_COLOR.to_string()
}
fn default_background() -> String {
    DEFAULT_GROUP_BACKGROUND.to_string()
}
fn default_connection_color() -> String {
    DEFAULT_CONNECTION_COLOR.to_string()
}

// ─── Records ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_node_width")]
    pub width: f64,
    /// Exported for readers of the file; recomputed on load.
    #[serde(default)]
    pub height: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub label: String,
    #[serde(default = "default_node_color", deserialize_with = "lenient")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient")]
    pub memo: String,
    #[serde(default, deserialize_with = "lenient")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elements: Vec<Element>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub left_ports: Vec<Port>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub right_ports: Vec<Port>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub top_ports: Vec<Port>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bottom_ports: Vec<Port>,
    #[serde(default)]
    pub parent_id: Option<Id>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Status,
    #[serde(default = "default_classification", deserialize_with = "classification")]
    pub classification: String,
    #[serde(default, deserialize_with = "lenient")]
    pub management_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub model_number: String,
    #[serde(default, deserialize_with = "lenient")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient")]
    pub install_date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub disposal_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_group_width")]
    pub width: f64,
    #[serde(default = "default_group_height")]
    pub height: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub label: String,
    #[serde(default = "default_group_color", deserialize_with = "lenient")]
    pub color: String,
    #[serde(default = "default_background", deserialize_with = "background")]
    pub background_color: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Id>,
    #[serde(default)]
    pub parent_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: Id,
    pub from_node_id: Id,
    pub from_port_id: Id,
    pub to_node_id: Id,
    pub to_port_id: Id,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default = "default_connection_color", deserialize_with = "connection_color")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient")]
    pub line_style: LineStyle,
}

/// A whole diagram (or a clipboard fragment of one) in wire form.
///
/// `nodes` and `connections` are required; a document without them is
/// malformed. `groups` postdates the first file format and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    pub nodes: Vec<NodeRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<GroupRecord>,
    pub connections: Vec<ConnectionRecord>,
}

// ─── Scene → records ─────────────────────────────────────────────────────

impl From<&Node> for NodeRecord {
    fn from(n: &Node) -> Self {
        Self {
            id: n.id,
            x: n.x,
            y: n.y,
            width: n.width,
            height: n.height,
            label: n.label.clone(),
            color: n.color.clone(),
            memo: n.memo.clone(),
            link: n.link.clone(),
            elements: n.elements.clone(),
            left_ports: n.left_ports.to_vec(),
            right_ports: n.right_ports.to_vec(),
            top_ports: n.top_ports.to_vec(),
            bottom_ports: n.bottom_ports.to_vec(),
            parent_id: n.parent,
            status: n.status,
            classification: n.classification.clone(),
            management_id: n.management_id.clone(),
            model_number: n.model_number.clone(),
            location: n.location.clone(),
            install_date: n.install_date.clone(),
            disposal_date: n.disposal_date.clone(),
        }
    }
}

impl From<&Group> for GroupRecord {
    fn from(g: &Group) -> Self {
        Self {
            id: g.id,
            x: g.x,
            y: g.y,
            width: g.width,
            height: g.height,
            label: g.label.clone(),
            color: g.color.clone(),
            background_color: g.background_color.clone(),
            children: g.children.iter().map(|c| c.id()).collect(),
            parent_id: g.parent,
        }
    }
}

impl From<&Connection> for ConnectionRecord {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id,
            from_node_id: c.from.node,
            from_port_id: c.from.port,
            to_node_id: c.to.node,
            to_port_id: c.to.port,
            name: c.name.clone(),
            color: c.color.clone(),
            line_style: c.line_style,
        }
    }
}

// ─── Records → scene ─────────────────────────────────────────────────────

impl NodeRecord {
    /// Build the live node under `id`. Port ids are taken from `port_id`,
    /// element ids from `element_id`; the height is always recomputed.
    fn build(
        &self,
        id: Id,
        offset: Vec2,
        mut port_id: impl FnMut(&Port) -> Id,
        mut element_id: impl FnMut(&Element) -> Id,
    ) -> Node {
        let mut ports = |list: &[Port]| -> PortList {
            list.iter()
                .map(|p| Port {
                    id: port_id(p),
                    ..p.clone()
                })
                .collect()
        };
        let left_ports = ports(&self.left_ports);
        let right_ports = ports(&self.right_ports);
        let top_ports = ports(&self.top_ports);
        let bottom_ports = ports(&self.bottom_ports);
        let mut node = Node {
            id,
            x: self.x + offset.x,
            y: self.y + offset.y,
            width: self.width,
            height: self.height,
            label: self.label.clone(),
            color: self.color.clone(),
            memo: self.memo.clone(),
            link: self.link.clone(),
            status: self.status,
            classification: self.classification.clone(),
            management_id: self.management_id.clone(),
            model_number: self.model_number.clone(),
            location: self.location.clone(),
            install_date: self.install_date.clone(),
            disposal_date: self.disposal_date.clone(),
            elements: self
                .elements
                .iter()
                .map(|e| Element {
                    id: element_id(e),
                    ..e.clone()
                })
                .collect(),
            left_ports,
            right_ports,
            top_ports,
            bottom_ports,
            parent: None,
        };
        node.update_height();
        node
    }

    fn port_name(&self, port: Id) -> Option<&str> {
        [&self.left_ports, &self.right_ports, &self.top_ports, &self.bottom_ports]
            .into_iter()
            .flatten()
            .find(|p| p.id == port)
            .map(|p| p.name.as_str())
    }
}

impl GroupRecord {
    fn build(&self, id: Id, offset: Vec2) -> Group {
        Group {
            id,
            x: self.x + offset.x,
            y: self.y + offset.y,
            width: self.width,
            height: self.height,
            label: self.label.clone(),
            color: self.color.clone(),
            background_color: self.background_color.clone(),
            children: Vec::new(),
            parent: None,
        }
    }
}

impl ConnectionRecord {
    fn build(&self, id: Id, from: Endpoint, to: Endpoint) -> Connection {
        Connection {
            id,
            from,
            to,
            name: self.name.clone(),
            color: self.color.clone(),
            line_style: self.line_style,
        }
    }
}

/// Ids of everything an import or paste created, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imported {
    pub nodes: Vec<Id>,
    pub groups: Vec<Id>,
    pub connections: Vec<Id>,
}

impl Imported {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty() && self.connections.is_empty()
    }
}

// ─── Document API ────────────────────────────────────────────────────────

impl Document {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(DocumentError::Malformed)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Encode)
    }

    /// Structural dump of the whole scene, in draw order.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        Self {
            title: Some(scene.title.clone()),
            nodes: scene.nodes.values().map(NodeRecord::from).collect(),
            groups: scene.groups.values().map(GroupRecord::from).collect(),
            connections: scene.connections.values().map(ConnectionRecord::from).collect(),
        }
    }

    /// A fragment holding `nodes`, `groups` and the full subtree of each
    /// group, plus every connection whose two ends are both inside it.
    pub fn from_selection(scene: &SceneGraph, nodes: &[Id], groups: &[Id]) -> Self {
        let mut node_ids: Vec<Id> = Vec::new();
        let mut group_ids: Vec<Id> = Vec::new();
        let mut push = |entity: EntityRef| {
            let list = match entity {
                EntityRef::Node(_) => &mut node_ids,
                EntityRef::Group(_) => &mut group_ids,
            };
            if !list.contains(&entity.id()) {
                list.push(entity.id());
            }
        };
        for &g in groups.iter().filter(|g| scene.groups.contains_key(*g)) {
            push(EntityRef::Group(g));
            for child in scene.descendants(g) {
                push(child);
            }
        }
        for &n in nodes.iter().filter(|n| scene.nodes.contains_key(*n)) {
            push(EntityRef::Node(n));
        }

        // Keep draw order rather than selection order.
        let nodes: Vec<NodeRecord> = scene
            .nodes
            .values()
            .filter(|n| node_ids.contains(&n.id))
            .map(NodeRecord::from)
            .collect();
        let groups = scene
            .groups
            .values()
            .filter(|g| group_ids.contains(&g.id))
            .map(GroupRecord::from)
            .collect();
        let connections = scene
            .connections
            .values()
            .filter(|c| node_ids.contains(&c.from.node) && node_ids.contains(&c.to.node))
            .map(ConnectionRecord::from)
            .collect();
        Self {
            title: None,
            nodes,
            groups,
            connections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty()
    }

    /// Build a fresh scene that trusts every id in the document.
    ///
    /// Group children come back as typed references: an id is a node when
    /// that node names this group as parent, otherwise a group if one
    /// exists, otherwise a node if one exists. Ids naming nothing are
    /// dropped with a warning.
    pub fn to_scene(&self) -> SceneGraph {
        let mut scene = SceneGraph::new();
        if let Some(title) = self.title.as_ref().filter(|t| !t.is_empty()) {
            scene.title = title.clone();
        }
        for record in &self.nodes {
            let mut node = record.build(record.id, Vec2::ZERO, |p| p.id, |e| e.id);
            node.parent = record.parent_id;
            scene.nodes.insert(node.id, node);
        }
        for record in &self.groups {
            let mut group = record.build(record.id, Vec2::ZERO);
            group.parent = record.parent_id;
            scene.groups.insert(group.id, group);
        }
        for record in &self.groups {
            let children: Vec<EntityRef> = record
                .children
                .iter()
                .filter_map(|&child| {
                    let resolved = resolve_child(&scene, record.id, child);
                    if resolved.is_none() {
                        log::warn!("group {} lists unknown child {child}; dropped", record.id);
                    }
                    resolved
                })
                .collect();
            if let Some(g) = scene.groups.get_mut(&record.id) {
                g.children = children;
            }
        }
        for record in &self.connections {
            let conn = record.build(
                record.id,
                Endpoint {
                    node: record.from_node_id,
                    port: record.from_port_id,
                },
                Endpoint {
                    node: record.to_node_id,
                    port: record.to_port_id,
                },
            );
            scene.connections.insert(conn.id, conn);
        }
        scene
    }
}

fn resolve_child(scene: &SceneGraph, group: Id, child: Id) -> Option<EntityRef> {
    match (scene.node(child), scene.group(child)) {
        (Some(n), _) if n.parent == Some(group) => Some(EntityRef::Node(child)),
        (_, Some(_)) => Some(EntityRef::Group(child)),
        (Some(_), None) => Some(EntityRef::Node(child)),
        (None, None) => None,
    }
}

// ─── Scene-level entry points ────────────────────────────────────────────

impl SceneGraph {
    /// Export the scene as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Document::from_scene(self).to_json()
    }

    /// Replace the whole scene with the document. On error nothing changes.
    pub fn load(&mut self, json: &str) -> Result<()> {
        let doc = Document::from_json(json)?;
        self.load_document(&doc);
        Ok(())
    }

    pub fn load_document(&mut self, doc: &Document) {
        let mut scene = doc.to_scene();
        if doc.title.as_ref().is_none_or(|t| t.is_empty()) {
            scene.title = std::mem::take(&mut self.title);
        }
        scene.restore_element_seq(self.element_seq());
        *self = scene;
        for diag in lint_document(self) {
            log::warn!("[{}] {}", diag.rule, diag.message);
        }
        log::debug!(
            "loaded {} node(s), {} group(s), {} connection(s)",
            self.nodes.len(),
            self.groups.len(),
            self.connections.len()
        );
    }

    /// Merge a document into the scene under fresh ids. On error nothing
    /// changes.
    pub fn import(&mut self, json: &str, ids: &mut dyn IdGenerator) -> Result<Imported> {
        let doc = Document::from_json(json)?;
        Ok(self.instantiate(&doc, ids, Vec2::ZERO))
    }

    /// Add a copy of `doc` with every identity regenerated and every
    /// position shifted by `offset`.
    ///
    /// Groups are mapped first so parent links resolve, then nodes, then
    /// connections. Parents outside the fragment become root. Connections
    /// survive only when both owning nodes are in the fragment.
    pub fn instantiate(&mut self, doc: &Document, ids: &mut dyn IdGenerator, offset: Vec2) -> Imported {
        let mut remap = IdRemap::new();
        for g in &doc.groups {
            remap.map_group(g.id, ids);
        }
        for n in &doc.nodes {
            remap.map_node(n.id, ids);
        }
        let mut out = Imported::default();

        for record in &doc.groups {
            let Some(new_id) = remap.group(record.id) else { continue };
            let mut group = record.build(new_id, offset);
            group.parent = record.parent_id.and_then(|p| remap.group(p));
            self.groups.insert(new_id, group);
            out.groups.push(new_id);
        }
        for record in &doc.nodes {
            let Some(new_id) = remap.node(record.id) else { continue };
            let mut node = record.build(new_id, offset, |p| Id::port(new_id, &p.name), |_| {
                self.next_element_id(new_id)
            });
            node.parent = record.parent_id.and_then(|p| remap.group(p));
            self.nodes.insert(new_id, node);
            out.nodes.push(new_id);
        }

        // Membership: listed order first, then any parent pointer the list
        // forgot, so both sides agree.
        let by_id: HashMap<Id, &NodeRecord> = doc.nodes.iter().map(|n| (n.id, n)).collect();
        for record in &doc.groups {
            let Some(new_group) = remap.group(record.id) else { continue };
            for &child in &record.children {
                let entity = match (by_id.get(&child), remap.group(child)) {
                    (Some(n), _) if n.parent_id == Some(record.id) => remap.node(child).map(EntityRef::Node),
                    (_, Some(g)) => Some(EntityRef::Group(g)),
                    (Some(_), None) => remap.node(child).map(EntityRef::Node),
                    (None, None) => None,
                };
                if let Some(entity) = entity
                    && self.parent_of(entity) == Some(new_group)
                    && let Some(g) = self.groups.get_mut(&new_group)
                {
                    g.push_child(entity);
                }
            }
        }
        let orphans: Vec<(EntityRef, Id)> = out
            .nodes
            .iter()
            .map(|&n| EntityRef::Node(n))
            .chain(out.groups.iter().map(|&g| EntityRef::Group(g)))
            .filter_map(|e| self.parent_of(e).map(|p| (e, p)))
            .collect();
        for (entity, parent) in orphans {
            if let Some(g) = self.groups.get_mut(&parent) {
                g.push_child(entity);
            }
        }

        for record in &doc.connections {
            let from = endpoint(&remap, &by_id, record.from_node_id, record.from_port_id);
            let to = endpoint(&remap, &by_id, record.to_node_id, record.to_port_id);
            let (Some(from), Some(to)) = (from, to) else {
                log::warn!("connection {} references a node outside the document; skipped", record.id);
                continue;
            };
            let new_id = ids.next_id();
            self.connections.insert(new_id, record.build(new_id, from, to));
            out.connections.push(new_id);
        }

        log::debug!(
            "instantiated {} node(s), {} group(s), {} connection(s)",
            out.nodes.len(),
            out.groups.len(),
            out.connections.len()
        );
        out
    }
}

fn endpoint(
    remap: &IdRemap,
    records: &HashMap<Id, &NodeRecord>,
    old_node: Id,
    old_port: Id,
) -> Option<Endpoint> {
    let name = records.get(&old_node).and_then(|r| r.port_name(old_port));
    Some(Endpoint {
        node: remap.node(old_node)?,
        port: remap.port(old_node, old_port, name)?,
    })
}

// ─── Snapshots ───────────────────────────────────────────────────────────

/// Compact binary image of a scene for undo history.
pub fn encode_snapshot(scene: &SceneGraph) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&Document::from_scene(scene))
        .map_err(|e| DocumentError::Snapshot(e.to_string()))
}

/// Restore a scene from [`encode_snapshot`] output, in place. The element
/// counter keeps counting up across restores.
pub fn restore_snapshot(scene: &mut SceneGraph, bytes: &[u8]) -> Result<()> {
    let doc: Document =
        rmp_serde::from_slice(bytes).map_err(|e| DocumentError::Snapshot(e.to_string()))?;
    let mut restored = doc.to_scene();
    restored.restore_element_seq(scene.element_seq());
    *scene = restored;
    Ok(())
}
