//! Entity model for network diagrams.
//!
//! Three top-level entity kinds live in the scene: [`Node`] (a piece of
//! equipment with elements and ports), [`Group`] (a translucent container
//! that may nest) and [`Connection`] (a curve between two ports). Everything
//! cross-references by [`Id`], never by pointer, so a document is a direct
//! structural copy of the model.

use crate::color::Color;
use crate::id::Id;
use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

// ─── Layout constants ────────────────────────────────────────────────────

/// Height of the label header; also the height of an empty node.
pub const HEADER_HEIGHT: f64 = 40.0;
/// Gap between the header and the first element row.
pub const ELEMENT_PADDING: f64 = 15.0;
/// Height of one element row.
pub const ELEMENT_ROW_HEIGHT: f64 = 25.0;
/// Gap below the last element row.
pub const BOTTOM_PADDING: f64 = 10.0;
/// Vertical room reserved per left/right port.
pub const PORT_ROW_HEIGHT: f64 = 20.0;
/// Minimum height once a node has at least one element.
pub const MIN_HEIGHT_WITH_ELEMENTS: f64 = 100.0;

pub const DEFAULT_NODE_WIDTH: f64 = 200.0;
pub const DEFAULT_NODE_LABEL: &str = "ノード";
pub const DEFAULT_NODE_COLOR: &str = "#21262d";
pub const DEFAULT_CLASSIFICATION: &str = "PC";
pub const DEFAULT_ELEMENT_COLOR: &str = "#c9d1d9";

pub const DEFAULT_GROUP_WIDTH: f64 = 300.0;
pub const DEFAULT_GROUP_HEIGHT: f64 = 200.0;
pub const DEFAULT_GROUP_LABEL: &str = "グループ";
pub const DEFAULT_GROUP_COLOR: &str = "#30363d";
pub const DEFAULT_GROUP_BACKGROUND: &str = "rgba(22, 27, 34, 0.5)";
/// Padding added around children by [`crate::SceneGraph::auto_resize_group`].
pub const GROUP_PADDING: f64 = 20.0;

pub const DEFAULT_CONNECTION_COLOR: &str = "#58a6ff";

/// Deserialize a field, falling back to `T::default()` for `null` or any
/// value of the wrong shape. Documents written by older editors carry
/// free-form strings in enum slots.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

// ─── Enumerations ────────────────────────────────────────────────────────

/// Lifecycle status of a node or port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

/// Status of a node element. `Error` is drawn with a red marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementStatus {
    #[default]
    Active,
    Inactive,
    Error,
}

/// Physical port classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortKind {
    #[default]
    #[serde(rename = "LAN")]
    Lan,
    #[serde(rename = "USB")]
    Usb,
    #[serde(rename = "COM")]
    Com,
    #[serde(rename = "HDMI")]
    Hdmi,
    DisplayPort,
}

/// The node edge a port sits on (and the direction a curve leaves it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Single-letter prefix used for default port names (`L1`, `T3`, ...).
    pub fn prefix(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
            Side::Top => 'T',
            Side::Bottom => 'B',
        }
    }
}

/// Stroke style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// A typed reference to a node or a group.
///
/// Group children are a sequence of these, so resolving a child never has to
/// search both collections and node/group id spaces cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Node(Id),
    Group(Id),
}

impl EntityRef {
    pub fn id(self) -> Id {
        match self {
            EntityRef::Node(id) | EntityRef::Group(id) => id,
        }
    }
}

// ─── Element ─────────────────────────────────────────────────────────────

/// A row inside a node (a service, card, VM...). Order is draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: Id,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: ElementStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub memo1: String,
    #[serde(default, deserialize_with = "lenient")]
    pub memo2: String,
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
    #[serde(default = "default_element_color", deserialize_with = "lenient")]
    pub color: String,
}

fn default_element_color() -> String {
    DEFAULT_ELEMENT_COLOR.to_string()
}

impl Element {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            status: ElementStatus::Active,
            memo1: String::new(),
            memo2: String::new(),
            url: String::new(),
            color: default_element_color(),
        }
    }
}

// ─── Port ────────────────────────────────────────────────────────────────

/// A connection point on one side of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// Always `{nodeId}-{name}`; see [`Id::port`].
    pub id: Id,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient")]
    pub classification: PortKind,
    #[serde(default, deserialize_with = "lenient")]
    pub model_number: String,
    #[serde(default, deserialize_with = "lenient")]
    pub memo: String,
}

impl Port {
    pub fn new(node: Id, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Id::port(node, &name),
            name,
            description: String::new(),
            status: Status::Active,
            classification: PortKind::Lan,
            model_number: String::new(),
            memo: String::new(),
        }
    }
}

/// Ports along one side. Most equipment has a handful per side.
pub type PortList = SmallVec<[Port; 4]>;

// ─── Node ────────────────────────────────────────────────────────────────

/// A piece of network equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// Derived from element and port counts; see [`Node::update_height`].
    pub height: f64,
    pub label: String,
    pub color: String,
    pub memo: String,
    pub link: String,
    pub status: Status,
    pub classification: String,
    pub management_id: String,
    pub model_number: String,
    pub location: String,
    pub install_date: String,
    pub disposal_date: String,
    pub elements: Vec<Element>,
    pub left_ports: PortList,
    pub right_ports: PortList,
    pub top_ports: PortList,
    pub bottom_ports: PortList,
    pub parent: Option<Id>,
}

/// Node height as a pure function of its counts.
pub fn derived_height(element_count: usize, left_ports: usize, right_ports: usize) -> f64 {
    let content = if element_count == 0 {
        HEADER_HEIGHT
    } else {
        HEADER_HEIGHT + ELEMENT_PADDING + element_count as f64 * ELEMENT_ROW_HEIGHT + BOTTOM_PADDING
    };
    let min_port_height = (left_ports.max(right_ports) + 1) as f64 * PORT_ROW_HEIGHT;
    let min_height = if element_count == 0 {
        HEADER_HEIGHT
    } else {
        MIN_HEIGHT_WITH_ELEMENTS
    };
    content.max(min_port_height).max(min_height)
}

impl Node {
    pub fn new(id: Id, x: f64, y: f64) -> Self {
        let mut node = Self {
            id,
            x,
            y,
            width: DEFAULT_NODE_WIDTH,
            height: HEADER_HEIGHT,
            label: DEFAULT_NODE_LABEL.to_string(),
            color: DEFAULT_NODE_COLOR.to_string(),
            memo: String::new(),
            link: String::new(),
            status: Status::Active,
            classification: DEFAULT_CLASSIFICATION.to_string(),
            management_id: String::new(),
            model_number: String::new(),
            location: String::new(),
            install_date: String::new(),
            disposal_date: String::new(),
            elements: Vec::new(),
            left_ports: PortList::new(),
            right_ports: PortList::new(),
            top_ports: PortList::new(),
            bottom_ports: PortList::new(),
            parent: None,
        };
        node.update_height();
        node
    }

    /// Recompute the derived height. Must follow every element or port
    /// mutation; idempotent otherwise.
    pub fn update_height(&mut self) {
        self.height = derived_height(
            self.elements.len(),
            self.left_ports.len(),
            self.right_ports.len(),
        );
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Inclusive on every edge.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    // ── Ports ──

    pub fn ports(&self, side: Side) -> &PortList {
        match side {
            Side::Left => &self.left_ports,
            Side::Right => &self.right_ports,
            Side::Top => &self.top_ports,
            Side::Bottom => &self.bottom_ports,
        }
    }

    pub fn ports_mut(&mut self, side: Side) -> &mut PortList {
        match side {
            Side::Left => &mut self.left_ports,
            Side::Right => &mut self.right_ports,
            Side::Top => &mut self.top_ports,
            Side::Bottom => &mut self.bottom_ports,
        }
    }

    /// All ports with their side, in left/right/top/bottom scan order.
    pub fn all_ports(&self) -> impl Iterator<Item = (Side, &Port)> {
        Side::ALL
            .into_iter()
            .flat_map(move |side| self.ports(side).iter().map(move |p| (side, p)))
    }

    /// Side and index of a port within its side-sequence.
    pub fn locate_port(&self, port_id: Id) -> Option<(Side, usize)> {
        Side::ALL.into_iter().find_map(|side| {
            self.ports(side)
                .iter()
                .position(|p| p.id == port_id)
                .map(|i| (side, i))
        })
    }

    pub fn port(&self, port_id: Id) -> Option<&Port> {
        self.locate_port(port_id)
            .map(|(side, i)| &self.ports(side)[i])
    }

    /// Append a port named `{prefix}{n}` and return its id. `n` starts at
    /// `count+1` and skips names already taken anywhere on the node.
    pub fn add_port(&mut self, side: Side) -> Id {
        let mut n = self.ports(side).len() + 1;
        let name = loop {
            let candidate = format!("{}{}", side.prefix(), n);
            if self.port(Id::port(self.id, &candidate)).is_none() {
                break candidate;
            }
            n += 1;
        };
        let port = Port::new(self.id, name);
        let id = port.id;
        self.ports_mut(side).push(port);
        self.update_height();
        id
    }

    pub fn remove_port(&mut self, side: Side, index: usize) -> Option<Port> {
        let ports = self.ports_mut(side);
        if index >= ports.len() {
            return None;
        }
        let removed = ports.remove(index);
        self.update_height();
        Some(removed)
    }

    /// Swap a port with its neighbour (`delta` is -1 or +1).
    /// Returns false when the move would leave the sequence.
    pub fn move_port(&mut self, side: Side, index: usize, delta: isize) -> bool {
        swap_neighbour(self.ports_mut(side), index, delta)
    }

    // ── Elements ──

    pub fn add_element(&mut self, id: Id, name: Option<&str>) -> Id {
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("要素 {}", self.elements.len() + 1),
        };
        self.elements.push(Element::new(id, name));
        self.update_height();
        id
    }

    pub fn remove_element(&mut self, index: usize) -> Option<Element> {
        if index >= self.elements.len() {
            return None;
        }
        let removed = self.elements.remove(index);
        self.update_height();
        Some(removed)
    }

    pub fn move_element(&mut self, index: usize, delta: isize) -> bool {
        swap_neighbour(&mut self.elements, index, delta)
    }
}

fn swap_neighbour<T>(items: &mut [T], index: usize, delta: isize) -> bool {
    let Some(target) = index.checked_add_signed(delta) else {
        return false;
    };
    if index >= items.len() || target >= items.len() {
        return false;
    }
    items.swap(index, target);
    true
}

// ─── Group ───────────────────────────────────────────────────────────────

/// A container drawn behind its members.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    /// Border color.
    pub color: String,
    /// Translucent fill, normally `rgba(r, g, b, a)`.
    pub background_color: String,
    pub children: Vec<EntityRef>,
    pub parent: Option<Id>,
}

impl Group {
    pub fn new(id: Id, x: f64, y: f64) -> Self {
        Self::with_size(id, x, y, DEFAULT_GROUP_WIDTH, DEFAULT_GROUP_HEIGHT)
    }

    pub fn with_size(id: Id, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            label: DEFAULT_GROUP_LABEL.to_string(),
            color: DEFAULT_GROUP_COLOR.to_string(),
            background_color: DEFAULT_GROUP_BACKGROUND.to_string(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn has_child(&self, child: EntityRef) -> bool {
        self.children.contains(&child)
    }

    /// Append `child` unless already present.
    pub fn push_child(&mut self, child: EntityRef) {
        if !self.has_child(child) {
            self.children.push(child);
        }
    }

    pub fn remove_child(&mut self, child: EntityRef) {
        self.children.retain(|c| *c != child);
    }

    /// Compose the background from a `#rrggbb` swatch and an opacity in
    /// percent (0–100). Invalid hex leaves the background unchanged.
    pub fn set_background(&mut self, hex: &str, opacity_percent: f32) {
        if let Some(mut color) = Color::from_hex(hex) {
            color.a = (opacity_percent / 100.0).clamp(0.0, 1.0);
            self.background_color = color.to_css_rgba();
        }
    }

    /// Background opacity in percent; 50 when the stored value has no alpha
    /// channel we can read.
    pub fn background_opacity(&self) -> u8 {
        match Color::parse(&self.background_color) {
            Some(c) if self.background_color.trim_start().starts_with("rgba") => {
                (c.a * 100.0).round() as u8
            }
            _ => 50,
        }
    }
}

// ─── Connection ──────────────────────────────────────────────────────────

/// One end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: Id,
    pub port: Id,
}

/// A curve between two ports on (normally) different nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: Id,
    pub from: Endpoint,
    pub to: Endpoint,
    /// Drawn at the curve midpoint when non-empty.
    pub name: String,
    pub color: String,
    pub line_style: LineStyle,
}

impl Connection {
    pub fn new(id: Id, from: Endpoint, to: Endpoint) -> Self {
        Self {
            id,
            from,
            to,
            name: String::new(),
            color: DEFAULT_CONNECTION_COLOR.to_string(),
            line_style: LineStyle::Solid,
        }
    }

    /// True when either end sits on `node`.
    pub fn touches(&self, node: Id) -> bool {
        self.from.node == node || self.to.node == node
    }
}

// ─── Attribute contract ──────────────────────────────────────────────────
//
// The property panel mutates entities only through these enums. Geometry
// that is derived (node height) has no setter.

/// A settable node attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAttr {
    Label(String),
    Color(String),
    Memo(String),
    Link(String),
    Status(Status),
    Classification(String),
    ManagementId(String),
    ModelNumber(String),
    Location(String),
    InstallDate(String),
    DisposalDate(String),
    /// Ignored unless positive.
    Width(f64),
}

impl NodeAttr {
    pub fn apply(self, node: &mut Node) {
        match self {
            NodeAttr::Label(v) => node.label = v,
            NodeAttr::Color(v) => node.color = v,
            NodeAttr::Memo(v) => node.memo = v,
            NodeAttr::Link(v) => node.link = v,
            NodeAttr::Status(v) => node.status = v,
            NodeAttr::Classification(v) => node.classification = v,
            NodeAttr::ManagementId(v) => node.management_id = v,
            NodeAttr::ModelNumber(v) => node.model_number = v,
            NodeAttr::Location(v) => node.location = v,
            NodeAttr::InstallDate(v) => node.install_date = v,
            NodeAttr::DisposalDate(v) => node.disposal_date = v,
            NodeAttr::Width(v) if v > 0.0 => node.width = v,
            NodeAttr::Width(_) => {}
        }
    }
}

/// A settable group attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupAttr {
    Label(String),
    Color(String),
    BackgroundColor(String),
    /// Ignored unless positive.
    Width(f64),
    /// Ignored unless positive.
    Height(f64),
}

impl GroupAttr {
    pub fn apply(self, group: &mut Group) {
        match self {
            GroupAttr::Label(v) => group.label = v,
            GroupAttr::Color(v) => group.color = v,
            GroupAttr::BackgroundColor(v) => group.background_color = v,
            GroupAttr::Width(v) if v > 0.0 => group.width = v,
            GroupAttr::Height(v) if v > 0.0 => group.height = v,
            GroupAttr::Width(_) | GroupAttr::Height(_) => {}
        }
    }
}

/// A settable connection attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAttr {
    Name(String),
    Color(String),
    LineStyle(LineStyle),
}

impl ConnectionAttr {
    pub fn apply(self, conn: &mut Connection) {
        match self {
            ConnectionAttr::Name(v) => conn.name = v,
            ConnectionAttr::Color(v) => conn.color = v,
            ConnectionAttr::LineStyle(v) => conn.line_style = v,
        }
    }
}

/// A settable element attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementAttr {
    Name(String),
    Description(String),
    Status(ElementStatus),
    Memo1(String),
    Memo2(String),
    Url(String),
    Color(String),
}

impl ElementAttr {
    pub fn apply(self, element: &mut Element) {
        match self {
            ElementAttr::Name(v) => element.name = v,
            ElementAttr::Description(v) => element.description = v,
            ElementAttr::Status(v) => element.status = v,
            ElementAttr::Memo1(v) => element.memo1 = v,
            ElementAttr::Memo2(v) => element.memo2 = v,
            ElementAttr::Url(v) => element.url = v,
            ElementAttr::Color(v) => element.color = v,
        }
    }
}

/// A settable port attribute. Renaming goes through
/// [`crate::SceneGraph::rename_port`] because it changes the port id.
#[derive(Debug, Clone, PartialEq)]
pub enum PortAttr {
    Description(String),
    Status(Status),
    Classification(PortKind),
    ModelNumber(String),
    Memo(String),
}

impl PortAttr {
    pub fn apply(self, port: &mut Port) {
        match self {
            PortAttr::Description(v) => port.description = v,
            PortAttr::Status(v) => port.status = v,
            PortAttr::Classification(v) => port.classification = v,
            PortAttr::ModelNumber(v) => port.model_number = v,
            PortAttr::Memo(v) => port.memo = v,
        }
    }
}
