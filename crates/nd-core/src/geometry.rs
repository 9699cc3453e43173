//! Geometry kernel: connection curves, port placement and hit regions.
//!
//! All coordinates are world units. Curves are cubic Béziers whose control
//! points leave each port perpendicular to the node edge it sits on.

use crate::id::Id;
use crate::model::{Group, Node, Port, Side};
use kurbo::{CubicBez, ParamCurve, Point, Rect};

/// Control-point distance as a fraction of the larger axis delta.
pub const CURVE_OFFSET_FACTOR: f64 = 0.5;
/// Upper bound on the control-point distance.
pub const MAX_CURVE_OFFSET: f64 = 100.0;

/// Default pick radius around a port.
pub const PORT_HIT_RADIUS: f64 = 8.0;
/// Default pick distance around a connection curve.
pub const CURVE_HIT_THRESHOLD: f64 = 10.0;
/// Default number of curve segments sampled for picking.
pub const CURVE_HIT_SAMPLES: usize = 50;

/// Side of the square node resize handle.
pub const NODE_HANDLE_SIZE: f64 = 12.0;
/// Distance the node handle sits outside the bottom-right corner.
pub const NODE_HANDLE_OFFSET: f64 = 5.0;
/// Reach of the group resize region inside the bottom-right corner.
pub const GROUP_HANDLE_SIZE: f64 = 20.0;
/// Reach of the group resize region outside the bottom-right corner.
pub const GROUP_HANDLE_OUTSET: f64 = 10.0;

/// A port's resolved position plus the side it emits from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pos: Point,
    pub side: Side,
}

impl Anchor {
    pub fn new(x: f64, y: f64, side: Side) -> Self {
        Self {
            pos: Point::new(x, y),
            side,
        }
    }

    fn displaced(self, offset: f64) -> Point {
        let Point { x, y } = self.pos;
        match self.side {
            Side::Left => Point::new(x - offset, y),
            Side::Right => Point::new(x + offset, y),
            Side::Top => Point::new(x, y - offset),
            Side::Bottom => Point::new(x, y + offset),
        }
    }
}

// ─── Curves ──────────────────────────────────────────────────────────────

/// Control points for the curve `from → to`.
///
/// Both use the same offset, `min(max(|dx|, |dy|) * 0.5, 100)`, pushed out
/// along each anchor's own side.
pub fn bezier_control_points(from: Anchor, to: Anchor) -> (Point, Point) {
    let dx = (to.pos.x - from.pos.x).abs();
    let dy = (to.pos.y - from.pos.y).abs();
    let offset = (dx.max(dy) * CURVE_OFFSET_FACTOR).clamp(0.0, MAX_CURVE_OFFSET);
    (from.displaced(offset), to.displaced(offset))
}

/// The full cubic for a connection between two anchors.
pub fn connection_curve(from: Anchor, to: Anchor) -> CubicBez {
    let (cp1, cp2) = bezier_control_points(from, to);
    CubicBez::new(from.pos, cp1, cp2, to.pos)
}

/// Standard cubic Bézier evaluation at `t ∈ [0, 1]`.
pub fn bezier_point_at(t: f64, p0: Point, cp1: Point, cp2: Point, p3: Point) -> Point {
    CubicBez::new(p0, cp1, cp2, p3).eval(t)
}

/// Label position for a named connection.
pub fn curve_midpoint(from: Anchor, to: Anchor) -> Point {
    connection_curve(from, to).eval(0.5)
}

/// Approximate proximity test: samples `samples + 1` evenly spaced
/// parameters and accepts if any sample is closer than `threshold`.
pub fn is_near_curve(point: Point, from: Anchor, to: Anchor, threshold: f64, samples: usize) -> bool {
    let curve = connection_curve(from, to);
    let steps = samples.max(1);
    (0..=steps).any(|i| {
        let t = i as f64 / steps as f64;
        curve.eval(t).distance(point) < threshold
    })
}

// ─── Ports ───────────────────────────────────────────────────────────────

/// Where a port sits on its node.
///
/// Ports are spread evenly: the i-th of N ports on a side is placed at
/// `extent / (N + 1) * (i + 1)`, where the extent is the node height for
/// left/right and the width for top/bottom.
pub fn port_position(node: &Node, port_id: Id) -> Option<Anchor> {
    let (side, index) = node.locate_port(port_id)?;
    Some(port_anchor(node, side, index))
}

fn port_anchor(node: &Node, side: Side, index: usize) -> Anchor {
    let count = node.ports(side).len() as f64;
    let step = (index + 1) as f64;
    match side {
        Side::Left => Anchor::new(node.x, node.y + node.height / (count + 1.0) * step, side),
        Side::Right => Anchor::new(
            node.x + node.width,
            node.y + node.height / (count + 1.0) * step,
            side,
        ),
        Side::Top => Anchor::new(node.x + node.width / (count + 1.0) * step, node.y, side),
        Side::Bottom => Anchor::new(
            node.x + node.width / (count + 1.0) * step,
            node.y + node.height,
            side,
        ),
    }
}

/// First port (left, right, top, bottom order) within `radius` of `point`.
pub fn port_at_position(node: &Node, point: Point, radius: f64) -> Option<&Port> {
    Side::ALL.into_iter().find_map(|side| {
        node.ports(side)
            .iter()
            .enumerate()
            .find(|(i, _)| port_anchor(node, side, *i).pos.distance(point) < radius)
            .map(|(_, port)| port)
    })
}

// ─── Hit regions ─────────────────────────────────────────────────────────

/// The node width handle: a square just outside the bottom-right corner.
pub fn node_resize_handle_hit(node: &Node, point: Point) -> bool {
    let center = Point::new(
        node.x + node.width + NODE_HANDLE_OFFSET,
        node.y + node.height + NODE_HANDLE_OFFSET,
    );
    Rect::from_center_size(center, (NODE_HANDLE_SIZE, NODE_HANDLE_SIZE)).contains_inclusive(point)
}

/// The group resize region straddles the bottom-right corner.
pub fn group_resize_handle_hit(group: &Group, point: Point) -> bool {
    let corner = Point::new(group.x + group.width, group.y + group.height);
    Rect::new(
        corner.x - GROUP_HANDLE_SIZE,
        corner.y - GROUP_HANDLE_SIZE,
        corner.x + GROUP_HANDLE_OUTSET,
        corner.y + GROUP_HANDLE_OUTSET,
    )
    .contains_inclusive(point)
}

trait ContainsInclusive {
    fn contains_inclusive(&self, p: Point) -> bool;
}

impl ContainsInclusive for Rect {
    fn contains_inclusive(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }
}

/// Normalized rectangle spanning two drag points.
pub fn drag_rect(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// True when `inner` lies entirely inside `outer` (edges inclusive).
pub fn rect_encloses(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}
