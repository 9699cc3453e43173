//! Hit testing: world point → scene entity lookup.
//!
//! Picks follow draw order. Connections and nodes are scanned back to
//! front (last drawn = topmost); groups resolve to the deepest container
//! rather than the topmost one so nested groups stay reachable.

use kurbo::{Point, Rect};
use nd_core::geometry::{self, CURVE_HIT_SAMPLES, CURVE_HIT_THRESHOLD, PORT_HIT_RADIUS};
use nd_core::{Endpoint, Id, SceneGraph};

/// Pick distances, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    pub port_radius: f64,
    pub curve_threshold: f64,
    pub curve_samples: usize,
}

impl Default for HitTolerance {
    fn default() -> Self {
        Self {
            port_radius: PORT_HIT_RADIUS,
            curve_threshold: CURVE_HIT_THRESHOLD,
            curve_samples: CURVE_HIT_SAMPLES,
        }
    }
}

/// First port within `tol.port_radius` of `point`, scanning nodes in
/// collection order.
pub fn port_at(scene: &SceneGraph, point: Point, tol: &HitTolerance) -> Option<Endpoint> {
    scene.nodes.values().find_map(|node| {
        geometry::port_at_position(node, point, tol.port_radius).map(|port| Endpoint {
            node: node.id,
            port: port.id,
        })
    })
}

/// Topmost connection whose curve passes near `point`. Connections with an
/// unresolved end are skipped.
pub fn connection_at(scene: &SceneGraph, point: Point, tol: &HitTolerance) -> Option<Id> {
    let hit = scene.connections.values().rev().find_map(|conn| {
        let (from, to) = scene.connection_anchors(conn)?;
        geometry::is_near_curve(point, from, to, tol.curve_threshold, tol.curve_samples)
            .then_some(conn.id)
    });
    if let Some(id) = hit {
        log::trace!("connection hit: {id}");
    }
    hit
}

/// Topmost node containing `point`.
pub fn node_at(scene: &SceneGraph, point: Point) -> Option<Id> {
    scene
        .nodes
        .values()
        .rev()
        .find(|n| n.contains_point(point))
        .map(|n| n.id)
}

/// Deepest group containing `point`.
pub fn group_at(scene: &SceneGraph, point: Point) -> Option<Id> {
    scene.deepest_container_at(point, None)
}

/// Nodes whose full bounds lie inside `rect`, in draw order.
pub fn nodes_in_rect(scene: &SceneGraph, rect: Rect) -> Vec<Id> {
    scene
        .nodes
        .values()
        .filter(|n| geometry::rect_encloses(rect, n.bounds()))
        .map(|n| n.id)
        .collect()
}

/// Groups whose full bounds lie inside `rect`, in draw order.
pub fn groups_in_rect(scene: &SceneGraph, rect: Rect) -> Vec<Id> {
    scene
        .groups
        .values()
        .filter(|g| geometry::rect_encloses(rect, g.bounds()))
        .map(|g| g.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_core::{Connection, Group, Node, Side};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> Id {
        Id::intern(s)
    }

    /// Two linked nodes side by side, a third overlapping the first, and a
    /// pair of nested groups behind everything.
    fn scene() -> SceneGraph {
        let mut sg = SceneGraph::new();
        sg.add_group(Group::with_size(id("hit_outer"), 0.0, 0.0, 800.0, 600.0));
        let mut inner = Group::with_size(id("hit_inner"), 400.0, 300.0, 300.0, 200.0);
        inner.parent = Some(id("hit_outer"));
        sg.add_group(inner);

        let mut a = Node::new(id("hit_a"), 100.0, 80.0);
        a.add_port(Side::Right);
        let mut b = Node::new(id("hit_b"), 500.0, 80.0);
        b.add_port(Side::Left);
        sg.add_node(a);
        sg.add_node(b);
        sg.add_node(Node::new(id("hit_top"), 150.0, 90.0));
        sg.add_connection(Connection::new(
            id("hit_link"),
            Endpoint { node: id("hit_a"), port: id("hit_a-R1") },
            Endpoint { node: id("hit_b"), port: id("hit_b-L1") },
        ));
        sg
    }

    #[test]
    fn port_under_pointer() {
        let sg = scene();
        // hit_a: x 100..300, y 80..120; its single right port sits at (300, 100).
        let hit = port_at(&sg, Point::new(303.0, 98.0), &HitTolerance::default());
        assert_eq!(hit, Some(Endpoint { node: id("hit_a"), port: id("hit_a-R1") }));
        assert_eq!(port_at(&sg, Point::new(320.0, 100.0), &HitTolerance::default()), None);
    }

    #[test]
    fn connection_under_pointer() {
        let sg = scene();
        // Straight horizontal link from (300,100) to (500,100).
        let tol = HitTolerance::default();
        assert_eq!(connection_at(&sg, Point::new(400.0, 104.0), &tol), Some(id("hit_link")));
        assert_eq!(connection_at(&sg, Point::new(400.0, 160.0), &tol), None);
    }

    #[test]
    fn topmost_node_wins() {
        let sg = scene();
        assert_eq!(node_at(&sg, Point::new(160.0, 100.0)), Some(id("hit_top")));
        assert_eq!(node_at(&sg, Point::new(110.0, 85.0)), Some(id("hit_a")));
        assert_eq!(node_at(&sg, Point::new(50.0, 500.0)), None);
    }

    #[test]
    fn deepest_group_wins() {
        let sg = scene();
        assert_eq!(group_at(&sg, Point::new(450.0, 350.0)), Some(id("hit_inner")));
        assert_eq!(group_at(&sg, Point::new(50.0, 500.0)), Some(id("hit_outer")));
        assert_eq!(group_at(&sg, Point::new(900.0, 900.0)), None);
    }

    #[test]
    fn rect_selection_requires_full_enclosure() {
        let sg = scene();
        let rect = Rect::new(90.0, 70.0, 360.0, 140.0);
        assert_eq!(nodes_in_rect(&sg, rect), vec![id("hit_a"), id("hit_top")]);
        assert!(groups_in_rect(&sg, rect).is_empty());

        let all = Rect::new(-10.0, -10.0, 810.0, 610.0);
        assert_eq!(groups_in_rect(&sg, all), vec![id("hit_outer"), id("hit_inner")]);
        assert!(nodes_in_rect(&sg, Rect::ZERO).is_empty());
    }
}
