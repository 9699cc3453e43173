//! Integration tests: JSON document → SceneGraph → JSON document.
//!
//! Exercises full load, export and additive import against a small office
//! network fixture (one rack group holding a firewall and a switch, plus a
//! loose PC).

use nd_core::document::Document;
use nd_core::{EntityRef, Id, Point, Reparent, SceneGraph, SequentialIds, Side};
use pretty_assertions::assert_eq;

const OFFICE: &str = include_str!("fixtures/office.json");

fn loaded() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene.load(OFFICE).expect("fixture should load");
    scene
}

// ─── Full load ───────────────────────────────────────────────────────────

#[test]
fn load_then_export_is_lossless() {
    let scene = loaded();
    let exported = Document::from_scene(&scene);
    let original = Document::from_json(OFFICE).unwrap();
    assert_eq!(exported, original);

    let json = scene.to_json().unwrap();
    let mut reloaded = SceneGraph::new();
    reloaded.load(&json).unwrap();
    assert_eq!(reloaded, scene);
}

#[test]
fn load_resolves_typed_children() {
    let scene = loaded();
    let rack = scene.group(Id::intern("rack")).unwrap();
    assert_eq!(
        rack.children,
        vec![
            EntityRef::Node(Id::intern("fw01")),
            EntityRef::Node(Id::intern("core")),
        ]
    );
    let fw = scene.node(Id::intern("fw01")).unwrap();
    assert_eq!(fw.height, 115.0);
    assert_eq!(fw.elements.len(), 2);
    assert_eq!(scene.title, "本社ネットワーク");
}

#[test]
fn load_replaces_previous_scene() {
    let mut scene = SceneGraph::new();
    scene.add_node(nd_core::Node::new(Id::intern("rt_old"), 0.0, 0.0));
    scene.load(OFFICE).unwrap();
    assert!(scene.node(Id::intern("rt_old")).is_none());
    assert_eq!(scene.nodes.len(), 3);
}

// ─── Additive import ─────────────────────────────────────────────────────

#[test]
fn import_regenerates_every_identity() {
    let mut scene = loaded();
    let mut ids = SequentialIds::new("rt_imp");
    let made = scene.import(OFFICE, &mut ids).unwrap();

    assert_eq!(scene.nodes.len(), 6);
    assert_eq!(scene.groups.len(), 2);
    assert_eq!(scene.connections.len(), 2);
    assert_eq!((made.nodes.len(), made.groups.len(), made.connections.len()), (3, 1, 1));

    let originals = ["fw01", "core", "pc17", "rack", "link1"].map(Id::intern);
    for id in made.nodes.iter().chain(&made.groups).chain(&made.connections) {
        assert!(!originals.contains(id), "{id} reused an original id");
    }

    for &node_id in &made.nodes {
        let node = scene.node(node_id).unwrap();
        for (_, port) in node.all_ports() {
            assert_eq!(port.id, Id::port(node_id, &port.name));
        }
        for element in &node.elements {
            assert!(element.id.as_str().starts_with(&format!("{node_id}-e")));
        }
    }
}

#[test]
fn imported_connection_resolves_to_new_ports() {
    let mut scene = loaded();
    let mut ids = SequentialIds::new("rt_conn");
    let made = scene.import(OFFICE, &mut ids).unwrap();

    let conn = scene.connection(made.connections[0]).unwrap();
    assert!(made.nodes.contains(&conn.from.node));
    assert!(made.nodes.contains(&conn.to.node));
    assert_eq!(conn.from.port, Id::port(conn.from.node, "R1"));
    assert_eq!(conn.to.port, Id::port(conn.to.node, "L1"));
    assert!(scene.connection_anchors(conn).is_some());
    assert_eq!(conn.name, "10G");
}

#[test]
fn imported_group_holds_the_new_nodes() {
    let mut scene = loaded();
    let mut ids = SequentialIds::new("rt_grp");
    let made = scene.import(OFFICE, &mut ids).unwrap();

    let group = scene.group(made.groups[0]).unwrap();
    let children: Vec<Id> = group.children.iter().map(|c| c.id()).collect();
    assert_eq!(children, vec![made.nodes[0], made.nodes[1]]);
    for child in children {
        assert_eq!(scene.node(child).unwrap().parent, Some(group.id));
    }
    assert_eq!(scene.node(made.nodes[2]).unwrap().parent, None);
}

#[test]
fn import_of_malformed_document_changes_nothing() {
    let mut scene = loaded();
    let before = scene.clone();
    let mut ids = SequentialIds::new("rt_bad");
    assert!(scene.import(r#"{"nodes": 3, "connections": []}"#, &mut ids).is_err());
    assert_eq!(scene, before);
}

// ─── Scene graph properties ──────────────────────────────────────────────

#[test]
fn deleting_a_node_cascades_only_its_connections() {
    let mut scene = loaded();
    let mut ids = SequentialIds::new("rt_del");
    scene.import(OFFICE, &mut ids).unwrap();
    let before = scene.connections.len();

    scene.remove_node(Id::intern("fw01"));
    assert_eq!(scene.connections.len(), before - 1);
    assert!(scene.connection(Id::intern("link1")).is_none());
    assert!(
        scene
            .connections
            .values()
            .all(|c| !c.touches(Id::intern("fw01")))
    );
    assert!(!scene.group(Id::intern("rack")).unwrap().has_child(EntityRef::Node(Id::intern("fw01"))));
}

#[test]
fn nested_group_wins_at_point_and_cycles_are_refused() {
    let mut scene = loaded();
    let rack = Id::intern("rack");
    let mut shelf = nd_core::Group::with_size(Id::intern("rt_shelf"), 110.0, 50.0, 200.0, 150.0);
    shelf.parent = Some(rack);
    scene.add_group(shelf);

    assert_eq!(scene.deepest_container_at(Point::new(150.0, 100.0), None), Some(Id::intern("rt_shelf")));
    assert_eq!(scene.deepest_container_at(Point::new(600.0, 200.0), None), Some(rack));

    let before = scene.clone();
    assert_eq!(
        scene.set_parent(EntityRef::Group(rack), Some(Id::intern("rt_shelf"))),
        Reparent::Rejected
    );
    assert_eq!(scene, before);
}

#[test]
fn rename_port_survives_export() {
    let mut scene = loaded();
    let new = scene.rename_port(Id::intern("core"), Side::Left, 0, "Gi0/1").unwrap();
    let json = scene.to_json().unwrap();
    let mut reloaded = SceneGraph::new();
    reloaded.load(&json).unwrap();
    let conn = reloaded.connection(Id::intern("link1")).unwrap();
    assert_eq!(conn.to.port, new);
    assert!(reloaded.connection_anchors(conn).is_some());
}
