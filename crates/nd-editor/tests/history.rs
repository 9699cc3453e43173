//! Integration tests: session-level undo/redo across discrete commands
//! and document load/import.

use nd_core::{EntityRef, Id, NodeAttr, SequentialIds, Side};
use nd_editor::{InteractionConfig, Session};
use pretty_assertions::assert_eq;

const OFFICE: &str = include_str!("../../nd-core/tests/fixtures/office.json");

fn session(prefix: &str, depth: usize) -> Session {
    let config = InteractionConfig {
        history_depth: depth,
        ..InteractionConfig::default()
    };
    Session::with_ids(config, Box::new(SequentialIds::new(prefix)))
}

#[test]
fn load_clears_history_and_selection() {
    let mut s = session("hist_a", 100);
    s.add_node(nd_core::Point::new(0.0, 0.0));
    assert!(s.can_undo());

    s.load(OFFICE).unwrap();
    assert!(!s.can_undo());
    assert!(s.selection().is_empty());
    assert_eq!(s.scene().title, "本社ネットワーク");
    assert_eq!(s.scene().nodes.len(), 3);
}

#[test]
fn failed_load_keeps_everything() {
    let mut s = session("hist_b", 100);
    s.load(OFFICE).unwrap();
    let n = s.add_node(nd_core::Point::new(0.0, 0.0));

    assert!(s.load(r#"{"nodes": []}"#).is_err());
    assert_eq!(s.scene().nodes.len(), 4);
    assert_eq!(s.selection().primary(), Some(EntityRef::Node(n)));
    assert!(s.can_undo());
}

#[test]
fn import_is_one_undo_step() {
    let mut s = session("hist_c", 100);
    s.load(OFFICE).unwrap();
    let imported = s.import(OFFICE).unwrap();

    assert_eq!(imported.nodes.len(), 3);
    assert_eq!(imported.groups.len(), 1);
    assert_eq!(imported.connections.len(), 1);
    assert_eq!(s.scene().nodes.len(), 6);
    assert_eq!(s.selection().node_count(), 3);
    assert!(imported.nodes.iter().all(|n| !["fw01", "core", "pc17"].contains(&n.as_str())));

    assert_eq!(s.undo().as_deref(), Some("import"));
    assert_eq!(s.scene().nodes.len(), 3);
    assert!(s.selection().is_empty());
    assert_eq!(s.redo().as_deref(), Some("import"));
    assert_eq!(s.scene().nodes.len(), 6);
}

#[test]
fn malformed_import_pushes_nothing() {
    let mut s = session("hist_d", 100);
    s.load(OFFICE).unwrap();
    assert!(s.import("{").is_err());
    assert!(!s.can_undo());
    assert_eq!(s.scene().nodes.len(), 3);
}

#[test]
fn port_rename_and_element_edits_undo_in_order() {
    let mut s = session("hist_e", 100);
    s.load(OFFICE).unwrap();
    let fw = Id::intern("fw01");

    assert_eq!(s.rename_port(fw, Side::Right, 0, "WAN"), Some(Id::intern("fw01-WAN")));
    assert_eq!(s.scene().connection(Id::intern("link1")).unwrap().from.port, Id::intern("fw01-WAN"));

    let e = s.add_element(fw, None).expect("node exists");
    assert_eq!(s.scene().node(fw).unwrap().elements.len(), 3);
    assert_ne!(e, Id::intern("fw01-e1"));
    assert_ne!(e, Id::intern("fw01-e2"));
    assert!(s.move_element(fw, 2, -1));
    assert_eq!(s.scene().node(fw).unwrap().elements[1].id, e);

    assert_eq!(s.undo().as_deref(), Some("reorder elements"));
    assert_eq!(s.undo().as_deref(), Some("add element"));
    assert_eq!(s.scene().node(fw).unwrap().elements.len(), 2);
    assert_eq!(s.undo().as_deref(), Some("rename port"));
    assert_eq!(s.scene().connection(Id::intern("link1")).unwrap().from.port, Id::intern("fw01-R1"));
}

#[test]
fn rejected_edits_record_nothing() {
    let mut s = session("hist_f", 100);
    s.load(OFFICE).unwrap();
    assert!(!s.set_node_attr(Id::intern("missing"), NodeAttr::Label("x".into())));
    assert!(!s.remove_port(Id::intern("core"), Side::Right, 0));
    assert_eq!(s.rename_port(Id::intern("fw01"), Side::Right, 0, "L1"), None);
    assert!(!s.can_undo());
}

#[test]
fn history_depth_is_bounded() {
    let mut s = session("hist_g", 2);
    s.load(OFFICE).unwrap();
    let core = Id::intern("core");
    for label in ["a", "b", "c"] {
        s.set_node_attr(core, NodeAttr::Label(label.into()));
    }
    assert!(s.undo().is_some());
    assert!(s.undo().is_some());
    assert!(s.undo().is_none());
    assert_eq!(s.scene().node(core).unwrap().label, "a");
}
