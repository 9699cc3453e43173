//! In-process clipboard.
//!
//! Copy freezes the selection into a [`Document`] fragment; paste feeds
//! that fragment back through [`SceneGraph::instantiate`], the same path
//! additive import takes, so every id is regenerated and every internal
//! reference is remapped.

use kurbo::Vec2;
use nd_core::{Document, IdGenerator, Imported, SceneGraph};

use crate::selection::Selection;

/// What the clipboard slot was copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipKind {
    /// A single node.
    Node,
    /// A single group with its full subtree.
    Group,
    /// Any other combination of selected nodes and groups.
    Multi,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<(ClipKind, Document)>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> Option<ClipKind> {
        self.slot.as_ref().map(|(kind, _)| *kind)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Snapshot the current node/group selection. An empty selection
    /// leaves the previous contents in place. Returns the kind captured.
    pub fn copy(&mut self, scene: &SceneGraph, selection: &Selection) -> Option<ClipKind> {
        let nodes: Vec<_> = selection.nodes().collect();
        let groups: Vec<_> = selection.groups().collect();
        let kind = match (nodes.len(), groups.len()) {
            (0, 0) => return None,
            (1, 0) => ClipKind::Node,
            (0, 1) => ClipKind::Group,
            _ => ClipKind::Multi,
        };
        let doc = Document::from_selection(scene, &nodes, &groups);
        if doc.is_empty() {
            return None;
        }
        log::debug!(
            "copied {kind:?}: {} node(s), {} group(s), {} connection(s)",
            doc.nodes.len(),
            doc.groups.len(),
            doc.connections.len()
        );
        self.slot = Some((kind, doc));
        Some(kind)
    }

    /// Instantiate the clipboard contents shifted by `offset`. `None` when
    /// the clipboard is empty.
    pub fn paste(&self, scene: &mut SceneGraph, ids: &mut dyn IdGenerator, offset: Vec2) -> Option<Imported> {
        let (_, doc) = self.slot.as_ref()?;
        Some(scene.instantiate(doc, ids, offset))
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_core::{EntityRef, Group, Id, Node, SequentialIds, Side};
    use pretty_assertions::assert_eq;

    fn scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene.add_group(Group::with_size(Id::intern("clip_g"), 0.0, 0.0, 500.0, 300.0));
        let mut a = Node::new(Id::intern("clip_a"), 20.0, 40.0);
        a.add_port(Side::Right);
        a.parent = Some(Id::intern("clip_g"));
        let mut b = Node::new(Id::intern("clip_b"), 260.0, 40.0);
        b.add_port(Side::Left);
        b.parent = Some(Id::intern("clip_g"));
        scene.add_node(a);
        scene.add_node(b);
        scene.connect(
            Id::intern("clip_link"),
            nd_core::Endpoint { node: Id::intern("clip_a"), port: Id::intern("clip_a-R1") },
            nd_core::Endpoint { node: Id::intern("clip_b"), port: Id::intern("clip_b-L1") },
        );
        scene
    }

    #[test]
    fn empty_selection_copies_nothing() {
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy(&scene(), &Selection::new()), None);
        assert!(clip.is_empty());

        let mut s = scene();
        assert_eq!(clip.paste(&mut s, &mut SequentialIds::new("p"), Vec2::ZERO), None);
    }

    #[test]
    fn single_node_paste_lands_at_root_with_offset() {
        let mut s = scene();
        let mut sel = Selection::new();
        sel.click(EntityRef::Node(Id::intern("clip_a")), false);
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy(&s, &sel), Some(ClipKind::Node));

        let mut ids = SequentialIds::new("clip_new");
        let pasted = clip.paste(&mut s, &mut ids, Vec2::new(20.0, 20.0)).unwrap();
        assert_eq!(pasted.nodes.len(), 1);
        assert!(pasted.connections.is_empty());

        let node = s.node(pasted.nodes[0]).unwrap();
        assert_eq!((node.x, node.y), (40.0, 60.0));
        assert_eq!(node.parent, None);
        assert_eq!(node.right_ports[0].id, Id::port(node.id, "R1"));
    }

    #[test]
    fn group_paste_keeps_internal_links() {
        let mut s = scene();
        let mut sel = Selection::new();
        sel.click(EntityRef::Group(Id::intern("clip_g")), false);
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy(&s, &sel), Some(ClipKind::Group));

        let pasted = clip
            .paste(&mut s, &mut SequentialIds::new("clip_dup"), Vec2::new(20.0, 20.0))
            .unwrap();
        assert_eq!(pasted.groups.len(), 1);
        assert_eq!(pasted.nodes.len(), 2);
        assert_eq!(pasted.connections.len(), 1);

        let group = s.group(pasted.groups[0]).unwrap();
        assert_eq!(group.children.len(), 2);
        let conn = s.connection(pasted.connections[0]).unwrap();
        assert!(pasted.nodes.contains(&conn.from.node));
        assert!(pasted.nodes.contains(&conn.to.node));
        assert_eq!(s.connections.len(), 2);
    }
}
