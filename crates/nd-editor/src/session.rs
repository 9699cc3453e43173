//! Editing session: the one context object a host talks to.
//!
//! `Session` owns the scene, the selection, the active interaction mode,
//! clipboard, history, viewport and the id generator. Hosts feed it
//! [`InputEvent`]s and call the discrete editing entry points; everything
//! that changes the scene is recorded in the undo history.

use indexmap::IndexSet;
use kurbo::{Point, Vec2};
use nd_core::{
    ConnectionAttr, ElementAttr, EntityRef, Group, GroupAttr, Id, IdGenerator, Imported, Node,
    NodeAttr, PortAttr, Reparent, SceneGraph, Side, UuidIds,
};

use crate::clipboard::{ClipKind, Clipboard};
use crate::commands::CommandStack;
use crate::config::InteractionConfig;
use crate::input::InputEvent;
use crate::interaction::{self, Effect, Mode, View};
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::viewport::Viewport;

/// New entities created inside a selected group land at this offset from
/// its top-left corner, clear of the label.
const IN_GROUP_OFFSET: Vec2 = Vec2::new(20.0, 40.0);

pub struct Session {
    scene: SceneGraph,
    selection: Selection,
    mode: Mode,
    clipboard: Clipboard,
    history: CommandStack,
    viewport: Viewport,
    config: InteractionConfig,
    ids: Box<dyn IdGenerator>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl Session {
    /// Session minting random (UUID) identities.
    pub fn new(config: InteractionConfig) -> Self {
        Self::with_ids(config, Box::new(UuidIds))
    }

    pub fn with_ids(config: InteractionConfig, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            scene: SceneGraph::new(),
            selection: Selection::new(),
            mode: Mode::Idle,
            clipboard: Clipboard::new(),
            history: CommandStack::new(config.history_depth),
            viewport: Viewport::default(),
            config,
            ids,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn clipboard_kind(&self) -> Option<ClipKind> {
        self.clipboard.kind()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Dispatch one input event. Returns the shortcut a key event
    /// triggered, if any.
    ///
    /// Each pointer gesture (down … up) is one undo step.
    pub fn handle(&mut self, event: &InputEvent) -> Option<ShortcutAction> {
        if let InputEvent::Key {
            key,
            modifiers,
            text_input_focused,
        } = event
        {
            let action = ShortcutMap::resolve(key, *modifiers, *text_input_focused)?;
            self.run_shortcut(action);
            return Some(action);
        }

        let transition = interaction::step(
            &self.mode,
            event,
            View {
                scene: &self.scene,
                selection: &self.selection,
                config: &self.config,
            },
        );

        if matches!(event, InputEvent::PointerDown { .. }) {
            // A lost pointer-up must not merge two gestures.
            if self.history.is_batching() {
                self.history.end_batch(&self.scene);
            }
            self.history.begin_batch(&self.scene, gesture_name(&transition.mode));
        }
        if std::mem::discriminant(&self.mode) != std::mem::discriminant(&transition.mode) {
            log::debug!("mode {:?} -> {:?}", self.mode, transition.mode);
        }
        self.mode = transition.mode;
        for effect in transition.effects {
            self.apply(effect);
        }
        if matches!(event, InputEvent::PointerUp { .. }) {
            self.history.end_batch(&self.scene);
        }
        None
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Click { target, additive } => self.selection.click(target, additive),
            Effect::SelectConnection(id) => self.selection.select_connection(id),
            Effect::ClearSelection => self.selection.clear(),
            Effect::ExtendSelection { nodes, groups } => self.selection.extend(nodes, groups),
            Effect::MoveSelection(delta) => self.move_selection(delta),
            Effect::ResizeNode { node, width } => {
                if let Some(n) = self.scene.node_mut(node) {
                    n.width = width;
                }
            }
            Effect::ResizeGroup {
                group,
                width,
                height,
            } => {
                if let Some(g) = self.scene.group_mut(group) {
                    g.width = width;
                    g.height = height;
                }
            }
            Effect::Pan(delta) => self.viewport.pan(delta),
            Effect::ZoomAt { screen, delta_y } => self.viewport.wheel(screen, delta_y),
            Effect::Connect { from, to } => {
                let id = self.ids.next_id();
                self.scene.connect(id, from, to);
            }
            Effect::Reparent { child, parent } => {
                if self.scene.set_parent(child, parent) == Reparent::Rejected {
                    log::debug!("drop of {child:?} into {parent:?} rejected");
                }
            }
        }
    }

    /// Translate every selected entity once: selected nodes, selected
    /// groups, and everything inside a selected group.
    fn move_selection(&mut self, delta: Vec2) {
        let mut moving: IndexSet<EntityRef> = IndexSet::new();
        for g in self.selection.groups() {
            moving.insert(EntityRef::Group(g));
            moving.extend(self.scene.descendants(g));
        }
        moving.extend(self.selection.nodes().map(EntityRef::Node));
        for entity in moving {
            match entity {
                EntityRef::Node(id) => {
                    if let Some(n) = self.scene.node_mut(id) {
                        n.translate(delta.x, delta.y);
                    }
                }
                EntityRef::Group(id) => {
                    if let Some(g) = self.scene.group_mut(id) {
                        g.translate(delta.x, delta.y);
                    }
                }
            }
        }
    }

    fn run_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::Delete => {
                self.delete_selection();
            }
            ShortcutAction::Copy => {
                self.copy();
            }
            ShortcutAction::Paste => {
                self.paste();
            }
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::SelectAll => self.selection.select_all(&self.scene),
            ShortcutAction::Deselect => self.selection.clear(),
        }
    }

    // ─── Edit commands ───────────────────────────────────────────────────

    /// Remove the selected nodes (with their connections), the selected
    /// groups (members go to the root) and the selected connection.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let nodes: Vec<Id> = self.selection.nodes().collect();
        let groups: Vec<Id> = self.selection.groups().collect();
        let connection = self.selection.connection();
        self.history.execute(&mut self.scene, "delete", |scene| {
            if let Some(id) = connection {
                scene.remove_connection(id);
            }
            for id in nodes {
                scene.remove_node(id);
            }
            for id in groups {
                scene.remove_group(id);
            }
        });
        self.selection.clear();
        true
    }

    pub fn copy(&mut self) -> Option<ClipKind> {
        self.clipboard.copy(&self.scene, &self.selection)
    }

    /// Paste the clipboard shifted by the configured offset and select the
    /// result. `None` on an empty clipboard.
    pub fn paste(&mut self) -> Option<Imported> {
        let offset = self.config.paste_offset();
        let clipboard = &self.clipboard;
        let ids = self.ids.as_mut();
        let pasted = self
            .history
            .execute(&mut self.scene, "paste", |scene| clipboard.paste(scene, ids, offset))?;
        self.selection
            .replace(pasted.nodes.iter().copied(), pasted.groups.iter().copied());
        Some(pasted)
    }

    pub fn undo(&mut self) -> Option<String> {
        if self.history.is_batching() {
            return None;
        }
        let desc = self.history.undo(&mut self.scene)?;
        self.selection.retain_live(&self.scene);
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        if self.history.is_batching() {
            return None;
        }
        let desc = self.history.redo(&mut self.scene)?;
        self.selection.retain_live(&self.scene);
        Some(desc)
    }

    /// Where a new entity goes: inside the selected group, or centred on
    /// `view_center` offset by `half_size`.
    fn placement(&self, view_center: Point, half_size: Vec2) -> (Point, Option<Id>) {
        match self.selection.primary_group().and_then(|g| self.scene.group(g)) {
            Some(g) => (Point::new(g.x, g.y) + IN_GROUP_OFFSET, Some(g.id)),
            None => (view_center - half_size, None),
        }
    }

    /// Create a default node and select it.
    pub fn add_node(&mut self, view_center: Point) -> Id {
        let (at, parent) = self.placement(view_center, Vec2::new(100.0, 75.0));
        let mut node = Node::new(self.ids.next_id(), at.x, at.y);
        node.parent = parent;
        let id = self.history.execute(&mut self.scene, "add node", |s| s.add_node(node));
        self.selection.click(EntityRef::Node(id), false);
        id
    }

    /// Create a default group and select it.
    pub fn add_group(&mut self, view_center: Point) -> Id {
        let (at, parent) = self.placement(view_center, Vec2::new(150.0, 100.0));
        let mut group = Group::new(self.ids.next_id(), at.x, at.y);
        group.parent = parent;
        let id = self.history.execute(&mut self.scene, "add group", |s| s.add_group(group));
        self.selection.click(EntityRef::Group(id), false);
        id
    }

    /// Grow or shrink a group to wrap its direct children.
    pub fn fit_group(&mut self, id: Id) -> bool {
        self.history.execute(&mut self.scene, "fit group", |s| s.auto_resize_group(id))
    }

    pub fn set_title(&mut self, title: &str) {
        self.history.execute(&mut self.scene, "rename diagram", |s| s.title = title.to_string());
    }

    pub fn set_node_attr(&mut self, id: Id, attr: NodeAttr) -> bool {
        self.history.execute(&mut self.scene, "edit node", |s| s.set_node_attr(id, attr))
    }

    pub fn set_group_attr(&mut self, id: Id, attr: GroupAttr) -> bool {
        self.history.execute(&mut self.scene, "edit group", |s| s.set_group_attr(id, attr))
    }

    pub fn set_connection_attr(&mut self, id: Id, attr: ConnectionAttr) -> bool {
        self.history
            .execute(&mut self.scene, "edit connection", |s| s.set_connection_attr(id, attr))
    }

    pub fn set_element_attr(&mut self, node: Id, index: usize, attr: ElementAttr) -> bool {
        self.history
            .execute(&mut self.scene, "edit element", |s| s.set_element_attr(node, index, attr))
    }

    pub fn set_port_attr(&mut self, node: Id, side: Side, index: usize, attr: PortAttr) -> bool {
        self.history
            .execute(&mut self.scene, "edit port", |s| s.set_port_attr(node, side, index, attr))
    }

    pub fn add_element(&mut self, node: Id, name: Option<&str>) -> Option<Id> {
        self.history
            .execute(&mut self.scene, "add element", |s| s.add_element(node, name))
    }

    pub fn remove_element(&mut self, node: Id, index: usize) -> bool {
        self.history.execute(&mut self.scene, "remove element", |s| {
            s.node_mut(node).and_then(|n| n.remove_element(index)).is_some()
        })
    }

    pub fn move_element(&mut self, node: Id, index: usize, delta: isize) -> bool {
        self.history.execute(&mut self.scene, "reorder elements", |s| {
            s.node_mut(node).is_some_and(|n| n.move_element(index, delta))
        })
    }

    pub fn add_port(&mut self, node: Id, side: Side) -> Option<Id> {
        self.history.execute(&mut self.scene, "add port", |s| s.add_port(node, side))
    }

    pub fn remove_port(&mut self, node: Id, side: Side, index: usize) -> bool {
        self.history.execute(&mut self.scene, "remove port", |s| {
            s.node_mut(node).and_then(|n| n.remove_port(side, index)).is_some()
        })
    }

    pub fn move_port(&mut self, node: Id, side: Side, index: usize, delta: isize) -> bool {
        self.history.execute(&mut self.scene, "reorder ports", |s| {
            s.node_mut(node).is_some_and(|n| n.move_port(side, index, delta))
        })
    }

    pub fn rename_port(&mut self, node: Id, side: Side, index: usize, name: &str) -> Option<Id> {
        self.history
            .execute(&mut self.scene, "rename port", |s| s.rename_port(node, side, index, name))
    }

    // ─── Documents ───────────────────────────────────────────────────────

    pub fn to_json(&self) -> nd_core::Result<String> {
        self.scene.to_json()
    }

    /// Replace the scene. Clears selection and history; on error nothing
    /// changes.
    pub fn load(&mut self, json: &str) -> nd_core::Result<()> {
        self.scene.load(json)?;
        self.selection.clear();
        self.history.clear();
        self.mode = Mode::Idle;
        Ok(())
    }

    /// Merge a document under fresh ids as one undo step, selecting what
    /// was added.
    pub fn import(&mut self, json: &str) -> nd_core::Result<Imported> {
        let ids = self.ids.as_mut();
        let imported = self
            .history
            .execute(&mut self.scene, "import", |scene| scene.import(json, ids))?;
        self.selection
            .replace(imported.nodes.iter().copied(), imported.groups.iter().copied());
        Ok(imported)
    }
}

fn gesture_name(mode: &Mode) -> &'static str {
    match mode {
        Mode::DraggingSelection { .. } => "move",
        Mode::ConnectingDrag { .. } => "connect",
        Mode::ResizingNode { .. } => "resize node",
        Mode::ResizingGroup { .. } => "resize group",
        Mode::AreaSelecting { .. } | Mode::Panning { .. } | Mode::Idle => "canvas edit",
    }
}
