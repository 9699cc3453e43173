//! Undo/Redo command stack.
//!
//! Every undoable edit is captured as a **scene snapshot** pair: the whole
//! scene is encoded (rmp-serde) before and after, and undo/redo swaps the
//! live scene for the matching image. Pointer gestures open a batch on
//! pointer-down and close it on pointer-up, so a drag of any length is a
//! single undo step.

use nd_core::{SceneGraph, encode_snapshot, restore_snapshot};

/// One undoable step.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub before: Vec<u8>,
    pub after: Vec<u8>,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for gestures.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Snapshot captured when the outermost batch opened.
    batch_snapshot: Option<Vec<u8>>,
    batch_description: String,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(256)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
        }
    }

    /// Open a batch. The outermost call captures the scene; nested calls
    /// only bump the depth.
    pub fn begin_batch(&mut self, scene: &SceneGraph, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = match encode_snapshot(scene) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("history snapshot failed, '{description}' won't be undoable: {err}");
                    None
                }
            };
            self.batch_description = description.to_string();
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes and the scene
    /// actually changed, one command is pushed.
    pub fn end_batch(&mut self, scene: &SceneGraph) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let Some(before) = self.batch_snapshot.take() else {
            return;
        };
        let after = match encode_snapshot(scene) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("history snapshot failed: {err}");
                return;
            }
        };
        if before == after {
            return;
        }
        let description = std::mem::take(&mut self.batch_description);
        log::debug!("history push: {description}");
        self.push(Command {
            before,
            after,
            description,
        });
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Run `edit` against the scene as one undo step.
    pub fn execute<R>(
        &mut self,
        scene: &mut SceneGraph,
        description: &str,
        edit: impl FnOnce(&mut SceneGraph) -> R,
    ) -> R {
        self.begin_batch(scene, description);
        let out = edit(scene);
        self.end_batch(scene);
        out
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        if let Err(err) = restore_snapshot(scene, &cmd.before) {
            log::warn!("undo of '{}' failed: {err}", cmd.description);
            return None;
        }
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, scene: &mut SceneGraph) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        if let Err(err) = restore_snapshot(scene, &cmd.after) {
            log::warn!("redo of '{}' failed: {err}", cmd.description);
            return None;
        }
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Drop all history, including an open batch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_description.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_core::{Id, Node};
    use pretty_assertions::assert_eq;

    fn scene_with(id: &str) -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene.add_node(Node::new(Id::intern(id), 10.0, 10.0));
        scene
    }

    #[test]
    fn undo_redo_move() {
        let mut scene = scene_with("cmd_a");
        let mut stack = CommandStack::new(10);
        stack.execute(&mut scene, "move", |s| s.translate_node(Id::intern("cmd_a"), 5.0, 0.0));
        assert_eq!(scene.node(Id::intern("cmd_a")).map(|n| n.x), Some(15.0));

        assert_eq!(stack.undo(&mut scene).as_deref(), Some("move"));
        assert_eq!(scene.node(Id::intern("cmd_a")).map(|n| n.x), Some(10.0));
        assert!(stack.can_redo());

        assert_eq!(stack.redo(&mut scene).as_deref(), Some("move"));
        assert_eq!(scene.node(Id::intern("cmd_a")).map(|n| n.x), Some(15.0));
        assert!(!stack.can_redo());
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut scene = scene_with("cmd_b");
        let mut stack = CommandStack::new(10);
        let id = Id::intern("cmd_b");
        stack.execute(&mut scene, "first", |s| s.translate_node(id, 1.0, 0.0));
        stack.undo(&mut scene);
        assert!(stack.can_redo());
        stack.execute(&mut scene, "second", |s| s.translate_node(id, 0.0, 1.0));
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut scene = scene_with("cmd_c");
        let mut stack = CommandStack::new(3);
        let id = Id::intern("cmd_c");
        for _ in 0..5 {
            stack.execute(&mut scene, "nudge", |s| s.translate_node(id, 1.0, 0.0));
        }
        assert_eq!(stack.undo_len(), 3);
        while stack.undo(&mut scene).is_some() {}
        assert_eq!(scene.node(id).map(|n| n.x), Some(12.0));
    }

    #[test]
    fn batch_undo_is_single_step() {
        let mut scene = scene_with("cmd_d");
        let mut stack = CommandStack::new(10);
        let id = Id::intern("cmd_d");
        stack.begin_batch(&scene, "drag");
        for _ in 0..4 {
            stack.execute(&mut scene, "inner", |s| s.translate_node(id, 2.0, 2.0));
        }
        assert!(stack.is_batching());
        stack.end_batch(&scene);
        assert_eq!(stack.undo_len(), 1);

        assert_eq!(stack.undo(&mut scene).as_deref(), Some("drag"));
        assert_eq!(scene.node(id).map(|n| (n.x, n.y)), Some((10.0, 10.0)));
    }

    #[test]
    fn empty_batch_no_undo_entry() {
        let mut scene = scene_with("cmd_e");
        let mut stack = CommandStack::new(10);
        stack.begin_batch(&scene, "click");
        stack.end_batch(&scene);
        stack.execute(&mut scene, "noop", |_| ());
        assert!(!stack.can_undo());
    }
}
