//! Pointer interaction state machine.
//!
//! [`step`] is a pure function `(mode, event, view) → (mode', effects)`.
//! It reads the scene and selection but never mutates them; the resulting
//! [`Effect`]s are applied by the session.
//!
//! Pointer-down picks a mode by hit priority:
//!
//! | # | Under the pointer | Mode |
//! |---|-------------------|------|
//! | 0 | *Shift held*      | `AreaSelecting` |
//! | 1 | port              | `ConnectingDrag` |
//! | 2 | connection curve  | `Idle` (connection selected) |
//! | 3 | primary's resize handle | `ResizingNode` / `ResizingGroup` |
//! | 4 | node, then deepest group | `DraggingSelection` |
//! | 5 | nothing           | `Panning` |
//!
//! Every mode returns to `Idle` on pointer-up.

use crate::config::InteractionConfig;
use crate::input::{InputEvent, Modifiers};
use crate::selection::Selection;
use kurbo::{Point, Vec2};
use nd_core::geometry::{self, drag_rect};
use nd_core::{EntityRef, Endpoint, Id, SceneGraph};
use nd_render::hit;

/// The single active interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    #[default]
    Idle,
    /// Dragging empty canvas; tracks the last screen position.
    Panning { last: Point },
    /// Moving the selection; `grabbed` is the entity under the pointer at
    /// pointer-down, the only one reparented on drop.
    DraggingSelection { grabbed: EntityRef, last: Point },
    /// Dragging a new connection out of a port.
    ConnectingDrag { origin: Endpoint, cursor: Point },
    ResizingNode { node: Id },
    ResizingGroup { group: Id },
    AreaSelecting { anchor: Point, current: Point },
}

impl Mode {
    pub fn is_idle(&self) -> bool {
        matches!(self, Mode::Idle)
    }

    /// Normalized rubber band while area-selecting.
    pub fn area_rect(&self) -> Option<kurbo::Rect> {
        match self {
            Mode::AreaSelecting { anchor, current } => Some(drag_rect(*anchor, *current)),
            _ => None,
        }
    }
}

/// A state change requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Click on a node or group (multi-select rules apply).
    Click { target: EntityRef, additive: bool },
    SelectConnection(Id),
    ClearSelection,
    /// Add to the selection without removing anything.
    ExtendSelection { nodes: Vec<Id>, groups: Vec<Id> },
    /// Translate every selected node, and every selected group with its
    /// subtree, by a world delta.
    MoveSelection(Vec2),
    ResizeNode { node: Id, width: f64 },
    ResizeGroup { group: Id, width: f64, height: f64 },
    /// Move the viewport by a screen delta.
    Pan(Vec2),
    ZoomAt { screen: Point, delta_y: f64 },
    Connect { from: Endpoint, to: Endpoint },
    /// Move `child` under `parent` (root when `None`).
    Reparent { child: EntityRef, parent: Option<Id> },
}

/// Read-only view the state machine decides against.
#[derive(Clone, Copy)]
pub struct View<'a> {
    pub scene: &'a SceneGraph,
    pub selection: &'a Selection,
    pub config: &'a InteractionConfig,
}

/// Outcome of one [`step`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: Mode,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(mode: Mode) -> Self {
        Self {
            mode,
            effects: Vec::new(),
        }
    }

    fn with(mode: Mode, effect: Effect) -> Self {
        Self {
            mode,
            effects: vec![effect],
        }
    }
}

/// Advance the state machine by one event.
pub fn step(mode: &Mode, event: &InputEvent, view: View<'_>) -> Transition {
    match event {
        InputEvent::PointerDown {
            world,
            screen,
            modifiers,
        } => pointer_down(*world, *screen, *modifiers, view),
        InputEvent::PointerMove { world, screen, .. } => pointer_move(mode, *world, *screen, view),
        InputEvent::PointerUp { world, .. } => pointer_up(mode, *world, view),
        InputEvent::Wheel { screen, delta_y } => Transition::with(
            *mode,
            Effect::ZoomAt {
                screen: *screen,
                delta_y: *delta_y,
            },
        ),
        InputEvent::Key { .. } => Transition::to(*mode),
    }
}

// ─── Pointer down ────────────────────────────────────────────────────────

fn pointer_down(world: Point, screen: Point, modifiers: Modifiers, view: View<'_>) -> Transition {
    let View {
        scene,
        selection,
        config,
    } = view;
    let tol = config.hit_tolerance();

    if modifiers.area_select() {
        return Transition::to(Mode::AreaSelecting {
            anchor: world,
            current: world,
        });
    }

    if let Some(origin) = hit::port_at(scene, world, &tol) {
        log::debug!("connect drag from {}:{}", origin.node, origin.port);
        return Transition::to(Mode::ConnectingDrag {
            origin,
            cursor: world,
        });
    }

    if let Some(conn) = hit::connection_at(scene, world, &tol) {
        return Transition::with(Mode::Idle, Effect::SelectConnection(conn));
    }

    match selection.primary() {
        Some(EntityRef::Node(id))
            if scene
                .node(id)
                .is_some_and(|n| geometry::node_resize_handle_hit(n, world)) =>
        {
            return Transition::to(Mode::ResizingNode { node: id });
        }
        Some(EntityRef::Group(id))
            if scene
                .group(id)
                .is_some_and(|g| geometry::group_resize_handle_hit(g, world)) =>
        {
            return Transition::to(Mode::ResizingGroup { group: id });
        }
        _ => {}
    }

    let target = hit::node_at(scene, world)
        .map(EntityRef::Node)
        .or_else(|| hit::group_at(scene, world).map(EntityRef::Group));
    if let Some(target) = target {
        return Transition::with(
            Mode::DraggingSelection {
                grabbed: target,
                last: world,
            },
            Effect::Click {
                target,
                additive: modifiers.additive(),
            },
        );
    }

    let panning = Mode::Panning { last: screen };
    if modifiers.additive() {
        Transition::to(panning)
    } else {
        Transition::with(panning, Effect::ClearSelection)
    }
}

// ─── Pointer move ────────────────────────────────────────────────────────

fn pointer_move(mode: &Mode, world: Point, screen: Point, view: View<'_>) -> Transition {
    let View { scene, config, .. } = view;
    match *mode {
        Mode::Idle => Transition::to(Mode::Idle),
        Mode::Panning { last } => Transition::with(Mode::Panning { last: screen }, Effect::Pan(screen - last)),
        Mode::DraggingSelection { grabbed, last } => {
            let delta = world - last;
            log::trace!("drag {grabbed:?} by ({}, {})", delta.x, delta.y);
            let next = Mode::DraggingSelection { grabbed, last: world };
            if delta == Vec2::ZERO {
                Transition::to(next)
            } else {
                Transition::with(next, Effect::MoveSelection(delta))
            }
        }
        Mode::ConnectingDrag { origin, .. } => Transition::to(Mode::ConnectingDrag {
            origin,
            cursor: world,
        }),
        Mode::ResizingNode { node } => match scene.node(node) {
            Some(n) => Transition::with(
                *mode,
                Effect::ResizeNode {
                    node,
                    width: (world.x - n.x).max(config.min_node_width),
                },
            ),
            None => Transition::to(*mode),
        },
        Mode::ResizingGroup { group } => match scene.group(group) {
            Some(g) => Transition::with(
                *mode,
                Effect::ResizeGroup {
                    group,
                    width: (world.x - g.x).max(config.min_group_size),
                    height: (world.y - g.y).max(config.min_group_size),
                },
            ),
            None => Transition::to(*mode),
        },
        Mode::AreaSelecting { anchor, .. } => Transition::to(Mode::AreaSelecting {
            anchor,
            current: world,
        }),
    }
}

// ─── Pointer up ──────────────────────────────────────────────────────────

fn pointer_up(mode: &Mode, world: Point, view: View<'_>) -> Transition {
    let View {
        scene,
        selection,
        config,
    } = view;
    let mut effects = Vec::new();
    match *mode {
        Mode::ConnectingDrag { origin, .. } => {
            match hit::port_at(scene, world, &config.hit_tolerance()) {
                Some(target) if target.node != origin.node => effects.push(Effect::Connect {
                    from: origin,
                    to: target,
                }),
                _ => log::debug!("connect drag from {} discarded", origin.node),
            }
        }
        Mode::DraggingSelection { grabbed, .. } if selection.contains(grabbed) => {
            if let Some(center) = scene.bounds_of(grabbed).map(|b| b.center()) {
                let exclude = matches!(grabbed, EntityRef::Group(_)).then_some(grabbed);
                let parent = scene.deepest_container_at(center, exclude);
                effects.push(Effect::Reparent {
                    child: grabbed,
                    parent,
                });
            }
        }
        Mode::AreaSelecting { anchor, .. } => {
            let rect = drag_rect(anchor, world);
            if rect.area() > 0.0 {
                let nodes = hit::nodes_in_rect(scene, rect);
                let groups = hit::groups_in_rect(scene, rect);
                if !nodes.is_empty() || !groups.is_empty() {
                    effects.push(Effect::ExtendSelection { nodes, groups });
                }
            }
        }
        _ => {}
    }
    Transition {
        mode: Mode::Idle,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nd_core::{Group, Node, Side};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> Id {
        Id::intern(s)
    }

    struct Fixture {
        scene: SceneGraph,
        selection: Selection,
        config: InteractionConfig,
    }

    impl Fixture {
        /// `ia_a` (100,100) with a right port, `ia_b` (400,100) with a left
        /// port, both inside group `ia_g` (50,50 600×300).
        fn new() -> Self {
            let mut scene = SceneGraph::new();
            scene.add_group(Group::with_size(id("ia_g"), 50.0, 50.0, 600.0, 300.0));
            let mut a = Node::new(id("ia_a"), 100.0, 100.0);
            a.add_port(Side::Right);
            a.parent = Some(id("ia_g"));
            let mut b = Node::new(id("ia_b"), 400.0, 100.0);
            b.add_port(Side::Left);
            b.parent = Some(id("ia_g"));
            scene.add_node(a);
            scene.add_node(b);
            Self {
                scene,
                selection: Selection::new(),
                config: InteractionConfig::default(),
            }
        }

        fn step(&self, mode: &Mode, event: InputEvent) -> Transition {
            step(
                mode,
                &event,
                View {
                    scene: &self.scene,
                    selection: &self.selection,
                    config: &self.config,
                },
            )
        }
    }

    #[test]
    fn port_beats_node() {
        let f = Fixture::new();
        // ia_a right port at (300, 120).
        let t = f.step(&Mode::Idle, InputEvent::pointer_down(300.0, 120.0, Modifiers::NONE));
        assert_eq!(
            t.mode,
            Mode::ConnectingDrag {
                origin: Endpoint { node: id("ia_a"), port: id("ia_a-R1") },
                cursor: Point::new(300.0, 120.0),
            }
        );
        assert!(t.effects.is_empty());
    }

    #[test]
    fn shift_overrides_everything() {
        let f = Fixture::new();
        let t = f.step(&Mode::Idle, InputEvent::pointer_down(300.0, 120.0, Modifiers::SHIFT));
        assert!(matches!(t.mode, Mode::AreaSelecting { .. }));
    }

    #[test]
    fn node_click_starts_drag() {
        let f = Fixture::new();
        let t = f.step(&Mode::Idle, InputEvent::pointer_down(150.0, 110.0, Modifiers::CTRL));
        assert_eq!(
            t.effects,
            vec![Effect::Click { target: EntityRef::Node(id("ia_a")), additive: true }]
        );
        assert!(matches!(t.mode, Mode::DraggingSelection { .. }));
    }

    #[test]
    fn group_click_when_no_node() {
        let f = Fixture::new();
        let t = f.step(&Mode::Idle, InputEvent::pointer_down(60.0, 300.0, Modifiers::NONE));
        assert_eq!(
            t.effects,
            vec![Effect::Click { target: EntityRef::Group(id("ia_g")), additive: false }]
        );
    }

    #[test]
    fn empty_canvas_pans_and_clears() {
        let f = Fixture::new();
        let t = f.step(&Mode::Idle, InputEvent::pointer_down(900.0, 900.0, Modifiers::NONE));
        assert_eq!(t.mode, Mode::Panning { last: Point::new(900.0, 900.0) });
        assert_eq!(t.effects, vec![Effect::ClearSelection]);

        let kept = f.step(&Mode::Idle, InputEvent::pointer_down(900.0, 900.0, Modifiers::CTRL));
        assert!(kept.effects.is_empty());

        let moved = f.step(&t.mode, InputEvent::pointer_move(910.0, 895.0));
        assert_eq!(moved.effects, vec![Effect::Pan(Vec2::new(10.0, -5.0))]);
    }

    #[test]
    fn resize_handle_needs_primary() {
        let mut f = Fixture::new();
        // ia_a is 200×40 → handle centred at (305, 145).
        let down = InputEvent::pointer_down(305.0, 145.0, Modifiers::NONE);
        assert!(!matches!(f.step(&Mode::Idle, down.clone()).mode, Mode::ResizingNode { .. }));

        f.selection.click(EntityRef::Node(id("ia_a")), false);
        let t = f.step(&Mode::Idle, down);
        assert_eq!(t.mode, Mode::ResizingNode { node: id("ia_a") });

        let narrow = f.step(&t.mode, InputEvent::pointer_move(120.0, 145.0));
        assert_eq!(narrow.effects, vec![Effect::ResizeNode { node: id("ia_a"), width: 100.0 }]);
        let wide = f.step(&t.mode, InputEvent::pointer_move(420.0, 145.0));
        assert_eq!(wide.effects, vec![Effect::ResizeNode { node: id("ia_a"), width: 320.0 }]);
    }

    #[test]
    fn group_resize_clamps_both_axes() {
        let f = Fixture::new();
        let mode = Mode::ResizingGroup { group: id("ia_g") };
        let t = f.step(&mode, InputEvent::pointer_move(60.0, 500.0));
        assert_eq!(
            t.effects,
            vec![Effect::ResizeGroup { group: id("ia_g"), width: 100.0, height: 450.0 }]
        );
    }

    #[test]
    fn connect_to_other_node_only() {
        let f = Fixture::new();
        let origin = Endpoint { node: id("ia_a"), port: id("ia_a-R1") };
        let mode = Mode::ConnectingDrag { origin, cursor: Point::ZERO };

        // ia_b left port at (400, 120).
        let t = f.step(&mode, InputEvent::pointer_up(402.0, 121.0));
        assert_eq!(
            t.effects,
            vec![Effect::Connect {
                from: origin,
                to: Endpoint { node: id("ia_b"), port: id("ia_b-L1") },
            }]
        );
        assert_eq!(t.mode, Mode::Idle);

        let same = f.step(&mode, InputEvent::pointer_up(300.0, 120.0));
        assert!(same.effects.is_empty());
        let nowhere = f.step(&mode, InputEvent::pointer_up(800.0, 800.0));
        assert!(nowhere.effects.is_empty());
        assert_eq!(nowhere.mode, Mode::Idle);
    }

    #[test]
    fn drop_reparents_grabbed_to_deepest_container() {
        let mut f = Fixture::new();
        f.selection.click(EntityRef::Node(id("ia_a")), false);
        let mode = Mode::DraggingSelection {
            grabbed: EntityRef::Node(id("ia_a")),
            last: Point::ZERO,
        };
        let t = f.step(&mode, InputEvent::pointer_up(0.0, 0.0));
        assert_eq!(
            t.effects,
            vec![Effect::Reparent { child: EntityRef::Node(id("ia_a")), parent: Some(id("ia_g")) }]
        );

        f.scene.translate_node(id("ia_a"), 1000.0, 0.0);
        let t = f.step(&mode, InputEvent::pointer_up(0.0, 0.0));
        assert_eq!(
            t.effects,
            vec![Effect::Reparent { child: EntityRef::Node(id("ia_a")), parent: None }]
        );
    }

    #[test]
    fn area_select_on_release() {
        let f = Fixture::new();
        let mode = Mode::AreaSelecting {
            anchor: Point::new(90.0, 90.0),
            current: Point::new(90.0, 90.0),
        };
        let t = f.step(&mode, InputEvent::pointer_up(320.0, 160.0));
        assert_eq!(
            t.effects,
            vec![Effect::ExtendSelection { nodes: vec![id("ia_a")], groups: vec![] }]
        );

        let zero = f.step(&mode, InputEvent::pointer_up(90.0, 90.0));
        assert!(zero.effects.is_empty());
    }
}
