//! Lint diagnostics for diagram documents.
//!
//! Reports structural issues without modifying the scene. Load and import
//! log every finding; nothing here is fatal because the scene tolerates
//! dangling references at draw and hit-test time.

use crate::id::Id;
use crate::model::EntityRef;
use crate::scene::SceneGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Breaks an invariant the editor relies on.
    Error,
    /// Tolerated, but probably a leftover from a hand-edited file.
    Warning,
}

/// A single lint diagnostic.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    /// The entity this diagnostic refers to.
    pub subject: Id,
    /// Human-readable message.
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "dangling-connection").
    pub rule: &'static str,
}

// ─── Public API ───────────────────────────────────────────────────────────

/// Run all lint rules over the scene and return diagnostics.
#[must_use]
pub fn lint_document(scene: &SceneGraph) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_dangling_connections(scene, &mut diags);
    lint_membership(scene, &mut diags);
    lint_port_ids(scene, &mut diags);
    lint_containment_cycles(scene, &mut diags);
    diags
}

// ─── Rules ────────────────────────────────────────────────────────────────

/// Connections whose node or port no longer exists are inert.
fn lint_dangling_connections(scene: &SceneGraph, diags: &mut Vec<LintDiagnostic>) {
    for conn in scene.connections.values() {
        for end in [conn.from, conn.to] {
            let problem = match scene.node(end.node) {
                None => Some(format!("node `{}`", end.node)),
                Some(n) if n.port(end.port).is_none() => Some(format!("port `{}`", end.port)),
                Some(_) => None,
            };
            if let Some(what) = problem {
                diags.push(LintDiagnostic {
                    subject: conn.id,
                    message: format!("Connection `{}` references missing {what}.", conn.id),
                    severity: LintSeverity::Warning,
                    rule: "dangling-connection",
                });
            }
        }
    }
}

/// Both sides of the parent/child relation must agree.
fn lint_membership(scene: &SceneGraph, diags: &mut Vec<LintDiagnostic>) {
    for group in scene.groups.values() {
        for child in &group.children {
            if !scene.contains(*child) {
                diags.push(LintDiagnostic {
                    subject: group.id,
                    message: format!("Group `{}` lists missing child `{}`.", group.id, child.id()),
                    severity: LintSeverity::Warning,
                    rule: "missing-child",
                });
            } else if scene.parent_of(*child) != Some(group.id) {
                diags.push(LintDiagnostic {
                    subject: child.id(),
                    message: format!(
                        "`{}` is listed in group `{}` but its parent is {:?}.",
                        child.id(),
                        group.id,
                        scene.parent_of(*child)
                    ),
                    severity: LintSeverity::Error,
                    rule: "membership-mismatch",
                });
            }
        }
    }

    let entities = scene
        .nodes
        .values()
        .map(|n| (EntityRef::Node(n.id), n.parent))
        .chain(scene.groups.values().map(|g| (EntityRef::Group(g.id), g.parent)));
    for (entity, parent) in entities {
        let Some(parent) = parent else { continue };
        match scene.group(parent) {
            None => diags.push(LintDiagnostic {
                subject: entity.id(),
                message: format!("`{}` points at missing parent group `{parent}`.", entity.id()),
                severity: LintSeverity::Warning,
                rule: "missing-parent",
            }),
            Some(g) if !g.has_child(entity) => diags.push(LintDiagnostic {
                subject: entity.id(),
                message: format!("`{}` names `{parent}` as parent but is not among its children.", entity.id()),
                severity: LintSeverity::Error,
                rule: "membership-mismatch",
            }),
            Some(_) => {}
        }
    }
}

/// Import and paste re-derive port ids from `{nodeId}-{name}`.
fn lint_port_ids(scene: &SceneGraph, diags: &mut Vec<LintDiagnostic>) {
    for node in scene.nodes.values() {
        for (_, port) in node.all_ports() {
            if port.id != Id::port(node.id, &port.name) {
                diags.push(LintDiagnostic {
                    subject: port.id,
                    message: format!(
                        "Port `{}` on `{}` should be `{}-{}`; connections to it will not survive import.",
                        port.id, node.id, node.id, port.name
                    ),
                    severity: LintSeverity::Warning,
                    rule: "port-id",
                });
            }
        }
    }
}

/// Group parent chains must be acyclic.
fn lint_containment_cycles(scene: &SceneGraph, diags: &mut Vec<LintDiagnostic>) {
    let mut graph: DiGraphMap<Id, ()> = DiGraphMap::new();
    for group in scene.groups.values() {
        graph.add_node(group.id);
        if let Some(parent) = group.parent.filter(|p| scene.groups.contains_key(p)) {
            graph.add_edge(parent, group.id, ());
        }
    }
    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1 || graph.contains_edge(component[0], component[0]);
        if !cyclic {
            continue;
        }
        for id in &component {
            diags.push(LintDiagnostic {
                subject: *id,
                message: format!("Group `{id}` is its own ancestor."),
                severity: LintSeverity::Error,
                rule: "containment-cycle",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, Endpoint, Group, Node, Side};

    fn rules(scene: &SceneGraph) -> Vec<&'static str> {
        lint_document(scene).into_iter().map(|d| d.rule).collect()
    }

    #[test]
    fn clean_scene_has_no_diags() {
        let mut scene = SceneGraph::new();
        scene.add_group(Group::new(Id::intern("lint_g"), 0.0, 0.0));
        let mut a = Node::new(Id::intern("lint_a"), 0.0, 0.0);
        a.parent = Some(Id::intern("lint_g"));
        a.add_port(Side::Right);
        let mut b = Node::new(Id::intern("lint_b"), 300.0, 0.0);
        b.add_port(Side::Left);
        scene.add_node(a);
        scene.add_node(b);
        scene.connect(
            Id::intern("lint_c"),
            Endpoint { node: Id::intern("lint_a"), port: Id::intern("lint_a-R1") },
            Endpoint { node: Id::intern("lint_b"), port: Id::intern("lint_b-L1") },
        );
        assert!(lint_document(&scene).is_empty());
    }

    #[test]
    fn dangling_connection() {
        let mut scene = SceneGraph::new();
        scene.add_node(Node::new(Id::intern("lint_only"), 0.0, 0.0));
        scene.add_connection(Connection::new(
            Id::intern("lint_dc"),
            Endpoint { node: Id::intern("lint_only"), port: Id::intern("lint_only-R9") },
            Endpoint { node: Id::intern("lint_gone"), port: Id::intern("lint_gone-L1") },
        ));
        assert_eq!(rules(&scene), vec!["dangling-connection", "dangling-connection"]);
    }

    #[test]
    fn membership_and_parent_rules() {
        let mut scene = SceneGraph::new();
        scene.add_group(Group::new(Id::intern("lint_m"), 0.0, 0.0));
        scene.add_node(Node::new(Id::intern("lint_stray"), 0.0, 0.0));
        let g = scene.group_mut(Id::intern("lint_m")).unwrap();
        g.children.push(EntityRef::Node(Id::intern("lint_stray")));
        g.children.push(EntityRef::Node(Id::intern("lint_nobody")));
        let mut lost = Node::new(Id::intern("lint_lost"), 0.0, 0.0);
        lost.parent = Some(Id::intern("lint_void"));
        scene.nodes.insert(lost.id, lost);

        assert_eq!(
            rules(&scene),
            vec!["membership-mismatch", "missing-child", "missing-parent"]
        );
    }

    #[test]
    fn bad_port_id() {
        let mut scene = SceneGraph::new();
        let mut n = Node::new(Id::intern("lint_p"), 0.0, 0.0);
        n.add_port(Side::Top);
        n.top_ports[0].id = Id::intern("random-token");
        scene.add_node(n);
        assert_eq!(rules(&scene), vec!["port-id"]);
    }

    #[test]
    fn containment_cycle() {
        let mut scene = SceneGraph::new();
        let mut a = Group::new(Id::intern("lint_ca"), 0.0, 0.0);
        let mut b = Group::new(Id::intern("lint_cb"), 0.0, 0.0);
        a.parent = Some(b.id);
        b.parent = Some(a.id);
        a.children.push(EntityRef::Group(b.id));
        b.children.push(EntityRef::Group(a.id));
        scene.groups.insert(a.id, a);
        scene.groups.insert(b.id, b);
        assert_eq!(rules(&scene), vec!["containment-cycle", "containment-cycle"]);
    }
}
