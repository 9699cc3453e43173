//! Load diagram documents and print a summary plus lint findings.
//!
//! ```text
//! RUST_LOG=debug cargo run -p nd-core --example inspect_document -- office.json
//! ```

use nd_core::{EntityRef, SceneGraph, lint_document};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let paths: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: inspect_document <file.json>...");
        return ExitCode::FAILURE;
    }

    let mut failed = false;
    for path in &paths {
        let json = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failed = true;
                continue;
            }
        };
        let mut scene = SceneGraph::new();
        if let Err(e) = scene.load(&json) {
            eprintln!("{}: {e}", path.display());
            failed = true;
            continue;
        }

        println!("{}: {}", path.display(), scene.title);
        println!(
            "  {} node(s), {} group(s), {} connection(s)",
            scene.nodes.len(),
            scene.groups.len(),
            scene.connections.len()
        );
        for group in scene.groups.values().filter(|g| g.parent.is_none()) {
            print_group(&scene, group.id, 1);
        }
        let diags = lint_document(&scene);
        for d in &diags {
            println!("  {:?} [{}] {}", d.severity, d.rule, d.message);
        }
        failed |= !diags.is_empty();
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_group(scene: &SceneGraph, id: nd_core::Id, depth: usize) {
    let Some(group) = scene.group(id) else { return };
    let indent = "  ".repeat(depth);
    println!("{indent}[{}] {}", group.id, group.label);
    for child in &group.children {
        match *child {
            EntityRef::Node(n) => {
                if let Some(node) = scene.node(n) {
                    println!("{indent}  {} {} ({})", node.id, node.label, node.classification);
                }
            }
            EntityRef::Group(g) => print_group(scene, g, depth + 1),
        }
    }
}
