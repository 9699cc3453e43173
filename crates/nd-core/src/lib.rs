pub mod color;
pub mod document;
pub mod error;
pub mod geometry;
pub mod id;
pub mod lint;
pub mod model;
pub mod remap;
pub mod scene;

pub use color::Color;
pub use document::{Document, Imported, encode_snapshot, restore_snapshot};
pub use error::{DocumentError, Result};
pub use geometry::Anchor;
pub use id::{Id, IdGenerator, SequentialIds, UuidIds};
pub use lint::{LintDiagnostic, LintSeverity, lint_document};
pub use model::*;
pub use remap::IdRemap;
pub use scene::{Reparent, SceneGraph};

// Re-export kurbo types so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Vec2};
