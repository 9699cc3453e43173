pub mod clipboard;
pub mod commands;
pub mod config;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod viewport;

pub use clipboard::{ClipKind, Clipboard};
pub use commands::CommandStack;
pub use config::InteractionConfig;
pub use input::{InputEvent, Modifiers};
pub use interaction::{Effect, Mode, Transition, View, step};
pub use selection::Selection;
pub use session::Session;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use viewport::Viewport;
