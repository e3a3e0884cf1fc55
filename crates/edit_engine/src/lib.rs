//! Edit Engine - Undoable commands, history and the tree editor
//!
//! This crate turns the stateless edits of `field_tree` into undoable
//! commands, keeps them in a linear undo/redo history and exposes the named
//! editing actions through [`TreeEditor`].

mod attribute_commands;
mod command;
mod editor;
mod error;
mod observer;
mod settings;
mod structure_commands;
mod undo;

pub use attribute_commands::*;
pub use command::*;
pub use editor::*;
pub use error::*;
pub use observer::*;
pub use settings::*;
pub use structure_commands::*;
pub use undo::*;
