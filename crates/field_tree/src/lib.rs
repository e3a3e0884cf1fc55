//! Field Tree - ordered tree of form fields
//!
//! This crate provides the data model of the field editor: an ordered n-ary
//! tree of attribute bags with stable node ids, the selection model, and the
//! stateless structural and attribute edit algorithms that the edit engine
//! records as undoable commands.

mod attributes;
mod error;
pub mod locking;
pub mod mutator;
mod node;
mod node_id;
mod selection;
mod tree;
pub mod values;

pub use attributes::*;
pub use error::*;
pub use locking::LockLevel;
pub use mutator::{Insertion, Removal, RunMove, SiblingRun};
pub use node::*;
pub use node_id::*;
pub use selection::*;
pub use tree::*;
pub use values::AttributeChange;
