//! Top-down red-black engine.
//!
//! Insert splits 4-nodes and delete fixes 2-nodes during a single descent,
//! so neither needs parent pointers nor a second bottom-up pass.

mod tree;
mod types;

pub use tree::RbTree;
pub use types::RbNode;
