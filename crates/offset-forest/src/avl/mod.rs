//! AVL engine with threaded in-order links.

mod tree;
mod types;

pub use tree::AvlTree;
pub use types::{AvlNode, Link};
