//! Offset maintenance shared by both engines.
//!
//! A node's absolute position is `parent absolute + node offset`, the root
//! being measured from zero. Structural primitives rewrite offsets in the same
//! step that changes a parent; [`shift_right_of_path`] moves a whole suffix of
//! the in-order sequence without touching the shape of the tree.

use crate::arena::NodeArena;
use crate::types::{Offsets, Side, TreeNode};

/// Adds `adjust` to the absolute position of every node whose position on
/// `side` is at or after `at`.
///
/// Only nodes on the root-to-`at` path are written: a node's offset changes
/// when its shift status differs from its parent's, which keeps every
/// unvisited subtree consistent with its (possibly moved) root.
pub fn shift_right_of_path<N>(
    arena: &mut NodeArena<N>,
    root: Option<u32>,
    side: Side,
    at: i64,
    adjust: N::Offset,
) where
    N: TreeNode,
{
    let mut curr = root;
    let mut parent_abs = N::Offset::default();
    let mut parent_shifted = false;
    while let Some(n) = curr {
        let offset = arena[n].offset();
        let abs = parent_abs.add(offset);
        let pos = abs.axis(side);
        let shifted = pos >= at;
        if shifted != parent_shifted {
            arena[n].set_offset(if shifted {
                offset.add(adjust)
            } else {
                offset.sub(adjust)
            });
        }
        if pos == at {
            // Everything left of an exact hit stays put.
            if let Some(l) = arena[n].left() {
                let l_offset = arena[l].offset();
                arena[l].set_offset(l_offset.sub(adjust));
            }
            return;
        }
        parent_abs = abs;
        parent_shifted = shifted;
        curr = if shifted {
            arena[n].left()
        } else {
            arena[n].right()
        };
    }
}

/// Absolute position of `node`, given the absolute position of its parent.
#[inline]
pub(crate) fn absolute<N: TreeNode>(
    arena: &NodeArena<N>,
    parent_abs: N::Offset,
    node: u32,
) -> N::Offset {
    parent_abs.add(arena[node].offset())
}
