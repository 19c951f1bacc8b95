//! Non-invasive structural inspection.
//!
//! Validators and tests walk raw nodes through this module. Collections
//! behave identically whether or not it is ever used.

use crate::engine::Engine;
use crate::types::{Offsets, Side, TreeNode};

/// Balance metadata of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Balance {
    /// Right height minus left height.
    Avl(i8),
    RedBlack { black: bool },
}

pub trait Inspect<K, V, O: Offsets>: Engine<K, V, O> {
    fn balance_of(&self, handle: u32) -> Balance;

    /// Number of nodes on the longest root-to-leaf path.
    fn height(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(u32, usize)> = self.root().map(|r| (r, 1)).into_iter().collect();
        while let Some((n, depth)) = stack.pop() {
            max = max.max(depth);
            let node = self.node(n);
            stack.extend(node.left().map(|c| (c, depth + 1)));
            stack.extend(node.right().map(|c| (c, depth + 1)));
        }
        max
    }

    /// Handles and absolute offsets in order.
    fn in_order(&self) -> Vec<(u32, O)> {
        let mut out = Vec::with_capacity(self.count() as usize);
        let mut stack: Vec<(u32, O)> = Vec::new();
        let mut curr = self.root();
        let mut base = O::default();
        loop {
            while let Some(n) = curr {
                let abs = base.add(self.node(n).offset());
                stack.push((n, abs));
                curr = self.node(n).left();
                base = abs;
            }
            let Some((n, abs)) = stack.pop() else {
                return out;
            };
            out.push((n, abs));
            curr = self.node(n).right();
            base = abs;
        }
    }
}

/// Checks the engine-independent invariants: strictly increasing positions
/// on every axis, count against reachable nodes and live allocations, and
/// the depth bound.
pub(crate) fn check_common<K, V, O, E>(tree: &E) -> Result<Vec<(u32, O)>, String>
where
    O: Offsets,
    E: Inspect<K, V, O>,
{
    let arena = tree.arena();
    let mut reached = 0usize;
    let mut stack: Vec<u32> = tree.root().into_iter().collect();
    while let Some(n) = stack.pop() {
        let Some(node) = arena.get(n) else {
            return Err(format!("reachable handle {n} refers to a vacant slot"));
        };
        reached += 1;
        if reached > arena.slot_count() {
            return Err(format!("cycle through node {n}"));
        }
        stack.extend(node.left());
        stack.extend(node.right());
    }

    let nodes = tree.in_order();
    if nodes.len() != tree.count() as usize {
        return Err(format!(
            "count {} but {} reachable nodes",
            tree.count(),
            nodes.len()
        ));
    }
    if tree.arena().live() != tree.count() {
        return Err(format!(
            "count {} but {} live allocations",
            tree.count(),
            tree.arena().live()
        ));
    }
    if let Some(root) = tree.root() {
        let first = nodes.first().map(|&(_, abs)| abs);
        if first.is_some_and(|abs| (0..O::AXES).any(|i| abs.axis(axis_side(i)) < 0)) {
            return Err(format!("negative first position below root {root}"));
        }
    }
    for pair in nodes.windows(2) {
        let (a, pa) = pair[0];
        let (b, pb) = pair[1];
        for i in 0..O::AXES {
            let side = axis_side(i);
            if pa.axis(side) >= pb.axis(side) {
                return Err(format!(
                    "offset order violated on {side:?} between nodes {a} and {b}: {} >= {}",
                    pa.axis(side),
                    pb.axis(side)
                ));
            }
        }
    }
    let height = tree.height();
    let bound = E::depth_bound(tree.count());
    if height > bound {
        return Err(format!(
            "height {height} exceeds bound {bound} for {} nodes",
            tree.count()
        ));
    }
    Ok(nodes)
}

fn axis_side(i: usize) -> Side {
    if i == 0 {
        Side::X
    } else {
        Side::Y
    }
}
