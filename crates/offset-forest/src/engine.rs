//! Contract between the collections and the two balancing engines.
//!
//! Collections never look at balance metadata. They hand the engine a
//! `probe` closure that compares the sought key or position with a node
//! (receiving the node and its absolute offsets) and let the engine descend,
//! splice and rebalance.

use std::cmp::Ordering;

use crate::arena::NodeArena;
use crate::config::TreeConfig;
use crate::error::Result;
use crate::types::{Nearest, Offsets, Side, TreeNode};

pub trait Engine<K, V, O: Offsets>: Sized {
    type Node: TreeNode<Key = K, Value = V, Offset = O>;

    fn with_config(config: TreeConfig) -> Self;

    fn arena(&self) -> &NodeArena<Self::Node>;

    fn root(&self) -> Option<u32>;

    fn count(&self) -> u32;

    /// Incremented by every structural change; fast enumerators compare it.
    fn version(&self) -> u64;

    /// Links a new node whose absolute offsets are `at`.
    ///
    /// `probe(key, node, abs)` orders the new key against an existing node.
    /// `Equal` descends right: callers rule out duplicates beforehand.
    fn insert_by<P>(&mut self, key: K, value: V, at: O, probe: P) -> Result<u32>
    where
        P: FnMut(&K, &Self::Node, O) -> Ordering;

    /// Unlinks the node for which `probe` returns `Equal` and hands back its
    /// key, value and absolute offsets.
    fn remove_by<P>(&mut self, probe: P) -> Option<(K, V, O)>
    where
        P: FnMut(&Self::Node, O) -> Ordering;

    fn value_mut(&mut self, handle: u32) -> &mut V;

    /// See [`crate::offset::shift_right_of_path`]. Counts as a structural
    /// change.
    fn shift_right_of_path(&mut self, side: Side, at: i64, adjust: O);

    fn clear(&mut self);

    /// Largest height a valid tree of `count` nodes can reach.
    fn depth_bound(count: u32) -> usize;

    /// Full structural check: ordering of offsets, balance, threads, depth
    /// and allocator bookkeeping.
    fn assert_valid(&self) -> Result<(), String>;

    fn node(&self, handle: u32) -> &Self::Node {
        &self.arena()[handle]
    }

    fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    fn find_by<P>(&self, mut probe: P) -> Option<(u32, O)>
    where
        P: FnMut(&Self::Node, O) -> Ordering,
    {
        let arena = self.arena();
        let mut curr = self.root();
        let mut base = O::default();
        while let Some(n) = curr {
            let node = &arena[n];
            let abs = base.add(node.offset());
            curr = match probe(node, abs) {
                Ordering::Equal => return Some((n, abs)),
                Ordering::Less => node.left(),
                Ordering::Greater => node.right(),
            };
            base = abs;
        }
        None
    }

    /// Single descent keeping the best candidate seen so far.
    fn nearest_by<P>(&self, mut probe: P, nearest: Nearest) -> Option<(u32, O)>
    where
        P: FnMut(&Self::Node, O) -> Ordering,
    {
        let arena = self.arena();
        let mut best = None;
        let mut curr = self.root();
        let mut base = O::default();
        while let Some(n) = curr {
            let node = &arena[n];
            let abs = base.add(node.offset());
            let order = probe(node, abs);
            if order == Ordering::Equal
                && matches!(nearest, Nearest::LessOrEqual | Nearest::GreaterOrEqual)
            {
                return Some((n, abs));
            }
            curr = match nearest {
                Nearest::Less | Nearest::LessOrEqual => {
                    if order == Ordering::Greater {
                        best = Some((n, abs));
                        node.right()
                    } else {
                        node.left()
                    }
                }
                Nearest::Greater | Nearest::GreaterOrEqual => {
                    if order == Ordering::Less {
                        best = Some((n, abs));
                        node.left()
                    } else {
                        node.right()
                    }
                }
            };
            base = abs;
        }
        best
    }

    /// In-order successor of `handle`, whose absolute offsets are `abs`.
    ///
    /// The default descends from the root by position on the X axis, so it
    /// needs positional offsets. Engines with successor links override it.
    fn successor(&self, _handle: u32, abs: O) -> Option<(u32, O)> {
        let target = abs.axis(Side::X);
        self.nearest_by(move |_, a| target.cmp(&a.axis(Side::X)), Nearest::Greater)
    }

    fn first(&self) -> Option<(u32, O)> {
        self.nearest_by(|_, _| Ordering::Less, Nearest::Greater)
    }

    fn last(&self) -> Option<(u32, O)> {
        self.nearest_by(|_, _| Ordering::Greater, Nearest::Less)
    }
}

/// AVL height bound, `1.4405 * log2(n + 2)`.
pub(crate) fn avl_depth_bound(count: u32) -> usize {
    (1.4405 * (f64::from(count) + 2.0).log2()).ceil() as usize
}

/// Red-black height bound, `2 * log2(n + 1)`.
pub(crate) fn rb_depth_bound(count: u32) -> usize {
    (2.0 * (f64::from(count) + 1.0).log2()).ceil() as usize
}
