//! Stack-based in-order traversal.
//!
//! A [`FastEnumerator`] holds handles into the tree, so it only stays valid
//! while the tree is unchanged: it captures the tree's version and every
//! step compares it. Robust cursors live with each collection and re-query
//! the tree instead.

use std::cmp::Ordering;

use crate::engine::Engine;
use crate::error::{Result, TreeError};
use crate::types::{Offsets, TreeNode};

#[derive(Clone, Debug)]
pub struct FastEnumerator<O> {
    stack: Vec<(u32, O)>,
    version: u64,
    forward: bool,
}

impl<O: Offsets> FastEnumerator<O> {
    /// Starts at the first (forward) or last (backward) node.
    pub fn new<K, V, E>(tree: &E, forward: bool) -> Self
    where
        E: Engine<K, V, O>,
    {
        let edge = if forward {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        Self::starting_at(tree, forward, |_, _| edge)
    }

    /// Starts at the first node the probe does not place before the target
    /// (forward), or the last node it does not place after it (backward).
    ///
    /// `probe(node, abs)` orders the target against a node, as in
    /// [`Engine::find_by`].
    pub fn starting_at<K, V, E, P>(tree: &E, forward: bool, mut probe: P) -> Self
    where
        E: Engine<K, V, O>,
        P: FnMut(&E::Node, O) -> Ordering,
    {
        let mut stack = Vec::with_capacity(E::depth_bound(tree.count()) + 1);
        let mut curr = tree.root();
        let mut base = O::default();
        while let Some(n) = curr {
            let node = tree.node(n);
            let abs = base.add(node.offset());
            let order = probe(node, abs);
            curr = if forward {
                if order == Ordering::Greater {
                    node.right()
                } else {
                    stack.push((n, abs));
                    node.left()
                }
            } else if order == Ordering::Less {
                node.left()
            } else {
                stack.push((n, abs));
                node.right()
            };
            base = abs;
        }
        Self {
            stack,
            version: tree.version(),
            forward,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Node the next call will return, without advancing.
    pub fn peek(&self) -> Option<(u32, O)> {
        self.stack.last().copied()
    }

    /// Returns the next handle and its absolute offsets.
    pub fn next_entry<K, V, E>(&mut self, tree: &E) -> Result<Option<(u32, O)>>
    where
        E: Engine<K, V, O>,
    {
        if tree.version() != self.version {
            tracing::trace!(
                captured = self.version,
                current = tree.version(),
                "fast enumerator invalidated"
            );
            return Err(TreeError::StaleEnumerator);
        }
        let Some((n, abs)) = self.stack.pop() else {
            return Ok(None);
        };
        let node = tree.node(n);
        let mut curr = if self.forward {
            node.right()
        } else {
            node.left()
        };
        let mut base = abs;
        while let Some(c) = curr {
            let child = tree.node(c);
            let c_abs = base.add(child.offset());
            self.stack.push((c, c_abs));
            curr = if self.forward {
                child.left()
            } else {
                child.right()
            };
            base = c_abs;
        }
        Ok(Some((n, abs)))
    }
}

/// Fast enumerator that also reports where the following node starts, for
/// collections whose element length is the distance to the successor.
#[derive(Clone, Debug)]
pub(crate) struct SpanEnumerator<O> {
    inner: FastEnumerator<O>,
    following: Option<O>,
}

impl<O: Offsets> SpanEnumerator<O> {
    pub(crate) fn new(inner: FastEnumerator<O>) -> Self {
        Self {
            inner,
            following: None,
        }
    }

    /// Returns `(handle, start, end)`. [`Engine::successor`] is only
    /// consulted for the first node of a backward traversal.
    pub(crate) fn next_span<K, V, E>(&mut self, tree: &E, extent: O) -> Result<Option<(u32, O, O)>>
    where
        E: Engine<K, V, O>,
    {
        let Some((n, start)) = self.inner.next_entry(tree)? else {
            return Ok(None);
        };
        let end = if self.inner.is_forward() {
            self.inner.peek().map_or(extent, |(_, abs)| abs)
        } else {
            self.following.unwrap_or_else(|| {
                tree.successor(n, start).map_or(extent, |(_, abs)| abs)
            })
        };
        self.following = Some(start);
        Ok(Some((n, start, end)))
    }
}
