use std::cmp::Ordering;

use crate::arena::NodeArena;
use crate::config::TreeConfig;
use crate::engine::{avl_depth_bound, Engine};
use crate::error::Result;
use crate::inspect::{check_common, Balance, Inspect};
use crate::offset;
use crate::types::{Offsets, Side, TreeNode};

use super::types::{AvlNode, Link};

/// One ancestor on the descent path and the side the descent took below it.
#[derive(Clone, Copy, Debug)]
struct Step {
    node: u32,
    left: bool,
}

/// Threaded AVL tree over arena nodes.
///
/// There are no parent pointers: insert and delete record the descent in a
/// path buffer that is kept between calls to avoid reallocating it.
#[derive(Clone, Debug)]
pub struct AvlTree<K, V, O> {
    arena: NodeArena<AvlNode<K, V, O>>,
    root: Option<u32>,
    count: u32,
    version: u64,
    path: Vec<Step>,
}

impl<K, V, O: Offsets> Default for AvlTree<K, V, O> {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K, V, O: Offsets> AvlTree<K, V, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-order successor handle. See [`Engine::successor`] for the variant
    /// that also reports offsets.
    pub fn next(&self, handle: u32) -> Option<u32> {
        match self.arena[handle].right {
            Link::Thread(t) => t,
            Link::Child(c) => Some(self.leftmost(c)),
        }
    }

    /// In-order predecessor handle.
    pub fn prev(&self, handle: u32) -> Option<u32> {
        match self.arena[handle].left {
            Link::Thread(t) => t,
            Link::Child(c) => Some(self.rightmost(c)),
        }
    }

    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn leftmost(&self, mut n: u32) -> u32 {
        while let Link::Child(l) = self.arena[n].left {
            n = l;
        }
        n
    }

    fn rightmost(&self, mut n: u32) -> u32 {
        while let Link::Child(r) = self.arena[n].right {
            n = r;
        }
        n
    }

    /// Points the slot `parent` descended through (or the root) at `child`.
    fn set_child(&mut self, parent: Option<Step>, child: u32) {
        match parent {
            None => self.root = Some(child),
            Some(Step { node, left: true }) => self.arena[node].left = Link::Child(child),
            Some(Step { node, left: false }) => self.arena[node].right = Link::Child(child),
        }
    }

    fn rotate_left(&mut self, n: u32) -> u32 {
        let r = self.arena[n]
            .right
            .child()
            .expect("left rotation needs a right child");
        let n_offset = self.arena[n].offset;
        let r_offset = self.arena[r].offset;
        match self.arena[r].left {
            Link::Child(rl) => {
                self.arena[rl].offset = self.arena[rl].offset.add(r_offset);
                self.arena[n].right = Link::Child(rl);
            }
            Link::Thread(_) => self.arena[n].right = Link::Thread(Some(r)),
        }
        self.arena[r].left = Link::Child(n);
        self.arena[n].offset = r_offset.neg();
        self.arena[r].offset = r_offset.add(n_offset);

        let nb = self.arena[n].balance - 1 - self.arena[r].balance.max(0);
        let rb = self.arena[r].balance - 1 + nb.min(0);
        self.arena[n].balance = nb;
        self.arena[r].balance = rb;
        r
    }

    fn rotate_right(&mut self, n: u32) -> u32 {
        let l = self.arena[n]
            .left
            .child()
            .expect("right rotation needs a left child");
        let n_offset = self.arena[n].offset;
        let l_offset = self.arena[l].offset;
        match self.arena[l].right {
            Link::Child(lr) => {
                self.arena[lr].offset = self.arena[lr].offset.add(l_offset);
                self.arena[n].left = Link::Child(lr);
            }
            Link::Thread(_) => self.arena[n].left = Link::Thread(Some(l)),
        }
        self.arena[l].right = Link::Child(n);
        self.arena[n].offset = l_offset.neg();
        self.arena[l].offset = l_offset.add(n_offset);

        let nb = self.arena[n].balance + 1 - self.arena[l].balance.min(0);
        let lb = self.arena[l].balance + 1 + nb.max(0);
        self.arena[n].balance = nb;
        self.arena[l].balance = lb;
        l
    }

    /// Restores balance at a node whose factor reached ±2 and returns the new
    /// subtree root. The caller relinks it.
    fn rebalance(&mut self, n: u32) -> u32 {
        tracing::trace!(node = n, balance = self.arena[n].balance, "avl rotation");
        if self.arena[n].balance > 0 {
            let r = self.arena[n].right.child().expect("right-heavy node");
            if self.arena[r].balance < 0 {
                let top = self.rotate_right(r);
                self.arena[n].right = Link::Child(top);
            }
            self.rotate_left(n)
        } else {
            let l = self.arena[n].left.child().expect("left-heavy node");
            if self.arena[l].balance > 0 {
                let top = self.rotate_left(l);
                self.arena[n].left = Link::Child(top);
            }
            self.rotate_right(n)
        }
    }

    fn retrace_insert(&mut self, path: &[Step]) {
        for i in (0..path.len()).rev() {
            let Step { node, left } = path[i];
            let balance = self.arena[node].balance + if left { -1 } else { 1 };
            self.arena[node].balance = balance;
            match balance {
                0 => return,
                -1 | 1 => {}
                _ => {
                    let top = self.rebalance(node);
                    self.set_child(i.checked_sub(1).map(|p| path[p]), top);
                    return;
                }
            }
        }
    }

    fn retrace_remove(&mut self, path: &[Step]) {
        for i in (0..path.len()).rev() {
            let Step { node, left } = path[i];
            let balance = self.arena[node].balance + if left { 1 } else { -1 };
            self.arena[node].balance = balance;
            match balance {
                -1 | 1 => return,
                0 => {}
                _ => {
                    let heavy = if balance > 0 {
                        self.arena[node].right
                    } else {
                        self.arena[node].left
                    };
                    let heavy = heavy.child().expect("heavy side has a child");
                    let height_kept = self.arena[heavy].balance == 0;
                    let top = self.rebalance(node);
                    self.set_child(i.checked_sub(1).map(|p| path[p]), top);
                    if height_kept {
                        return;
                    }
                }
            }
        }
    }

    /// Unlinks `n` (absolute `n_abs`) given the descent path down to its
    /// parent. Extends `path` with the ancestors whose subtree shrank.
    fn splice_out(&mut self, n: u32, n_abs: O, path: &mut Vec<Step>) {
        let parent = path.last().copied();
        let (n_left, n_right, n_offset) = {
            let node = &self.arena[n];
            (node.left, node.right, node.offset)
        };
        match (n_left, n_right) {
            (Link::Thread(_), Link::Thread(_)) => match parent {
                None => self.root = None,
                Some(Step { node, left: true }) => self.arena[node].left = n_left,
                Some(Step { node, left: false }) => self.arena[node].right = n_right,
            },
            (Link::Child(l), Link::Thread(_)) => {
                let m = self.rightmost(l);
                self.arena[m].right = n_right;
                self.arena[l].offset = self.arena[l].offset.add(n_offset);
                self.set_child(parent, l);
            }
            (Link::Thread(_), Link::Child(r)) => {
                let m = self.leftmost(r);
                self.arena[m].left = n_left;
                self.arena[r].offset = self.arena[r].offset.add(n_offset);
                self.set_child(parent, r);
            }
            (Link::Child(l), Link::Child(r)) => {
                // The successor takes n's place; its step is patched below.
                let slot = path.len();
                path.push(Step {
                    node: n,
                    left: false,
                });
                let r_abs = n_abs.add(self.arena[r].offset);
                let mut s = r;
                let mut s_abs = r_abs;
                while let Link::Child(sl) = self.arena[s].left {
                    path.push(Step { node: s, left: true });
                    s_abs = s_abs.add(self.arena[sl].offset);
                    s = sl;
                }
                let m = self.rightmost(l);
                self.arena[m].right = Link::Thread(Some(s));
                if s != r {
                    let sp = path.last().expect("successor below r has a parent").node;
                    let s_offset = self.arena[s].offset;
                    self.arena[sp].left = match self.arena[s].right {
                        Link::Child(sr) => {
                            self.arena[sr].offset = self.arena[sr].offset.add(s_offset);
                            Link::Child(sr)
                        }
                        Link::Thread(_) => Link::Thread(Some(s)),
                    };
                    self.arena[s].right = Link::Child(r);
                    self.arena[r].offset = r_abs.sub(s_abs);
                }
                self.arena[l].offset = n_abs.add(self.arena[l].offset).sub(s_abs);
                self.arena[s].left = Link::Child(l);
                self.arena[s].balance = self.arena[n].balance;
                self.arena[s].offset = s_abs.sub(n_abs.sub(n_offset));
                path[slot].node = s;
                self.set_child(parent, s);
            }
        }
    }

    fn check_threads(&self, nodes: &[(u32, O)]) -> Result<(), String> {
        for (i, &(n, _)) in nodes.iter().enumerate() {
            let node = &self.arena[n];
            let prev = i.checked_sub(1).map(|p| nodes[p].0);
            let next = nodes.get(i + 1).map(|&(h, _)| h);
            if let Link::Thread(t) = node.left {
                if t != prev {
                    return Err(format!("node {n}: left thread {t:?}, predecessor {prev:?}"));
                }
            }
            if let Link::Thread(t) = node.right {
                if t != next {
                    return Err(format!("node {n}: right thread {t:?}, successor {next:?}"));
                }
            }
        }
        Ok(())
    }

    /// Returns the measured height of the subtree at `n`.
    fn check_balance(&self, n: Option<u32>) -> Result<i32, String> {
        let Some(n) = n else {
            return Ok(0);
        };
        let node = &self.arena[n];
        let lh = self.check_balance(node.left.child())?;
        let rh = self.check_balance(node.right.child())?;
        let measured = rh - lh;
        if i32::from(node.balance) != measured {
            return Err(format!(
                "node {n}: balance {} but heights differ by {measured}",
                node.balance
            ));
        }
        if measured.abs() > 1 {
            return Err(format!("node {n} is out of balance: {measured}"));
        }
        Ok(1 + lh.max(rh))
    }
}

impl<K, V, O: Offsets> Engine<K, V, O> for AvlTree<K, V, O> {
    type Node = AvlNode<K, V, O>;

    fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(config),
            root: None,
            count: 0,
            version: 0,
            path: Vec::new(),
        }
    }

    fn arena(&self) -> &NodeArena<Self::Node> {
        &self.arena
    }

    fn root(&self) -> Option<u32> {
        self.root
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn insert_by<P>(&mut self, key: K, value: V, at: O, mut probe: P) -> Result<u32>
    where
        P: FnMut(&K, &Self::Node, O) -> Ordering,
    {
        self.arena.check_available()?;
        self.bump_version();
        let Some(root) = self.root else {
            let leaf = AvlNode::leaf(key, value, at, Link::Thread(None), Link::Thread(None));
            let h = self.arena.allocate(leaf)?;
            self.root = Some(h);
            self.count += 1;
            return Ok(h);
        };

        let mut path = std::mem::take(&mut self.path);
        path.clear();
        let mut curr = root;
        let mut abs = self.arena[root].offset;
        loop {
            let node = &self.arena[curr];
            let left = probe(&key, node, abs) == Ordering::Less;
            path.push(Step { node: curr, left });
            let link = if left { node.left } else { node.right };
            match link {
                Link::Child(c) => {
                    abs = offset::absolute(&self.arena, abs, c);
                    curr = c;
                }
                Link::Thread(_) => break,
            }
        }

        let Step { node: parent, left } = *path.last().expect("descent visits the root");
        let leaf = if left {
            AvlNode::leaf(
                key,
                value,
                at.sub(abs),
                self.arena[parent].left,
                Link::Thread(Some(parent)),
            )
        } else {
            AvlNode::leaf(
                key,
                value,
                at.sub(abs),
                Link::Thread(Some(parent)),
                self.arena[parent].right,
            )
        };
        let h = match self.arena.allocate(leaf) {
            Ok(h) => h,
            Err(err) => {
                self.path = path;
                return Err(err);
            }
        };
        if left {
            self.arena[parent].left = Link::Child(h);
        } else {
            self.arena[parent].right = Link::Child(h);
        }
        self.count += 1;
        self.retrace_insert(&path);
        self.path = path;
        debug_assert_eq!(self.arena.live(), self.count);
        Ok(h)
    }

    fn remove_by<P>(&mut self, mut probe: P) -> Option<(K, V, O)>
    where
        P: FnMut(&Self::Node, O) -> Ordering,
    {
        let mut path = std::mem::take(&mut self.path);
        path.clear();
        let mut curr = self.root;
        let mut base = O::default();
        let found = loop {
            let Some(c) = curr else {
                break None;
            };
            let node = &self.arena[c];
            let abs = base.add(node.offset);
            let left = match probe(node, abs) {
                Ordering::Equal => break Some((c, abs)),
                Ordering::Less => true,
                Ordering::Greater => false,
            };
            path.push(Step { node: c, left });
            curr = if left { node.left.child() } else { node.right.child() };
            base = abs;
        };
        let Some((n, n_abs)) = found else {
            self.path = path;
            return None;
        };

        self.bump_version();
        self.splice_out(n, n_abs, &mut path);
        self.retrace_remove(&path);
        self.path = path;
        self.count -= 1;
        let (key, value) = self.arena.free(n).into_entry();
        debug_assert_eq!(self.arena.live(), self.count);
        Some((key, value, n_abs))
    }

    fn value_mut(&mut self, handle: u32) -> &mut V {
        &mut self.arena[handle].value
    }

    fn shift_right_of_path(&mut self, side: Side, at: i64, adjust: O) {
        self.bump_version();
        offset::shift_right_of_path(&mut self.arena, self.root, side, at, adjust);
    }

    fn clear(&mut self) {
        self.bump_version();
        self.root = None;
        self.count = 0;
        self.arena.clear();
    }

    /// Reaches the successor through the right thread or down the right
    /// subtree, without a descent from the root.
    fn successor(&self, handle: u32, abs: O) -> Option<(u32, O)> {
        match self.arena[handle].right {
            Link::Child(c) => {
                let mut n = c;
                let mut n_abs = offset::absolute(&self.arena, abs, c);
                while let Link::Child(l) = self.arena[n].left {
                    n_abs = offset::absolute(&self.arena, n_abs, l);
                    n = l;
                }
                Some((n, n_abs))
            }
            Link::Thread(None) => None,
            Link::Thread(Some(t)) => {
                // `handle` is the rightmost node of the left subtree of `t`:
                // sum the offsets down that right spine.
                let mut n = self.arena[t].left.child()?;
                let mut below = self.arena[n].offset;
                while n != handle {
                    n = self.arena[n].right.child()?;
                    below = below.add(self.arena[n].offset);
                }
                Some((t, abs.sub(below)))
            }
        }
    }

    fn depth_bound(count: u32) -> usize {
        avl_depth_bound(count)
    }

    fn assert_valid(&self) -> Result<(), String> {
        let nodes = check_common::<K, V, O, _>(self)?;
        self.check_threads(&nodes)?;
        self.check_balance(self.root)?;
        Ok(())
    }
}

impl<K, V, O: Offsets> Inspect<K, V, O> for AvlTree<K, V, O> {
    fn balance_of(&self, handle: u32) -> Balance {
        Balance::Avl(self.arena[handle].balance)
    }
}
