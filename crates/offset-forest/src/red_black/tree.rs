use std::cmp::Ordering;

use crate::arena::NodeArena;
use crate::config::TreeConfig;
use crate::engine::{rb_depth_bound, Engine};
use crate::error::Result;
use crate::inspect::{check_common, Balance, Inspect};
use crate::offset;
use crate::types::{Offsets, Side, TreeNode};

use super::types::RbNode;

#[derive(Clone, Debug)]
pub struct RbTree<K, V, O> {
    arena: NodeArena<RbNode<K, V, O>>,
    root: Option<u32>,
    count: u32,
    version: u64,
}

impl<K, V, O: Offsets> Default for RbTree<K, V, O> {
    fn default() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K, V, O: Offsets> RbTree<K, V, O> {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn blacken_root(&mut self) {
        if let Some(root) = self.root {
            self.arena[root].black = true;
        }
    }

    fn is_red(&self, n: Option<u32>) -> bool {
        n.is_some_and(|n| !self.arena[n].black)
    }

    fn is_4_node(&self, n: u32) -> bool {
        self.is_red(self.arena[n].left) && self.is_red(self.arena[n].right)
    }

    fn is_2_node(&self, n: u32) -> bool {
        self.arena[n].black && !self.is_red(self.arena[n].left) && !self.is_red(self.arena[n].right)
    }

    fn split_4_node(&mut self, n: u32) {
        self.arena[n].black = false;
        self.set_black(self.arena[n].left, true);
        self.set_black(self.arena[n].right, true);
    }

    fn merge_2_nodes(&mut self, n: u32) {
        self.arena[n].black = true;
        self.set_black(self.arena[n].left, false);
        self.set_black(self.arena[n].right, false);
    }

    fn set_black(&mut self, n: Option<u32>, black: bool) {
        if let Some(n) = n {
            self.arena[n].black = black;
        }
    }

    fn sibling(&self, parent: u32, child: u32) -> u32 {
        let p = &self.arena[parent];
        let sibling = if p.left == Some(child) { p.right } else { p.left };
        sibling.expect("black node below a parent has a sibling")
    }

    fn replace_child_or_root(&mut self, parent: Option<u32>, child: u32, new_child: Option<u32>) {
        match parent {
            None => self.root = new_child,
            Some(p) if self.arena[p].left == Some(child) => self.arena[p].left = new_child,
            Some(p) => self.arena[p].right = new_child,
        }
    }

    fn shift(&mut self, n: Option<u32>, by: O) {
        if let Some(n) = n {
            self.arena[n].offset = self.arena[n].offset.add(by);
        }
    }

    fn rotate_left(&mut self, n: u32) -> u32 {
        let r = self.arena[n].right.expect("left rotation needs a right child");
        let n_offset = self.arena[n].offset;
        let r_offset = self.arena[r].offset;
        let rl = self.arena[r].left;
        self.arena[n].right = rl;
        self.shift(rl, r_offset);
        self.arena[r].left = Some(n);
        self.arena[n].offset = r_offset.neg();
        self.arena[r].offset = r_offset.add(n_offset);
        r
    }

    fn rotate_right(&mut self, n: u32) -> u32 {
        let l = self.arena[n].left.expect("right rotation needs a left child");
        let n_offset = self.arena[n].offset;
        let l_offset = self.arena[l].offset;
        let lr = self.arena[l].right;
        self.arena[n].left = lr;
        self.shift(lr, l_offset);
        self.arena[l].right = Some(n);
        self.arena[n].offset = l_offset.neg();
        self.arena[l].offset = l_offset.add(n_offset);
        l
    }

    /// Lifts the right child of `g`'s left child above both.
    fn rotate_left_right(&mut self, g: u32) -> u32 {
        let c = self.arena[g].left.expect("left child");
        let gc = self.arena[c].right.expect("left-right grandchild");
        let (g_offset, c_offset, gc_offset) =
            (self.arena[g].offset, self.arena[c].offset, self.arena[gc].offset);
        let (gc_left, gc_right) = (self.arena[gc].left, self.arena[gc].right);

        self.arena[g].left = gc_right;
        self.shift(gc_right, c_offset.add(gc_offset));
        self.arena[c].right = gc_left;
        self.shift(gc_left, gc_offset);
        self.arena[gc].left = Some(c);
        self.arena[gc].right = Some(g);

        self.arena[gc].offset = g_offset.add(c_offset).add(gc_offset);
        self.arena[g].offset = c_offset.add(gc_offset).neg();
        self.arena[c].offset = gc_offset.neg();
        gc
    }

    /// Lifts the left child of `g`'s right child above both.
    fn rotate_right_left(&mut self, g: u32) -> u32 {
        let c = self.arena[g].right.expect("right child");
        let gc = self.arena[c].left.expect("right-left grandchild");
        let (g_offset, c_offset, gc_offset) =
            (self.arena[g].offset, self.arena[c].offset, self.arena[gc].offset);
        let (gc_left, gc_right) = (self.arena[gc].left, self.arena[gc].right);

        self.arena[g].right = gc_left;
        self.shift(gc_left, c_offset.add(gc_offset));
        self.arena[c].left = gc_right;
        self.shift(gc_right, gc_offset);
        self.arena[gc].left = Some(g);
        self.arena[gc].right = Some(c);

        self.arena[gc].offset = g_offset.add(c_offset).add(gc_offset);
        self.arena[g].offset = c_offset.add(gc_offset).neg();
        self.arena[c].offset = gc_offset.neg();
        gc
    }

    /// Resolves a red `current` under a red `parent`. After a double rotation
    /// `current` sits above its old grandparent, so `parent` becomes `great`.
    fn insertion_balance(
        &mut self,
        current: u32,
        parent: &mut Option<u32>,
        grand: Option<u32>,
        great: Option<u32>,
    ) {
        let p = parent.expect("red node has a parent");
        let g = grand.expect("red parent is never the root");
        tracing::trace!(node = current, parent = p, grand = g, "red-black insert rotation");
        let parent_on_right = self.arena[g].right == Some(p);
        let current_on_right = self.arena[p].right == Some(current);
        let top = if parent_on_right == current_on_right {
            if current_on_right {
                self.rotate_left(g)
            } else {
                self.rotate_right(g)
            }
        } else {
            *parent = great;
            if current_on_right {
                self.rotate_left_right(g)
            } else {
                self.rotate_right_left(g)
            }
        };
        self.arena[g].black = false;
        self.arena[top].black = true;
        self.replace_child_or_root(great, g, Some(top));
    }

    /// Rotation that borrows a red node from a 3- or 4-node sibling so that
    /// `current` stops being a 2-node. Returns the new top of the subtree.
    fn rotate_for_removal(&mut self, parent: u32, current: u32, sibling: u32) -> u32 {
        let current_on_left = self.arena[parent].left == Some(current);
        if self.is_red(self.arena[sibling].left) {
            if current_on_left {
                self.rotate_right_left(parent)
            } else {
                self.set_black(self.arena[sibling].left, true);
                self.rotate_right(parent)
            }
        } else if current_on_left {
            self.set_black(self.arena[sibling].right, true);
            self.rotate_left(parent)
        } else {
            self.rotate_left_right(parent)
        }
    }

    /// Moves the successor `s` into the slot of the matched node `m`.
    fn replace_node(
        &mut self,
        (m, m_abs): (u32, O),
        parent_of_match: Option<u32>,
        (s, s_abs): (u32, O),
        parent_of_successor: Option<u32>,
    ) {
        let base = m_abs.sub(self.arena[m].offset);
        let replacement = if s == m {
            // No right subtree: the left child, if any, is a red leaf.
            self.arena[m]
                .left
                .map(|l| (l, offset::absolute(&self.arena, m_abs, l)))
        } else {
            let s_offset = self.arena[s].offset;
            let s_right = self.arena[s].right;
            self.set_black(s_right, true);
            if parent_of_successor != Some(m) {
                let ps = parent_of_successor.expect("deep successor has a parent");
                self.arena[ps].left = s_right;
                self.shift(s_right, s_offset);
                let m_right = self.arena[m].right;
                self.arena[s].right = m_right;
                self.shift(m_right, m_abs.sub(s_abs));
            }
            let m_left = self.arena[m].left;
            self.arena[s].left = m_left;
            self.shift(m_left, m_abs.sub(s_abs));
            Some((s, s_abs))
        };
        if let Some((r, r_abs)) = replacement {
            self.arena[r].black = self.arena[m].black;
            self.arena[r].offset = r_abs.sub(base);
        }
        self.replace_child_or_root(parent_of_match, m, replacement.map(|(r, _)| r));
    }

    /// Returns the black height of the subtree at `n`.
    fn check_colors(&self, n: Option<u32>, parent_red: bool) -> Result<u32, String> {
        let Some(n) = n else {
            return Ok(1);
        };
        let node = &self.arena[n];
        if parent_red && !node.black {
            return Err(format!("red node {n} has a red parent"));
        }
        let lh = self.check_colors(node.left, !node.black)?;
        let rh = self.check_colors(node.right, !node.black)?;
        if lh != rh {
            return Err(format!("node {n}: black heights {lh} and {rh} differ"));
        }
        Ok(lh + u32::from(node.black))
    }
}

impl<K, V, O: Offsets> Engine<K, V, O> for RbTree<K, V, O> {
    type Node = RbNode<K, V, O>;

    fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: NodeArena::new(config),
            root: None,
            count: 0,
            version: 0,
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
            let h = self.arena.allocate(RbNode::new(key, value, at, true))?;
            self.root = Some(h);
            self.count += 1;
            return Ok(h);
        };

        let mut current = root;
        let mut abs = self.arena[root].offset;
        let mut parent: Option<u32> = None;
        let mut grand: Option<u32> = None;
        let mut great: Option<u32> = None;
        let mut left;
        loop {
            left = probe(&key, &self.arena[current], abs) == Ordering::Less;
            if self.is_4_node(current) {
                self.split_4_node(current);
                if self.is_red(parent) {
                    self.insertion_balance(current, &mut parent, grand, great);
                }
            }
            great = grand;
            grand = parent;
            parent = Some(current);
            let next = if left {
                self.arena[current].left
            } else {
                self.arena[current].right
            };
            let Some(next) = next else {
                break;
            };
            abs = offset::absolute(&self.arena, abs, next);
            current = next;
        }

        let p = current;
        let linked = self
            .arena
            .allocate(RbNode::new(key, value, at.sub(abs), false))
            .map(|h| {
                if left {
                    self.arena[p].left = Some(h);
                } else {
                    self.arena[p].right = Some(h);
                }
                if !self.arena[p].black {
                    self.insertion_balance(h, &mut parent, grand, great);
                }
                self.count += 1;
                h
            });
        self.blacken_root();
        debug_assert_eq!(self.arena.live(), self.count);
        linked
    }

    fn remove_by<P>(&mut self, mut probe: P) -> Option<(K, V, O)>
    where
        P: FnMut(&Self::Node, O) -> Ordering,
    {
        let root = self.root?;
        self.bump_version();

        let mut current = Some(root);
        let mut parent: Option<u32> = None;
        let mut grand: Option<u32> = None;
        let mut parent_abs = O::default();
        let mut matched: Option<(u32, O)> = None;
        let mut parent_of_match: Option<u32> = None;
        while let Some(c) = current {
            let c_abs = parent_abs.add(self.arena[c].offset);
            if self.is_2_node(c) {
                match parent {
                    None => self.arena[c].black = false,
                    Some(p) => {
                        let mut sibling = self.sibling(p, c);
                        if !self.arena[sibling].black {
                            if self.arena[p].right == Some(sibling) {
                                self.rotate_left(p);
                            } else {
                                self.rotate_right(p);
                            }
                            self.arena[p].black = false;
                            self.arena[sibling].black = true;
                            self.replace_child_or_root(grand, p, Some(sibling));
                            grand = Some(sibling);
                            if matched.is_some_and(|(m, _)| m == p) {
                                parent_of_match = Some(sibling);
                            }
                            sibling = self.sibling(p, c);
                        }
                        if self.is_2_node(sibling) {
                            self.merge_2_nodes(p);
                        } else {
                            tracing::trace!(node = c, parent = p, "red-black delete rotation");
                            let top = self.rotate_for_removal(p, c, sibling);
                            self.arena[top].black = self.arena[p].black;
                            self.arena[p].black = true;
                            self.arena[c].black = false;
                            self.replace_child_or_root(grand, p, Some(top));
                            if matched.is_some_and(|(m, _)| m == p) {
                                parent_of_match = Some(top);
                            }
                        }
                    }
                }
            }

            // Past a match, the descent heads for the successor.
            let order = if matched.is_some() {
                Ordering::Less
            } else {
                probe(&self.arena[c], c_abs)
            };
            if order == Ordering::Equal {
                matched = Some((c, c_abs));
                parent_of_match = parent;
            }
            grand = parent;
            parent = Some(c);
            parent_abs = c_abs;
            current = if order == Ordering::Less {
                self.arena[c].left
            } else {
                self.arena[c].right
            };
        }

        let removed = matched.map(|(m, m_abs)| {
            let successor = parent.expect("descent visited at least the match");
            self.replace_node((m, m_abs), parent_of_match, (successor, parent_abs), grand);
            self.count -= 1;
            let (key, value) = self.arena.free(m).into_entry();
            (key, value, m_abs)
        });
        self.blacken_root();
        debug_assert_eq!(self.arena.live(), self.count);
        removed
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

    fn depth_bound(count: u32) -> usize {
        rb_depth_bound(count)
    }

    fn assert_valid(&self) -> Result<(), String> {
        check_common::<K, V, O, _>(self)?;
        if self.is_red(self.root) {
            return Err("root is red".to_string());
        }
        self.check_colors(self.root, false)?;
        Ok(())
    }
}

impl<K, V, O: Offsets> Inspect<K, V, O> for RbTree<K, V, O> {
    fn balance_of(&self, handle: u32) -> Balance {
        Balance::RedBlack {
            black: self.arena[handle].black,
        }
    }
}
