use crate::types::{Offsets, TreeNode};

/// One child slot of a threaded AVL node.
///
/// A missing child is replaced by a non-owning link to the in-order
/// predecessor (left slot) or successor (right slot); `Thread(None)` marks
/// the two ends of the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    Child(u32),
    Thread(Option<u32>),
}

impl Link {
    #[inline]
    pub fn child(self) -> Option<u32> {
        match self {
            Link::Child(c) => Some(c),
            Link::Thread(_) => None,
        }
    }

    #[inline]
    pub fn is_child(self) -> bool {
        matches!(self, Link::Child(_))
    }
}

#[derive(Clone, Debug)]
pub struct AvlNode<K, V, O> {
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) offset: O,
    /// Height of the right subtree minus height of the left subtree.
    pub(crate) balance: i8,
}

impl<K, V, O> AvlNode<K, V, O> {
    pub(crate) fn leaf(key: K, value: V, offset: O, left: Link, right: Link) -> Self {
        Self {
            left,
            right,
            key,
            value,
            offset,
            balance: 0,
        }
    }

    pub fn left_link(&self) -> Link {
        self.left
    }

    pub fn right_link(&self) -> Link {
        self.right
    }

    pub fn balance(&self) -> i8 {
        self.balance
    }
}

impl<K, V, O: Offsets> TreeNode for AvlNode<K, V, O> {
    type Key = K;
    type Value = V;
    type Offset = O;

    fn left(&self) -> Option<u32> {
        self.left.child()
    }

    fn right(&self) -> Option<u32> {
        self.right.child()
    }

    fn key(&self) -> &K {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }

    fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    fn offset(&self) -> O {
        self.offset
    }

    fn set_offset(&mut self, offset: O) {
        self.offset = offset;
    }

    fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}
