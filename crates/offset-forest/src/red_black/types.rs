use crate::types::{Offsets, TreeNode};

#[derive(Clone, Debug)]
pub struct RbNode<K, V, O> {
    pub(crate) left: Option<u32>,
    pub(crate) right: Option<u32>,
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) offset: O,
    pub(crate) black: bool,
}

impl<K, V, O> RbNode<K, V, O> {
    pub(crate) fn new(key: K, value: V, offset: O, black: bool) -> Self {
        Self {
            left: None,
            right: None,
            key,
            value,
            offset,
            black,
        }
    }

    pub fn is_black(&self) -> bool {
        self.black
    }
}

impl<K, V, O: Offsets> TreeNode for RbNode<K, V, O> {
    type Key = K;
    type Value = V;
    type Offset = O;

    fn left(&self) -> Option<u32> {
        self.left
    }

    fn right(&self) -> Option<u32> {
        self.right
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
