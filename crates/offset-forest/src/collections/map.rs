use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::avl::AvlTree;
use crate::config::TreeConfig;
use crate::engine::Engine;
use crate::enumerate::FastEnumerator;
use crate::error::{Result, TreeError};
use crate::red_black::RbTree;
use crate::types::{Comparator, Nearest, TreeNode};

use super::check_key_order;

/// Ordered key-value map.
#[derive(Clone, Debug)]
pub struct Map<K, V, E = AvlTree<K, V, ()>, C = Comparator<K>> {
    tree: E,
    comparator: C,
    _marker: PhantomData<(K, V)>,
}

pub type AvlMap<K, V> = Map<K, V, AvlTree<K, V, ()>>;
pub type RbMap<K, V> = Map<K, V, RbTree<K, V, ()>>;

impl<K: Ord, V, E: Engine<K, V, ()>> Map<K, V, E> {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::with_comparator_and_config(<K as Ord>::cmp, config)
    }
}

impl<K: Ord, V, E: Engine<K, V, ()>> Default for Map<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E, C> Map<K, V, E, C>
where
    E: Engine<K, V, ()>,
    C: Fn(&K, &K) -> Ordering,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_comparator_and_config(comparator, TreeConfig::default())
    }

    pub fn with_comparator_and_config(comparator: C, config: TreeConfig) -> Self {
        Self {
            tree: E::with_config(config),
            comparator,
            _marker: PhantomData,
        }
    }

    fn find(&self, key: &K) -> Option<u32> {
        let cmp = &self.comparator;
        self.tree
            .find_by(|node, _| cmp(key, node.key()))
            .map(|(h, _)| h)
    }

    fn nearest(&self, key: &K, nearest: Nearest) -> Option<u32> {
        let cmp = &self.comparator;
        self.tree
            .nearest_by(|node, _| cmp(key, node.key()), nearest)
            .map(|(h, _)| h)
    }

    fn entry(&self, handle: u32) -> (&K, &V) {
        let node = self.tree.node(handle);
        (node.key(), node.value())
    }

    /// Adds `key` unless it is already present.
    pub fn try_add(&mut self, key: K, value: V) -> Result<bool> {
        if self.find(&key).is_some() {
            return Ok(false);
        }
        let cmp = &self.comparator;
        self.tree
            .insert_by(key, value, (), |k, node, _| cmp(k, node.key()))?;
        Ok(true)
    }

    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.try_add(key, value)? {
            Ok(())
        } else {
            Err(TreeError::DuplicateKey)
        }
    }

    pub fn try_remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Result<V> {
        self.take(key).ok_or(TreeError::NotFound)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        let cmp = &self.comparator;
        self.tree
            .remove_by(|node, _| cmp(key, node.key()))
            .map(|(_, value, _)| value)
    }

    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|h| self.tree.node(h).value())
    }

    pub fn get(&self, key: &K) -> Result<&V> {
        self.try_get(key).ok_or(TreeError::NotFound)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let h = self.find(key)?;
        Some(self.tree.value_mut(h))
    }

    /// Replaces the value of an existing key.
    pub fn try_set_value(&mut self, key: &K, value: V) -> bool {
        match self.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn set_value(&mut self, key: &K, value: V) -> Result<()> {
        if self.try_set_value(key, value) {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn nearest_less(&self, key: &K) -> Option<&K> {
        self.nearest(key, Nearest::Less).map(|h| self.entry(h).0)
    }

    pub fn nearest_less_or_equal(&self, key: &K) -> Option<&K> {
        self.nearest(key, Nearest::LessOrEqual).map(|h| self.entry(h).0)
    }

    pub fn nearest_greater(&self, key: &K) -> Option<&K> {
        self.nearest(key, Nearest::Greater).map(|h| self.entry(h).0)
    }

    pub fn nearest_greater_or_equal(&self, key: &K) -> Option<&K> {
        self.nearest(key, Nearest::GreaterOrEqual)
            .map(|h| self.entry(h).0)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|(h, _)| self.entry(h))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|(h, _)| self.entry(h))
    }

    pub fn len(&self) -> usize {
        self.tree.count() as usize
    }

    pub fn long_count(&self) -> u64 {
        u64::from(self.tree.count())
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn engine(&self) -> &E {
        &self.tree
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn fast_enumerator(&self, forward: bool) -> MapCursor {
        MapCursor {
            inner: FastEnumerator::new(&self.tree, forward),
        }
    }

    /// Starts at the first key `>= key` (forward) or the last key `<= key`
    /// (backward).
    pub fn fast_enumerator_from(&self, key: &K, forward: bool) -> MapCursor {
        let cmp = &self.comparator;
        MapCursor {
            inner: FastEnumerator::starting_at(&self.tree, forward, |node, _| {
                cmp(key, node.key())
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut cursor = self.fast_enumerator(true);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn iter_rev(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut cursor = self.fast_enumerator(false);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn assert_valid(&self) -> Result<(), String> {
        self.tree.assert_valid()?;
        check_key_order(self.iter().map(|(k, _)| k), &self.comparator)
    }
}

impl<K: Clone, V, E, C> Map<K, V, E, C>
where
    E: Engine<K, V, ()>,
    C: Fn(&K, &K) -> Ordering,
{
    pub fn robust_enumerator(&self, forward: bool) -> MapRobustCursor<K> {
        MapRobustCursor {
            position: None,
            nearest: Nearest::new(forward, true),
            forward,
        }
    }

    pub fn robust_enumerator_from(&self, key: K, forward: bool) -> MapRobustCursor<K> {
        MapRobustCursor {
            position: Some(key),
            nearest: Nearest::new(forward, true),
            forward,
        }
    }
}

/// Version-checked cursor over a [`Map`].
#[derive(Clone, Debug)]
pub struct MapCursor {
    inner: FastEnumerator<()>,
}

impl MapCursor {
    /// Fails with [`TreeError::StaleEnumerator`] once the map changed.
    pub fn next<'a, K, V, E, C>(&mut self, map: &'a Map<K, V, E, C>) -> Result<Option<(&'a K, &'a V)>>
    where
        E: Engine<K, V, ()>,
        C: Fn(&K, &K) -> Ordering,
    {
        Ok(self.inner.next_entry(&map.tree)?.map(|(h, _)| map.entry(h)))
    }
}

/// Cursor that re-finds its place by key on every step, so the map may be
/// modified between steps.
#[derive(Clone, Debug)]
pub struct MapRobustCursor<K> {
    position: Option<K>,
    nearest: Nearest,
    forward: bool,
}

impl<K: Clone> MapRobustCursor<K> {
    pub fn next<'a, V, E, C>(&mut self, map: &'a Map<K, V, E, C>) -> Option<(&'a K, &'a V)>
    where
        E: Engine<K, V, ()>,
        C: Fn(&K, &K) -> Ordering,
    {
        let handle = match &self.position {
            None if self.forward => map.tree.first()?.0,
            None => map.tree.last()?.0,
            Some(key) => map.nearest(key, self.nearest)?,
        };
        let (key, value) = map.entry(handle);
        self.position = Some(key.clone());
        self.nearest = Nearest::new(self.forward, false);
        Some((key, value))
    }
}
