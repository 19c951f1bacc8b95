use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::avl::AvlTree;
use crate::config::TreeConfig;
use crate::engine::Engine;
use crate::enumerate::{FastEnumerator, SpanEnumerator};
use crate::error::{Result, TreeError};
use crate::red_black::RbTree;
use crate::types::{Comparator, Nearest, Side, TreeNode};

use super::{check_extent, check_key_order};

/// Ordered map in which every key occupies `count` consecutive ranks.
///
/// Ranks are not stored: a key's rank is its node's absolute offset and its
/// count is the distance to the next key's rank (or to the total).
#[derive(Clone, Debug)]
pub struct MultiRankMap<K, V, E = AvlTree<K, V, i64>, C = Comparator<K>> {
    tree: E,
    comparator: C,
    extent: i64,
    _marker: PhantomData<(K, V)>,
}

pub type AvlMultiRankMap<K, V> = MultiRankMap<K, V, AvlTree<K, V, i64>>;
pub type RbMultiRankMap<K, V> = MultiRankMap<K, V, RbTree<K, V, i64>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankEntry<'a, K, V> {
    pub key: &'a K,
    pub value: &'a V,
    /// First rank occupied by the key.
    pub rank: i64,
    pub count: i64,
}

impl<K: Ord, V, E: Engine<K, V, i64>> MultiRankMap<K, V, E> {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::with_comparator_and_config(<K as Ord>::cmp, config)
    }
}

impl<K: Ord, V, E: Engine<K, V, i64>> Default for MultiRankMap<K, V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E, C> MultiRankMap<K, V, E, C>
where
    E: Engine<K, V, i64>,
    C: Fn(&K, &K) -> Ordering,
{
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_comparator_and_config(comparator, TreeConfig::default())
    }

    pub fn with_comparator_and_config(comparator: C, config: TreeConfig) -> Self {
        Self {
            tree: E::with_config(config),
            comparator,
            extent: 0,
            _marker: PhantomData,
        }
    }

    fn find(&self, key: &K) -> Option<(u32, i64)> {
        let cmp = &self.comparator;
        self.tree.find_by(|node, _| cmp(key, node.key()))
    }

    fn by_rank(rank: i64) -> impl Fn(&E::Node, i64) -> Ordering {
        move |_: &E::Node, abs: i64| rank.cmp(&abs)
    }

    /// Rank one past the last rank of `handle`, which starts at `rank`.
    fn end_of(&self, handle: u32, rank: i64) -> i64 {
        self.tree
            .successor(handle, rank)
            .map_or(self.extent, |(_, abs)| abs)
    }

    fn entry(&self, handle: u32, rank: i64) -> RankEntry<'_, K, V> {
        let node = self.tree.node(handle);
        RankEntry {
            key: node.key(),
            value: node.value(),
            rank,
            count: self.end_of(handle, rank) - rank,
        }
    }

    /// Adds `key` with `count` ranks unless it is already present.
    pub fn try_add(&mut self, key: K, value: V, count: i64) -> Result<bool> {
        if count <= 0 {
            return Err(TreeError::InvalidArgument("count must be positive"));
        }
        if self.find(&key).is_some() {
            return Ok(false);
        }
        let extent = self.extent.checked_add(count).ok_or(TreeError::Overflow)?;
        self.tree.arena().check_available()?;
        let cmp = &self.comparator;
        let rank = self
            .tree
            .nearest_by(|node, _| cmp(&key, node.key()), Nearest::Greater)
            .map_or(self.extent, |(_, abs)| abs);
        self.tree.shift_right_of_path(Side::X, rank, count);
        self.tree
            .insert_by(key, value, rank, |k, node, _| cmp(k, node.key()))?;
        self.extent = extent;
        Ok(true)
    }

    pub fn add(&mut self, key: K, value: V, count: i64) -> Result<()> {
        if self.try_add(key, value, count)? {
            Ok(())
        } else {
            Err(TreeError::DuplicateKey)
        }
    }

    pub fn try_remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Result<V> {
        self.take(key).ok_or(TreeError::NotFound)
    }

    fn take(&mut self, key: &K) -> Option<V> {
        let (h, rank) = self.find(key)?;
        let count = self.end_of(h, rank) - rank;
        let cmp = &self.comparator;
        let (_, value, _) = self.tree.remove_by(|node, _| cmp(key, node.key()))?;
        self.tree.shift_right_of_path(Side::X, rank, -count);
        self.extent -= count;
        Some(value)
    }

    pub fn try_get(&self, key: &K) -> Option<RankEntry<'_, K, V>> {
        self.find(key).map(|(h, rank)| self.entry(h, rank))
    }

    pub fn get(&self, key: &K) -> Result<RankEntry<'_, K, V>> {
        self.try_get(key).ok_or(TreeError::NotFound)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (h, _) = self.find(key)?;
        Some(self.tree.value_mut(h))
    }

    pub fn rank_of(&self, key: &K) -> Option<i64> {
        self.find(key).map(|(_, rank)| rank)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Entry whose ranks include `rank`.
    pub fn entry_at_rank(&self, rank: i64) -> Option<RankEntry<'_, K, V>> {
        if !(0..self.extent).contains(&rank) {
            return None;
        }
        self.tree
            .nearest_by(Self::by_rank(rank), Nearest::LessOrEqual)
            .map(|(h, start)| self.entry(h, start))
    }

    pub fn try_get_key_by_rank(&self, rank: i64) -> Option<&K> {
        self.entry_at_rank(rank).map(|entry| entry.key)
    }

    pub fn get_key_by_rank(&self, rank: i64) -> Result<&K> {
        if rank < 0 {
            return Err(TreeError::InvalidArgument("rank must not be negative"));
        }
        self.try_get_key_by_rank(rank).ok_or(TreeError::NotFound)
    }

    pub fn try_set_count(&mut self, key: &K, count: i64) -> Result<bool> {
        if count <= 0 {
            return Err(TreeError::InvalidArgument("count must be positive"));
        }
        let Some((h, rank)) = self.find(key) else {
            return Ok(false);
        };
        let old = self.end_of(h, rank) - rank;
        let delta = count - old;
        if delta != 0 {
            let extent = self.extent.checked_add(delta).ok_or(TreeError::Overflow)?;
            self.tree.shift_right_of_path(Side::X, rank + old, delta);
            self.extent = extent;
        }
        Ok(true)
    }

    pub fn set_count(&mut self, key: &K, count: i64) -> Result<()> {
        if self.try_set_count(key, count)? {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    /// Adds `delta` to the count of `key` and returns the new count.
    ///
    /// A missing key is created with a default value; a key whose count
    /// drops to zero is removed.
    pub fn adjust_count(&mut self, key: K, delta: i64) -> Result<i64>
    where
        V: Default,
    {
        let Some((h, rank)) = self.find(&key) else {
            return match delta.cmp(&0) {
                Ordering::Less => Err(TreeError::InvalidArgument("count would become negative")),
                Ordering::Equal => Ok(0),
                Ordering::Greater => {
                    self.try_add(key, V::default(), delta)?;
                    Ok(delta)
                }
            };
        };
        let count = self.end_of(h, rank) - rank;
        let adjusted = count.checked_add(delta).ok_or(TreeError::Overflow)?;
        match adjusted.cmp(&0) {
            Ordering::Less => return Err(TreeError::InvalidArgument("count would become negative")),
            Ordering::Equal => {
                self.take(&key);
            }
            Ordering::Greater => {
                self.try_set_count(&key, adjusted)?;
            }
        }
        Ok(adjusted)
    }

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

    fn nearest_key(&self, key: &K, nearest: Nearest) -> Option<&K> {
        let cmp = &self.comparator;
        self.tree
            .nearest_by(|node, _| cmp(key, node.key()), nearest)
            .map(|(h, _)| self.tree.node(h).key())
    }

    pub fn nearest_less(&self, key: &K) -> Option<&K> {
        self.nearest_key(key, Nearest::Less)
    }

    pub fn nearest_less_or_equal(&self, key: &K) -> Option<&K> {
        self.nearest_key(key, Nearest::LessOrEqual)
    }

    pub fn nearest_greater(&self, key: &K) -> Option<&K> {
        self.nearest_key(key, Nearest::Greater)
    }

    pub fn nearest_greater_or_equal(&self, key: &K) -> Option<&K> {
        self.nearest_key(key, Nearest::GreaterOrEqual)
    }

    /// Entry starting at the nearest rank that satisfies `nearest` relative
    /// to `rank`. Only starting ranks are considered.
    pub fn nearest_by_rank(&self, rank: i64, nearest: Nearest) -> Option<RankEntry<'_, K, V>> {
        if rank < 0 && matches!(nearest, Nearest::Less | Nearest::LessOrEqual) {
            return None;
        }
        self.tree
            .nearest_by(Self::by_rank(rank), nearest)
            .map(|(h, start)| self.entry(h, start))
    }

    /// Sum of all counts.
    pub fn rank_count(&self) -> i64 {
        self.extent
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
        self.extent = 0;
    }

    pub fn engine(&self) -> &E {
        &self.tree
    }

    pub fn fast_enumerator(&self, forward: bool) -> RankCursor {
        RankCursor {
            inner: SpanEnumerator::new(FastEnumerator::new(&self.tree, forward)),
        }
    }

    pub fn fast_enumerator_from(&self, key: &K, forward: bool) -> RankCursor {
        let cmp = &self.comparator;
        let inner = FastEnumerator::starting_at(&self.tree, forward, |node, _| cmp(key, node.key()));
        RankCursor {
            inner: SpanEnumerator::new(inner),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = RankEntry<'_, K, V>> + '_ {
        let mut cursor = self.fast_enumerator(true);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn iter_rev(&self) -> impl Iterator<Item = RankEntry<'_, K, V>> + '_ {
        let mut cursor = self.fast_enumerator(false);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn assert_valid(&self) -> Result<(), String> {
        self.tree.assert_valid()?;
        check_key_order(self.iter().map(|entry| entry.key), &self.comparator)?;
        check_extent(
            self.tree.first().map(|(_, abs)| abs),
            self.tree.last().map(|(_, abs)| abs),
            self.extent,
        )
    }
}

impl<K: Clone, V, E, C> MultiRankMap<K, V, E, C>
where
    E: Engine<K, V, i64>,
    C: Fn(&K, &K) -> Ordering,
{
    pub fn robust_enumerator(&self, forward: bool) -> RankRobustCursor<K> {
        RankRobustCursor {
            position: None,
            nearest: Nearest::new(forward, true),
            forward,
        }
    }

    pub fn robust_enumerator_from(&self, key: K, forward: bool) -> RankRobustCursor<K> {
        RankRobustCursor {
            position: Some(key),
            nearest: Nearest::new(forward, true),
            forward,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RankCursor {
    inner: SpanEnumerator<i64>,
}

impl RankCursor {
    pub fn next<'a, K, V, E, C>(
        &mut self,
        map: &'a MultiRankMap<K, V, E, C>,
    ) -> Result<Option<RankEntry<'a, K, V>>>
    where
        E: Engine<K, V, i64>,
        C: Fn(&K, &K) -> Ordering,
    {
        let span = self.inner.next_span(&map.tree, map.extent)?;
        Ok(span.map(|(h, rank, end)| {
            let node = map.tree.node(h);
            RankEntry {
                key: node.key(),
                value: node.value(),
                rank,
                count: end - rank,
            }
        }))
    }
}

/// Key-tracking cursor that tolerates modification between steps.
#[derive(Clone, Debug)]
pub struct RankRobustCursor<K> {
    position: Option<K>,
    nearest: Nearest,
    forward: bool,
}

impl<K: Clone> RankRobustCursor<K> {
    pub fn next<'a, V, E, C>(&mut self, map: &'a MultiRankMap<K, V, E, C>) -> Option<RankEntry<'a, K, V>>
    where
        E: Engine<K, V, i64>,
        C: Fn(&K, &K) -> Ordering,
    {
        let (handle, rank) = match &self.position {
            None if self.forward => map.tree.first()?,
            None => map.tree.last()?,
            Some(key) => {
                let cmp = &map.comparator;
                map.tree
                    .nearest_by(|node, _| cmp(key, node.key()), self.nearest)?
            }
        };
        let entry = map.entry(handle, rank);
        self.position = Some(entry.key.clone());
        self.nearest = Nearest::new(self.forward, false);
        Some(entry)
    }
}
