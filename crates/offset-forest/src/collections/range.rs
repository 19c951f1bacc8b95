use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::avl::AvlTree;
use crate::config::TreeConfig;
use crate::engine::Engine;
use crate::enumerate::{FastEnumerator, SpanEnumerator};
use crate::error::{Result, TreeError};
use crate::red_black::RbTree;
use crate::types::{Nearest, Offsets, Side, TreeNode};

use super::{check_extent, check_position};

/// Sequence of contiguous, non-empty ranges starting at 0.
///
/// Each node stores only the offset of its start relative to its parent; a
/// range's length is the distance to the next start, or to the extent for
/// the last range. Inserting or deleting a range moves every later range, so
/// both operations shift the suffix with
/// [`Engine::shift_right_of_path`] instead of rewriting positions.
///
/// `O` is `i64` for a single axis and [`XY`](crate::XY) for two axes that
/// are kept in lockstep (see [`Range2Map`](super::Range2Map)).
#[derive(Clone, Debug)]
pub struct RangeMap<V, O = i64, E = AvlTree<(), V, O>> {
    tree: E,
    extent: O,
    _marker: PhantomData<V>,
}

pub type AvlRangeMap<V> = RangeMap<V, i64, AvlTree<(), V, i64>>;
pub type RbRangeMap<V> = RangeMap<V, i64, RbTree<(), V, i64>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeEntry<'a, V, O = i64> {
    pub start: O,
    pub length: O,
    pub value: &'a V,
}

impl<V, O: Offsets, E: Engine<(), V, O>> Default for RangeMap<V, O, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, O: Offsets, E: Engine<(), V, O>> RangeMap<V, O, E> {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            tree: E::with_config(config),
            extent: O::default(),
            _marker: PhantomData,
        }
    }

    pub(super) fn at(side: Side, position: i64) -> impl Fn(&E::Node, O) -> Ordering {
        move |_: &E::Node, abs: O| position.cmp(&abs.axis(side))
    }

    fn find(&self, side: Side, start: i64) -> Option<(u32, O)> {
        self.tree.find_by(Self::at(side, start))
    }

    /// Start of the range after `handle`, or the extent.
    fn following(&self, handle: u32, start: O) -> O {
        self.tree
            .successor(handle, start)
            .map_or(self.extent, |(_, abs)| abs)
    }

    fn entry(&self, handle: u32, start: O) -> RangeEntry<'_, V, O> {
        RangeEntry {
            start,
            length: self.following(handle, start).sub(start),
            value: self.tree.node(handle).value(),
        }
    }

    pub(super) fn insert_at(&mut self, side: Side, start: i64, length: O, value: V) -> Result<bool> {
        check_position(start)?;
        if !length.all_positive() {
            return Err(TreeError::InvalidArgument("length must be positive"));
        }
        let at = if start == self.extent.axis(side) {
            self.extent
        } else {
            match self.find(side, start) {
                Some((_, abs)) => abs,
                None => return Ok(false),
            }
        };
        let extent = self.extent.checked_add(length).ok_or(TreeError::Overflow)?;
        self.tree.arena().check_available()?;
        self.tree.shift_right_of_path(side, start, length);
        self.tree
            .insert_by((), value, at, |_, _, abs| start.cmp(&abs.axis(side)))?;
        self.extent = extent;
        Ok(true)
    }

    pub(super) fn delete_at(&mut self, side: Side, start: i64) -> Result<Option<V>> {
        check_position(start)?;
        let Some((h, abs)) = self.find(side, start) else {
            return Ok(None);
        };
        let length = self.following(h, abs).sub(abs);
        let removed = self.tree.remove_by(Self::at(side, start));
        self.tree.shift_right_of_path(side, start, length.neg());
        self.extent = self.extent.sub(length);
        Ok(removed.map(|(_, value, _)| value))
    }

    pub(super) fn get_at(&self, side: Side, start: i64) -> Option<RangeEntry<'_, V, O>> {
        if start < 0 {
            return None;
        }
        self.find(side, start).map(|(h, abs)| self.entry(h, abs))
    }

    pub(super) fn set_length_at(&mut self, side: Side, start: i64, length: O) -> Result<bool> {
        check_position(start)?;
        if !length.all_positive() {
            return Err(TreeError::InvalidArgument("length must be positive"));
        }
        let Some((h, abs)) = self.find(side, start) else {
            return Ok(false);
        };
        let end = self.following(h, abs);
        let delta = length.sub(end.sub(abs));
        if delta != O::default() {
            let extent = self.extent.checked_add(delta).ok_or(TreeError::Overflow)?;
            self.tree.shift_right_of_path(side, end.axis(side), delta);
            self.extent = extent;
        }
        Ok(true)
    }

    pub(super) fn set_value_at(&mut self, side: Side, start: i64, value: V) -> Result<bool> {
        check_position(start)?;
        let Some((h, _)) = self.find(side, start) else {
            return Ok(false);
        };
        *self.tree.value_mut(h) = value;
        Ok(true)
    }

    pub(super) fn nearest_at(&self, side: Side, position: i64, nearest: Nearest) -> Option<O> {
        if position < 0 && matches!(nearest, Nearest::Less | Nearest::LessOrEqual) {
            return None;
        }
        self.tree
            .nearest_by(Self::at(side, position), nearest)
            .map(|(_, abs)| abs)
    }

    pub(super) fn containing_at(&self, side: Side, position: i64) -> Option<RangeEntry<'_, V, O>> {
        if !(0..self.extent.axis(side)).contains(&position) {
            return None;
        }
        self.tree
            .nearest_by(Self::at(side, position), Nearest::LessOrEqual)
            .map(|(h, abs)| self.entry(h, abs))
    }

    pub(super) fn cursor_at(&self, side: Side, position: i64, forward: bool) -> RangeCursor<O> {
        RangeCursor {
            inner: SpanEnumerator::new(FastEnumerator::starting_at(
                &self.tree,
                forward,
                Self::at(side, position),
            )),
        }
    }

    pub(super) fn robust_cursor_at(&self, side: Side, position: i64, forward: bool) -> RangeRobustCursor {
        RangeRobustCursor {
            side,
            position,
            nearest: Nearest::new(forward, true),
            forward,
        }
    }

    /// One past the end of the last range, on every axis.
    pub fn extent(&self) -> O {
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
        self.extent = O::default();
    }

    pub fn engine(&self) -> &E {
        &self.tree
    }

    pub fn fast_enumerator(&self, forward: bool) -> RangeCursor<O> {
        RangeCursor {
            inner: SpanEnumerator::new(FastEnumerator::new(&self.tree, forward)),
        }
    }

    pub fn robust_enumerator(&self, forward: bool) -> RangeRobustCursor {
        let position = if forward { 0 } else { i64::MAX };
        self.robust_cursor_at(Side::X, position, forward)
    }

    pub fn iter(&self) -> impl Iterator<Item = RangeEntry<'_, V, O>> + '_ {
        let mut cursor = self.fast_enumerator(true);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn iter_rev(&self) -> impl Iterator<Item = RangeEntry<'_, V, O>> + '_ {
        let mut cursor = self.fast_enumerator(false);
        std::iter::from_fn(move || cursor.next(self).ok().flatten())
    }

    pub fn assert_valid(&self) -> Result<(), String> {
        self.tree.assert_valid()?;
        let first = self.tree.first().map(|(_, abs)| abs);
        let last = self.tree.last().map(|(_, abs)| abs);
        for i in 0..O::AXES {
            let side = if i == 0 { Side::X } else { Side::Y };
            check_extent(
                first.map(|abs| abs.axis(side)),
                last.map(|abs| abs.axis(side)),
                self.extent.axis(side),
            )
            .map_err(|err| format!("{side:?}: {err}"))?;
        }
        Ok(())
    }
}

impl<V, E: Engine<(), V, i64>> RangeMap<V, i64, E> {
    /// Inserts a range at `start`, which must be an existing range start or
    /// the extent. Later ranges move up by `length`.
    pub fn try_insert(&mut self, start: i64, length: i64, value: V) -> Result<bool> {
        self.insert_at(Side::X, start, length, value)
    }

    pub fn insert(&mut self, start: i64, length: i64, value: V) -> Result<()> {
        if self.try_insert(start, length, value)? {
            Ok(())
        } else {
            Err(TreeError::InvalidArgument("start is not a range boundary"))
        }
    }

    /// Deletes the range starting at `start`; later ranges move down.
    pub fn try_delete(&mut self, start: i64) -> Result<bool> {
        Ok(self.delete_at(Side::X, start)?.is_some())
    }

    pub fn delete(&mut self, start: i64) -> Result<V> {
        self.delete_at(Side::X, start)?.ok_or(TreeError::NotFound)
    }

    pub fn try_get(&self, start: i64) -> Option<RangeEntry<'_, V>> {
        self.get_at(Side::X, start)
    }

    pub fn get(&self, start: i64) -> Result<RangeEntry<'_, V>> {
        check_position(start)?;
        self.try_get(start).ok_or(TreeError::NotFound)
    }

    pub fn contains_start(&self, start: i64) -> bool {
        self.try_get(start).is_some()
    }

    pub fn try_set_length(&mut self, start: i64, length: i64) -> Result<bool> {
        self.set_length_at(Side::X, start, length)
    }

    pub fn set_length(&mut self, start: i64, length: i64) -> Result<()> {
        if self.try_set_length(start, length)? {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    pub fn try_set_value(&mut self, start: i64, value: V) -> Result<bool> {
        self.set_value_at(Side::X, start, value)
    }

    pub fn set_value(&mut self, start: i64, value: V) -> Result<()> {
        if self.try_set_value(start, value)? {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    pub fn get_extent(&self) -> i64 {
        self.extent
    }

    /// Start of the nearest range that begins before `position`.
    pub fn nearest_less(&self, position: i64) -> Option<i64> {
        self.nearest_at(Side::X, position, Nearest::Less)
    }

    pub fn nearest_less_or_equal(&self, position: i64) -> Option<i64> {
        self.nearest_at(Side::X, position, Nearest::LessOrEqual)
    }

    pub fn nearest_greater(&self, position: i64) -> Option<i64> {
        self.nearest_at(Side::X, position, Nearest::Greater)
    }

    pub fn nearest_greater_or_equal(&self, position: i64) -> Option<i64> {
        self.nearest_at(Side::X, position, Nearest::GreaterOrEqual)
    }

    /// Range covering `position`, if `0 <= position < extent`.
    pub fn range_containing(&self, position: i64) -> Option<RangeEntry<'_, V>> {
        self.containing_at(Side::X, position)
    }

    /// Starts at the first range starting at or after `position` (forward),
    /// or the last one starting at or before it (backward).
    pub fn fast_enumerator_from(&self, position: i64, forward: bool) -> RangeCursor<i64> {
        self.cursor_at(Side::X, position, forward)
    }

    pub fn robust_enumerator_from(&self, position: i64, forward: bool) -> RangeRobustCursor {
        self.robust_cursor_at(Side::X, position, forward)
    }
}

/// Version-checked cursor over a [`RangeMap`].
#[derive(Clone, Debug)]
pub struct RangeCursor<O> {
    inner: SpanEnumerator<O>,
}

impl<O: Offsets> RangeCursor<O> {
    pub fn next<'a, V, E>(&mut self, map: &'a RangeMap<V, O, E>) -> Result<Option<RangeEntry<'a, V, O>>>
    where
        E: Engine<(), V, O>,
    {
        let span = self.inner.next_span(&map.tree, map.extent)?;
        Ok(span.map(|(h, start, end)| RangeEntry {
            start,
            length: end.sub(start),
            value: map.tree.node(h).value(),
        }))
    }
}

/// Position-tracking cursor that tolerates modification between steps.
///
/// It remembers the start of the last range it returned, so inserting or
/// deleting ranges before that point moves later ranges under it.
#[derive(Clone, Debug)]
pub struct RangeRobustCursor {
    side: Side,
    position: i64,
    nearest: Nearest,
    forward: bool,
}

impl RangeRobustCursor {
    pub fn next<'a, V, O, E>(&mut self, map: &'a RangeMap<V, O, E>) -> Option<RangeEntry<'a, V, O>>
    where
        O: Offsets,
        E: Engine<(), V, O>,
    {
        let (h, start) = map
            .tree
            .nearest_by(RangeMap::<V, O, E>::at(self.side, self.position), self.nearest)?;
        self.position = start.axis(self.side);
        self.nearest = Nearest::new(self.forward, false);
        Some(map.entry(h, start))
    }
}
