use crate::avl::AvlTree;
use crate::engine::Engine;
use crate::error::{Result, TreeError};
use crate::red_black::RbTree;
use crate::types::{Nearest, Offsets, Side, XY};

use super::range::{RangeCursor, RangeEntry, RangeMap, RangeRobustCursor};

/// Range map with two independent length axes, e.g. bytes and characters.
///
/// Every range has a positive length on both axes and either axis can be
/// used to address it.
pub type Range2Map<V, E = AvlTree<(), V, XY>> = RangeMap<V, XY, E>;

pub type AvlRange2Map<V> = Range2Map<V, AvlTree<(), V, XY>>;
pub type RbRange2Map<V> = Range2Map<V, RbTree<(), V, XY>>;

impl<V, E: Engine<(), V, XY>> RangeMap<V, XY, E> {
    /// Inserts a range at `start` on `side`, which must be an existing range
    /// start or the extent on that side.
    pub fn try_insert(&mut self, side: Side, start: i64, length: XY, value: V) -> Result<bool> {
        self.insert_at(side, start, length, value)
    }

    pub fn insert(&mut self, side: Side, start: i64, length: XY, value: V) -> Result<()> {
        if self.try_insert(side, start, length, value)? {
            Ok(())
        } else {
            Err(TreeError::InvalidArgument("start is not a range boundary"))
        }
    }

    pub fn try_delete(&mut self, side: Side, start: i64) -> Result<bool> {
        Ok(self.delete_at(side, start)?.is_some())
    }

    pub fn delete(&mut self, side: Side, start: i64) -> Result<V> {
        self.delete_at(side, start)?.ok_or(TreeError::NotFound)
    }

    pub fn try_get(&self, side: Side, start: i64) -> Option<RangeEntry<'_, V, XY>> {
        self.get_at(side, start)
    }

    pub fn get(&self, side: Side, start: i64) -> Result<RangeEntry<'_, V, XY>> {
        if start < 0 {
            return Err(TreeError::InvalidArgument("position must not be negative"));
        }
        self.try_get(side, start).ok_or(TreeError::NotFound)
    }

    pub fn try_set_length(&mut self, side: Side, start: i64, length: XY) -> Result<bool> {
        self.set_length_at(side, start, length)
    }

    pub fn set_length(&mut self, side: Side, start: i64, length: XY) -> Result<()> {
        if self.try_set_length(side, start, length)? {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    pub fn try_set_value(&mut self, side: Side, start: i64, value: V) -> Result<bool> {
        self.set_value_at(side, start, value)
    }

    pub fn set_value(&mut self, side: Side, start: i64, value: V) -> Result<()> {
        if self.try_set_value(side, start, value)? {
            Ok(())
        } else {
            Err(TreeError::NotFound)
        }
    }

    pub fn get_extent(&self, side: Side) -> i64 {
        self.extent().axis(side)
    }

    pub fn nearest_less(&self, side: Side, position: i64) -> Option<XY> {
        self.nearest_at(side, position, Nearest::Less)
    }

    pub fn nearest_less_or_equal(&self, side: Side, position: i64) -> Option<XY> {
        self.nearest_at(side, position, Nearest::LessOrEqual)
    }

    pub fn nearest_greater(&self, side: Side, position: i64) -> Option<XY> {
        self.nearest_at(side, position, Nearest::Greater)
    }

    pub fn nearest_greater_or_equal(&self, side: Side, position: i64) -> Option<XY> {
        self.nearest_at(side, position, Nearest::GreaterOrEqual)
    }

    pub fn range_containing(&self, side: Side, position: i64) -> Option<RangeEntry<'_, V, XY>> {
        self.containing_at(side, position)
    }

    pub fn fast_enumerator_from(&self, side: Side, position: i64, forward: bool) -> RangeCursor<XY> {
        self.cursor_at(side, position, forward)
    }

    pub fn robust_enumerator_from(
        &self,
        side: Side,
        position: i64,
        forward: bool,
    ) -> RangeRobustCursor {
        self.robust_cursor_at(side, position, forward)
    }
}
