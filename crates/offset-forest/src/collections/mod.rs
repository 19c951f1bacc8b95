//! Front-end collections, each generic over the balancing engine.

mod map;
mod multi_rank;
mod range;
mod range2;

pub use map::{AvlMap, Map, MapCursor, MapRobustCursor, RbMap};
pub use multi_rank::{
    AvlMultiRankMap, MultiRankMap, RankCursor, RankEntry, RankRobustCursor, RbMultiRankMap,
};
pub use range::{AvlRangeMap, RangeCursor, RangeEntry, RangeMap, RangeRobustCursor, RbRangeMap};
pub use range2::{AvlRange2Map, Range2Map, RbRange2Map};

use std::cmp::Ordering;

use crate::error::{Result, TreeError};

fn check_position(position: i64) -> Result<()> {
    if position < 0 {
        return Err(TreeError::InvalidArgument("position must not be negative"));
    }
    Ok(())
}

/// Keys must come out of an in-order walk strictly increasing.
fn check_key_order<'a, K, C, I>(keys: I, comparator: &C) -> Result<(), String>
where
    K: 'a,
    C: Fn(&K, &K) -> Ordering,
    I: IntoIterator<Item = &'a K>,
{
    let mut prev: Option<&K> = None;
    for (i, key) in keys.into_iter().enumerate() {
        if let Some(prev) = prev {
            if comparator(prev, key) != Ordering::Less {
                return Err(format!("key at index {i} is not greater than its predecessor"));
            }
        }
        prev = Some(key);
    }
    Ok(())
}

/// A span-based collection is consistent when its first element starts at
/// zero and its last one ends at the extent.
fn check_extent(first: Option<i64>, last: Option<i64>, extent: i64) -> Result<(), String> {
    match (first, last) {
        (None, _) | (_, None) if extent != 0 => Err(format!("empty tree with extent {extent}")),
        (Some(first), _) if first != 0 => Err(format!("first element starts at {first}")),
        (_, Some(last)) if last >= extent => {
            Err(format!("last element starts at {last}, extent is {extent}"))
        }
        _ => Ok(()),
    }
}
