//! Arena-backed AVL and red-black trees with relative-offset indexing.
//!
//! Every node stores its position as an offset from its parent, so a whole
//! suffix of a sequence can move by touching only one root-to-leaf path.
//! On top of the two engines sit four collections:
//!
//! | Collection | Ordered by | Offset axes | AVL | Red-black |
//! |------------|------------|-------------|-----|-----------|
//! | [`Map`] | key | none | [`AvlMap`] | [`RbMap`] |
//! | [`MultiRankMap`] | key | rank | [`AvlMultiRankMap`] | [`RbMultiRankMap`] |
//! | [`RangeMap`] | position | one | [`AvlRangeMap`] | [`RbRangeMap`] |
//! | [`Range2Map`] | position | two | [`AvlRange2Map`] | [`RbRange2Map`] |
//!
//! ```
//! use offset_forest::AvlRangeMap;
//!
//! let mut ranges = AvlRangeMap::new();
//! assert!(ranges.try_insert(0, 5, "a").unwrap());
//! assert!(ranges.try_insert(5, 3, "b").unwrap());
//! assert_eq!(ranges.nearest_less_or_equal(6), Some(5));
//! assert!(ranges.try_delete(0).unwrap());
//! assert_eq!(ranges.get_extent(), 3);
//! ```
//!
//! Nodes live in a [`NodeArena`](arena::NodeArena) whose allocation policy
//! is chosen once through [`TreeConfig`].

pub mod arena;
pub mod avl;
pub mod collections;
pub mod config;
pub mod engine;
pub mod enumerate;
pub mod error;
pub mod inspect;
pub mod offset;
pub mod red_black;
pub mod types;

pub use collections::{
    AvlMap, AvlMultiRankMap, AvlRange2Map, AvlRangeMap, Map, MapCursor, MapRobustCursor,
    MultiRankMap, RankCursor, RankEntry, RankRobustCursor, Range2Map, RangeCursor, RangeEntry,
    RangeMap, RangeRobustCursor, RbMap, RbMultiRankMap, RbRange2Map, RbRangeMap,
};
pub use config::{AllocationMode, TreeConfig};
pub use engine::Engine;
pub use enumerate::FastEnumerator;
pub use error::{Result, TreeError};
pub use inspect::{Balance, Inspect};
pub use types::{Nearest, Offsets, Side, TreeNode, XY};
