//! Node trait and offset types shared by both engines.
//!
//! Nodes live in a [`NodeArena`](crate::arena::NodeArena) and refer to each
//! other by `u32` handle. A node never stores its absolute position: it
//! stores an offset relative to its parent, and the absolute position is the
//! sum of offsets from the root down to the node.

use std::cmp::Ordering;
use std::fmt::Debug;

/// Comparator used by keyed collections.
pub type Comparator<K> = fn(&K, &K) -> Ordering;

/// Which axis of a dual-axis tree a position refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    #[default]
    X,
    Y,
}

/// Relative-offset augmentation carried by every node.
///
/// `()` means no position axis (plain maps), `i64` a single axis and [`XY`]
/// two independent axes kept in lockstep.
pub trait Offsets: Copy + Default + PartialEq + Debug {
    /// Number of position axes.
    const AXES: usize;

    fn add(self, rhs: Self) -> Self;

    fn sub(self, rhs: Self) -> Self;

    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// Component on `side`. Single-axis offsets ignore `side`.
    fn axis(self, side: Side) -> i64;

    /// True when every axis is strictly positive, i.e. a valid length.
    fn all_positive(self) -> bool;

    fn neg(self) -> Self {
        Self::default().sub(self)
    }
}

impl Offsets for () {
    const AXES: usize = 0;

    fn add(self, _rhs: Self) -> Self {}

    fn sub(self, _rhs: Self) -> Self {}

    fn checked_add(self, _rhs: Self) -> Option<Self> {
        Some(())
    }

    fn axis(self, _side: Side) -> i64 {
        0
    }

    fn all_positive(self) -> bool {
        true
    }
}

impl Offsets for i64 {
    const AXES: usize = 1;

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        i64::checked_add(self, rhs)
    }

    fn axis(self, _side: Side) -> i64 {
        self
    }

    fn all_positive(self) -> bool {
        self > 0
    }
}

/// Paired offsets of a dual-axis tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XY {
    pub x: i64,
    pub y: i64,
}

impl XY {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl Offsets for XY {
    const AXES: usize = 2;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }

    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self::new(self.x.checked_add(rhs.x)?, self.y.checked_add(rhs.y)?))
    }

    fn axis(self, side: Side) -> i64 {
        match side {
            Side::X => self.x,
            Side::Y => self.y,
        }
    }

    fn all_positive(self) -> bool {
        self.x > 0 && self.y > 0
    }
}

/// Arena node interface.
///
/// `left`/`right` report real children only; threaded links of the AVL
/// engine are not children.
pub trait TreeNode {
    type Key;
    type Value;
    type Offset: Offsets;

    fn left(&self) -> Option<u32>;
    fn right(&self) -> Option<u32>;
    fn key(&self) -> &Self::Key;
    fn value(&self) -> &Self::Value;
    fn value_mut(&mut self) -> &mut Self::Value;
    fn offset(&self) -> Self::Offset;
    fn set_offset(&mut self, offset: Self::Offset);
    fn into_entry(self) -> (Self::Key, Self::Value);
}

/// Which neighbour [`nearest_by`](crate::engine::Engine::nearest_by) looks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nearest {
    Less,
    LessOrEqual,
    GreaterOrEqual,
    Greater,
}

impl Nearest {
    pub const fn new(greater: bool, or_equal: bool) -> Self {
        match (greater, or_equal) {
            (false, false) => Self::Less,
            (false, true) => Self::LessOrEqual,
            (true, true) => Self::GreaterOrEqual,
            (true, false) => Self::Greater,
        }
    }
}
