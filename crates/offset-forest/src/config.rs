//! Construction-time configuration.
//!
//! Both the allocation mode and the capacity hint are fixed when a tree is
//! built; no operation changes them afterwards.

/// Node lifecycle policy of a [`NodeArena`](crate::arena::NodeArena).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AllocationMode {
    /// Freed records are dropped. Trailing vacant slots are truncated and
    /// `clear` releases the storage. A freed interior slot cannot be
    /// truncated without renumbering handles, so it is reused by the next
    /// allocation.
    #[default]
    DynamicDiscard,
    /// Freed slots go on a free list and are reused before the arena grows.
    DynamicRetainFreelist,
    /// `capacity` slots exist from construction on; the arena never grows.
    PreallocatedFixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    pub mode: AllocationMode,
    /// Hard limit for [`AllocationMode::PreallocatedFixed`], number of
    /// pre-populated free slots for [`AllocationMode::DynamicRetainFreelist`]
    /// and a reservation hint for [`AllocationMode::DynamicDiscard`].
    pub capacity: u32,
}

impl TreeConfig {
    pub const fn new(mode: AllocationMode, capacity: u32) -> Self {
        Self { mode, capacity }
    }

    pub const fn discard() -> Self {
        Self::new(AllocationMode::DynamicDiscard, 0)
    }

    pub const fn retained(capacity: u32) -> Self {
        Self::new(AllocationMode::DynamicRetainFreelist, capacity)
    }

    pub const fn fixed(capacity: u32) -> Self {
        Self::new(AllocationMode::PreallocatedFixed, capacity)
    }
}
