//! Fixed-record node allocator.
//!
//! Every tree owns one [`NodeArena`]. Nodes are addressed by `u32` handles;
//! vacant slots form a singly-linked free list threaded through the slots
//! themselves. The engines only ever call [`NodeArena::allocate`],
//! [`NodeArena::free`] and [`NodeArena::check_available`], so the three
//! [`AllocationMode`]s are invisible to them.

use std::ops::{Index, IndexMut};

use crate::config::{AllocationMode, TreeConfig};
use crate::error::{Result, TreeError};

#[derive(Clone, Debug)]
enum Slot<N> {
    Occupied(N),
    Vacant { next: Option<u32> },
}

#[derive(Clone, Debug)]
pub struct NodeArena<N> {
    slots: Vec<Slot<N>>,
    free: Option<u32>,
    config: TreeConfig,
    live: u32,
}

impl<N> NodeArena<N> {
    pub fn new(config: TreeConfig) -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            free: None,
            config,
            live: 0,
        };
        arena.ensure_capacity(config.capacity);
        arena
    }

    pub fn mode(&self) -> AllocationMode {
        self.config.mode
    }

    /// Configured capacity; a hard limit only in fixed mode.
    pub fn capacity(&self) -> u32 {
        self.config.capacity
    }

    /// Number of occupied slots.
    pub fn live(&self) -> u32 {
        self.live
    }

    /// Number of slots, occupied or vacant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_live(&self, handle: u32) -> bool {
        matches!(self.slots.get(handle as usize), Some(Slot::Occupied(_)))
    }

    pub fn get(&self, handle: u32) -> Option<&N> {
        match self.slots.get(handle as usize) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Makes room for `n` slots.
    ///
    /// Retaining modes chain the new slots onto the free list; a fixed arena
    /// never grows past its configured capacity; discard mode only reserves
    /// vector storage.
    pub fn ensure_capacity(&mut self, n: u32) {
        let target = match self.config.mode {
            AllocationMode::DynamicDiscard => {
                self.slots
                    .reserve((n as usize).saturating_sub(self.slots.len()));
                return;
            }
            AllocationMode::DynamicRetainFreelist => n as usize,
            AllocationMode::PreallocatedFixed => n.min(self.config.capacity) as usize,
        };
        let start = self.slots.len();
        if target <= start {
            return;
        }
        tracing::debug!(from = start, to = target, "pre-populating node free list");
        let head = self.free;
        self.slots.extend((start..target).map(|i| Slot::Vacant {
            next: if i + 1 < target {
                Some((i + 1) as u32)
            } else {
                head
            },
        }));
        self.free = Some(start as u32);
    }

    /// Fails exactly when [`NodeArena::allocate`] would fail.
    pub fn check_available(&self) -> Result<()> {
        if self.free.is_some() {
            return Ok(());
        }
        if self.config.mode == AllocationMode::PreallocatedFixed {
            return Err(TreeError::CapacityExhausted {
                capacity: self.config.capacity,
            });
        }
        if self.slots.len() >= u32::MAX as usize {
            return Err(TreeError::Overflow);
        }
        Ok(())
    }

    pub fn can_allocate(&self) -> bool {
        self.check_available().is_ok()
    }

    pub fn allocate(&mut self, node: N) -> Result<u32> {
        if let Some(handle) = self.free {
            let next = match &self.slots[handle as usize] {
                Slot::Vacant { next } => *next,
                Slot::Occupied(_) => unreachable!("free list points at live node {handle}"),
            };
            self.free = next;
            self.slots[handle as usize] = Slot::Occupied(node);
            self.live += 1;
            return Ok(handle);
        }
        if let Err(err) = self.check_available() {
            tracing::warn!(live = self.live, %err, "node allocation refused");
            return Err(err);
        }
        let handle = self.slots.len() as u32;
        self.slots.push(Slot::Occupied(node));
        self.live += 1;
        Ok(handle)
    }

    /// Moves the record out of `handle` and returns it to the caller, so the
    /// arena holds no payload for a removed node in any mode.
    pub fn free(&mut self, handle: u32) -> N {
        let slot = std::mem::replace(
            &mut self.slots[handle as usize],
            Slot::Vacant { next: None },
        );
        let Slot::Occupied(node) = slot else {
            panic!("double free of node {handle}");
        };
        self.live -= 1;
        if self.config.mode == AllocationMode::DynamicDiscard
            && handle as usize + 1 == self.slots.len()
        {
            self.slots.pop();
        } else {
            self.slots[handle as usize] = Slot::Vacant { next: self.free };
            self.free = Some(handle);
        }
        node
    }

    /// Drops every record. Discard mode releases the storage; the retaining
    /// modes keep it and rebuild the free list over all slots.
    pub fn clear(&mut self) {
        let slots = self.slots.len();
        tracing::debug!(live = self.live, slots, mode = ?self.config.mode, "clearing node arena");
        self.live = 0;
        self.free = None;
        match self.config.mode {
            AllocationMode::DynamicDiscard => self.slots = Vec::new(),
            _ => {
                self.slots.clear();
                self.ensure_capacity(slots as u32);
            }
        }
    }
}

impl<N> Index<u32> for NodeArena<N> {
    type Output = N;

    fn index(&self, handle: u32) -> &N {
        match &self.slots[handle as usize] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("handle {handle} refers to a vacant slot"),
        }
    }
}

impl<N> IndexMut<u32> for NodeArena<N> {
    fn index_mut(&mut self, handle: u32) -> &mut N {
        match &mut self.slots[handle as usize] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("handle {handle} refers to a vacant slot"),
        }
    }
}
