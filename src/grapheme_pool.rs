//! Reference-counted pool for grapheme clusters.
//!
//! Clusters that cannot be stored as a literal ASCII cell (multi-byte
//! characters, emoji and ZWJ sequences, combining sequences, tabs) are interned
//! here and referenced by a [`GraphemeHandle`]. Each cell that stores a handle
//! holds one reference; the slot becomes reusable when the last reference is
//! released.
//!
//! # Usage
//!
//! ```
//! use opentui_text::grapheme_pool::GraphemePool;
//!
//! let mut pool = GraphemePool::new();
//!
//! let id = pool.intern("👨‍👩‍👧").unwrap();
//! assert_eq!(pool.resolve(id).unwrap(), "👨‍👩‍👧");
//!
//! // Interning the same bytes again shares the slot.
//! let again = pool.intern("👨‍👩‍👧").unwrap();
//! assert_eq!(id, again);
//! assert_eq!(pool.refcount(id), 2);
//!
//! assert!(pool.release(id).unwrap());
//! assert!(!pool.release(id).unwrap()); // freed
//! assert!(pool.resolve(id).is_err());
//! ```
//!
//! # Invariants
//!
//! - Handle 0 is reserved and never resolves
//! - A slot is never reused while its refcount is above zero
//! - A freed handle never resolves, even if its bytes are interned again
//!   (the new interning gets its own fresh reference)

use crate::cell::GraphemeHandle;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A pool shared by every buffer of one document session.
///
/// Buffers are single-threaded, so the pool is shared through `Rc<RefCell<_>>`
/// and passed explicitly into constructors.
pub type SharedGraphemePool = Rc<RefCell<GraphemePool>>;

/// Statistics about pool utilization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of slots ever allocated (excluding reserved slot 0).
    pub total_slots: usize,
    /// Number of slots with a nonzero refcount.
    pub active_slots: usize,
    /// Number of freed slots waiting for reuse.
    pub free_slots: usize,
    /// Bytes held by active clusters.
    pub arena_bytes: usize,
    /// Configured capacity limit, if any.
    pub capacity: Option<usize>,
}

#[derive(Clone, Debug, Default)]
struct Slot {
    bytes: Box<str>,
    refcount: u32,
}

impl Slot {
    fn is_free(&self) -> bool {
        self.refcount == 0
    }
}

/// Reference-counted, deduplicating store for grapheme clusters.
///
/// Not thread-safe; see [`SharedGraphemePool`].
#[derive(Clone, Debug)]
pub struct GraphemePool {
    /// Index 0 is reserved.
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    /// Cluster bytes to slot, for active slots only.
    index: HashMap<Box<str>, u32>,
    capacity: Option<usize>,
    arena_bytes: usize,
}

impl Default for GraphemePool {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphemePool {
    /// Create an empty pool limited only by the 24-bit handle space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::default()],
            free_list: Vec::new(),
            index: HashMap::new(),
            capacity: None,
            arena_bytes: 0,
        }
    }

    /// Create a pool that holds at most `capacity` active clusters.
    ///
    /// Interning a new cluster beyond that fails with
    /// [`Error::PoolExhausted`].
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Create a pool wrapped for sharing between buffers.
    #[must_use]
    pub fn shared(capacity: Option<usize>) -> SharedGraphemePool {
        let pool = capacity.map_or_else(Self::new, Self::with_capacity_limit);
        Rc::new(RefCell::new(pool))
    }

    /// Configured capacity limit.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn effective_capacity(&self) -> usize {
        self.capacity
            .unwrap_or(GraphemeHandle::MAX as usize)
            .min(GraphemeHandle::MAX as usize)
    }

    /// Intern a cluster, returning a handle holding one new reference.
    ///
    /// If the same bytes are already active the existing slot is shared and
    /// its refcount incremented. Otherwise a slot is allocated, reusing freed
    /// slots first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] when no slot is available.
    pub fn intern(&mut self, grapheme: &str) -> Result<GraphemeHandle> {
        if let Some(&id) = self.index.get(grapheme) {
            let slot = &mut self.slots[id as usize];
            slot.refcount = slot.refcount.saturating_add(1);
            return Ok(GraphemeHandle::from_raw(id));
        }

        if self.active_count() >= self.effective_capacity() {
            return Err(Error::PoolExhausted {
                capacity: self.effective_capacity(),
            });
        }

        let bytes: Box<str> = grapheme.into();
        let slot = Slot {
            bytes: bytes.clone(),
            refcount: 1,
        };
        let id = if let Some(free_id) = self.free_list.pop() {
            self.slots[free_id as usize] = slot;
            free_id
        } else {
            let id = u32::try_from(self.slots.len())
                .ok()
                .filter(|&id| id <= GraphemeHandle::MAX)
                .ok_or(Error::PoolExhausted {
                    capacity: GraphemeHandle::MAX as usize,
                })?;
            self.slots.push(slot);
            id
        };

        self.arena_bytes += bytes.len();
        self.index.insert(bytes, id);
        Ok(GraphemeHandle::from_raw(id))
    }

    /// Intern raw bytes, validating them as UTF-8 first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncoding`] for non-UTF-8 input, or
    /// [`Error::PoolExhausted`] as [`intern`](Self::intern).
    pub fn intern_bytes(&mut self, bytes: &[u8]) -> Result<GraphemeHandle> {
        let text = std::str::from_utf8(bytes)?;
        self.intern(text)
    }

    fn active_slot_mut(&mut self, handle: GraphemeHandle) -> Result<&mut Slot> {
        match self.slots.get_mut(handle.raw() as usize) {
            Some(slot) if !handle.is_null() && !slot.is_free() => Ok(slot),
            _ => Err(Error::StaleHandle),
        }
    }

    /// Add one reference to an active handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle is null or freed.
    pub fn retain(&mut self, handle: GraphemeHandle) -> Result<()> {
        let slot = self.active_slot_mut(handle)?;
        slot.refcount = slot.refcount.saturating_add(1);
        Ok(())
    }

    /// Drop one reference.
    ///
    /// Returns `true` if references remain, `false` if the slot was freed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle is null or already freed.
    pub fn release(&mut self, handle: GraphemeHandle) -> Result<bool> {
        let slot = self.active_slot_mut(handle)?;
        slot.refcount -= 1;
        if slot.refcount > 0 {
            return Ok(true);
        }
        let bytes = std::mem::take(&mut slot.bytes);
        self.arena_bytes -= bytes.len();
        self.index.remove(&bytes);
        self.free_list.push(handle.raw());
        Ok(false)
    }

    /// The cluster stored behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle is null or freed.
    pub fn resolve(&self, handle: GraphemeHandle) -> Result<&str> {
        match self.slots.get(handle.raw() as usize) {
            Some(slot) if !handle.is_null() && !slot.is_free() => Ok(&slot.bytes),
            _ => Err(Error::StaleHandle),
        }
    }

    /// Current refcount, 0 for invalid or freed handles.
    #[must_use]
    pub fn refcount(&self, handle: GraphemeHandle) -> u32 {
        if handle.is_null() {
            return 0;
        }
        self.slots
            .get(handle.raw() as usize)
            .map_or(0, |slot| slot.refcount)
    }

    /// Whether a handle currently resolves.
    #[must_use]
    pub fn is_valid(&self, handle: GraphemeHandle) -> bool {
        self.refcount(handle) > 0
    }

    /// Number of active clusters.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    /// Bytes held by active clusters.
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.arena_bytes
    }

    /// Snapshot of pool utilization.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let total_slots = self.slots.len() - 1;
        PoolStats {
            total_slots,
            active_slots: self.active_count(),
            free_slots: self.free_list.len(),
            arena_bytes: self.arena_bytes,
            capacity: self.capacity,
        }
    }

    /// Iterate over active `(handle, cluster)` pairs in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = (GraphemeHandle, &str)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| !slot.is_free())
            .map(|(idx, slot)| (GraphemeHandle::from_raw(idx as u32), &*slot.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("é").unwrap();
        let b = pool.intern("é").unwrap();
        assert_eq!(a, b);
        assert_eq!(pool.refcount(a), 2);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn test_handle_zero_reserved() {
        let mut pool = GraphemePool::new();
        let id = pool.intern("漢").unwrap();
        assert!(!id.is_null());
        assert!(pool.resolve(GraphemeHandle::default()).is_err());
        assert!(pool.retain(GraphemeHandle::default()).is_err());
    }

    #[test]
    fn test_release_frees_and_reuses_slot() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("🎉").unwrap();
        assert!(!pool.release(a).unwrap());
        assert!(pool.resolve(a).is_err());
        assert_eq!(pool.stats().free_slots, 1);

        let b = pool.intern("→").unwrap();
        assert_eq!(a, b, "freed slot should be reused");
        assert_eq!(pool.resolve(b).unwrap(), "→");
    }

    #[test]
    fn test_release_stale_handle_errors() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("ü").unwrap();
        pool.release(a).unwrap();
        assert!(matches!(pool.release(a), Err(Error::StaleHandle)));
        assert!(matches!(pool.retain(a), Err(Error::StaleHandle)));
    }

    #[test]
    fn test_intern_after_free_gets_fresh_reference() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("ñ").unwrap();
        pool.release(a).unwrap();
        let b = pool.intern("ñ").unwrap();
        assert_eq!(pool.refcount(b), 1);
    }

    #[test]
    fn test_capacity_limit() {
        let mut pool = GraphemePool::with_capacity_limit(2);
        let a = pool.intern("α").unwrap();
        pool.intern("β").unwrap();
        // Existing clusters can still be shared.
        pool.intern("α").unwrap();
        let err = pool.intern("γ").unwrap_err();
        assert!(matches!(err, Error::PoolExhausted { capacity: 2 }));

        pool.release(a).unwrap();
        pool.release(a).unwrap();
        assert!(pool.intern("γ").is_ok());
    }

    #[test]
    fn test_intern_bytes_validates() {
        let mut pool = GraphemePool::new();
        assert!(matches!(
            pool.intern_bytes(&[0xC3]),
            Err(Error::InvalidEncoding(_))
        ));
        assert_eq!(pool.active_count(), 0);
        let id = pool.intern_bytes("ç".as_bytes()).unwrap();
        assert_eq!(pool.resolve(id).unwrap(), "ç");
    }

    #[test]
    fn test_stats_and_arena_bytes() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("日").unwrap();
        pool.intern("本").unwrap();
        let stats = pool.stats();
        assert_eq!(stats.active_slots, 2);
        assert_eq!(stats.arena_bytes, 6);
        pool.release(a).unwrap();
        assert_eq!(pool.arena_bytes(), 3);

        let active: Vec<_> = pool.iter_active().map(|(_, s)| s).collect();
        assert_eq!(active, vec!["本"]);
    }
}
