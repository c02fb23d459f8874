//! Generation-checked storage for text buffers.
//!
//! A [`BufferArena`] owns buffers that share one grapheme pool and hands out
//! [`BufferHandle`]s. Removing a buffer bumps its slot's generation, so a
//! handle kept past removal fails with [`Error::StaleHandle`] instead of
//! reaching whatever buffer reuses the slot.

use crate::error::{Error, Result};
use crate::grapheme_pool::{GraphemePool, SharedGraphemePool};
use crate::options::TextOptions;
use crate::text::buffer::TextBuffer;
use std::fmt;

/// Reference to a buffer stored in a [`BufferArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    index: u32,
    generation: u32,
}

impl BufferHandle {
    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation the slot had when the handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    buffer: Option<TextBuffer>,
}

/// Buffers sharing one grapheme pool, addressed by generation-checked handles.
#[derive(Debug)]
pub struct BufferArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    pool: SharedGraphemePool,
    options: TextOptions,
}

impl Default for BufferArena {
    fn default() -> Self {
        Self::new(TextOptions::default())
    }
}

impl BufferArena {
    /// Create an arena whose buffers use `options` and a fresh shared pool.
    #[must_use]
    pub fn new(options: TextOptions) -> Self {
        Self::with_pool(GraphemePool::shared(options.pool_capacity), options)
    }

    /// Create an arena around an existing shared pool.
    #[must_use]
    pub fn with_pool(pool: SharedGraphemePool, options: TextOptions) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            pool,
            options,
        }
    }

    /// The pool every buffer created by this arena interns into.
    #[must_use]
    pub fn pool(&self) -> &SharedGraphemePool {
        &self.pool
    }

    /// Create an empty buffer in the arena.
    pub fn create(&mut self) -> BufferHandle {
        let buffer = TextBuffer::with_pool(self.pool.clone(), self.options);
        self.insert(buffer)
    }

    /// Create a buffer holding `text`.
    ///
    /// # Errors
    ///
    /// Propagates grapheme pool errors; the arena is unchanged on error.
    pub fn create_with_text(&mut self, text: &str) -> Result<BufferHandle> {
        let mut buffer = TextBuffer::with_pool(self.pool.clone(), self.options);
        buffer.set_text(text)?;
        Ok(self.insert(buffer))
    }

    /// Move a buffer into the arena.
    pub fn insert(&mut self, buffer: TextBuffer) -> BufferHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.buffer = Some(buffer);
            return BufferHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            buffer: Some(buffer),
        });
        BufferHandle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: BufferHandle) -> Result<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.buffer.is_some())
            .ok_or(Error::StaleHandle)
    }

    /// Borrow a buffer.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if the buffer was removed.
    pub fn get(&self, handle: BufferHandle) -> Result<&TextBuffer> {
        self.slot(handle)?
            .buffer
            .as_ref()
            .ok_or(Error::StaleHandle)
    }

    /// Mutably borrow a buffer.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if the buffer was removed.
    pub fn get_mut(&mut self, handle: BufferHandle) -> Result<&mut TextBuffer> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.buffer.as_mut())
            .ok_or(Error::StaleHandle)
    }

    /// Take a buffer out of the arena, invalidating every handle to it.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if the buffer was already removed.
    pub fn remove(&mut self, handle: BufferHandle) -> Result<TextBuffer> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let buffer = slot.buffer.take().ok_or(Error::StaleHandle)?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(buffer)
    }

    /// Whether `handle` still refers to a live buffer.
    #[must_use]
    pub fn contains(&self, handle: BufferHandle) -> bool {
        self.slot(handle).is_ok()
    }

    /// Number of live buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the arena holds no buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live buffers with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (BufferHandle, &TextBuffer)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let buffer = slot.buffer.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((
                BufferHandle {
                    index,
                    generation: slot.generation,
                },
                buffer,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_after_remove() {
        let mut arena = BufferArena::default();
        let a = arena.create_with_text("alpha").unwrap();
        assert_eq!(arena.get(a).unwrap().plain_text(), "alpha");

        let removed = arena.remove(a).unwrap();
        assert_eq!(removed.plain_text(), "alpha");
        assert!(matches!(arena.get(a), Err(Error::StaleHandle)));
        assert!(matches!(arena.remove(a), Err(Error::StaleHandle)));

        // The slot is reused under a new generation.
        let b = arena.create();
        assert_eq!(b.index(), a.index());
        assert_ne!(b, a);
        assert!(arena.get_mut(a).is_err());
        assert!(arena.contains(b));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_buffers_share_the_pool() {
        let mut arena = BufferArena::default();
        let a = arena.create_with_text("漢").unwrap();
        let b = arena.create_with_text("漢字").unwrap();
        let handle = arena.get(a).unwrap().grapheme_handles().next().unwrap();
        assert_eq!(arena.pool().borrow().refcount(handle), 2);

        drop(arena.remove(b).unwrap());
        assert_eq!(arena.pool().borrow().refcount(handle), 1);
        assert_eq!(arena.pool().borrow().active_count(), 1);
    }

    #[test]
    fn test_iter_and_mutation() {
        let mut arena = BufferArena::default();
        let a = arena.create();
        let b = arena.create();
        arena.get_mut(b).unwrap().append("bee").unwrap();
        let live: Vec<_> = arena.iter().map(|(h, buf)| (h, buf.plain_text())).collect();
        assert_eq!(live, vec![(a, String::new()), (b, "bee".to_owned())]);
        assert!(!arena.is_empty());
    }
}
