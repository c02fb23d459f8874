//! Registry of byte buffers that text can be loaded from by ID.
//!
//! Callers register text once and later point a buffer at it with
//! [`TextBuffer::set_from_registered`](crate::text::TextBuffer::set_from_registered).
//! Registered bytes are either moved into the registry ([`MemSource::Owned`])
//! or shared with the caller through an `Arc` ([`MemSource::Shared`]); in both
//! cases the registry's hold on them ends when the entry is replaced,
//! unregistered or the registry is cleared.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of a registered buffer.
///
/// IDs are allocated in increasing order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemId(u32);

impl MemId {
    /// Create an ID from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytes handed to the registry.
#[derive(Clone, Debug)]
pub enum MemSource {
    /// The registry takes ownership and drops the bytes when the entry goes.
    Owned(Vec<u8>),
    /// The caller keeps its own reference; the registry holds a clone.
    Shared(Arc<[u8]>),
}

impl MemSource {
    /// The registered bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Shared(bytes) => bytes,
        }
    }

    /// Whether the registry owns these bytes.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    fn owned_bytes(&self) -> usize {
        match self {
            Self::Owned(bytes) => bytes.capacity(),
            Self::Shared(_) => 0,
        }
    }
}

impl From<Vec<u8>> for MemSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Owned(bytes)
    }
}

impl From<String> for MemSource {
    fn from(text: String) -> Self {
        Self::Owned(text.into_bytes())
    }
}

impl From<Arc<[u8]>> for MemSource {
    fn from(bytes: Arc<[u8]>) -> Self {
        Self::Shared(bytes)
    }
}

/// Maps [`MemId`]s to registered byte buffers.
#[derive(Clone, Debug, Default)]
pub struct MemRegistry {
    entries: BTreeMap<MemId, MemSource>,
    next_id: u32,
}

impl MemRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return their new ID.
    ///
    /// # Errors
    ///
    /// [`Error::MemIdsExhausted`] once the ID space is used up; IDs are not
    /// recycled.
    pub fn register(&mut self, source: impl Into<MemSource>) -> Result<MemId> {
        let next = self.next_id.checked_add(1).ok_or(Error::MemIdsExhausted)?;
        let id = MemId(self.next_id);
        self.next_id = next;
        self.entries.insert(id, source.into());
        Ok(id)
    }

    /// Replace the bytes behind an existing ID, dropping the old ones.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`] if `id` is not registered.
    pub fn replace(&mut self, id: MemId, source: impl Into<MemSource>) -> Result<()> {
        let slot = self.entries.get_mut(&id).ok_or(Error::UnknownMemId(id))?;
        *slot = source.into();
        Ok(())
    }

    /// Remove an entry, returning its bytes.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`] if `id` is not registered.
    pub fn unregister(&mut self, id: MemId) -> Result<MemSource> {
        self.entries.remove(&id).ok_or(Error::UnknownMemId(id))
    }

    /// The bytes registered under `id`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownMemId`] if `id` is not registered.
    pub fn get(&self, id: MemId) -> Result<&[u8]> {
        self.entries
            .get(&id)
            .map(MemSource::as_bytes)
            .ok_or(Error::UnknownMemId(id))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: MemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. IDs keep increasing afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Bytes owned by the registry (shared entries are not counted).
    #[must_use]
    pub fn arena_bytes(&self) -> usize {
        self.entries.values().map(MemSource::owned_bytes).sum()
    }
}
