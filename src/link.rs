//! Hyperlink pool for URLs attached to styled chunks.
//!
//! Link IDs are packed into [`TextAttributes`](crate::TextAttributes) so a
//! renderer can emit an OSC 8 hyperlink for any styled run that carries one.

use crate::error::{Error, Result};
use crate::style::TextAttributes;
use std::collections::HashMap;

/// Deduplicating, reference-counted pool of hyperlink URLs.
///
/// ID 0 means "no link" and is never handed out.
#[derive(Clone, Debug, Default)]
pub struct LinkPool {
    urls: Vec<Option<String>>,
    ref_counts: Vec<u32>,
    free_list: Vec<u32>,
    index: HashMap<String, u32>,
}

impl LinkPool {
    /// Create a new empty link pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a URL, returning its non-zero ID with one new reference.
    ///
    /// # Errors
    ///
    /// [`Error::PoolExhausted`] when every ID that fits in the attribute bits
    /// is in use.
    pub fn intern(&mut self, url: &str) -> Result<u32> {
        if let Some(&id) = self.index.get(url) {
            let idx = (id - 1) as usize;
            self.ref_counts[idx] = self.ref_counts[idx].saturating_add(1);
            return Ok(id);
        }

        let id = if let Some(id) = self.free_list.pop() {
            let idx = (id - 1) as usize;
            self.urls[idx] = Some(url.to_string());
            self.ref_counts[idx] = 1;
            id
        } else {
            let id = u32::try_from(self.urls.len() + 1)
                .ok()
                .filter(|&id| id <= TextAttributes::MAX_LINK_ID)
                .ok_or(Error::PoolExhausted {
                    capacity: TextAttributes::MAX_LINK_ID as usize,
                })?;
            self.urls.push(Some(url.to_string()));
            self.ref_counts.push(1);
            id
        };
        self.index.insert(url.to_string(), id);
        Ok(id)
    }

    /// Get the URL for a link ID.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.urls
            .get((id - 1) as usize)
            .and_then(|u| u.as_deref())
    }

    /// Add a reference to a live link. Unknown IDs are ignored.
    pub fn retain(&mut self, id: u32) {
        if self.get(id).is_some() {
            let idx = (id - 1) as usize;
            self.ref_counts[idx] = self.ref_counts[idx].saturating_add(1);
        }
    }

    /// Drop a reference, freeing the slot at zero. Unknown IDs are ignored.
    pub fn release(&mut self, id: u32) {
        if self.get(id).is_none() {
            return;
        }
        let idx = (id - 1) as usize;
        self.ref_counts[idx] -= 1;
        if self.ref_counts[idx] == 0 {
            if let Some(url) = self.urls[idx].take() {
                self.index.remove(&url);
            }
            self.free_list.push(id);
        }
    }

    /// Number of live links.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.index.len()
    }

    /// Check if no links are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop every link.
    pub fn clear(&mut self) {
        self.urls.clear();
        self.ref_counts.clear();
        self.free_list.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut pool = LinkPool::new();
        let id = pool.intern("https://example.com").unwrap();
        assert_ne!(id, 0);
        assert_eq!(pool.get(id), Some("https://example.com"));
        assert_eq!(pool.get(0), None);
    }

    #[test]
    fn test_intern_dedups() {
        let mut pool = LinkPool::new();
        let a = pool.intern("https://one.example").unwrap();
        let b = pool.intern("https://one.example").unwrap();
        let c = pool.intern("https://two.example").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_release_frees_after_last_reference() {
        let mut pool = LinkPool::new();
        let id = pool.intern("https://example.com").unwrap();
        pool.retain(id);
        pool.release(id);
        assert_eq!(pool.get(id), Some("https://example.com"));
        pool.release(id);
        assert_eq!(pool.get(id), None);
        // Double release is ignored.
        pool.release(id);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_slot_reuse() {
        let mut pool = LinkPool::new();
        let id1 = pool.intern("https://one.example").unwrap();
        pool.release(id1);
        let id2 = pool.intern("https://two.example").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(pool.get(id2), Some("https://two.example"));
    }
}
