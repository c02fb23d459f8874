//! Style-ID registry.
//!
//! Highlights refer to styles by a small integer ID. Language-aware
//! highlighters register named styles up front; styled-chunk ingestion
//! registers anonymous styles on the fly, deduplicated by value.

use crate::style::{Style, StyleKey};
use std::collections::HashMap;

/// A registered style.
#[derive(Clone, Debug)]
pub struct SyntaxStyle {
    /// Unique identifier.
    pub id: u32,
    /// Human-readable name. Anonymous styles are named `"style.<id>"`.
    pub name: String,
    /// The style to apply.
    pub style: Style,
}

impl SyntaxStyle {
    /// Create a new syntax style.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, style: Style) -> Self {
        Self {
            id,
            name: name.into(),
            style,
        }
    }
}

/// Registry mapping style IDs to [`Style`] values.
#[derive(Clone, Debug, Default)]
pub struct SyntaxStyleRegistry {
    styles: HashMap<u32, SyntaxStyle>,
    by_name: HashMap<String, u32>,
    by_value: HashMap<StyleKey, u32>,
    next_id: u32,
}

impl SyntaxStyleRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named style with an auto-generated ID.
    pub fn register(&mut self, name: impl Into<String>, style: Style) -> u32 {
        let id = self.next_id;
        self.register_with_id(id, name, style);
        id
    }

    /// Register a style with a specific ID, replacing any previous entry.
    pub fn register_with_id(&mut self, id: u32, name: impl Into<String>, style: Style) {
        let name = name.into();
        if let Some(old) = self.styles.remove(&id) {
            self.by_name.remove(&old.name);
            if self.by_value.get(&old.style.key()) == Some(&id) {
                self.by_value.remove(&old.style.key());
            }
        }
        self.by_name.insert(name.clone(), id);
        self.by_value.entry(style.key()).or_insert(id);
        self.styles.insert(id, SyntaxStyle::new(id, name, style));
        self.next_id = self.next_id.max(id.saturating_add(1));
    }

    /// ID of a style with exactly this value, registering an anonymous entry
    /// if none exists yet.
    pub fn intern(&mut self, style: Style) -> u32 {
        if let Some(&id) = self.by_value.get(&style.key()) {
            return id;
        }
        let id = self.next_id;
        self.register_with_id(id, format!("style.{id}"), style);
        id
    }

    /// Get a style by ID.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&SyntaxStyle> {
        self.styles.get(&id)
    }

    /// Get style ID by name.
    #[must_use]
    pub fn id_for_name(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    /// Get the style value by ID.
    #[must_use]
    pub fn style(&self, id: u32) -> Option<Style> {
        self.styles.get(&id).map(|s| s.style)
    }

    /// Get the number of registered styles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Clear all styles.
    pub fn clear(&mut self) {
        self.styles.clear();
        self.by_name.clear();
        self.by_value.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::style::TextAttributes;

    #[test]
    fn test_registry_basic() {
        let mut registry = SyntaxStyleRegistry::new();
        let id = registry.register(
            "keyword",
            Style::fg(Rgba::BLUE).with_attributes(TextAttributes::BOLD),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap().name, "keyword");
        assert_eq!(registry.id_for_name("keyword"), Some(id));
    }

    #[test]
    fn test_registry_with_id() {
        let mut registry = SyntaxStyleRegistry::new();
        registry.register_with_id(100, "comment", Style::fg(Rgba::GREEN));

        assert_eq!(registry.id_for_name("comment"), Some(100));
        let next = registry.register("string", Style::fg(Rgba::RED));
        assert_eq!(next, 101);
    }

    #[test]
    fn test_intern_dedups_by_value() {
        let mut registry = SyntaxStyleRegistry::new();
        let named = registry.register("error", Style::fg(Rgba::RED));
        assert_eq!(registry.intern(Style::fg(Rgba::RED)), named);

        let a = registry.intern(Style::bg(Rgba::BLUE));
        let b = registry.intern(Style::bg(Rgba::BLUE));
        assert_eq!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.style(a), Some(Style::bg(Rgba::BLUE)));
    }

    #[test]
    fn test_reregister_replaces_entry() {
        let mut registry = SyntaxStyleRegistry::new();
        registry.register_with_id(1, "a", Style::fg(Rgba::RED));
        registry.register_with_id(1, "b", Style::fg(Rgba::GREEN));
        assert_eq!(registry.id_for_name("a"), None);
        assert_eq!(registry.style(1), Some(Style::fg(Rgba::GREEN)));
        assert_ne!(registry.intern(Style::fg(Rgba::RED)), 1);
    }
}
