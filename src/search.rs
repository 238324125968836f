//! Search functionality for filtering items.
//!
//! This module encapsulates the search/matching logic, allowing the underlying
//! implementation to be changed without affecting the rest of the codebase.

/// A case-insensitive substring matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Matcher;

impl Matcher {
    pub const fn new() -> Self {
        Self
    }

    /// Check if `text` contains `pattern`, ignoring case.
    ///
    /// An empty pattern matches everything.
    pub fn matches(&self, text: &str, pattern: &str) -> bool {
        text.to_lowercase().contains(&pattern.to_lowercase())
    }

    /// Check if any of the provided texts match the pattern.
    pub fn matches_any<'a>(&self, texts: impl IntoIterator<Item = &'a str>, pattern: &str) -> bool {
        texts.into_iter().any(|text| self.matches(text, pattern))
    }
}
