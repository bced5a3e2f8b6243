//! Normalized comparison keys for free-text fields.
//!
//! Fabric names, design references, and customer names all arrive as free text
//! typed by operators or copied from spreadsheets. Every comparison between them
//! goes through [`MatchKey`], so pricing resolution, invoice grouping, and import
//! matching always agree on what "the same fabric" means.

use core::fmt;

/// Trimmed, case-folded form of a free-text value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Key for an optional constraint field.
    ///
    /// Absent and blank values both mean "no constraint" and yield `None`.
    pub fn optional(raw: Option<&str>) -> Option<Self> {
        raw.map(Self::new).filter(|k| !k.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
