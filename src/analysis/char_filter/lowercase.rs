//! Lowercase char filter implementation.
//!
//! Lowercases the whole text before any pattern is applied, so that the
//! URL pattern (`http…`) also matches `HTTP…` in the raw input.

use super::CharFilter;

/// A char filter that converts the whole text to lowercase.
///
/// Uses Unicode-aware lowercasing, so non-ASCII capitals (`É`, `Σ`) are
/// folded as well.
#[derive(Clone, Debug, Default)]
pub struct LowercaseCharFilter;

impl LowercaseCharFilter {
    /// Create a new lowercase char filter.
    pub fn new() -> Self {
        LowercaseCharFilter
    }
}

impl CharFilter for LowercaseCharFilter {
    fn filter(&self, input: &str) -> String {
        input.to_lowercase()
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
