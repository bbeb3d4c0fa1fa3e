//! Article text normalization.
//!
//! Every piece of text that reaches the vectorizer, at training time and at
//! prediction time alike, goes through [`normalize`]. There is exactly one
//! implementation, a fixed chain of char filters:
//!
//! ```text
//! Raw Text → Lowercase → strip URLs → strip digits → strip punctuation → trim
//! ```
//!
//! # Examples
//!
//! ```
//! use verity::analysis::normalizer::normalize;
//!
//! let text = "BREAKING: 5G towers!!! See http://example.com/x now";
//! assert_eq!(normalize(text), "breaking g towers see  now");
//! ```

use std::sync::{Arc, LazyLock};

use crate::analysis::char_filter::CharFilter;
use crate::analysis::char_filter::lowercase::LowercaseCharFilter;
use crate::analysis::char_filter::pattern_replace::PatternReplaceCharFilter;
use crate::error::Result;

/// A URL is a run of non-whitespace characters following `http`.
pub const URL_PATTERN: &str = r"http\S+";

/// Any run of (Unicode) decimal digits.
pub const DIGIT_PATTERN: &str = r"\d+";

/// Anything that is neither a word character nor whitespace.
pub const PUNCTUATION_PATTERN: &str = r"[^\w\s]";

/// The process-wide normalizer shared by training and inference.
static NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::new);

/// Normalize raw article text into its canonical token string.
///
/// Pure function of its input. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    NORMALIZER.normalize(text)
}

/// The fixed normalization chain used for article text.
///
/// Removing characters can splice fragments into a new `http…` run (for
/// example `ht-tp://x`), so the removal stages are re-applied until the text
/// stops changing. Ordinary text settles after a single pass. This makes
/// `normalize(normalize(x)) == normalize(x)` hold for every input.
pub struct TextNormalizer {
    lowercase: LowercaseCharFilter,
    removals: Vec<Arc<dyn CharFilter>>,
}

impl TextNormalizer {
    /// Build the normalizer.
    pub fn new() -> Self {
        Self::try_new().expect("Normalizer patterns should be valid")
    }

    fn try_new() -> Result<Self> {
        let removals: Vec<Arc<dyn CharFilter>> = vec![
            Arc::new(PatternReplaceCharFilter::remove(URL_PATTERN)?.with_name("url")),
            Arc::new(PatternReplaceCharFilter::remove(DIGIT_PATTERN)?.with_name("digit")),
            Arc::new(
                PatternReplaceCharFilter::remove(PUNCTUATION_PATTERN)?.with_name("punctuation"),
            ),
        ];

        Ok(TextNormalizer {
            lowercase: LowercaseCharFilter::new(),
            removals,
        })
    }

    /// Normalize `text`.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.lowercase.filter(text);

        loop {
            let next = self.remove_once(&current);
            if next == current {
                return next;
            }
            current = next;
        }
    }

    fn remove_once(&self, text: &str) -> String {
        let mut filtered = text.to_string();
        for filter in &self.removals {
            filtered = filter.filter(&filtered);
        }
        filtered.trim().to_string()
    }

    /// Names of the stages in application order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.lowercase.name()];
        names.extend(self.removals.iter().map(|f| f.name()));
        names.push("trim");
        names
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CharFilter for TextNormalizer {
    fn filter(&self, input: &str) -> String {
        self.normalize(input)
    }

    fn name(&self) -> &'static str {
        "article_normalizer"
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_trim() {
        assert_eq!(normalize("  Hello World  "), "hello world");
    }

    #[test]
    fn test_strips_urls() {
        assert_eq!(
            normalize("read https://t.co/AbC123?x=1 today"),
            "read  today"
        );
        assert_eq!(normalize("HTTP://EXAMPLE.COM"), "");
    }

    #[test]
    fn test_strips_digits_and_punctuation() {
        assert_eq!(normalize("COVID-19 in 2020!!!"), "covid in");
        assert_eq!(normalize("don't stop_words"), "dont stop_words");
    }

    #[test]
    fn test_preserves_internal_whitespace() {
        assert_eq!(normalize("a  b\n\nc"), "a  b\n\nc");
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        assert_eq!(normalize("!!! ??? 123"), "");
    }

    #[test]
    fn test_unicode_text() {
        assert_eq!(normalize("ÉCOLE Née"), "école née");
    }

    #[test]
    fn test_spliced_url_settles() {
        // One pass leaves "httpx", which is itself a URL match.
        let once = normalize("ht-tp://x");
        assert_eq!(once, "");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_idempotent_on_samples() {
        for sample in [
            "BREAKING: Shocking secret conspiracy!!! Anonymous insider reveals...",
            "According to a study published in a peer-reviewed journal",
            "h1ttp2 stuff",
            "",
        ] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_stage_names() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.stage_names(),
            vec!["lowercase", "url", "digit", "punctuation", "trim"]
        );
        assert_eq!(normalizer.name(), "article_normalizer");
    }
}
