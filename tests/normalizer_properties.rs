use proptest::prelude::*;

use verity::analysis::normalizer::normalize;

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "\\PC{0,200}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_for_url_fragments(
        parts in prop::collection::vec("(ht|tp|h|t|p|-|:|/|1|x| )", 0..40)
    ) {
        let text = parts.concat();
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalized_text_has_no_digits_or_punctuation(text in "\\PC{0,200}") {
        let normalized = normalize(&text);
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_digit()));
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_punctuation() && c != '_'));
        prop_assert_eq!(normalized.trim(), normalized.as_str());
    }
}

#[test]
fn test_empty_and_whitespace() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   \t\n "), "");
    assert_eq!(normalize("!!! 123 ..."), "");
}

#[test]
fn test_spliced_url_is_removed() {
    assert_eq!(normalize("ht-tp://example.com"), "");
}
