//! Response shaping shared by every fulfillment path.
//!
//! Model-generated answers are capped at `max_chars` characters (Unicode
//! scalar values, not bytes). Longer answers are cut, followed by "..." and
//! the "more detail?" suffix in the active language. Self-contained tool
//! messages are never shaped.

use storedesk_shared::Language;

pub const DEFAULT_MAX_CHARS: usize = 50;

pub const ELLIPSIS: &str = "...";

/// Apply the length cap to a model answer
pub fn shape_answer(raw: &str, language: Language, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let head: String = raw.chars().take(max_chars).collect();
    format!("{}{}{}", head, ELLIPSIS, language.more_detail_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_answer_unchanged() {
        let raw = "영업시간은 오전 11시부터 오후 9시까지예요.";
        assert_eq!(shape_answer(raw, Language::Ko, DEFAULT_MAX_CHARS), raw);
    }

    #[test]
    fn test_exactly_at_limit_unchanged() {
        let raw = "가".repeat(50);
        assert_eq!(shape_answer(&raw, Language::Ko, 50), raw);
    }

    #[test]
    fn test_long_answer_truncated_by_chars() {
        let raw = "가".repeat(51);
        let shaped = shape_answer(&raw, Language::Ko, 50);
        let expected = format!("{}...\n\n더 자세히 설명해드릴까요?", "가".repeat(50));
        assert_eq!(shaped, expected);
    }

    #[test]
    fn test_suffix_follows_language() {
        let raw = "a".repeat(80);
        let shaped = shape_answer(&raw, Language::En, 50);
        assert!(shaped.starts_with(&"a".repeat(50)));
        assert!(shaped.ends_with("...\n\nWould you like more detail?"));
    }
}
