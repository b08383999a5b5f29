/// Returns the prefix of `text` holding at most `max_chars` characters.
///
/// Counts Unicode scalar values, never splits a character, and borrows
/// instead of allocating when nothing needs cutting.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_shorter_text_is_untouched() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length_is_untouched() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_cuts_to_exact_char_count() {
        let long = "a".repeat(10_050);
        assert_eq!(truncate_chars(&long, 10_000).chars().count(), 10_000);
    }

    #[test]
    fn test_truncate_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }
}
