#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((clip_idx, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let mut out = text[..clip_idx].to_string();
    out.push_str("...");
    out
}

#[must_use]
pub fn clip_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((clip_idx, _)) => &text[..clip_idx],
        None => text,
    }
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Bullets, dashes, middle dots and "1." / "2)" style numbering.
#[must_use]
pub fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    let without_digits = trimmed.trim_start_matches(|ch: char| ch.is_ascii_digit());
    let rest = if without_digits.len() < trimmed.len()
        && without_digits.starts_with(['.', ')', ':'])
    {
        &without_digits[1..]
    } else {
        trimmed
    };
    rest.trim_start_matches(['-', '*', '+', '•', '・', '·'])
        .trim()
        .trim_matches(['"', '*'])
        .trim()
}

#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_text_preserves_utf8_char_boundaries() {
        let input = "\u{C548}\u{B155}\u{D558}\u{C138}\u{C694}-hello";
        let clipped = truncate_text(input, 5);
        let expected = format!("{}...", "\u{C548}\u{B155}\u{D558}\u{C138}\u{C694}");
        assert_eq!(clipped, expected);
    }

    #[test]
    fn truncate_text_returns_original_when_input_fits_limit() {
        assert_eq!(truncate_text("hello", 5), "hello");
    }

    #[test]
    fn clip_chars_cuts_without_ellipsis() {
        assert_eq!(clip_chars("売上高が増加", 2), "売上");
        assert_eq!(clip_chars("abc", 10), "abc");
    }

    #[test]
    fn strip_list_marker_handles_numbering_and_bullets() {
        assert_eq!(strip_list_marker("1. regional retail demand"), "regional retail demand");
        assert_eq!(strip_list_marker("  2) churn benchmarks "), "churn benchmarks");
        assert_eq!(strip_list_marker("- competitor pricing"), "competitor pricing");
        assert_eq!(strip_list_marker("・業界動向"), "業界動向");
        assert_eq!(strip_list_marker("\"saas pricing\""), "saas pricing");
        assert_eq!(strip_list_marker("3D printing market"), "3D printing market");
        assert_eq!(strip_list_marker("1. **EV battery supply**"), "EV battery supply");
    }

    #[test]
    fn non_blank_filters_whitespace_only_values() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
    }
}
