// Text helpers shared by the log statements of every crate

/// Shorten `s` to at most `max_chars` characters for log output, appending
/// `...` when something was cut. Cuts on char boundaries only.
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log() {
        let cases = [
            ("Hello World", 5, "Hello..."),
            ("Short", 10, "Short"),
            ("", 5, ""),
            ("Exactly", 7, "Exactly"),
            ("Привет мир", 6, "Привет..."),
        ];

        for (input, max, expected) in cases {
            assert_eq!(truncate_for_log(input, max), expected, "input {input:?}");
        }
    }
}
