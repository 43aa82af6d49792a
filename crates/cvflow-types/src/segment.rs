//! Classification of document-path segments.
//!
//! A path into a studio inputs document is an ordered list of strings. A
//! segment addressing a list element is the decimal text of its zero-based
//! index; any other segment addresses an object key. The platform carries
//! both in the same repeated-string field, so classification is purely
//! textual.

/// Returns `true` if `segment` addresses a list index.
///
/// A segment is an index iff it is non-empty and consists solely of ASCII
/// digits. Signs, decimal points, and anything non-ASCII make it a key, so
/// `"-1"` and `"1.0"` are keys while `"007"` is the index 7.
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a segment as a list index, or `None` if it is a key segment.
pub fn parse_index(segment: &str) -> Option<usize> {
    if is_index(segment) {
        // Digit strings too large for usize are out of contract; treat
        // them as keys rather than failing the caller.
        segment.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_digits_are_indices() {
        assert!(is_index("0"));
        assert!(is_index("3"));
        assert!(is_index("42"));
        assert_eq!(parse_index("42"), Some(42));
    }

    #[test]
    fn leading_zeros_still_index() {
        assert!(is_index("007"));
        assert_eq!(parse_index("007"), Some(7));
    }

    #[test]
    fn signs_and_decimals_are_keys() {
        assert!(!is_index("-1"));
        assert!(!is_index("+1"));
        assert!(!is_index("1.0"));
        assert_eq!(parse_index("-1"), None);
    }

    #[test]
    fn empty_and_text_are_keys() {
        assert!(!is_index(""));
        assert!(!is_index("devices"));
        assert!(!is_index("1a"));
        assert!(!is_index("a1"));
    }

    #[test]
    fn non_ascii_digits_are_keys() {
        assert!(!is_index("٣"));
    }

    #[test]
    fn overflowing_index_falls_back_to_key() {
        let huge = "9".repeat(40);
        assert!(is_index(&huge));
        assert_eq!(parse_index(&huge), None);
    }
}
