//! Optimal Recognition Point calculation
//!
//! Splits a word into the segments displayed around the highlighted pivot
//! character. Lengths are measured in characters, not bytes, so multi-byte
//! words split at the same visual offset as ASCII ones.

/// Pivot character index for a word, by character length.
pub fn orp_index(word: &str) -> usize {
    match word.chars().count() {
        0..=1 => 0,
        2..=5 => 1,
        6..=9 => 2,
        10..=13 => 3,
        _ => 4,
    }
}

/// Display segments of a word around its recognition point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSplit {
    pub before: String,
    pub pivot: String,
    pub after: String,
}

/// Split a word into `before`/`pivot`/`after` display segments.
///
/// The pivot is empty only when the index falls past the end of the word
/// (the empty word). Reassembling the three segments always reproduces
/// the input.
pub fn split(word: &str) -> WordSplit {
    let idx = orp_index(word);
    let mut parts = WordSplit::default();
    for (i, ch) in word.chars().enumerate() {
        if i < idx {
            parts.before.push(ch);
        } else if i == idx {
            parts.pivot.push(ch);
        } else {
            parts.after.push(ch);
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_follows_length_table() {
        assert_eq!(orp_index(""), 0);
        assert_eq!(orp_index("a"), 0);
        assert_eq!(orp_index("ab"), 1);
        assert_eq!(orp_index("hello"), 1);
        assert_eq!(orp_index("hellos"), 2);
        assert_eq!(orp_index("wonderful"), 2);
        assert_eq!(orp_index("extravagant"), 3);
        assert_eq!(orp_index("unimaginative"), 3);
        assert_eq!(orp_index("incomprehensible"), 4);
    }

    #[test]
    fn index_is_monotonic_in_length() {
        let mut word = String::new();
        let mut last = 0;
        for _ in 0..30 {
            word.push('x');
            let idx = orp_index(&word);
            assert!(idx >= last, "index decreased at length {}", word.len());
            assert!(idx <= 4);
            last = idx;
        }
    }

    #[test]
    fn split_reassembles_word() {
        for word in ["", "a", "it", "hello", "wonderful", "extravagant", "incomprehensible", "héllo"] {
            let parts = split(word);
            let rebuilt = format!("{}{}{}", parts.before, parts.pivot, parts.after);
            assert_eq!(rebuilt, word);
        }
    }

    #[test]
    fn pivot_empty_only_for_empty_word() {
        assert_eq!(split("").pivot, "");
        assert_eq!(split("a").pivot, "a");
        assert_eq!(split("hello").pivot, "e");
    }

    #[test]
    fn split_is_char_based() {
        let parts = split("héllo");
        assert_eq!(parts.before, "h");
        assert_eq!(parts.pivot, "é");
        assert_eq!(parts.after, "llo");
    }
}
