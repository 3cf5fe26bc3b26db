//! One token per character.

use promptweave_core::Tokenizer;

/// Treats every Unicode scalar value as a token whose id is its code point.
///
/// Round-trips exactly and truncates on character boundaries, so token
/// counts are simply character counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl CharTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        tokens
            .iter()
            .map(|&t| char::from_u32(t).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(CharTokenizer.count("héllo"), 5);
        assert_eq!(CharTokenizer.encode("héllo").len(), 5);
    }

    #[test]
    fn prefix_decodes_to_prefix() {
        let tokens = CharTokenizer.encode("Hello World");
        assert_eq!(CharTokenizer.decode(&tokens[..5]), "Hello");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(CharTokenizer.truncate("abc", 10), "abc");
        assert_eq!(CharTokenizer.truncate("abcdef", 2), "ab");
    }
}
