//! `cl100k_base` BPE tokenizer.

use crate::TokenizerError;
use promptweave_core::Tokenizer;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// The `cl100k_base` encoding. The BPE ranks ship with `tiktoken-rs`, so
/// loading never touches the network.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, TokenizerError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::Load(e.to_string()))?;
        debug!("Loaded cl100k_base tokenizer");
        Ok(Self { bpe })
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    /// A prefix can end inside a multi-byte character. Such trailing tokens
    /// are dropped and replaced by a single U+FFFD.
    fn decode(&self, tokens: &[u32]) -> String {
        let mut end = tokens.len();
        while end > 0 {
            if let Ok(text) = self.bpe.decode(tokens[..end].to_vec()) {
                if end < tokens.len() {
                    return format!("{text}{}", char::REPLACEMENT_CHARACTER);
                }
                return text;
            }
            end -= 1;
        }
        if tokens.is_empty() {
            String::new()
        } else {
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cl100kTokenizer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Cl100kTokenizer {
        Cl100kTokenizer::new().unwrap()
    }

    #[test]
    fn known_token_counts() {
        let t = tokenizer();
        assert_eq!(t.count("Hello World"), 2);
        assert_eq!(t.count("Hello\n\nWorld"), 3);
        assert_eq!(t.count(""), 0);
    }

    #[test]
    fn round_trips() {
        let t = tokenizer();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(t.decode(&t.encode(text)), text);
    }

    #[test]
    fn truncation_yields_prefix() {
        let t = tokenizer();
        let text = "The quick brown fox jumps over the lazy dog.";
        let truncated = t.truncate(text, 3);
        assert!(text.starts_with(&truncated));
        assert_eq!(t.count(&truncated), 3);
    }
}
