//! Tokenizer trait: the abstraction every budget is measured with.
//!
//! Implementations live in `promptweave-tokenizers`. A tokenizer must be
//! deterministic, and decoding a prefix of an encoding must yield a prefix
//! of the original text (a partial multi-byte token may degrade to a
//! replacement character).

/// Converts text to token ids and back.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids. The length is the token count.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    fn decode(&self, tokens: &[u32]) -> String;

    /// Number of tokens `text` encodes to.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Keep at most the first `max_tokens` tokens of `text`.
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let encoded = self.encode(text);
        if encoded.len() <= max_tokens {
            return text.to_string();
        }
        self.decode(&encoded[..max_tokens])
    }
}
