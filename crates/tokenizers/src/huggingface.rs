//! Tokenizers loaded from a Hugging Face `tokenizer.json`.

use crate::TokenizerError;
use promptweave_core::Tokenizer;
use std::path::Path;
use tracing::{debug, warn};

/// Wraps a `tokenizers::Tokenizer` so budgets can be measured in the exact
/// vocabulary of a local model.
pub struct HuggingFaceTokenizer {
    inner: tokenizers::Tokenizer,
}

impl HuggingFaceTokenizer {
    /// Load from a `tokenizer.json` file.
    pub fn from_file(path: &Path) -> Result<Self, TokenizerError> {
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| TokenizerError::Load(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded tokenizer.json");
        Ok(Self { inner })
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        match self.inner.encode(text, false) {
            Ok(encoding) => encoding.get_ids().to_vec(),
            Err(e) => {
                warn!(error = %e, "Tokenizer failed to encode text");
                Vec::new()
            }
        }
    }

    fn decode(&self, tokens: &[u32]) -> String {
        match self.inner.decode(tokens, false) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Tokenizer failed to decode tokens");
                String::new()
            }
        }
    }
}
