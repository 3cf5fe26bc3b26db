//! Tokenizer implementations for promptweave.
//!
//! - [`Cl100kTokenizer`]: the `cl100k_base` BPE used by GPT-3.5/GPT-4
//!   class models. The default.
//! - [`CharTokenizer`]: one token per Unicode scalar value. Exact and
//!   dependency-free; handy for tests and for character budgets.
//! - `HuggingFaceTokenizer`: any `tokenizer.json` (feature `huggingface`).

pub mod chars;
pub mod cl100k;

#[cfg(feature = "huggingface")]
pub mod huggingface;

pub use chars::CharTokenizer;
pub use cl100k::Cl100kTokenizer;

#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceTokenizer;

/// Tokenizer construction errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenizerError {
    #[error("Failed to load tokenizer: {0}")]
    Load(String),

    #[error("Unknown tokenizer kind: {0}")]
    UnknownKind(String),
}

/// Build a tokenizer from a configured kind: `"cl100k"`, `"char"`, or
/// `"huggingface"` (which needs `path` to a `tokenizer.json`).
#[cfg_attr(not(feature = "huggingface"), allow(unused_variables))]
pub fn from_kind(
    kind: &str,
    path: Option<&std::path::Path>,
) -> Result<Box<dyn promptweave_core::Tokenizer>, TokenizerError> {
    match kind {
        "cl100k" => Ok(Box::new(Cl100kTokenizer::new()?)),
        "char" => Ok(Box::new(CharTokenizer::new())),
        #[cfg(feature = "huggingface")]
        "huggingface" => {
            let path = path.ok_or_else(|| {
                TokenizerError::Load("huggingface tokenizer needs a tokenizer_path".into())
            })?;
            Ok(Box::new(HuggingFaceTokenizer::from_file(path)?))
        }
        other => Err(TokenizerError::UnknownKind(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_known_kinds() {
        let char_tokenizer = from_kind("char", None).unwrap();
        assert_eq!(char_tokenizer.count("abc"), 3);
        assert!(from_kind("cl100k", None).is_ok());
    }

    #[test]
    fn path_is_ignored_by_builtin_kinds() {
        let path = std::path::Path::new("tokenizer.json");
        let tokenizer = from_kind("char", Some(path)).unwrap();
        assert_eq!(tokenizer.count("abcd"), 4);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = from_kind("sentencepiece", None).err().unwrap();
        assert!(matches!(err, TokenizerError::UnknownKind(k) if k == "sentencepiece"));
    }
}
