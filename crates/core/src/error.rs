//! Error types for the promptweave domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Construction-time problems and render-time problems are kept apart:
//! a [`ConfigurationError`] is never raised mid-render, and running over a
//! token budget is never an error at all (it is reported via `too_long`).

use thiserror::Error;

/// The top-level error type for all promptweave operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Construction / registration ---
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    // --- Rendering ---
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Raised while sections, prompts, functions or data sources are being built
/// or registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Invalid template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("A {kind} named '{name}' is already registered")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Data source not found: {0}")]
    DataSourceNotFound(String),

    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("Failed to load prompt '{name}': {reason}")]
    PromptLoad { name: String, reason: String },

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

/// Raised by an external collaborator while a section renders. Propagates
/// unchanged to the caller of the top-level render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Function '{name}' failed: {reason}")]
    Function { name: String, reason: String },

    #[error("Data source '{name}' failed: {reason}")]
    DataSource { name: String, reason: String },

    #[error("Tokenizer failure: {0}")]
    Tokenizer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_displays_correctly() {
        let err = Error::Configuration(ConfigurationError::DuplicateName {
            kind: "prompt",
            name: "chat".into(),
        });
        assert!(err.to_string().contains("prompt"));
        assert!(err.to_string().contains("chat"));
    }

    #[test]
    fn render_error_converts_into_top_level() {
        let err: Error = RenderError::DataSource {
            name: "docs".into(),
            reason: "index offline".into(),
        }
        .into();
        assert!(matches!(err, Error::Render(RenderError::DataSource { .. })));
        assert!(err.to_string().contains("index offline"));
    }
}
