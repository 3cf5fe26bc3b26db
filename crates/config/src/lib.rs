//! Configuration loading, validation, and management for promptweave.
//!
//! Application settings come from `promptweave.toml` in the working
//! directory, falling back to `~/.promptweave/config.toml`, with
//! environment variable overrides. Per-prompt settings live next to each
//! prompt template as `config.json` (see [`template`]).

pub mod template;

pub use template::{AugmentationConfig, CompletionConfig, CompletionType, PromptTemplateConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaveConfig {
    /// Folder holding one sub-folder per prompt (`skprompt.txt` + `config.json`)
    #[serde(default = "default_prompts_folder")]
    pub prompts_folder: PathBuf,

    /// Tokenizer used to measure budgets: "cl100k", "char" or "huggingface"
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    /// Path to a `tokenizer.json` when `tokenizer = "huggingface"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_path: Option<PathBuf>,

    /// Default render ceiling when a prompt does not set its own
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// How the catalog assembles prompts loaded from disk
    #[serde(default)]
    pub catalog: CatalogConfig,
}

fn default_prompts_folder() -> PathBuf {
    PathBuf::from("prompts")
}
fn default_tokenizer() -> String {
    "cl100k".into()
}
fn default_max_input_tokens() -> usize {
    2048
}

/// Tokenizer kinds accepted by [`WeaveConfig::tokenizer`].
pub const TOKENIZER_KINDS: &[&str] = &["cl100k", "char", "huggingface"];

/// Section sizing used when the catalog builds a prompt from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Role of the template section
    #[serde(default = "default_role")]
    pub role: String,

    /// Sizing of the conversation history section (`tokens` semantics:
    /// negative = auto, 0..=1 = proportional, > 1 = fixed)
    #[serde(default = "default_history_tokens")]
    pub max_conversation_history_tokens: f64,

    /// Sizing of the user input section
    #[serde(default = "default_input_tokens")]
    pub max_input_tokens: f64,

    /// Memory variable holding a prompt's history; `{name}` is the prompt name
    #[serde(default = "default_history_variable")]
    pub history_variable_template: String,

    /// Memory variable holding the user's input
    #[serde(default = "default_input_variable")]
    pub input_variable: String,
}

fn default_role() -> String {
    "system".into()
}
fn default_history_tokens() -> f64 {
    1.0
}
fn default_input_tokens() -> f64 {
    -1.0
}
fn default_history_variable() -> String {
    "conversation.{name}_history".into()
}
fn default_input_variable() -> String {
    "temp.input".into()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            max_conversation_history_tokens: default_history_tokens(),
            max_input_tokens: default_input_tokens(),
            history_variable_template: default_history_variable(),
            input_variable: default_input_variable(),
        }
    }
}

impl CatalogConfig {
    /// The history variable for a given prompt.
    pub fn history_variable(&self, prompt_name: &str) -> String {
        self.history_variable_template.replace("{name}", prompt_name)
    }
}

impl WeaveConfig {
    /// Load configuration from `./promptweave.toml` if present, otherwise
    /// from `~/.promptweave/config.toml`.
    ///
    /// Environment variables override file settings:
    /// - `PROMPTWEAVE_PROMPTS`
    /// - `PROMPTWEAVE_TOKENIZER`
    /// - `PROMPTWEAVE_MAX_INPUT_TOKENS`
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from("promptweave.toml");
        let path = if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        };
        let mut config = Self::load_from(&path)?;

        if let Ok(folder) = std::env::var("PROMPTWEAVE_PROMPTS") {
            config.prompts_folder = PathBuf::from(folder);
        }

        if let Ok(kind) = std::env::var("PROMPTWEAVE_TOKENIZER") {
            config.tokenizer = kind;
        }

        if let Ok(max) = std::env::var("PROMPTWEAVE_MAX_INPUT_TOKENS") {
            config.max_input_tokens = max.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "PROMPTWEAVE_MAX_INPUT_TOKENS must be a positive integer, got '{max}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptweave")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_input_tokens must be greater than 0".into(),
            ));
        }

        if !TOKENIZER_KINDS.contains(&self.tokenizer.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "tokenizer must be one of {}, got '{}'",
                TOKENIZER_KINDS.join(", "),
                self.tokenizer
            )));
        }

        if self.tokenizer == "huggingface" && self.tokenizer_path.is_none() {
            return Err(ConfigError::ValidationError(
                "tokenizer_path is required for the huggingface tokenizer".into(),
            ));
        }

        if self.catalog.max_conversation_history_tokens.is_nan()
            || self.catalog.max_input_tokens.is_nan()
        {
            return Err(ConfigError::ValidationError(
                "catalog token sizes must be numbers".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            prompts_folder: default_prompts_folder(),
            tokenizer: default_tokenizer(),
            tokenizer_path: None,
            max_input_tokens: default_max_input_tokens(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WeaveConfig::default();
        assert_eq!(config.tokenizer, "cl100k");
        assert_eq!(config.max_input_tokens, 2048);
        assert_eq!(config.catalog.role, "system");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = WeaveConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: WeaveConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn unknown_tokenizer_rejected() {
        let config = WeaveConfig {
            tokenizer: "sentencepiece".into(),
            ..WeaveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn huggingface_needs_path() {
        let config = WeaveConfig {
            tokenizer: "huggingface".into(),
            ..WeaveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_ceiling_rejected() {
        let config = WeaveConfig {
            max_input_tokens: 0,
            ..WeaveConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = WeaveConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, WeaveConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promptweave.toml");
        std::fs::write(
            &path,
            r#"
tokenizer = "char"

[catalog]
role = "user"
max_conversation_history_tokens = 0.5
"#,
        )
        .unwrap();

        let config = WeaveConfig::load_from(&path).unwrap();
        assert_eq!(config.tokenizer, "char");
        assert_eq!(config.catalog.role, "user");
        assert_eq!(config.catalog.max_conversation_history_tokens, 0.5);
        assert_eq!(config.catalog.max_input_tokens, -1.0);
        assert_eq!(config.prompts_folder, PathBuf::from("prompts"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("promptweave.toml");
        std::fs::write(&path, "tokenizer = [").unwrap();
        assert!(matches!(
            WeaveConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn history_variable_uses_prompt_name() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.history_variable("chat"), "conversation.chat_history");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = WeaveConfig::default_toml();
        assert!(toml_str.contains("cl100k"));
        assert!(toml_str.contains("[catalog]"));
    }
}
