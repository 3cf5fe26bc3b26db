//! Per-prompt settings: the `config.json` stored beside each template.
//!
//! ```json
//! {
//!   "schema": 1.1,
//!   "description": "Chat with the user",
//!   "type": "completion",
//!   "completion": { "max_input_tokens": 2800, "include_history": true },
//!   "augmentation": { "data_sources": { "docs": 1200 } }
//! }
//! ```

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A prompt template's `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplateConfig {
    #[serde(default = "default_schema")]
    pub schema: f64,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default = "default_type")]
    pub template_type: String,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmentation: Option<AugmentationConfig>,
}

fn default_schema() -> f64 {
    1.1
}
fn default_type() -> String {
    "completion".into()
}

impl Default for PromptTemplateConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            description: String::new(),
            template_type: default_type(),
            completion: CompletionConfig::default(),
            augmentation: None,
        }
    }
}

/// Whether the prompt targets a chat or a plain-text completion model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionType {
    #[default]
    Chat,
    Text,
}

/// Model settings and section toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub completion_type: CompletionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Tokens the model may generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Render ceiling for the prompt itself
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    #[serde(default)]
    pub temperature: f64,

    #[serde(default)]
    pub top_p: f64,

    #[serde(default)]
    pub presence_penalty: f64,

    #[serde(default)]
    pub frequency_penalty: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,

    /// Append the conversation history section
    #[serde(default = "default_true")]
    pub include_history: bool,

    /// Append the user input section
    #[serde(default = "default_true")]
    pub include_input: bool,

    /// Attach input images to the user input section
    #[serde(default)]
    pub include_images: bool,
}

fn default_max_tokens() -> usize {
    150
}
fn default_max_input_tokens() -> usize {
    2048
}
fn default_true() -> bool {
    true
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            completion_type: CompletionType::default(),
            model: None,
            max_tokens: default_max_tokens(),
            max_input_tokens: default_max_input_tokens(),
            temperature: 0.0,
            top_p: 0.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            stop_sequences: Vec::new(),
            include_history: true,
            include_input: true,
            include_images: false,
        }
    }
}

/// Content the prompt is augmented with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentationConfig {
    /// Data source name → section sizing (`tokens` semantics)
    #[serde(default)]
    pub data_sources: BTreeMap<String, f64>,
}

impl PromptTemplateConfig {
    /// Parse `config.json` text.
    pub fn from_json(path: &Path, json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.json` from disk.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(path, &content)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let completion = &self.completion;
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(ConfigError::ValidationError(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&completion.top_p) {
            return Err(ConfigError::ValidationError(
                "completion.top_p must be between 0.0 and 1.0".into(),
            ));
        }

        if completion.max_input_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "completion.max_input_tokens must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Data sources the prompt is augmented with, in name order.
    pub fn data_sources(&self) -> impl Iterator<Item = (&str, f64)> {
        self.augmentation
            .iter()
            .flat_map(|a| a.data_sources.iter().map(|(name, tokens)| (name.as_str(), *tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = PromptTemplateConfig::from_json(Path::new("config.json"), "{}").unwrap();
        assert_eq!(config.schema, 1.1);
        assert_eq!(config.template_type, "completion");
        assert_eq!(config.completion.max_input_tokens, 2048);
        assert!(config.completion.include_history);
        assert!(config.completion.include_input);
        assert!(!config.completion.include_images);
        assert_eq!(config.data_sources().count(), 0);
    }

    #[test]
    fn full_config_parses() {
        let json = r#"{
            "schema": 1.1,
            "description": "Chat",
            "type": "completion",
            "completion": {
                "completion_type": "chat",
                "model": "gpt-4o",
                "max_tokens": 500,
                "max_input_tokens": 2800,
                "temperature": 0.7,
                "include_history": false,
                "include_images": true
            },
            "augmentation": { "data_sources": { "docs": 1200, "faq": 0.5 } }
        }"#;
        let config = PromptTemplateConfig::from_json(Path::new("config.json"), json).unwrap();
        assert_eq!(config.completion.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.completion.max_input_tokens, 2800);
        assert!(!config.completion.include_history);
        assert!(config.completion.include_images);
        let sources: Vec<_> = config.data_sources().collect();
        assert_eq!(sources, vec![("docs", 1200.0), ("faq", 0.5)]);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let json = r#"{ "completion": { "temperature": 5.0 } }"#;
        assert!(matches!(
            PromptTemplateConfig::from_json(Path::new("config.json"), json),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            PromptTemplateConfig::from_json(Path::new("config.json"), "{"),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
