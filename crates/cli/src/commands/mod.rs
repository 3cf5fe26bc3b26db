//! Subcommand implementations and the setup they share.

pub mod check;
pub mod config_cmd;
pub mod list;
pub mod render;
pub mod tokens;

use anyhow::Context;
use promptweave_config::WeaveConfig;
use promptweave_core::Tokenizer;
use promptweave_prompts::{PromptCatalog, TextDataSource};
use std::path::Path;
use std::sync::Arc;

/// Load the configuration from `path`, or from the default locations.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<WeaveConfig> {
    let config = match path {
        Some(path) => WeaveConfig::load_from(path),
        None => WeaveConfig::load(),
    };
    config.context("Failed to load configuration")
}

/// The configured tokenizer.
pub fn tokenizer(config: &WeaveConfig) -> anyhow::Result<Box<dyn Tokenizer>> {
    promptweave_tokenizers::from_kind(&config.tokenizer, config.tokenizer_path.as_deref())
        .with_context(|| format!("Failed to build the '{}' tokenizer", config.tokenizer))
}

/// A catalog over the configured prompts folder with the given `NAME=FILE`
/// text data sources registered.
pub fn catalog(config: &WeaveConfig, data_sources: &[String]) -> anyhow::Result<PromptCatalog> {
    let mut catalog = PromptCatalog::from_config(config);
    for spec in data_sources {
        let (name, file) = parse_data_source(spec)?;
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read data source file {file}"))?;
        catalog.add_data_source(Arc::new(TextDataSource::new(name, text)))?;
    }
    Ok(catalog)
}

fn parse_data_source(spec: &str) -> anyhow::Result<(&str, &str)> {
    match spec.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => Ok((name, file)),
        _ => anyhow::bail!("Data sources are given as NAME=FILE, got '{spec}'"),
    }
}
