//! `promptweave render`: Lay out a prompt and print the result.

use anyhow::Context;
use clap::ValueEnum;
use promptweave_core::{RenderContext, TurnContext};
use promptweave_memory::{TurnState, load_state};
use serde_json::json;
use std::path::{Path, PathBuf};

/// How the rendered prompt is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One block of text
    Text,
    /// Role-tagged messages as JSON
    Messages,
}

pub struct RenderArgs {
    pub name: String,
    pub state: Option<PathBuf>,
    pub input: Option<String>,
    pub max_tokens: Option<usize>,
    pub format: OutputFormat,
    pub data_sources: Vec<String>,
}

pub async fn run(config_path: Option<&Path>, args: RenderArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let tokenizer = super::tokenizer(&config)?;
    let catalog = super::catalog(&config, &args.data_sources)?;
    let template = catalog
        .get_prompt(&args.name)
        .with_context(|| format!("Failed to load prompt '{}'", args.name))?;

    let state = match &args.state {
        Some(path) => load_state(path)?,
        None => TurnState::new(),
    };
    if let Some(input) = args.input {
        state.set_value(&config.catalog.input_variable, json!(input));
    }

    let max_tokens = args.max_tokens.unwrap_or_else(|| template.max_input_tokens());
    let turn = TurnContext::new();
    let ctx = RenderContext::new(&turn, &state, &catalog, tokenizer.as_ref());

    match args.format {
        OutputFormat::Text => {
            let rendered = template.prompt.render_as_text(&ctx, max_tokens).await?;
            println!("{}", rendered.output);
            eprintln!();
            eprintln!(
                "length: {} / {max_tokens} tokens{}",
                rendered.length,
                if rendered.too_long { " (too long)" } else { "" }
            );
        }
        OutputFormat::Messages => {
            let rendered = template.prompt.render_as_messages(&ctx, max_tokens).await?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
    }

    if let Some(model) = &template.config.completion.model {
        tracing::debug!(prompt = %template.name, model = %model, "Rendered for model");
    }
    Ok(())
}
