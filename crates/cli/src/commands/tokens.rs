//! `promptweave tokens`: Count the tokens in a piece of text.

use anyhow::Context;
use std::io::Read;
use std::path::Path;

pub fn run(config_path: Option<&Path>, text: &str, show_ids: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let tokenizer = super::tokenizer(&config)?;

    let text = if text == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read standard input")?;
        buffer
    } else {
        text.to_string()
    };

    let ids = tokenizer.encode(&text);
    println!("{} tokens ({})", ids.len(), config.tokenizer);
    if show_ids {
        let ids: Vec<String> = ids.iter().map(u32::to_string).collect();
        println!("{}", ids.join(" "));
    }
    Ok(())
}
