//! `promptweave list`: List available prompts.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let catalog = super::catalog(&config, &[])?;
    let names = catalog.prompt_names();

    if names.is_empty() {
        println!("No prompts found in {}", config.prompts_folder.display());
        return Ok(());
    }

    println!("Prompts in {}:", config.prompts_folder.display());
    for name in names {
        match catalog.get_prompt(&name) {
            Ok(template) if !template.config.description.is_empty() => {
                println!("  {name:<24} {}", template.config.description)
            }
            Ok(_) => println!("  {name}"),
            Err(_) => println!("  {name:<24} (invalid, run `promptweave check`)"),
        }
    }
    Ok(())
}
