//! `promptweave check`: Load every prompt and report problems.

use std::path::Path;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("🔍 Checking prompts...");

    let config = super::load_config(config_path)?;
    println!("   ✅ Config parsed successfully");

    super::tokenizer(&config)?;
    println!("   ✅ Tokenizer '{}' loaded", config.tokenizer);

    let catalog = super::catalog(&config, &[])?;
    let names = catalog.prompt_names();
    let mut failures = 0;
    for name in &names {
        match catalog.get_prompt(name) {
            Ok(template) => println!(
                "   ✅ {name} ({} sections, {} tokens)",
                template.prompt.sections().len(),
                template.max_input_tokens()
            ),
            Err(e) => {
                failures += 1;
                println!("   ❌ {name}: {e}");
            }
        }
    }

    println!();
    if failures > 0 {
        anyhow::bail!("{failures} of {} prompts failed to load", names.len());
    }
    println!("   All {} prompts loaded", names.len());
    Ok(())
}
