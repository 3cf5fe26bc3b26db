//! `promptweave config`: Configuration commands.

use promptweave_config::WeaveConfig;
use std::path::Path;

pub fn show(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() {
    println!("{}", WeaveConfig::config_dir().join("config.toml").display());
}

pub fn default() {
    print!("{}", WeaveConfig::default_toml());
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = promptweave_config::WeaveConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains("config.toml"));
    }
}
