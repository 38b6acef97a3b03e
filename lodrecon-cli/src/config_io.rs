//! Loads a [`Config`] from a TOML or JSON file by its extension.

use anyhow::{bail, Context, Result};
use lodrecon_common::config::Config;
use std::path::Path;

pub fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text).with_context(|| format!("parsing {} as TOML", path.display())),
        Some("json") => serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display())),
        other => bail!("unrecognized config extension {other:?} for {}, expected .toml or .json", path.display()),
    }
}

pub fn write_default(path: &Path) -> Result<()> {
    let config = Config::default();
    let text = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::to_string_pretty(&config)?,
        _ => serde_json::to_string_pretty(&config)?,
    };
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
