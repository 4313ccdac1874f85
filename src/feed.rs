//! Startup data from disk, standing in for the network feed.

use std::path::Path;

use anyhow::Context;
use spot_core::StartupData;

/// Parse a startup document with `[configuration]` and `[[targets]]` tables.
pub fn parse_startup_toml(text: &str) -> anyhow::Result<StartupData> {
    toml::from_str(text).context("parsing startup TOML")
}

pub fn parse_startup_json(text: &str) -> anyhow::Result<StartupData> {
    serde_json::from_str(text).context("parsing startup JSON")
}

/// Load a `.toml` or `.json` startup file.
pub fn load_startup(path: &Path) -> anyhow::Result<StartupData> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading startup data {}", path.display()))?;
    let data = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_startup_json(&text)?,
        _ => parse_startup_toml(&text)?,
    };
    log::info!(
        "[feed] {}: configuration={} targets={}",
        path.display(),
        data.configuration.is_some(),
        data.targets.as_ref().map_or(0, Vec::len)
    );
    Ok(data)
}
