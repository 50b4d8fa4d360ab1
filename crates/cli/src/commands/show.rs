use anyhow::Result;

use crate::commands::{load_registry, render_versions, write_output};
use crate::config::DumpConfig;

/// Dump a single version.
pub fn show_command(
    config: &DumpConfig,
    file: Option<&str>,
    platform: &str,
    version: &str,
    json: bool,
) -> Result<()> {
    let registry = load_registry(&config.definitions_path(file))?;
    let resolved = registry.get(platform, version)?;
    let rendered = render_versions(&[resolved], config.format_for(json))?;
    write_output(&rendered, None)
}
