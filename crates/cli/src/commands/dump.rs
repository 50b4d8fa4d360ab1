use std::path::Path;

use anyhow::{bail, Result};
use memlayout_core::ResolvedVersion;

use crate::commands::{load_registry, render_versions, write_output};
use crate::config::DumpConfig;

/// Dump every resolved version (optionally for one platform) in registry order.
pub fn dump_command(
    config: &DumpConfig,
    file: Option<&str>,
    platform: Option<&str>,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let registry = load_registry(&config.definitions_path(file))?;

    let versions: Vec<&ResolvedVersion> = match config.platform_filter(platform) {
        Some(platform) => {
            let selected: Vec<&ResolvedVersion> = registry.by_platform(platform).collect();
            if selected.is_empty() {
                bail!(
                    "No versions defined for platform '{}'. Known platforms: {}",
                    platform,
                    registry.platforms().join(", ")
                );
            }
            selected
        }
        None => registry.all().iter().collect(),
    };

    let rendered = render_versions(&versions, config.format_for(json))?;
    write_output(&rendered, output)
}
