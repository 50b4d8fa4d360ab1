use anyhow::Result;
use serde::Serialize;

use crate::commands::load_registry;
use crate::config::{DumpConfig, OutputFormat};

#[derive(Debug, Serialize)]
pub struct CheckSummary {
    pub definitions: String,
    pub versions: usize,
    pub platforms: Vec<PlatformSummary>,
}

#[derive(Debug, Serialize)]
pub struct PlatformSummary {
    pub platform: String,
    pub versions: usize,
}

/// Load and resolve the definitions without dumping them.
pub fn check_command(config: &DumpConfig, file: Option<&str>, json: bool) -> Result<()> {
    let path = config.definitions_path(file);
    let registry = load_registry(&path)?;

    let summary = CheckSummary {
        definitions: path.display().to_string(),
        versions: registry.len(),
        platforms: registry
            .platforms()
            .into_iter()
            .map(|platform| PlatformSummary {
                platform: platform.to_string(),
                versions: registry.by_platform(platform).count(),
            })
            .collect(),
    };

    if config.format_for(json) == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("OK: {} resolved {} version(s)", summary.definitions, summary.versions);
    for platform in &summary.platforms {
        println!("- {}: {}", platform.platform, platform.versions);
    }
    Ok(())
}
