use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memlayout_core::{printer, Registry, ResolvedVersion};
use tracing::info;

use crate::config::OutputFormat;

/// Read a definitions file and resolve it into a registry.
pub fn load_registry(path: &Path) -> Result<Registry> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout definitions at {}", path.display()))?;
    let registry = Registry::from_source(&source)
        .with_context(|| format!("Failed to load layout definitions from {}", path.display()))?;
    info!(definitions = %path.display(), versions = registry.len(), "definitions loaded");
    Ok(registry)
}

/// Render versions as text dumps or a JSON array.
pub fn render_versions(versions: &[&ResolvedVersion], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(printer::format_all(versions.iter().copied())),
        OutputFormat::Json => {
            let mut json = printer::format_json(versions.iter().copied())
                .context("Failed to serialize versions as JSON")?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Write rendered output to a file, or to stdout when no path is given.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            info!(output = %path.display(), bytes = text.len(), "wrote dump");
        }
        None => print!("{text}"),
    }
    Ok(())
}
