use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "dumpoffsets.json";

/// Definitions file used when neither the CLI nor the config names one.
pub const DEFAULT_DEFINITIONS_FILE: &str = "Memory.xml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Optional JSON configuration for the CLI.
///
/// Precedence for every setting is CLI flag, then this file, then the
/// built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Definitions file; relative paths are resolved against the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<String>,
    /// Only dump versions for this platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Wait for Enter before exiting (for double-click console launches).
    #[serde(default)]
    pub pause_on_exit: bool,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl DumpConfig {
    /// Resolve the definitions path: CLI override > config > `Memory.xml`.
    pub fn definitions_path(&self, cli_override: Option<&str>) -> PathBuf {
        if let Some(path) = cli_override {
            return PathBuf::from(path);
        }
        match (&self.definitions, &self.base_dir) {
            (Some(path), _) if Path::new(path).is_absolute() => PathBuf::from(path),
            (Some(path), Some(base)) => base.join(path),
            (Some(path), None) => PathBuf::from(path),
            (None, _) => PathBuf::from(DEFAULT_DEFINITIONS_FILE),
        }
    }

    pub fn platform_filter<'a>(&'a self, cli_override: Option<&'a str>) -> Option<&'a str> {
        cli_override.or(self.platform.as_deref())
    }

    pub fn format_for(&self, json_flag: bool) -> OutputFormat {
        if json_flag {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

/// Load the CLI config.
///
/// An explicit path must exist. Without one, `dumpoffsets.json` in the working
/// directory is used if present, otherwise defaults apply.
pub fn load_config(explicit: Option<&Path>) -> Result<DumpConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                debug!("no {DEFAULT_CONFIG_FILE} in working directory; using defaults");
                return Ok(DumpConfig::default());
            }
            default.to_path_buf()
        }
    };

    let body = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let mut config: DumpConfig = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse config JSON at {}", path.display()))?;
    config.base_dir = path.parent().map(Path::to_path_buf);
    debug!(config = %path.display(), "loaded CLI config");
    Ok(config)
}
