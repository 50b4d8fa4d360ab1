use std::path::Path;

use anyhow::{bail, Result};

use crate::commands::load_registry;
use crate::config::DumpConfig;
use crate::sha256_file;

/// Hash an executable and report which known version it is.
pub fn identify_command(config: &DumpConfig, file: Option<&str>, binary: &Path) -> Result<()> {
    let registry = load_registry(&config.definitions_path(file))?;
    let digest = sha256_file(binary)?;

    match registry.find_by_sha256(&digest) {
        Some(version) => {
            println!("{} [{}]", version.label(), version.platform());
            Ok(())
        }
        None => bail!("No known version matches {} (sha256 {})", binary.display(), digest),
    }
}
