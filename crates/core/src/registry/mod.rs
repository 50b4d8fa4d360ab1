//! Version registry: the resolved set of versions for one definitions source.
//!
//! The registry is an ordinary value owned by its caller. Independent
//! registries never share state, so tests and threads can each hold their own.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::markup;
use crate::model::{self, VersionId};
use crate::resolve::{self, ResolvedVersion};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Resolved versions in document order.
    versions: Vec<ResolvedVersion>,
    index: HashMap<VersionId, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: a fresh registry loaded from `source`.
    pub fn from_source(source: &str) -> RegistryResult<Self> {
        let mut registry = Self::new();
        registry.load_all(source)?;
        Ok(registry)
    }

    /// Parse, build, and resolve `source`, replacing any previous contents.
    ///
    /// Fails on the first error. On failure the registry is left empty, never
    /// half-loaded.
    pub fn load_all(&mut self, source: &str) -> RegistryResult<&mut Self> {
        self.versions.clear();
        self.index.clear();

        let root = markup::parse(source)?;
        debug!(root = %root.tag, children = root.children.len(), "parsed layout markup");
        let entries = model::build(&root)?;
        let resolved = resolve::resolve(&entries)?;

        self.versions = resolved.into_values().collect();
        self.index = self
            .versions
            .iter()
            .enumerate()
            .map(|(idx, version)| (version.id.clone(), idx))
            .collect();
        info!(versions = self.versions.len(), "loaded memory layout registry");
        Ok(self)
    }

    pub fn get(&self, platform: &str, label: &str) -> RegistryResult<&ResolvedVersion> {
        self.index
            .get(&VersionId::new(platform, label))
            .map(|&idx| &self.versions[idx])
            .ok_or_else(|| RegistryError::NotFound {
                platform: platform.to_string(),
                label: label.to_string(),
            })
    }

    /// All resolved versions in document order.
    pub fn all(&self) -> &[ResolvedVersion] {
        &self.versions
    }

    pub fn by_platform<'a>(
        &'a self,
        platform: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedVersion> + 'a {
        self.versions.iter().filter(move |version| version.id.platform == platform)
    }

    /// Distinct platforms in order of first appearance.
    pub fn platforms(&self) -> Vec<&str> {
        let mut platforms: Vec<&str> = Vec::new();
        for version in &self.versions {
            if !platforms.contains(&version.platform()) {
                platforms.push(version.platform());
            }
        }
        platforms
    }

    /// Find the version whose executable has this SHA-256 digest (any case).
    pub fn find_by_sha256(&self, digest: &str) -> Option<&ResolvedVersion> {
        let digest = digest.trim().to_ascii_lowercase();
        self.versions
            .iter()
            .find(|version| version.fingerprints.sha256.as_deref() == Some(digest.as_str()))
    }

    /// Find the version whose executable has this PE link timestamp.
    pub fn find_by_pe_timestamp(&self, timestamp: u32) -> Option<&ResolvedVersion> {
        self.versions.iter().find(|version| version.fingerprints.pe_timestamp == Some(timestamp))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
