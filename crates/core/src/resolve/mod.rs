//! Inheritance resolution: merge each version entry with its ancestor chain.
//!
//! Entries reference their ancestor by label (same platform), never by
//! pointer. Resolution runs in three passes over index-addressed tables:
//! link every reference, reject cycles, then merge each chain top-down with
//! each entry resolved exactly once regardless of how many children share it.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult, SchemaError};
use crate::model::{
    Fingerprints, OffsetCategory, OffsetKey, OffsetKind, OffsetTable, PointerWidth, VersionEntry,
    VersionId,
};

/// A version merged with all of its ancestors. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub id: VersionId,
    #[serde(rename = "bits")]
    pub width: PointerWidth,
    /// Ancestor labels, nearest first.
    pub lineage: Vec<String>,
    pub fingerprints: Fingerprints,
    pub offsets: OffsetTable,
}

impl ResolvedVersion {
    pub fn label(&self) -> &str {
        &self.id.label
    }

    pub fn platform(&self) -> &str {
        &self.id.platform
    }

    /// Address of a global variable.
    pub fn global(&self, name: &str) -> Option<u64> {
        match self.offsets.get(&OffsetKey::new(OffsetCategory::Global, name)) {
            Some(OffsetKind::GlobalAddress { address, .. }) => Some(*address),
            _ => None,
        }
    }

    /// Address of a function.
    pub fn function(&self, name: &str) -> Option<u64> {
        match self.offsets.get(&OffsetKey::new(OffsetCategory::Function, name)) {
            Some(OffsetKind::FunctionAddress { address, .. }) => Some(*address),
            _ => None,
        }
    }

    pub fn vtable(&self, class: &str) -> Option<&OffsetKind> {
        self.offsets.get(&OffsetKey::new(OffsetCategory::VTable, class))
    }

    pub fn class(&self, name: &str) -> Option<&OffsetKind> {
        self.offsets.get(&OffsetKey::new(OffsetCategory::Class, name))
    }

    /// Number of resolved offsets.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offsets in resolved order.
    pub fn iter(&self) -> impl Iterator<Item = &OffsetKind> {
        self.offsets.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Resolve every entry. The result keeps the entries' document order.
pub fn resolve(entries: &[VersionEntry]) -> RegistryResult<IndexMap<VersionId, ResolvedVersion>> {
    let parents = link_parents(entries)?;
    check_fingerprints(entries)?;
    if let Some(cycle) = find_cycle(&parents) {
        let path = cycle.into_iter().map(|idx| entries[idx].id.clone()).collect();
        return Err(RegistryError::Cycle { path });
    }

    let mut slots: Vec<Option<ResolvedVersion>> = (0..entries.len()).map(|_| None).collect();
    for start in 0..entries.len() {
        // Walk up to the first already-resolved ancestor (or the chain root),
        // then merge back down.
        let mut chain = Vec::new();
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            if slots[idx].is_some() {
                break;
            }
            chain.push(idx);
            cursor = parents[idx];
        }
        for &idx in chain.iter().rev() {
            let base = parents[idx].and_then(|parent| slots[parent].as_ref());
            let resolved = merge(&entries[idx], base);
            debug!(
                version = %resolved.id,
                offsets = resolved.offsets.len(),
                depth = resolved.lineage.len(),
                "resolved version"
            );
            slots[idx] = Some(resolved);
        }
    }

    Ok(slots.into_iter().flatten().map(|resolved| (resolved.id.clone(), resolved)).collect())
}

/// Map each entry to the index of its ancestor.
fn link_parents(entries: &[VersionEntry]) -> RegistryResult<Vec<Option<usize>>> {
    let mut index: HashMap<&VersionId, usize> = HashMap::with_capacity(entries.len());
    let mut by_label: HashMap<&str, &VersionId> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        if index.insert(&entry.id, idx).is_some() {
            return Err(SchemaError::DuplicateVersion { id: entry.id.clone() }.into());
        }
        by_label.entry(entry.id.label.as_str()).or_insert(&entry.id);
    }

    let mut parents = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(target) = entry.inherits_from.as_deref() else {
            parents.push(None);
            continue;
        };
        let wanted = VersionId::new(entry.id.platform.as_str(), target);
        let parent = match index.get(&wanted) {
            Some(&parent) => parent,
            None => {
                return Err(match by_label.get(target) {
                    Some(elsewhere) => SchemaError::PlatformMismatch {
                        version: entry.id.clone(),
                        ancestor: target.to_string(),
                        ancestor_platform: elsewhere.platform.clone(),
                    }
                    .into(),
                    None => RegistryError::DanglingReference {
                        version: entry.id.clone(),
                        target: target.to_string(),
                    },
                });
            }
        };
        let ancestor = &entries[parent];
        if ancestor.width != entry.width {
            return Err(SchemaError::WidthMismatch {
                version: entry.id.clone(),
                bits: entry.width.bits(),
                ancestor: ancestor.id.clone(),
                ancestor_bits: ancestor.width.bits(),
            }
            .into());
        }
        parents.push(Some(parent));
    }
    Ok(parents)
}

/// No two versions may claim the same build fingerprint.
fn check_fingerprints(entries: &[VersionEntry]) -> RegistryResult<()> {
    let mut seen: HashMap<String, &VersionId> = HashMap::new();
    for entry in entries {
        let claims = [
            entry.fingerprints.sha256.as_ref().map(|digest| format!("sha256 {digest}")),
            entry.fingerprints.pe_timestamp.map(|ts| format!("pe-timestamp {ts:#010x}")),
        ];
        for fingerprint in claims.into_iter().flatten() {
            if let Some(first) = seen.get(&fingerprint) {
                return Err(SchemaError::DuplicateFingerprint {
                    fingerprint,
                    first: (*first).clone(),
                    second: entry.id.clone(),
                }
                .into());
            }
            seen.insert(fingerprint, &entry.id);
        }
    }
    Ok(())
}

/// Three-colour walk over the inheritance edges.
///
/// Returns the members of the first cycle found, in inheritance order.
fn find_cycle(parents: &[Option<usize>]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; parents.len()];
    for start in 0..parents.len() {
        let mut path = Vec::new();
        let mut cursor = Some(start);
        while let Some(idx) = cursor {
            match marks[idx] {
                Mark::Done => break,
                Mark::InProgress => {
                    let from = path.iter().position(|&member| member == idx).unwrap_or(0);
                    return Some(path.split_off(from));
                }
                Mark::Unvisited => {
                    marks[idx] = Mark::InProgress;
                    path.push(idx);
                    cursor = parents[idx];
                }
            }
        }
        for idx in path {
            marks[idx] = Mark::Done;
        }
    }
    None
}

fn merge(entry: &VersionEntry, base: Option<&ResolvedVersion>) -> ResolvedVersion {
    let (mut offsets, lineage) = match base {
        Some(base) => {
            let mut lineage = Vec::with_capacity(base.lineage.len() + 1);
            lineage.push(base.id.label.clone());
            lineage.extend(base.lineage.iter().cloned());
            (base.offsets.clone(), lineage)
        }
        None => (OffsetTable::new(), Vec::new()),
    };
    for declaration in &entry.declarations {
        offsets.apply(declaration.clone());
    }

    ResolvedVersion {
        id: entry.id.clone(),
        width: entry.width,
        lineage,
        fingerprints: entry.fingerprints.clone(),
        offsets,
    }
}
