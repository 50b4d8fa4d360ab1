//! Deterministic text dump of a resolved version.
//!
//! Sections come in a fixed order (globals, functions, vtables, classes) and
//! entries keep their table order within each section. Addresses are padded
//! to the platform's pointer width.

use std::fmt;

use crate::model::{OffsetCategory, OffsetKind, PointerWidth};
use crate::resolve::ResolvedVersion;

/// Format one resolved version as text.
pub fn format(version: &ResolvedVersion) -> String {
    OffsetDump(version).to_string()
}

/// Format several versions, separated by one blank line.
pub fn format_all<'a>(versions: impl IntoIterator<Item = &'a ResolvedVersion>) -> String {
    versions.into_iter().map(format).collect::<Vec<_>>().join("\n")
}

/// Pretty JSON array of versions, for machine consumers.
pub fn format_json<'a>(
    versions: impl IntoIterator<Item = &'a ResolvedVersion>,
) -> serde_json::Result<String> {
    let versions: Vec<&ResolvedVersion> = versions.into_iter().collect();
    serde_json::to_string_pretty(&versions)
}

/// `Display` adapter behind [`format`].
struct OffsetDump<'a>(&'a ResolvedVersion);

struct Address(u64, PointerWidth);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0width$x}", self.0, width = self.1.hex_digits())
    }
}

impl fmt::Display for OffsetDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.0;
        let width = version.width;

        writeln!(
            f,
            "version {} [{}, {}-bit]",
            version.label(),
            version.platform(),
            width.bits()
        )?;
        if !version.lineage.is_empty() {
            writeln!(f, "  inherits: {}", version.lineage.join(" <- "))?;
        }
        if let Some(digest) = &version.fingerprints.sha256 {
            writeln!(f, "  sha256: {digest}")?;
        }
        if let Some(timestamp) = version.fingerprints.pe_timestamp {
            writeln!(f, "  pe-timestamp: {timestamp:#010x}")?;
        }
        if version.offsets.is_empty() {
            writeln!(f, "  (no offsets)")?;
            return Ok(());
        }

        for category in OffsetCategory::ALL {
            let mut entries = version.offsets.in_category(category).peekable();
            if entries.peek().is_none() {
                continue;
            }
            writeln!(f, "{}:", category.heading())?;
            for entry in entries {
                write_entry(f, entry, width)?;
            }
        }
        Ok(())
    }
}

fn write_entry(f: &mut fmt::Formatter<'_>, entry: &OffsetKind, width: PointerWidth) -> fmt::Result {
    match entry {
        OffsetKind::GlobalAddress { name, address }
        | OffsetKind::FunctionAddress { name, address } => {
            writeln!(f, "  {} {name}", Address(*address, width))
        }
        OffsetKind::VTable { class, address, methods } => {
            writeln!(f, "  {} {class}", Address(*address, width))?;
            for (slot, method) in methods.iter().enumerate() {
                writeln!(f, "      [{slot}] {method}")?;
            }
            Ok(())
        }
        OffsetKind::ClassLayout { name, vtable, fields } => {
            match vtable {
                Some(vtable) => writeln!(f, "  {name} (vtable {})", Address(*vtable, width))?,
                None => writeln!(f, "  {name}")?,
            }
            for (field, offset) in fields {
                writeln!(f, "      +{offset:#06x} {field}")?;
            }
            Ok(())
        }
    }
}
