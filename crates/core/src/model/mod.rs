//! Typed layout model: version identities, offset kinds, and the ordered
//! offset table that inheritance resolves into.

mod builder;
mod table;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

pub use builder::build;
pub use table::OffsetTable;

/// Identity of a version entry: a label, unique within its platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VersionId {
    pub platform: String,
    pub label: String,
}

impl VersionId {
    pub fn new(platform: impl Into<String>, label: impl Into<String>) -> Self {
        Self { platform: platform.into(), label: label.into() }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.label, self.platform)
    }
}

/// Pointer width of the target build; bounds every address and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    /// Width implied by a platform tag when the version has no explicit `bits`.
    ///
    /// The bare OS names were 32-bit targets; unknown tags are assumed 64-bit.
    pub fn for_platform(platform: &str) -> Self {
        match platform.to_ascii_lowercase().as_str() {
            "windows" | "linux" | "osx" => PointerWidth::Bits32,
            _ => PointerWidth::Bits64,
        }
    }

    /// Parse an explicit `bits` attribute.
    pub fn from_bits(bits: &str) -> Option<Self> {
        match bits.trim() {
            "32" => Some(PointerWidth::Bits32),
            "64" => Some(PointerWidth::Bits64),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            PointerWidth::Bits32 => 32,
            PointerWidth::Bits64 => 64,
        }
    }

    pub fn max_value(self) -> u64 {
        match self {
            PointerWidth::Bits32 => u64::from(u32::MAX),
            PointerWidth::Bits64 => u64::MAX,
        }
    }

    /// Number of hex digits in a fixed-width address rendering.
    pub fn hex_digits(self) -> usize {
        match self {
            PointerWidth::Bits32 => 8,
            PointerWidth::Bits64 => 16,
        }
    }
}

impl From<PointerWidth> for u32 {
    fn from(width: PointerWidth) -> Self {
        width.bits()
    }
}

/// Output category of an offset; declaration order is the dump order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetCategory {
    Global,
    Function,
    #[serde(rename = "vtable")]
    VTable,
    Class,
}

impl OffsetCategory {
    pub const ALL: [OffsetCategory; 4] = [
        OffsetCategory::Global,
        OffsetCategory::Function,
        OffsetCategory::VTable,
        OffsetCategory::Class,
    ];

    /// Section heading used by the printer.
    pub fn heading(self) -> &'static str {
        match self {
            OffsetCategory::Global => "globals",
            OffsetCategory::Function => "functions",
            OffsetCategory::VTable => "vtables",
            OffsetCategory::Class => "classes",
        }
    }
}

/// Canonical key of an offset inside a resolved table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OffsetKey {
    pub category: OffsetCategory,
    pub name: String,
}

impl OffsetKey {
    pub fn new(category: OffsetCategory, name: impl Into<String>) -> Self {
        Self { category, name: name.into() }
    }
}

/// One offset declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OffsetKind {
    GlobalAddress {
        name: String,
        address: u64,
    },
    FunctionAddress {
        name: String,
        address: u64,
    },
    /// Method slot index is the position in `methods`.
    #[serde(rename = "vtable")]
    VTable {
        class: String,
        address: u64,
        methods: Vec<String>,
    },
    ClassLayout {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        vtable: Option<u64>,
        fields: IndexMap<String, u64>,
    },
}

impl OffsetKind {
    pub fn category(&self) -> OffsetCategory {
        match self {
            OffsetKind::GlobalAddress { .. } => OffsetCategory::Global,
            OffsetKind::FunctionAddress { .. } => OffsetCategory::Function,
            OffsetKind::VTable { .. } => OffsetCategory::VTable,
            OffsetKind::ClassLayout { .. } => OffsetCategory::Class,
        }
    }

    /// The global/function name, or the class name for vtables and layouts.
    pub fn name(&self) -> &str {
        match self {
            OffsetKind::GlobalAddress { name, .. }
            | OffsetKind::FunctionAddress { name, .. }
            | OffsetKind::ClassLayout { name, .. } => name,
            OffsetKind::VTable { class, .. } => class,
        }
    }

    pub fn key(&self) -> OffsetKey {
        OffsetKey::new(self.category(), self.name())
    }

    /// Fold a later declaration with the same key into this one.
    ///
    /// Scalars are replaced. A vtable takes the new address and, if the newer
    /// declaration lists methods, the new method list. A class layout takes a
    /// declared vtable and merges fields: existing fields keep their position
    /// with the new offset, new fields are appended.
    pub fn absorb(&mut self, newer: OffsetKind) {
        match (self, newer) {
            (
                OffsetKind::GlobalAddress { address, .. },
                OffsetKind::GlobalAddress { address: new_address, .. },
            )
            | (
                OffsetKind::FunctionAddress { address, .. },
                OffsetKind::FunctionAddress { address: new_address, .. },
            ) => *address = new_address,
            (
                OffsetKind::VTable { address, methods, .. },
                OffsetKind::VTable { address: new_address, methods: new_methods, .. },
            ) => {
                *address = new_address;
                if !new_methods.is_empty() {
                    *methods = new_methods;
                }
            }
            (
                OffsetKind::ClassLayout { vtable, fields, .. },
                OffsetKind::ClassLayout { vtable: new_vtable, fields: new_fields, .. },
            ) => {
                if new_vtable.is_some() {
                    *vtable = new_vtable;
                }
                for (field, offset) in new_fields {
                    fields.insert(field, offset);
                }
            }
            // Keys include the category, so mixed kinds never meet here.
            (slot, newer) => *slot = newer,
        }
    }
}

/// Build fingerprints used to recognise an executable. Never inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    /// Lowercase hex SHA-256 of the executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// PE header link timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_timestamp: Option<u32>,
}

/// A version entry as declared, before merging with its ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: VersionId,
    pub width: PointerWidth,
    /// Label of the ancestor on the same platform.
    pub inherits_from: Option<String>,
    pub fingerprints: Fingerprints,
    /// Local declarations in document order.
    pub declarations: Vec<OffsetKind>,
}
