//! Error taxonomy for loading and resolving layout definitions.
//!
//! Every failure is terminal for the operation that raised it. Nothing here is
//! retried or partially recovered: an incomplete offset table is worse than no
//! table for tooling that dereferences raw addresses.

use thiserror::Error;

use crate::markup::ParseError;
use crate::model::VersionId;

/// Structurally valid markup that does not describe a valid set of versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A child of the document root that is not a `<version>` element.
    #[error("Unexpected element <{tag}> under the document root; only <version> is allowed")]
    UnexpectedElement { tag: String },

    /// An element nested in a version that maps to no known offset kind.
    #[error("Unknown element <{tag}> in version '{version}'")]
    UnknownElement { version: String, tag: String },

    #[error("Missing required attribute '{attribute}' on <{element}> in version '{version}'")]
    MissingAttribute { version: String, element: String, attribute: &'static str },

    #[error(
        "Invalid numeric value '{value}' for attribute '{attribute}' on <{element}> in version '{version}': {reason}"
    )]
    InvalidNumber {
        version: String,
        element: String,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    #[error(
        "Invalid value '{value}' for attribute '{attribute}' on <{element}> in version '{version}': {reason}"
    )]
    InvalidAttribute {
        version: String,
        element: String,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    /// The same field name appears twice inside a single `<class>` element.
    #[error("Field '{field}' is declared twice in class '{class}' of version '{version}'")]
    DuplicateField { version: String, class: String, field: String },

    #[error("Version {id} is defined more than once")]
    DuplicateVersion { id: VersionId },

    /// The inheritance target exists, but only on another platform.
    #[error(
        "Version {version} inherits from '{ancestor}', which only exists on platform '{ancestor_platform}'"
    )]
    PlatformMismatch { version: VersionId, ancestor: String, ancestor_platform: String },

    #[error("Version {version} ({bits}-bit) inherits from {ancestor} ({ancestor_bits}-bit)")]
    WidthMismatch { version: VersionId, bits: u32, ancestor: VersionId, ancestor_bits: u32 },

    #[error("Fingerprint {fingerprint} is claimed by both {first} and {second}")]
    DuplicateFingerprint { fingerprint: String, first: VersionId, second: VersionId },
}

/// Error type for every registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An `inherits-from` reference names a version that does not exist anywhere.
    #[error("Version {version} inherits from '{target}', which is not defined")]
    DanglingReference { version: VersionId, target: String },

    /// The inheritance graph contains a cycle; `path` lists every member once.
    #[error("Inheritance cycle detected: {}", cycle_path(.path))]
    Cycle { path: Vec<VersionId> },

    #[error("No version '{label}' is defined for platform '{platform}'")]
    NotFound { platform: String, label: String },
}

/// Convenience result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Render a cycle as `a -> b -> c -> a`.
fn cycle_path(path: &[VersionId]) -> String {
    let mut labels: Vec<&str> = path.iter().map(|id| id.label.as_str()).collect();
    if let Some(first) = path.first() {
        labels.push(first.label.as_str());
    }
    labels.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_closes_the_loop() {
        let err = RegistryError::Cycle {
            path: vec![VersionId::new("p", "a"), VersionId::new("p", "b"), VersionId::new("p", "c")],
        };
        assert_eq!(err.to_string(), "Inheritance cycle detected: a -> b -> c -> a");
    }

    #[test]
    fn dangling_reference_names_the_target() {
        let err = RegistryError::DanglingReference {
            version: VersionId::new("p", "child"),
            target: "ghost".into(),
        };
        assert!(err.to_string().contains("'ghost'"), "unexpected message: {err}");
    }
}
