//! memlayout-core
//!
//! Core library for layered memory-layout definitions of target executables.
//!
//! A definitions source describes many builds ("versions") of one program.
//! Each version declares function and global addresses, vtables, and class
//! layouts, and may inherit everything from an earlier version and override
//! only what changed. This crate turns that source into a fully resolved
//! offset table per version:
//!
//! - [`markup`]: parse the raw text into an untyped element tree.
//! - [`model`]: typed version entries and offset kinds.
//! - [`resolve`]: merge each entry with its ancestor chain.
//! - [`registry`]: owns the resolved versions and answers lookups.
//! - [`printer`]: deterministic text dump of a resolved version.
//!
//! The crate does no I/O; frontends read the source and write the output.

pub mod error;
pub mod markup;
pub mod model;
pub mod printer;
pub mod registry;
pub mod resolve;

pub use error::{RegistryError, RegistryResult, SchemaError};
pub use markup::{ParseError, RawNode};
pub use model::{OffsetCategory, OffsetKind, PointerWidth, VersionEntry, VersionId};
pub use registry::Registry;
pub use resolve::ResolvedVersion;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
