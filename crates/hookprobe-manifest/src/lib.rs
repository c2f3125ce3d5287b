//! Resource manifests
//!
//! The collectors produce three plain lists per package: hidden submodule
//! names, `(source, dest_dir)` data files and `(dest, source, "BINARY")`
//! shared libraries. This crate holds those types and reads/writes them as
//! TOML or JSON for the archive writer that consumes them.

pub mod errors;
pub mod manifest;
pub mod manifest_writer;
pub mod types;

pub use errors::ManifestError;
pub use manifest::{Manifest, ManifestFormat};
pub use manifest_writer::{read_from_path, write_to_path};
pub use types::{ArtifactKind, BinaryEntry, DataFileEntry, PackageResources, SubmoduleSet};
