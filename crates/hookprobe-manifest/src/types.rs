//! Manifest entry types
//!
//! Paths are stored as given by the collectors: sources are absolute,
//! destinations are relative to the bundle root.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Dotted module names of a package and its importable descendants
pub type SubmoduleSet = BTreeSet<String>;

/// A non-code file and the bundle directory it belongs in
///
/// `dest_dir` is a directory; the file keeps its own basename there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataFileEntry {
    pub source: PathBuf,
    pub dest_dir: PathBuf,
}

impl DataFileEntry {
    pub fn new(source: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        DataFileEntry {
            source: source.into(),
            dest_dir: dest_dir.into(),
        }
    }

    /// Final bundle path of the file (`dest_dir/basename`)
    pub fn dest_file(&self) -> Option<PathBuf> {
        self.source.file_name().map(|name| self.dest_dir.join(name))
    }
}

/// Kind tag consumed by the archive writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    #[default]
    #[serde(rename = "BINARY")]
    Binary,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Binary => write!(f, "BINARY"),
        }
    }
}

/// A shared library and its bundle path (file name included)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryEntry {
    pub dest: PathBuf,
    pub source: PathBuf,
    #[serde(default)]
    pub kind: ArtifactKind,
}

impl BinaryEntry {
    pub fn new(dest: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        BinaryEntry {
            dest: dest.into(),
            source: source.into(),
            kind: ArtifactKind::Binary,
        }
    }
}

/// Everything collected for one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResources {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_dir: Option<PathBuf>,
    #[serde(default)]
    pub submodules: Vec<String>,
    #[serde(default)]
    pub datas: Vec<DataFileEntry>,
    #[serde(default)]
    pub binaries: Vec<BinaryEntry>,
}

impl PackageResources {
    pub fn new(name: impl Into<String>) -> Self {
        PackageResources {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Store a submodule set in sorted order
    pub fn set_submodules(&mut self, submodules: SubmoduleSet) {
        self.submodules = submodules.into_iter().collect();
    }

    pub fn is_empty(&self) -> bool {
        self.submodules.is_empty() && self.datas.is_empty() && self.binaries.is_empty()
    }
}
