use crate::errors::ManifestError;
use crate::types::{BinaryEntry, DataFileEntry, PackageResources};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Manifest format version written by this crate
pub const MANIFEST_VERSION: &str = "1.0";

/// On-disk encoding of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
}

impl ManifestFormat {
    /// `.json` files are JSON, everything else TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ManifestFormat::Json,
            _ => ManifestFormat::Toml,
        }
    }
}

/// Resources collected for a set of packages in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at: String,
    /// Interpreter the child queries ran under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageResources>,

    /// Runtime only - rebuilt on load
    #[serde(skip)]
    package_index: AHashMap<String, usize>,
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            version: MANIFEST_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            interpreter: None,
            packages: Vec::new(),
            package_index: AHashMap::new(),
        }
    }
}

impl Manifest {
    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Manifest {
            interpreter: Some(interpreter.into()),
            ..Default::default()
        }
    }

    pub fn rebuild_indexes(&mut self) {
        self.package_index = self
            .packages
            .iter()
            .enumerate()
            .map(|(i, pkg)| (pkg.name.clone(), i))
            .collect();
    }

    /// Insert a package, replacing an earlier entry with the same name
    pub fn upsert_package(&mut self, package: PackageResources) {
        if let Some(&idx) = self.package_index.get(&package.name) {
            debug!("Replacing manifest entry for package '{}'", package.name);
            self.packages[idx] = package;
        } else {
            self.package_index
                .insert(package.name.clone(), self.packages.len());
            self.packages.push(package);
        }
    }

    pub fn get_package(&self, name: &str) -> Option<&PackageResources> {
        self.package_index
            .get(name)
            .and_then(|&idx| self.packages.get(idx))
    }

    pub fn remove_package(&mut self, name: &str) -> Result<PackageResources, ManifestError> {
        let idx = self
            .package_index
            .get(name)
            .copied()
            .ok_or_else(|| ManifestError::UnknownPackage(name.to_string()))?;
        let removed = self.packages.remove(idx);
        self.rebuild_indexes();
        Ok(removed)
    }

    /// Union of every package's submodules, sorted
    pub fn hidden_imports(&self) -> Vec<String> {
        self.packages
            .iter()
            .flat_map(|pkg| pkg.submodules.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn all_datas(&self) -> impl Iterator<Item = &DataFileEntry> {
        self.packages.iter().flat_map(|pkg| pkg.datas.iter())
    }

    pub fn all_binaries(&self) -> impl Iterator<Item = &BinaryEntry> {
        self.packages.iter().flat_map(|pkg| pkg.binaries.iter())
    }

    pub fn to_string_as(&self, format: ManifestFormat) -> Result<String, ManifestError> {
        match format {
            ManifestFormat::Toml => Ok(toml::to_string_pretty(self)?),
            ManifestFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    pub fn from_str_as(content: &str, format: ManifestFormat) -> Result<Self, ManifestError> {
        let mut manifest: Manifest = match format {
            ManifestFormat::Toml => toml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
        };
        manifest.rebuild_indexes();
        Ok(manifest)
    }
}
