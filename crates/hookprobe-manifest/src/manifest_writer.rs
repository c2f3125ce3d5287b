//! Reading and writing manifests on disk
//!
//! The format follows the file extension (see [`ManifestFormat::from_path`]).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::manifest::{Manifest, ManifestFormat};

/// Write a manifest, creating parent directories as needed
pub fn write_to_path(manifest: &Manifest, output_path: &Path) -> Result<()> {
    debug!("Writing manifest to: {:?}", output_path);

    let format = ManifestFormat::from_path(output_path);
    let content = manifest
        .to_string_as(format)
        .with_context(|| format!("Failed to encode manifest as {:?}", format))?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(output_path, &content)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Manifest written to: {:?}", output_path);
    info!("Total packages: {}", manifest.packages.len());

    Ok(())
}

pub fn read_from_path(manifest_path: &Path) -> Result<Manifest> {
    debug!("Reading manifest from: {:?}", manifest_path);

    let content = fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
    let manifest = Manifest::from_str_as(&content, ManifestFormat::from_path(manifest_path))
        .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;

    info!("Manifest version: {}", manifest.version);
    info!("Generated at: {}", manifest.generated_at);
    info!("Total packages: {}", manifest.packages.len());

    Ok(manifest)
}
