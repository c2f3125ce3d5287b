//! Error type for command handlers

use hookprobe_config::ConfigError;
use hookprobe_manifest::ManifestError;
use hookprobe_python::{DiscoveryError, ProbeError};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Probe(#[from] ProbeError),

    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Manifest(#[from] anyhow::Error),

    #[error("{0}")]
    ManifestEntry(#[from] ManifestError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
