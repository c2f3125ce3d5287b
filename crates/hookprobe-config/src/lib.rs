//! Configuration for the hookprobe engine and CLI
//!
//! - [`config`]: the TOML configuration file and interpreter selection
//! - [`toolkit`]: per-platform candidate directory tables for toolkit resources
//! - [`venv_paths`]: locating the interpreter inside a virtual environment

pub mod config;
pub mod toolkit;
pub mod venv_paths;

pub use config::{Config, ConfigError, DEFAULT_BINARY_PATTERNS, DEFAULT_TIMEOUT_SECS};
pub use toolkit::{Candidate, ToolkitTables};
