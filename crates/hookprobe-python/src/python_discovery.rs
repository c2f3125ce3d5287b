//! Finding and checking the interpreter queries run under

use hookprobe_config::Config;
use hookprobe_logger as logger;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Minimum supported Python version
pub const MIN_PYTHON_VERSION: (u8, u8) = (3, 8);

/// A probed interpreter
#[derive(Debug, Clone, Serialize)]
pub struct PythonEnvironment {
    pub executable: PathBuf,
    /// `sys.prefix` (the virtual environment when one is active)
    pub prefix: PathBuf,
    /// `sys.base_prefix`
    pub base_prefix: PathBuf,
    pub version: (u8, u8),
}

/// Errors during Python discovery
#[derive(Debug)]
pub enum DiscoveryError {
    /// No interpreter configured or on PATH
    NoPython(String),
    /// The executable did not answer the version probe
    ProbeFailed { executable: PathBuf, reason: String },
    /// Python found but version too old
    VersionTooOld { found: (u8, u8), required: (u8, u8) },
    Io(std::io::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::NoPython(msg) => write!(f, "No Python found: {}", msg),
            DiscoveryError::ProbeFailed { executable, reason } => {
                write!(f, "Could not probe {}: {}", executable.display(), reason)
            }
            DiscoveryError::VersionTooOld { found, required } => {
                write!(
                    f,
                    "Python {}.{} found, but {}.{} or newer is required",
                    found.0, found.1, required.0, required.1
                )
            }
            DiscoveryError::Io(e) => write!(f, "IO error during discovery: {}", e),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<std::io::Error> for DiscoveryError {
    fn from(e: std::io::Error) -> Self {
        DiscoveryError::Io(e)
    }
}

impl PythonEnvironment {
    /// Resolve the configured interpreter and check its version
    pub fn discover(config: &Config) -> Result<Self, DiscoveryError> {
        logger::debug("Starting Python discovery");

        let executable = config
            .resolve_python()
            .map_err(|e| DiscoveryError::NoPython(e.to_string()))?;
        let env = Self::probe(&executable)?;

        if env.version < MIN_PYTHON_VERSION {
            return Err(DiscoveryError::VersionTooOld {
                found: env.version,
                required: MIN_PYTHON_VERSION,
            });
        }

        logger::info(&format!(
            "Using Python {}.{} at {}",
            env.version.0,
            env.version.1,
            env.executable.display()
        ));
        Ok(env)
    }

    /// Ask an executable for its version and prefixes
    pub fn probe(executable: &Path) -> Result<Self, DiscoveryError> {
        logger::debug(&format!("Probing Python at: {}", executable.display()));

        let output = Command::new(executable)
            .args([
                "-c",
                "import sys; print(sys.version_info.major); print(sys.version_info.minor); print(sys.prefix); print(sys.base_prefix)",
            ])
            .output()?;

        if !output.status.success() {
            return Err(DiscoveryError::ProbeFailed {
                executable: executable.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse_probe_output(executable, &String::from_utf8_lossy(&output.stdout))
    }

    fn parse_probe_output(executable: &Path, stdout: &str) -> Result<Self, DiscoveryError> {
        let failed = |reason: &str| DiscoveryError::ProbeFailed {
            executable: executable.to_path_buf(),
            reason: reason.to_string(),
        };

        let lines: Vec<&str> = stdout.lines().map(str::trim).collect();
        let [major, minor, prefix, base_prefix, ..] = lines.as_slice() else {
            return Err(failed("unexpected probe output"));
        };
        let major: u8 = major.parse().map_err(|_| failed("unreadable major version"))?;
        let minor: u8 = minor.parse().map_err(|_| failed("unreadable minor version"))?;

        Ok(PythonEnvironment {
            executable: executable.to_path_buf(),
            prefix: PathBuf::from(prefix),
            base_prefix: PathBuf::from(base_prefix),
            version: (major, minor),
        })
    }

    pub fn is_venv(&self) -> bool {
        self.prefix != self.base_prefix
    }
}
