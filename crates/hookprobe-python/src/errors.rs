use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the introspection engine
///
/// Absence of an optional resource is not an error; resolvers report it as
/// [`crate::resolvers::Lookup::Missing`] or
/// [`crate::resolvers::Lookup::Unavailable`] instead.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Script '{}' is not in the engine's script directory", .0.display())]
    UnauthorizedScript(PathBuf),

    #[error("Execution failed: {command}: {reason}")]
    ExecutionFailed { command: String, reason: String },

    #[error("Cannot decode interpreter output {text:?} at byte {offset}: {reason}")]
    Decode {
        text: String,
        offset: usize,
        reason: String,
    },

    #[error("'{0}' is not a package")]
    NotAPackage(String),

    #[error("Invalid module name '{0}'")]
    InvalidModuleName(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Package directory '{}' does not end with the path of '{name}'", package_dir.display())]
    LayoutMismatch { name: String, package_dir: PathBuf },

    #[error("Not a directory: '{}' (zipped packages are not supported)", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] hookprobe_config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<walkdir::Error> for ProbeError {
    fn from(err: walkdir::Error) -> Self {
        ProbeError::Io(err.into())
    }
}

impl ProbeError {
    /// Build a decode error, keeping at most a short excerpt of the text
    pub(crate) fn decode(text: &str, offset: usize, reason: impl Into<String>) -> Self {
        const EXCERPT: usize = 200;
        let text = if text.len() > EXCERPT {
            let mut end = EXCERPT;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &text[..end])
        } else {
            text.to_string()
        };
        ProbeError::Decode {
            text,
            offset,
            reason: reason.into(),
        }
    }

    /// Whether the failure came from running the child process itself
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, ProbeError::ExecutionFailed { .. })
    }
}
