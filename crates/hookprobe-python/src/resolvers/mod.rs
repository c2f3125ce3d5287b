//! Resolvers for optional third-party resources
//!
//! A resolver answers "where is X?" for something a bundle may or may not
//! need. Not finding it is an ordinary outcome, reported as a [`Lookup`]
//! and logged at error level, never raised.

pub mod django;
pub mod imports;
pub mod opengl;
pub mod pywin32;
pub mod qt;

use crate::errors::ProbeError;
use hookprobe_config::Candidate;
use hookprobe_logger as logger;
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "kebab-case")]
pub enum Lookup<T> {
    Found(T),
    /// The probe worked and the resource is not there
    Missing,
    /// The probe itself could not run, e.g. the package fails to import
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Log a negative outcome; the detail goes to debug
    pub(crate) fn report(self, what: &str) -> Self {
        match &self {
            Lookup::Found(_) => {}
            Lookup::Missing => logger::error(&format!("Cannot find {}", what)),
            Lookup::Unavailable(reason) => {
                logger::error(&format!("Cannot find {}", what));
                logger::debug(&format!("Lookup of {} failed: {}", what, reason));
            }
        }
        self
    }
}

/// Turn a failed child run into [`Lookup::Unavailable`]
///
/// Other errors (bad names, undecodable output, rejected scripts) point at
/// a bug on this side and still propagate.
pub(crate) fn probe<T>(result: Result<T, ProbeError>) -> Result<Lookup<T>, ProbeError> {
    match result {
        Ok(value) => Ok(Lookup::Found(value)),
        Err(ProbeError::ExecutionFailed { reason, .. }) => Ok(Lookup::Unavailable(reason)),
        Err(e) => Err(e),
    }
}

/// Values the candidate tables are expanded against
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    pub prefix: Option<PathBuf>,
    pub env: HashMap<String, OsString>,
}

impl SearchContext {
    /// Context for an interpreter, with the current process environment
    pub fn for_interpreter(interpreter: &Path) -> Self {
        SearchContext {
            prefix: Some(install_prefix(interpreter)),
            env: env::vars_os()
                .filter_map(|(k, v)| k.into_string().ok().map(|k| (k, v)))
                .collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn var(&self, key: &str) -> Option<&OsStr> {
        self.env.get(key).map(OsString::as_os_str)
    }

    /// Concrete paths a candidate stands for (globs may give several)
    pub fn expand(&self, candidate: &Candidate) -> Vec<PathBuf> {
        match candidate {
            Candidate::Fixed { path } => vec![path.clone()],
            Candidate::Env { var, suffix } => self
                .var(var)
                .filter(|v| !v.is_empty())
                .map(|v| vec![PathBuf::from(v).join(suffix)])
                .unwrap_or_default(),
            Candidate::Prefix { suffix } => self
                .prefix
                .as_ref()
                .map(|p| vec![p.join(suffix)])
                .unwrap_or_default(),
            Candidate::Glob { pattern } => match glob::glob(pattern) {
                Ok(paths) => {
                    let mut paths: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
                    paths.sort();
                    paths
                }
                Err(e) => {
                    logger::debug(&format!("Ignoring bad search pattern '{}': {}", pattern, e));
                    Vec::new()
                }
            },
        }
    }
}

/// Installation prefix of an interpreter
///
/// Framework builds live under `<prefix>/Library/Frameworks/...`; otherwise
/// the prefix is the directory above `bin`.
pub fn install_prefix(interpreter: &Path) -> PathBuf {
    let real = fs::canonicalize(interpreter).unwrap_or_else(|_| interpreter.to_path_buf());
    let text = real.to_string_lossy();
    if let Some(idx) = text.find("/Library") {
        return PathBuf::from(&text[..idx]);
    }
    real.parent()
        .and_then(Path::parent)
        .map_or_else(|| real.clone(), Path::to_path_buf)
}

/// First candidate that exists on disk, with `leaf` appended to each
pub fn first_existing(table: &[Candidate], leaf: Option<&Path>, ctx: &SearchContext) -> Option<PathBuf> {
    table
        .iter()
        .flat_map(|candidate| ctx.expand(candidate))
        .map(|path| match leaf {
            Some(leaf) => path.join(leaf),
            None => path,
        })
        .find(|path| path.exists())
}

/// Reject absolute paths and `..` in a relative subdirectory argument
pub(crate) fn relative_subdir(dir: &str) -> Result<&Path, ProbeError> {
    let path = Path::new(dir);
    let plain = !dir.is_empty()
        && path
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(ProbeError::InvalidArgument(format!(
            "'{}' is not a relative subdirectory",
            dir
        )))
    }
}
