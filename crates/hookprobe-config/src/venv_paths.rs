//! Locating the Python interpreter inside a virtual environment
//!
//! The engine never imports third-party code itself, so the only thing it
//! needs from a venv is the interpreter that will run the child queries.

use std::fs;
use std::path::{Path, PathBuf};

/// The name of the binaries/scripts directory in a Python venv
/// "Scripts" on Windows, "bin" on Unix
#[cfg(windows)]
pub const PYTHON_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
pub const PYTHON_BIN_DIR: &str = "bin";

/// Marker file written by `python -m venv` and `uv venv`
pub const PYVENV_CFG: &str = "pyvenv.cfg";

#[cfg(not(windows))]
const PYTHON_EXE_CANDIDATES: &[&str] = &["python3", "python"];
#[cfg(windows)]
const PYTHON_EXE_CANDIDATES: &[&str] = &["python.exe", "python3.exe"];

/// Error type for venv path resolution
#[derive(Debug, Clone, PartialEq)]
pub enum VenvPathError {
    /// The venv path does not exist or is not a directory
    VenvNotFound(PathBuf),
    /// The venv exists but holds no usable interpreter
    NoInterpreter(PathBuf),
}

impl std::fmt::Display for VenvPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VenvPathError::VenvNotFound(path) => {
                write!(f, "Virtual environment not found: {}", path.display())
            }
            VenvPathError::NoInterpreter(path) => {
                write!(f, "Python executable not found in {}", path.display())
            }
        }
    }
}

impl std::error::Error for VenvPathError {}

/// Whether `path` looks like a virtual environment root
pub fn is_venv(path: &Path) -> bool {
    path.join(PYVENV_CFG).is_file()
}

/// Resolve the Python executable of a virtual environment
///
/// - **Unix/macOS**: `.venv/bin/python3` or `.venv/bin/python`
/// - **Windows**: `.venv/Scripts/python.exe`
///
/// Falls back to any file in the bin directory whose name contains
/// `python` (e.g. `python3.12`).
pub fn resolve_python_exe(venv_path: &Path) -> Result<PathBuf, VenvPathError> {
    if !venv_path.is_dir() {
        return Err(VenvPathError::VenvNotFound(venv_path.to_path_buf()));
    }

    let bin_dir = venv_path.join(PYTHON_BIN_DIR);
    if !bin_dir.is_dir() {
        return Err(VenvPathError::NoInterpreter(bin_dir));
    }

    if let Some(found) = PYTHON_EXE_CANDIDATES
        .iter()
        .map(|exe| bin_dir.join(exe))
        .find(|candidate| candidate.is_file())
    {
        return Ok(found);
    }

    let mut fallback: Vec<PathBuf> = fs::read_dir(&bin_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|name| name.starts_with("python"))
                })
                .collect()
        })
        .unwrap_or_default();
    // read_dir order is unspecified
    fallback.sort();

    fallback
        .into_iter()
        .next()
        .ok_or(VenvPathError::NoInterpreter(bin_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_mock_venv(exe_name: &str) -> Option<TempDir> {
        let temp_dir = TempDir::new().ok()?;
        let bin_dir = temp_dir.path().join(PYTHON_BIN_DIR);
        fs::create_dir_all(&bin_dir).ok()?;
        fs::write(bin_dir.join(exe_name), "").ok()?;
        fs::write(temp_dir.path().join(PYVENV_CFG), "home = /usr/bin\n").ok()?;
        Some(temp_dir)
    }

    #[test]
    #[cfg(not(windows))]
    fn test_resolve_python_exe_prefers_python3() {
        let Some(venv) = create_mock_venv("python3") else {
            return;
        };
        let _ = fs::write(venv.path().join("bin").join("python"), "");
        let result = resolve_python_exe(venv.path());
        assert!(result.is_ok_and(|p| p.ends_with("bin/python3")));
    }

    #[test]
    #[cfg(not(windows))]
    fn test_resolve_python_exe_versioned_fallback() {
        let Some(venv) = create_mock_venv("python3.12") else {
            return;
        };
        let result = resolve_python_exe(venv.path());
        assert!(result.is_ok_and(|p| p.ends_with("bin/python3.12")));
    }

    #[test]
    fn test_is_venv() {
        let Some(venv) = create_mock_venv("python3") else {
            return;
        };
        assert!(is_venv(venv.path()));
        assert!(!is_venv(&venv.path().join(PYTHON_BIN_DIR)));
    }

    #[test]
    fn test_venv_not_found() {
        let missing = PathBuf::from("/tmp/hookprobe_missing_venv_12345");
        let result = resolve_python_exe(&missing);
        assert!(matches!(result, Err(VenvPathError::VenvNotFound(_))));
    }

    #[test]
    fn test_empty_bin_dir_has_no_interpreter() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let _ = fs::create_dir_all(temp_dir.path().join(PYTHON_BIN_DIR));
        let result = resolve_python_exe(temp_dir.path());
        assert!(matches!(result, Err(VenvPathError::NoInterpreter(_))));
    }
}
