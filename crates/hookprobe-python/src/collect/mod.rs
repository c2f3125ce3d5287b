//! Collectors turning a package directory into bundle entries
//!
//! Zipped packages are not supported: every collector needs a real
//! directory on disk.

mod binaries;
mod data_files;
mod submodules;

pub use binaries::{
    collect_binaries, collect_package_binaries, libraries_in_dir, libraries_in_subdirs, BinaryPatterns,
};
pub use data_files::{collect_data_files, data_files_in};
pub use submodules::{collect_submodules, submodules_in};

use std::path::Path;

/// Extensions of files Python can import as modules
pub const PY_EXECUTABLE_EXTENSIONS: &[&str] = &["py", "pyc", "pyo", "pyd", "so"];

/// Extensions never collected as data
pub const PY_IGNORE_EXTENSIONS: &[&str] = &["py", "pyc", "pyo", "pyd", "so", "dylib"];

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
