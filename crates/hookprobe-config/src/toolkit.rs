//! Candidate directory tables for toolkit resources
//!
//! GUI toolkits install their resource bundles in places that depend on the
//! platform and on the package manager that built them. These tables list
//! the candidates in priority order; the engine picks the first one that
//! exists. Tables are plain data so a config file can replace them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One place a toolkit resource directory may live
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Candidate {
    /// An absolute path
    Fixed { path: PathBuf },
    /// `$var/suffix`, skipped when the variable is unset or empty
    Env {
        var: String,
        #[serde(default)]
        suffix: PathBuf,
    },
    /// `suffix` under the interpreter's installation prefix (MacPorts layout)
    Prefix { suffix: PathBuf },
    /// A glob pattern; every match is a candidate, in sorted order
    Glob { pattern: String },
}

impl Candidate {
    pub fn fixed(path: &str) -> Self {
        Candidate::Fixed {
            path: PathBuf::from(path),
        }
    }

    pub fn env(var: &str, suffix: &str) -> Self {
        Candidate::Env {
            var: var.to_string(),
            suffix: PathBuf::from(suffix),
        }
    }

    pub fn prefix(suffix: &str) -> Self {
        Candidate::Prefix {
            suffix: PathBuf::from(suffix),
        }
    }

    pub fn glob(pattern: &str) -> Self {
        Candidate::Glob {
            pattern: pattern.to_string(),
        }
    }
}

/// Per-toolkit candidate tables
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolkitTables {
    /// Directories that may contain `qt_menu.nib` for Qt4 bindings
    pub qt4_menu_nib: Vec<Candidate>,
    /// Directories that may contain `qt_menu.nib` for Qt5 bindings
    pub qt5_menu_nib: Vec<Candidate>,
}

impl Default for ToolkitTables {
    fn default() -> Self {
        ToolkitTables {
            qt4_menu_nib: default_menu_nib_table(4),
            qt5_menu_nib: default_menu_nib_table(5),
        }
    }
}

impl ToolkitTables {
    /// Tables with no candidates at all
    pub fn empty() -> Self {
        ToolkitTables {
            qt4_menu_nib: Vec::new(),
            qt5_menu_nib: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == ToolkitTables::default()
    }
}

/// `qt_menu.nib` only ships with the Cocoa platform plugin
#[cfg(target_os = "macos")]
fn default_menu_nib_table(qt_major: u8) -> Vec<Candidate> {
    vec![
        // QT5DIR points at the qtbase directory of a Qt5 checkout
        Candidate::env("QT5DIR", "src/plugins/platforms/cocoa"),
        // MacPorts, not built as a framework
        Candidate::prefix("lib/Resources"),
        // MacPorts, framework build
        Candidate::prefix(&format!(
            "libexec/qt{qt_major}-mac/lib/QtGui.framework/Versions/{qt_major}/Resources"
        )),
        // Official installer defaults
        Candidate::fixed("/Library/Frameworks/QtGui.framework/Resources"),
        Candidate::fixed(&format!(
            "/Library/Frameworks/QtGui.framework/Versions/{qt_major}/Resources"
        )),
        Candidate::fixed("/Library/Frameworks/QtGui.Framework/Versions/Current/Resources"),
        // Homebrew framework build
        Candidate::glob(&format!(
            "/usr/local/Cellar/qt/{qt_major}.*/lib/QtGui.framework/Versions/{qt_major}/Resources"
        )),
    ]
}

#[cfg(not(target_os = "macos"))]
fn default_menu_nib_table(_qt_major: u8) -> Vec<Candidate> {
    Vec::new()
}
