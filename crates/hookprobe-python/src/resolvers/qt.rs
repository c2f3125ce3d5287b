//! Qt bindings: plugin directories, menu bundles and QML resources

use super::{first_existing, probe, relative_subdir, Lookup, SearchContext};
use crate::collect::{collect_binaries, libraries_in_dir, BinaryPatterns};
use crate::errors::ProbeError;
use crate::eval::eval_query;
use crate::executor::Interpreter;
use crate::query::{self, Query};
use hookprobe_config::{Candidate, ToolkitTables};
use hookprobe_logger as logger;
use hookprobe_manifest::{BinaryEntry, DataFileEntry};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

/// Bundle directory of the `qt_menu.nib` resource
pub const MENU_NIB: &str = "qt_menu.nib";

/// Bundle directory QML imports are placed under
pub const QML_TARGET: &str = "qml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QtBinding {
    PyQt4,
    PyQt5,
}

impl QtBinding {
    pub fn module(self) -> &'static str {
        match self {
            QtBinding::PyQt4 => "PyQt4",
            QtBinding::PyQt5 => "PyQt5",
        }
    }

    /// Module providing `QApplication`
    pub fn widgets_module(self) -> &'static str {
        match self {
            QtBinding::PyQt4 => "QtGui",
            QtBinding::PyQt5 => "QtWidgets",
        }
    }

    /// Bundle directory plugins of this binding are placed under
    pub fn plugins_target(self) -> &'static str {
        match self {
            QtBinding::PyQt4 => "qt4_plugins",
            QtBinding::PyQt5 => "qt5_plugins",
        }
    }

    pub fn menu_nib_table(self, tables: &ToolkitTables) -> &[Candidate] {
        match self {
            QtBinding::PyQt4 => &tables.qt4_menu_nib,
            QtBinding::PyQt5 => &tables.qt5_menu_nib,
        }
    }
}

impl fmt::Display for QtBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module())
    }
}

impl FromStr for QtBinding {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pyqt4" | "qt4" | "4" => Ok(QtBinding::PyQt4),
            "pyqt5" | "qt5" | "5" => Ok(QtBinding::PyQt5),
            _ => Err(ProbeError::InvalidArgument(format!(
                "unknown Qt binding '{}' (expected PyQt4 or PyQt5)",
                s
            ))),
        }
    }
}

/// First library path reported by the binding that exists as a directory
pub fn plugins_dir(interpreter: &dyn Interpreter, binding: QtBinding) -> Result<Lookup<PathBuf>, ProbeError> {
    let query = query::qt_library_paths(binding.module())?;
    let lookup = first_existing_library_path(interpreter, &query)?;
    Ok(lookup.report(&format!("{} plugin directory", binding)))
}

/// Same as [`plugins_dir`], with the multimedia backend loaded first
pub fn phonon_plugins_dir(interpreter: &dyn Interpreter, binding: QtBinding) -> Result<Lookup<PathBuf>, ProbeError> {
    let query = query::qt_phonon_library_paths(binding.module(), binding.widgets_module())?;
    let lookup = first_existing_library_path(interpreter, &query)?;
    Ok(lookup.report(&format!("{} phonon plugin directory", binding)))
}

fn first_existing_library_path(interpreter: &dyn Interpreter, query: &Query) -> Result<Lookup<PathBuf>, ProbeError> {
    let dirs = match probe(eval_query(interpreter, query))? {
        Lookup::Found(Some(literal)) => literal.into_string_list()?,
        Lookup::Found(None) | Lookup::Missing => return Ok(Lookup::Missing),
        Lookup::Unavailable(reason) => return Ok(Lookup::Unavailable(reason)),
    };

    match dirs.iter().map(PathBuf::from).find(|dir| dir.is_dir()) {
        Some(dir) => Ok(Lookup::Found(dir)),
        None => {
            logger::debug(&format!("None of the reported library paths exist: {:?}", dirs));
            Ok(Lookup::Missing)
        }
    }
}

/// Libraries of one plugin type, placed under `qt{N}_plugins/<type>/`
///
/// Only the top level of the plugin type directory is scanned.
pub fn plugins_binaries(
    interpreter: &dyn Interpreter,
    binding: QtBinding,
    plugin_type: &str,
    patterns: &BinaryPatterns,
) -> Result<Vec<BinaryEntry>, ProbeError> {
    let plugin_type = relative_subdir(plugin_type)?;
    if plugin_type.components().count() != 1 {
        return Err(ProbeError::InvalidArgument(format!(
            "plugin type '{}' must be a single directory name",
            plugin_type.display()
        )));
    }

    let Some(plugins) = plugins_dir(interpreter, binding)?.found() else {
        return Ok(Vec::new());
    };

    let target = Path::new(binding.plugins_target()).join(plugin_type);
    let binaries: Vec<BinaryEntry> = libraries_in_dir(&plugins.join(plugin_type), patterns)
        .into_iter()
        .filter_map(|source| {
            let file_name = source.file_name()?.to_os_string();
            Some(BinaryEntry::new(target.join(file_name), source))
        })
        .collect();
    logger::debug(&format!(
        "Found {} {} plugins of type '{}'",
        binaries.len(),
        binding,
        plugin_type.display()
    ));
    Ok(binaries)
}

/// Directory holding `qt_menu.nib`, from the binding's candidate table
pub fn menu_nib_dir(binding: QtBinding, tables: &ToolkitTables, ctx: &SearchContext) -> Lookup<PathBuf> {
    let table = binding.menu_nib_table(tables);
    let lookup = match first_existing(table, Some(Path::new(MENU_NIB)), ctx) {
        Some(dir) => Lookup::Found(dir),
        None => Lookup::Missing,
    };
    lookup.report(&format!("{} for {}", MENU_NIB, binding))
}

/// QML import directory reported by `qmake -query QT_INSTALL_QML`
pub fn qml_dir(qmake: Option<&Path>) -> Lookup<PathBuf> {
    let what = "Qt5 QML directory";
    let Some(qmake) = qmake else {
        return Lookup::Unavailable("qmake not found".to_string()).report(what);
    };

    let output = match Command::new(qmake).args(["-query", "QT_INSTALL_QML"]).output() {
        Ok(output) => output,
        Err(e) => {
            return Lookup::Unavailable(format!("cannot run {}: {}", qmake.display(), e)).report(what);
        }
    };
    logger::capture_output(&qmake.display().to_string(), &output);

    if !output.status.success() {
        let reason = format!(
            "{} exited with {}: {}",
            qmake.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Lookup::Unavailable(reason).report(what);
    }

    let reported = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if reported.is_empty() {
        logger::debug("qmake reported an empty QT_INSTALL_QML");
        return Lookup::Missing.report(what);
    }

    let dir = normalize(&reported);
    if dir.is_dir() {
        Lookup::Found(dir)
    } else {
        logger::debug(&format!("QT_INSTALL_QML {} does not exist", dir.display()));
        Lookup::Missing.report(what)
    }
}

/// qmake always prints `/`; rebuild the path from its components
fn normalize(reported: &str) -> PathBuf {
    let path = Path::new(reported);
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// A QML import directory as a data entry under `qml/`
pub fn qml_data(qml_dir: &Path, dir: &str) -> Result<DataFileEntry, ProbeError> {
    let dir = relative_subdir(dir)?;
    Ok(DataFileEntry::new(qml_dir.join(dir), QML_TARGET))
}

/// Libraries below a QML import directory, placed under `qml/<dir>/`
pub fn qml_plugins_binaries(
    qml_dir: &Path,
    dir: &str,
    patterns: &BinaryPatterns,
) -> Result<Vec<BinaryEntry>, ProbeError> {
    let dir = relative_subdir(dir)?;
    let source = qml_dir.join(dir);
    if !source.is_dir() {
        logger::error(&format!("Cannot find QML directory {}", source.display()));
        return Ok(Vec::new());
    }
    collect_binaries(&source, &Path::new(QML_TARGET).join(dir), patterns)
}
