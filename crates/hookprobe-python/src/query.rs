//! Queries sent to a child interpreter
//!
//! Every statement the engine builds comes from a template in this module.
//! Module names are checked before they are interpolated, so a template
//! can only ever produce the program it was written to produce.

use crate::errors::ProbeError;

/// One unit of work for a child interpreter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Inline program text run with `-c`
    Statement(String),
    /// Script from the engine's script directory, by basename
    Script { name: String, args: Vec<String> },
}

impl Query {
    pub fn statement(code: impl Into<String>) -> Self {
        Query::Statement(code.into())
    }

    pub fn script<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Script {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Short label for logs
    pub fn describe(&self) -> String {
        match self {
            Query::Statement(code) => {
                let first = code.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                format!("statement '{}'", first.trim())
            }
            Query::Script { name, args } if args.is_empty() => format!("script {}", name),
            Query::Script { name, args } => format!("script {} {}", name, args.join(" ")),
        }
    }
}

/// Check that `name` is a dotted sequence of Python identifiers
pub fn validate_module_name(name: &str) -> Result<(), ProbeError> {
    let valid = !name.is_empty() && name.split('.').all(is_identifier);
    if valid {
        Ok(())
    } else {
        Err(ProbeError::InvalidModuleName(name.to_string()))
    }
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

/// Prints `True` when `name` imports and has a `__path__`
pub fn is_package(name: &str) -> Result<Query, ProbeError> {
    validate_module_name(name)?;
    Ok(Query::statement(format!(
        "import importlib\n\
         module = importlib.import_module('{name}')\n\
         print(hasattr(module, '__path__'))\n"
    )))
}

/// Prints the repr of the module's `__file__`, or `None`
pub fn module_file(name: &str) -> Result<Query, ProbeError> {
    validate_module_name(name)?;
    Ok(Query::statement(format!(
        "import importlib\n\
         module = importlib.import_module('{name}')\n\
         print(repr(getattr(module, '__file__', None)))\n"
    )))
}

/// Prints the sorted modules that importing `name` pulls in besides itself
pub fn extension_imports(name: &str) -> Result<Query, ProbeError> {
    validate_module_name(name)?;
    Ok(Query::statement(format!(
        "import sys\n\
         before = set(sys.modules)\n\
         import {name}\n\
         imported = set(sys.modules) - before\n\
         imported.discard('{name}')\n\
         print(sorted(imported))\n"
    )))
}

/// Prints the library search paths reported by a Qt binding's core application
pub fn qt_library_paths(binding: &str) -> Result<Query, ProbeError> {
    validate_module_name(binding)?;
    Ok(Query::statement(format!(
        "from {binding}.QtCore import QCoreApplication\n\
         app = QCoreApplication([])\n\
         print([str(p) for p in app.libraryPaths()])\n"
    )))
}

/// Same as [`qt_library_paths`], after the multimedia backend has been loaded
///
/// Phonon registers its backend directories only once a video player exists,
/// which needs a full widget application.
pub fn qt_phonon_library_paths(binding: &str, widgets: &str) -> Result<Query, ProbeError> {
    validate_module_name(binding)?;
    validate_module_name(widgets)?;
    Ok(Query::statement(format!(
        "from {binding}.{widgets} import QApplication\n\
         app = QApplication([])\n\
         app.setApplicationName('hookprobe')\n\
         from {binding}.phonon import Phonon\n\
         player = Phonon.VideoPlayer(Phonon.VideoCategory)\n\
         print([str(p) for p in app.libraryPaths()])\n"
    )))
}

/// Prints the repr of the real module name behind `six.moves.<name>`, or `''`
pub fn six_moved_module(name: &str) -> Result<Query, ProbeError> {
    validate_module_name(name)?;
    Ok(Query::statement(format!(
        "import six\n\
         moved = six._importer.known_modules.get('six.moves.{name}')\n\
         print(repr(getattr(moved, 'mod', '')))\n"
    )))
}

/// Helper script importing a PyWin32 module and printing the repr of its `__file__`
pub const PYWIN32_MODULE_FILE_SCRIPT: &str = "pywin32_module_file.py";

/// File of a PyWin32 module such as `pywintypes` or `pythoncom`
///
/// A script rather than a statement: the import is retried with each
/// `pywin32_system32` directory on the search path.
pub fn pywin32_module_file(name: &str) -> Result<Query, ProbeError> {
    validate_module_name(name)?;
    Ok(Query::script(PYWIN32_MODULE_FILE_SCRIPT, [name]))
}

/// Prints the repr of the OpenGL package directory
pub fn opengl_package_dir() -> Query {
    Query::statement(
        "import OpenGL\n\
         print(repr(OpenGL.__path__[0]))\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_module_name() {
        assert!(validate_module_name("foo").is_ok());
        assert!(validate_module_name("foo.bar_baz.qux2").is_ok());
        assert!(validate_module_name("_private").is_ok());

        for bad in ["", "foo.", ".foo", "foo..bar", "2fast", "foo-bar", "os'); import shutil; ('"] {
            assert!(
                matches!(validate_module_name(bad), Err(ProbeError::InvalidModuleName(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_templates_interpolate_checked_names() {
        let Ok(Query::Statement(code)) = is_package("foo.bar") else {
            panic!("expected a statement");
        };
        assert!(code.contains("importlib.import_module('foo.bar')"));
        assert!(code.contains("hasattr(module, '__path__')"));

        assert!(module_file("bad name").is_err());
        assert!(qt_library_paths("PyQt5").is_ok());
        assert!(qt_phonon_library_paths("PyQt5", "QtWidgets").is_ok());
        assert!(six_moved_module("urllib.parse").is_ok());
    }

    #[test]
    fn test_six_template_targets_moves_namespace() {
        let Ok(Query::Statement(code)) = six_moved_module("configparser") else {
            panic!("expected a statement");
        };
        assert!(code.contains("known_modules.get('six.moves.configparser')"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            module_file("foo").map(|q| q.describe()).unwrap_or_default(),
            "statement 'import importlib'"
        );
        assert_eq!(
            Query::script("finder.py", ["a", "b"]).describe(),
            "script finder.py a b"
        );
        assert_eq!(
            Query::script("finder.py", Vec::<String>::new()).describe(),
            "script finder.py"
        );
    }
}
