//! Locating installed packages on disk

use crate::errors::ProbeError;
use crate::eval::eval_query;
use crate::executor::Interpreter;
use crate::literal::PyLiteral;
use crate::query::{self, validate_module_name};
use hookprobe_logger as logger;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Files whose presence makes a directory a regular package
pub const INIT_FILES: &[&str] = &["__init__.py", "__init__.pyc"];

/// Where a package lives
///
/// `namespace_root` joined with the dotted name (dots as separators)
/// gives `package_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageLocation {
    pub name: String,
    pub namespace_root: PathBuf,
    pub package_dir: PathBuf,
}

impl PackageLocation {
    /// Derive the namespace root by stripping the name's path from `package_dir`
    pub fn from_package_dir(name: &str, package_dir: impl Into<PathBuf>) -> Result<Self, ProbeError> {
        validate_module_name(name)?;
        let package_dir = package_dir.into();
        let relative = module_name_as_path(name);
        let mismatch = || ProbeError::LayoutMismatch {
            name: name.to_string(),
            package_dir: package_dir.clone(),
        };

        if !package_dir.ends_with(&relative) {
            return Err(mismatch());
        }
        let depth = relative.components().count();
        let namespace_root = package_dir.ancestors().nth(depth).ok_or_else(mismatch)?;

        Ok(PackageLocation {
            name: name.to_string(),
            namespace_root: namespace_root.to_path_buf(),
            package_dir: package_dir.clone(),
        })
    }

    /// Dotted module path of a directory under the namespace root
    pub fn dotted_path_of(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.namespace_root).ok()?;
        let parts = relative
            .components()
            .map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }
}

/// `a.b.c` as the relative path `a/b/c`
pub fn module_name_as_path(name: &str) -> PathBuf {
    name.split('.').collect()
}

pub fn has_init_file(dir: &Path) -> bool {
    INIT_FILES.iter().any(|init| dir.join(init).is_file())
}

/// Whether `name` imports as a package (has a `__path__`)
pub fn is_package(interpreter: &dyn Interpreter, name: &str) -> Result<bool, ProbeError> {
    let query = query::is_package(name)?;
    match eval_query(interpreter, &query)? {
        Some(PyLiteral::Bool(b)) => Ok(b),
        other => Err(ProbeError::decode(
            &format!("{:?}", other),
            0,
            "expected True or False",
        )),
    }
}

/// The `__file__` of a module as reported by a child interpreter
///
/// `None` for modules without one, such as namespace packages.
pub fn module_file_attribute(interpreter: &dyn Interpreter, name: &str) -> Result<Option<PathBuf>, ProbeError> {
    let query = query::module_file(name)?;
    match eval_query(interpreter, &query)? {
        Some(PyLiteral::Str(path)) => Ok(Some(PathBuf::from(path))),
        Some(PyLiteral::None) | None => Ok(None),
        Some(other) => Err(ProbeError::decode(
            &other.to_json().to_string(),
            0,
            format!("expected a path, found {}", other.type_name()),
        )),
    }
}

/// Find a package's directory and namespace root
pub fn resolve_package_paths(interpreter: &dyn Interpreter, name: &str) -> Result<PackageLocation, ProbeError> {
    if !is_package(interpreter, name)? {
        return Err(ProbeError::NotAPackage(name.to_string()));
    }
    let init_file = module_file_attribute(interpreter, name)?
        .ok_or_else(|| ProbeError::NotAPackage(name.to_string()))?;
    let package_dir = init_file
        .parent()
        .ok_or_else(|| ProbeError::NotAPackage(name.to_string()))?;

    let location = PackageLocation::from_package_dir(name, package_dir)?;
    logger::debug(&format!(
        "Package '{}' at {} (namespace root {})",
        name,
        location.package_dir.display(),
        location.namespace_root.display()
    ));
    Ok(location)
}

/// Directory to put on the search path so the package holding `path` imports
///
/// Starts at the parent of `path` and walks up while each directory is
/// itself a package.
pub fn toplevel_modules_root(path: &Path) -> PathBuf {
    let Some(mut current) = path.parent() else {
        return path.to_path_buf();
    };
    while has_init_file(current) {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInterpreter;
    use std::fs;
    use tempfile::TempDir;

    fn answering(name: &str, is_pkg: &str, file: &str) -> FakeInterpreter {
        let mut fake = FakeInterpreter::new();
        if let Ok(q) = query::is_package(name) {
            fake = fake.answer(q, is_pkg);
        }
        if let Ok(q) = query::module_file(name) {
            fake = fake.answer(q, file);
        }
        fake
    }

    #[test]
    fn test_resolve_dotted_package() {
        let fake = answering("a.b", "True", "'/sp/a/b/__init__.py'");
        let location = resolve_package_paths(&fake, "a.b");
        assert!(location.is_ok_and(|l| {
            l.package_dir == Path::new("/sp/a/b") && l.namespace_root == Path::new("/sp")
        }));
    }

    #[test]
    fn test_plain_module_is_not_a_package() {
        let fake = answering("six", "False", "'/sp/six.py'");
        assert!(matches!(
            resolve_package_paths(&fake, "six"),
            Err(ProbeError::NotAPackage(_))
        ));
    }

    #[test]
    fn test_layout_mismatch() {
        let fake = answering("a.b", "True", "'/sp/other/__init__.py'");
        assert!(matches!(
            resolve_package_paths(&fake, "a.b"),
            Err(ProbeError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn test_import_failure_propagates() {
        let fake = FakeInterpreter::new();
        assert!(matches!(
            resolve_package_paths(&fake, "missing"),
            Err(ProbeError::ExecutionFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_name_never_runs() {
        let fake = FakeInterpreter::new();
        assert!(matches!(
            resolve_package_paths(&fake, "os; rm"),
            Err(ProbeError::InvalidModuleName(_))
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_dotted_path_of() {
        let location = PackageLocation {
            name: "foo".to_string(),
            namespace_root: PathBuf::from("/root"),
            package_dir: PathBuf::from("/root/foo"),
        };
        assert_eq!(location.dotted_path_of(Path::new("/root/foo/bar")), Some("foo.bar".to_string()));
        assert_eq!(location.dotted_path_of(Path::new("/root")), None);
        assert_eq!(location.dotted_path_of(Path::new("/elsewhere/foo")), None);
    }

    #[test]
    fn test_toplevel_modules_root() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let project = temp_dir.path().join("mysite").join("app");
        if fs::create_dir_all(&project).is_err() {
            return;
        }
        let _ = fs::write(temp_dir.path().join("mysite").join("__init__.py"), "");
        let _ = fs::write(project.join("__init__.py"), "");

        assert_eq!(toplevel_modules_root(&project), temp_dir.path());
        assert_eq!(toplevel_modules_root(&project.join("models.py")), temp_dir.path());

        let plain = temp_dir.path().join("plain");
        assert_eq!(toplevel_modules_root(&plain.join("mysite")), plain);
    }
}
