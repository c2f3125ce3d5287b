//! Django projects: locating the project package and its settings imports

use super::{probe, Lookup};
use crate::env_override::with_override;
use crate::errors::ProbeError;
use crate::eval::eval_query_with_paths;
use crate::executor::Interpreter;
use crate::package::toplevel_modules_root;
use crate::query::{validate_module_name, Query};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Variable naming the settings module of a Django process
pub const SETTINGS_ENV: &str = "DJANGO_SETTINGS_MODULE";

/// Helper script printing the modules referenced by a project's settings
pub const IMPORT_FINDER_SCRIPT: &str = "django_import_finder.py";

fn is_project_dir(dir: &Path) -> bool {
    dir.join("settings.py").is_file() && dir.join("urls.py").is_file()
}

/// Project package next to a `manage.py`
///
/// The directory of `manage.py` itself wins when it holds both
/// `settings.py` and `urls.py`; otherwise the first such subdirectory in
/// name order.
pub fn find_root_dir(manage_py: &Path) -> Option<PathBuf> {
    let manage_py = if manage_py.is_absolute() {
        manage_py.to_path_buf()
    } else {
        env::current_dir().ok()?.join(manage_py)
    };
    let manage_dir = manage_py.parent()?;

    if is_project_dir(manage_dir) {
        return Some(manage_dir.to_path_buf());
    }

    let mut subdirs: Vec<PathBuf> = fs::read_dir(manage_dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs.into_iter().find(|dir| is_project_dir(dir))
}

/// Dotted module names referenced by the project's settings
///
/// The child runs with the settings module selected and both the project
/// directory and its top-level parent on the search path.
pub fn dottedstring_imports(interpreter: &dyn Interpreter, root_dir: &Path) -> Result<Lookup<Vec<String>>, ProbeError> {
    let package = root_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ProbeError::InvalidArgument(format!("'{}' has no package name", root_dir.display())))?;
    validate_module_name(package)?;

    let extra_paths = [toplevel_modules_root(root_dir), root_dir.to_path_buf()];
    let query = Query::script(IMPORT_FINDER_SCRIPT, Vec::<String>::new());
    let result = with_override(SETTINGS_ENV, format!("{}.settings", package), || {
        eval_query_with_paths(interpreter, &query, &extra_paths)
    });

    let lookup = match probe(result)? {
        Lookup::Found(Some(literal)) => Lookup::Found(literal.into_string_list()?),
        Lookup::Found(None) | Lookup::Missing => Lookup::Missing,
        Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
    };
    Ok(lookup.report(&format!("Django imports for '{}'", package)))
}
