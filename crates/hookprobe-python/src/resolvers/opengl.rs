//! PyOpenGL array handler modules
//!
//! PyOpenGL imports its `OpenGL.arrays.*` format handlers by name at run
//! time, so a bundler has to list them explicitly.

use super::{probe, Lookup};
use crate::errors::ProbeError;
use crate::eval::eval_query;
use crate::executor::Interpreter;
use crate::query;
use std::fs;
use std::path::{Path, PathBuf};

pub const ARRAYS_PACKAGE: &str = "OpenGL.arrays";

pub fn arrays_modules(interpreter: &dyn Interpreter) -> Result<Lookup<Vec<String>>, ProbeError> {
    let lookup = match probe(eval_query(interpreter, &query::opengl_package_dir()))? {
        Lookup::Found(Some(literal)) => {
            let package_dir = PathBuf::from(literal.into_string()?);
            arrays_modules_in(&package_dir.join("arrays"))
        }
        Lookup::Found(None) | Lookup::Missing => Lookup::Missing,
        Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
    };
    Ok(lookup.report("OpenGL array handlers"))
}

/// Modules of the arrays package found in `dir`, sorted
pub fn arrays_modules_in(dir: &Path) -> Lookup<Vec<String>> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Lookup::Missing;
    };
    let mut modules: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .filter(|stem| stem != "__init__")
        .map(|stem| format!("{}.{}", ARRAYS_PACKAGE, stem))
        .collect();
    modules.sort();
    Lookup::Found(modules)
}
