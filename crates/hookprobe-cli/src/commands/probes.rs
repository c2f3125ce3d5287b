//! Single-question probes: OpenGL handlers, extension imports, six.moves, PyWin32, the interpreter

use crate::common::print_json;
use crate::errors::CliError;
use crate::GlobalOpts;
use hookprobe_python::{Lookup, PythonEnvironment};
use std::collections::BTreeMap;

pub fn handle_opengl_arrays(opts: &GlobalOpts) -> Result<(), CliError> {
    print_json(&opts.introspector()?.opengl_arrays_modules()?)
}

pub fn handle_extension_imports(module: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    print_json(&opts.introspector()?.extension_imports(module)?)
}

/// Map each `six.moves` name to its real module; names without one are left out
pub fn handle_six_moves(names: &[String], opts: &GlobalOpts) -> Result<(), CliError> {
    let introspector = opts.introspector()?;
    let mut mapping = BTreeMap::new();
    for name in names {
        if let Lookup::Found(real) = introspector.six_moved_module(name)? {
            mapping.insert(format!("six.moves.{}", name), real);
        }
    }
    print_json(&mapping)
}

pub fn handle_pywin32_module(module: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    print_json(&opts.introspector()?.pywin32_module_file(module)?)
}

pub fn handle_python(opts: &GlobalOpts) -> Result<(), CliError> {
    let env = PythonEnvironment::discover(&opts.config()?)?;
    print_json(&env)
}
