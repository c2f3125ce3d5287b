//! PyWin32 modules, whose DLLs may live outside the default search

use super::{probe, Lookup};
use crate::errors::ProbeError;
use crate::eval::eval_query;
use crate::executor::Interpreter;
use crate::literal::PyLiteral;
use crate::query;
use std::path::PathBuf;

/// Absolute path of a PyWin32 module
///
/// Off Windows, or without PyWin32, the import fails and the result is
/// [`Lookup::Unavailable`].
pub fn module_file(interpreter: &dyn Interpreter, name: &str) -> Result<Lookup<PathBuf>, ProbeError> {
    let query = query::pywin32_module_file(name)?;
    let lookup = match probe(eval_query(interpreter, &query))? {
        Lookup::Found(Some(PyLiteral::Str(path))) => Lookup::Found(PathBuf::from(path)),
        Lookup::Found(Some(PyLiteral::None) | None) | Lookup::Missing => Lookup::Missing,
        Lookup::Found(Some(other)) => {
            return Err(ProbeError::decode(
                &other.to_json().to_string(),
                0,
                format!("expected a path, found {}", other.type_name()),
            ))
        }
        Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
    };
    Ok(lookup.report(&format!("PyWin32 module '{}'", name)))
}
