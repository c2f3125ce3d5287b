//! Import-time discovery: what a module pulls in, and where `six.moves` points

use super::{probe, Lookup};
use crate::errors::ProbeError;
use crate::eval::eval_query;
use crate::executor::Interpreter;
use crate::literal::PyLiteral;
use crate::query::{self, validate_module_name};
use hookprobe_logger as logger;

/// Modules loaded as a side effect of importing `module`
///
/// Extension modules import their dependencies from native code, where a
/// static scan cannot see them.
pub fn extension_imports(interpreter: &dyn Interpreter, module: &str) -> Result<Lookup<Vec<String>>, ProbeError> {
    let query = query::extension_imports(module)?;
    let lookup = match probe(eval_query(interpreter, &query))? {
        Lookup::Found(Some(literal)) => Lookup::Found(literal.into_string_list()?),
        Lookup::Found(None) | Lookup::Missing => Lookup::Missing,
        Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
    };
    Ok(lookup.report(&format!("imports of '{}'", module)))
}

/// Real module behind `six.moves.<name>`
///
/// Moved attributes (as opposed to moved modules) have no module of their
/// own and come back as [`Lookup::Missing`] without being logged as errors.
pub fn six_moved_module(interpreter: &dyn Interpreter, name: &str) -> Result<Lookup<String>, ProbeError> {
    let query = query::six_moved_module(name)?;
    let lookup = match probe(eval_query(interpreter, &query))? {
        Lookup::Found(Some(PyLiteral::Str(real))) if real.is_empty() => Lookup::Missing,
        Lookup::Found(Some(PyLiteral::Str(real))) => {
            validate_module_name(&real)?;
            Lookup::Found(real)
        }
        Lookup::Found(Some(other)) => return Err(ProbeError::decode(
            &other.to_json().to_string(),
            0,
            format!("expected a module name, found {}", other.type_name()),
        )),
        Lookup::Found(None) | Lookup::Missing => Lookup::Missing,
        Lookup::Unavailable(reason) => {
            return Ok(Lookup::Unavailable(reason).report("six"));
        }
    };
    if let Lookup::Found(ref real) = lookup {
        logger::debug(&format!("six.moves.{} -> {}", name, real));
    }
    Ok(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInterpreter;

    #[test]
    fn test_extension_imports() {
        let mut fake = FakeInterpreter::new();
        if let Ok(q) = query::extension_imports("lxml.etree") {
            fake = fake.answer(q, "['gzip', 'lxml._elementpath']");
        }
        let lookup = extension_imports(&fake, "lxml.etree");
        assert!(lookup.is_ok_and(|l| l
            == Lookup::Found(vec!["gzip".to_string(), "lxml._elementpath".to_string()])));
    }

    #[test]
    fn test_six_moved_module() {
        let mut fake = FakeInterpreter::new();
        if let Ok(q) = query::six_moved_module("configparser") {
            fake = fake.answer(q, "'configparser'");
        }
        if let Ok(q) = query::six_moved_module("reduce") {
            fake = fake.answer(q, "''");
        }

        assert!(six_moved_module(&fake, "configparser")
            .is_ok_and(|l| l == Lookup::Found("configparser".to_string())));
        assert!(six_moved_module(&fake, "reduce").is_ok_and(|l| l == Lookup::Missing));
        assert!(six_moved_module(&fake, "urllib").is_ok_and(|l| matches!(l, Lookup::Unavailable(_))));
    }
}
