//! Running a query and decoding what it printed

use crate::errors::ProbeError;
use crate::executor::Interpreter;
use crate::literal::PyLiteral;
use crate::query::Query;
use std::path::PathBuf;

/// Decode trimmed child output; empty output means "no value"
pub fn decode_output(text: &str) -> Result<Option<PyLiteral>, ProbeError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    PyLiteral::parse(text).map(Some)
}

pub fn eval_query(interpreter: &dyn Interpreter, query: &Query) -> Result<Option<PyLiteral>, ProbeError> {
    eval_query_with_paths(interpreter, query, &[])
}

pub fn eval_query_with_paths(
    interpreter: &dyn Interpreter,
    query: &Query,
    extra_paths: &[PathBuf],
) -> Result<Option<PyLiteral>, ProbeError> {
    let output = interpreter.run_with_paths(query, extra_paths)?;
    decode_output(&output)
}

/// Run inline code and decode the literal it prints
pub fn eval_statement(interpreter: &dyn Interpreter, code: &str) -> Result<Option<PyLiteral>, ProbeError> {
    eval_query(interpreter, &Query::statement(code))
}

/// Run a script from the script directory and decode the literal it prints
pub fn eval_script(
    interpreter: &dyn Interpreter,
    name: &str,
    args: &[String],
) -> Result<Option<PyLiteral>, ProbeError> {
    eval_query(interpreter, &Query::script(name, args.iter().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInterpreter;

    #[test]
    fn test_empty_output_is_no_value() {
        assert!(decode_output("").is_ok_and(|v| v.is_none()));
        assert!(decode_output("  \n").is_ok_and(|v| v.is_none()));
    }

    #[test]
    fn test_eval_statement_decodes_literal() {
        let fake = FakeInterpreter::new().answer_statement("print([1, 2])", "[1, 2]");
        let result = eval_statement(&fake, "print([1, 2])");
        assert!(result.is_ok_and(|v| v == Some(PyLiteral::List(vec![PyLiteral::Int(1), PyLiteral::Int(2)]))));
    }

    #[test]
    fn test_eval_statement_rejects_garbage() {
        let fake = FakeInterpreter::new().answer_statement("print(object())", "<object object at 0x7f>");
        assert!(matches!(
            eval_statement(&fake, "print(object())"),
            Err(ProbeError::Decode { .. })
        ));
    }

    #[test]
    fn test_eval_script_propagates_failure() {
        let fake = FakeInterpreter::new();
        assert!(matches!(
            eval_script(&fake, "finder.py", &[]),
            Err(ProbeError::ExecutionFailed { .. })
        ));
    }
}
