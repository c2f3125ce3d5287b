//! Canned interpreter for unit tests

use crate::errors::ProbeError;
use crate::executor::Interpreter;
use crate::query::Query;
use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub query: Query,
    pub extra_paths: Vec<PathBuf>,
    pub watched: Option<OsString>,
}

/// Answers queries from a table; unknown queries fail like a broken import
#[derive(Debug, Default)]
pub(crate) struct FakeInterpreter {
    answers: HashMap<Query, Result<String, String>>,
    watch_var: Option<&'static str>,
    calls: RefCell<Vec<Call>>,
}

impl FakeInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, query: Query, output: impl Into<String>) -> Self {
        self.answers.insert(query, Ok(output.into()));
        self
    }

    pub fn fail(mut self, query: Query, reason: impl Into<String>) -> Self {
        self.answers.insert(query, Err(reason.into()));
        self
    }

    pub fn answer_statement(self, code: &str, output: impl Into<String>) -> Self {
        self.answer(Query::statement(code), output)
    }

    /// Record the value of `var` as seen by each call
    pub fn watch(mut self, var: &'static str) -> Self {
        self.watch_var = Some(var);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Interpreter for FakeInterpreter {
    fn run_with_paths(&self, query: &Query, extra_paths: &[PathBuf]) -> Result<String, ProbeError> {
        self.calls.borrow_mut().push(Call {
            query: query.clone(),
            extra_paths: extra_paths.to_vec(),
            watched: self.watch_var.and_then(env::var_os),
        });
        match self.answers.get(query) {
            Some(Ok(output)) => Ok(output.trim().to_string()),
            Some(Err(reason)) => Err(ProbeError::ExecutionFailed {
                command: query.describe(),
                reason: reason.clone(),
            }),
            None => Err(ProbeError::ExecutionFailed {
                command: query.describe(),
                reason: "ModuleNotFoundError".to_string(),
            }),
        }
    }
}
