//! The contract between compiled snippets and whatever runs them.

use crate::resolver::ErrorLocationResolver;
use crate::thrown::ThrownError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snippet_transformer::{CompileOutput, ImportRecord};
use source_map::DecodeError;
use std::future::Future;
use thiserror::Error;

/// Prefix of the message a worker `require` throws for an unknown path.
pub const MODULE_NOT_FOUND_PREFIX: &str = "Module not found: ";

/// A `require` of a path the import map does not provide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Module not found: {path}")]
pub struct ModuleNotFound {
    pub path: String,
}

impl ModuleNotFound {
    /// Recognizes the error a worker `require` throws for a missing module.
    pub fn from_thrown(error: &ThrownError) -> Option<Self> {
        error
            .message
            .strip_prefix(MODULE_NOT_FOUND_PREFIX)
            .map(|path| Self {
                path: path.to_string(),
            })
    }
}

/// Module values available to `require`, keyed by the path the snippet imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportMap {
    modules: IndexMap<String, Value>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, module: Value) {
        self.modules.insert(path.into(), module);
    }

    pub fn resolve(&self, path: &str) -> Result<&Value, ModuleNotFound> {
        self.modules.get(path).ok_or_else(|| ModuleNotFound {
            path: path.to_string(),
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Paths the compiled code requires that neither this map nor `builtins` provide.
    pub fn missing<'a>(&self, records: &'a [ImportRecord], builtins: &[&str]) -> Vec<&'a str> {
        records
            .iter()
            .map(|record| record.source.as_str())
            .filter(|source| !self.contains(source) && !builtins.contains(source))
            .collect()
    }
}

impl FromIterator<(String, Value)> for ImportMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

/// One evaluation of compiled code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    /// Extra function parameters, bound to these values, in order.
    pub scope: IndexMap<String, Value>,
    pub imports: ImportMap,
}

impl ExecutionRequest {
    pub fn new(output: &CompileOutput, scope: IndexMap<String, Value>, imports: ImportMap) -> Self {
        Self {
            code: output.code.clone(),
            scope,
            imports,
        }
    }

    /// Parameter names of the function the code runs in, in order.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names = vec!["React", "render"];
        names.extend(self.scope.keys().map(String::as_str));
        names.extend(["require", "exports"]);
        names
    }
}

/// What evaluating compiled code produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The value passed to `render`, or the function's return value.
    Completed(Value),
    /// The code threw. `prologue` is the synthesized function source before the body.
    Threw { error: ThrownError, prologue: String },
}

/// Runs compiled code. Implemented by `snippet-runner` over a JS worker process.
pub trait Executor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> impl Future<Output = Result<ExecutionOutcome, Self::Error>> + Send;
}

/// A run that threw, with its location in the snippet resolved where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum RunFailure {
    ModuleNotFound(ModuleNotFound, ThrownError),
    Thrown(ThrownError),
}

impl RunFailure {
    pub fn thrown(&self) -> &ThrownError {
        match self {
            Self::ModuleNotFound(_, error) | Self::Thrown(error) => error,
        }
    }
}

/// Resolves the location of an outcome's thrown error against the compile's map.
pub fn resolve_outcome(
    output: &CompileOutput,
    outcome: ExecutionOutcome,
) -> Result<Result<Value, RunFailure>, DecodeError> {
    let (mut error, prologue) = match outcome {
        ExecutionOutcome::Completed(value) => return Ok(Ok(value)),
        ExecutionOutcome::Threw { error, prologue } => (error, prologue),
    };
    let resolver = ErrorLocationResolver::new(&output.map, &prologue)?;
    resolver.resolve(&mut error);
    Ok(Err(match ModuleNotFound::from_thrown(&error) {
        Some(missing) => RunFailure::ModuleNotFound(missing, error),
        None => RunFailure::Thrown(error),
    }))
}
