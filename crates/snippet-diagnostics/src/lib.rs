//! Diagnostics for compiled snippets.
//!
//! This crate provides:
//! - The model of an error thrown by running generated code ([`ThrownError`])
//! - Mapping a thrown error's position back to the snippet ([`ErrorLocationResolver`])
//! - The [`Executor`] contract and the import map behind `require`
//! - [`Diagnostic`]s for compile and runtime failures, renderable with `miette`
//!
//! # Example
//!
//! ```
//! use snippet_diagnostics::{ErrorLocationResolver, Location, ThrownError};
//! use snippet_transformer::{compile, CompileOptions};
//!
//! let output = compile("const a = 1;\nfoo(a);", &CompileOptions::default()).unwrap();
//! let prologue = "function anonymous(React,render,require,exports\n) {\n";
//! let resolver = ErrorLocationResolver::new(&output.map, prologue).unwrap();
//!
//! // `foo` sits at column 8 of the second generated line, `return (foo(a));`.
//! let mut error = ThrownError::new("ReferenceError", "foo is not defined")
//!     .with_stack("ReferenceError: foo is not defined\n    at eval (<anonymous>:4:9)");
//! assert_eq!(resolver.resolve(&mut error), Some(Location { line: 2, column: 0 }));
//! ```

mod diagnostic;
mod execution;
mod resolver;
mod thrown;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, SnippetReport};
pub use execution::{
    resolve_outcome, ExecutionOutcome, ExecutionRequest, Executor, ImportMap, ModuleNotFound,
    RunFailure, MODULE_NOT_FOUND_PREFIX,
};
pub use resolver::{reported_position, wrapper_line_offset, ErrorLocationResolver};
pub use thrown::{Location, ThrownError};
