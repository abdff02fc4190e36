//! node/bun process runner for compiled snippets.
//!
//! [`Runner`] implements [`snippet_diagnostics::Executor`]: each request is
//! evaluated as the body of `new Function('React', 'render', ...scope, 'require',
//! 'exports', code)` inside a persistent worker, and errors come back with the
//! function prologue needed to map them to the snippet.

mod runner;

pub use runner::{Runner, RunnerError, RUNTIME_ENV};
