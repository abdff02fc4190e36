//! Compiles JSX/TypeScript snippets to JavaScript that runs as a function body.
//!
//! The compiler works on the annotated token stream from `snippet-parser` and never
//! builds a syntax tree. A single front-to-back walk copies, replaces or removes
//! each token, so whitespace, comments and line numbers of untouched code survive.
//! It handles:
//! - Removing TypeScript and Flow type syntax, compiling TypeScript enums
//! - Compiling JSX to classic or automatic runtime calls
//! - Rewriting ES modules to `require` and `exports`, with interop helpers
//! - Returning the value of the last top-level expression
//! - Building a source map from every emitted token back to the snippet
//!
//! # Example
//!
//! ```
//! use snippet_transformer::{compile, CompileOptions};
//!
//! let output = compile("import Foo from './foo';", &CompileOptions::default()).unwrap();
//! assert_eq!(
//!     output.code,
//!     "var foo$0 = require('./foo');\nvar Foo = foo$0.default || foo$0;"
//! );
//! assert_eq!(output.imports[0].source, "./foo");
//! ```

mod compile;
mod entities;
mod error;
mod imports;
mod jsx;
mod module;
mod names;
mod processor;
mod root;
mod typescript;
mod wrap;

pub use compile::{compile, CompileOptions, CompileOutput, JsxRuntime, Transform};
pub use error::CompileError;
pub use imports::{AnalyzerOptions, ImportExportAnalyzer, ImportInfo, ImportKey, ImportRecord, NamedExport, NamedImport};
pub use names::{base_name_for_path, NameManager};
pub use processor::{Processed, ProcessorSnapshot, TokenProcessor};
pub use wrap::{plan_wrap, WrapPlan};
