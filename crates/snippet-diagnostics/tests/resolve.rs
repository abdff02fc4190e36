//! Runtime errors from compiled snippets, mapped back through the source map.

use pretty_assertions::assert_eq;
use serde_json::json;
use snippet_diagnostics::{
    resolve_outcome, Diagnostic, DiagnosticCode, ExecutionOutcome, ExecutionRequest, Executor,
    ImportMap, Location, RunFailure, ThrownError,
};
use snippet_transformer::{compile, CompileOptions, Transform};
use std::future::Future;

const PROLOGUE: &str = "function anonymous(React,render,require,exports\n) {\n";

/// Throws at the first occurrence of `needle` and reports the position the way V8
/// does for `new Function` code: the call site for ordinary statements, but the
/// start of the `return` statement for anything inside a returned expression.
struct ThrowingEngine {
    needle: &'static str,
}

impl ThrowingEngine {
    /// 1-based line and column in the wrapped function source.
    fn report_position(code: &str, offset: usize) -> (u32, u32) {
        let before = &code[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line_text = &before[line_start..];
        let indent = line_text.len() - line_text.trim_start().len();
        let column_offset = if line_text.trim_start().starts_with("return (") {
            indent
        } else {
            line_text.len()
        };
        let line = before.matches('\n').count() as u32 + 3;
        let column = line_text[..column_offset].encode_utf16().count() as u32 + 1;
        (line, column)
    }
}

impl Executor for ThrowingEngine {
    type Error = std::io::Error;

    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> impl Future<Output = Result<ExecutionOutcome, Self::Error>> + Send {
        let outcome = match request.code.find(self.needle) {
            Some(offset) => {
                let (line, column) = Self::report_position(&request.code, offset);
                ExecutionOutcome::Threw {
                    error: ThrownError::new("Error", "boom").with_stack(format!(
                        "Error: boom\n    at eval (eval at run (file:///worker.mjs:52:14), <anonymous>:{line}:{column})"
                    )),
                    prologue: PROLOGUE.to_string(),
                }
            }
            None => ExecutionOutcome::Completed(json!(null)),
        };
        std::future::ready(Ok(outcome))
    }
}

async fn run(source: &str, options: &CompileOptions, needle: &'static str) -> Result<serde_json::Value, RunFailure> {
    let output = compile(source, options).unwrap();
    let request = ExecutionRequest::new(&output, Default::default(), ImportMap::new());
    let outcome = ThrowingEngine { needle }.execute(request).await.unwrap();
    resolve_outcome(&output, outcome).unwrap()
}

fn location(failure: RunFailure) -> Option<Location> {
    failure.thrown().location
}

#[tokio::test]
async fn test_error_in_last_expression() {
    let failure = run("const a = 1;\nboom(a);", &CompileOptions::default(), "boom")
        .await
        .unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 2, column: 0 }));
}

#[tokio::test]
async fn test_error_in_only_expression() {
    let failure = run("boom()", &CompileOptions::default(), "boom").await.unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 1, column: 0 }));
}

#[tokio::test]
async fn test_error_before_returned_expression() {
    let source = "boom(a);\nconst b = 2;\nb";
    let failure = run(source, &CompileOptions::default(), "boom").await.unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 1, column: 0 }));
}

#[tokio::test]
async fn test_error_inside_jsx_expression() {
    let source = "const el = <div>\n  {boom()}\n</div>;";
    let failure = run(source, &CompileOptions::default(), "boom").await.unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 2, column: 3 }));
}

#[tokio::test]
async fn test_error_after_type_annotations() {
    let source = "const n: number = 1;\nfunction f(x: string): void {\n  boom(x);\n}\nf('a');";
    let options = CompileOptions::with_transforms(&[Transform::Typescript, Transform::Imports]);
    let failure = run(source, &options, "boom").await.unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 3, column: 2 }));
}

#[tokio::test]
async fn test_error_at_rewritten_import_call() {
    let source = "import { boom } from './lib';\nboom();";
    let failure = run(source, &CompileOptions::default(), "(0, lib$0.boom)")
        .await
        .unwrap_err();
    assert_eq!(location(failure), Some(Location { line: 2, column: 0 }));
}

#[tokio::test]
async fn test_error_between_segments_is_unlocated() {
    let source = "import { boom } from './lib';\nboom();\nif (done) {}";
    let failure = run(source, &CompileOptions::default(), "lib$0.boom)()")
        .await
        .unwrap_err();
    assert_eq!(location(failure), None);
}

#[tokio::test]
async fn test_completed_run() {
    let value = run("1 + 1", &CompileOptions::default(), "boom").await.unwrap();
    assert_eq!(value, json!(null));
}

#[test]
fn test_module_not_found_outcome() {
    let output = compile("import x from './missing';\nx;", &CompileOptions::default()).unwrap();
    let outcome = ExecutionOutcome::Threw {
        error: ThrownError::new("Error", "Module not found: ./missing")
            .with_stack("Error: Module not found: ./missing\n    at require (file:///worker.mjs:20:11)"),
        prologue: PROLOGUE.to_string(),
    };
    let failure = resolve_outcome(&output, outcome).unwrap().unwrap_err();
    let RunFailure::ModuleNotFound(missing, error) = &failure else {
        panic!("expected a missing module, got {failure:?}");
    };
    assert_eq!(missing.path, "./missing");
    assert_eq!(error.location, None);

    let diagnostic = Diagnostic::from_run_failure("import x from './missing';\nx;", &failure);
    assert_eq!(diagnostic.code, DiagnosticCode::ModuleNotFound);
}

#[test]
fn test_missing_imports_before_run() {
    let output = compile(
        "import a from './a';\nimport b from 'b';\n<div>{a}{b}</div>",
        &CompileOptions {
            jsx_runtime: snippet_transformer::JsxRuntime::Automatic,
            ..CompileOptions::default()
        },
    )
    .unwrap();
    let mut imports = ImportMap::new();
    imports.insert("./a", json!({ "default": 1 }));
    assert_eq!(
        imports.missing(&output.imports, &["react/jsx-dev-runtime"]),
        vec!["b"]
    );
}
