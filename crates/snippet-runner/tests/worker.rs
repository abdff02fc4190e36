//! Runs compiled snippets in a real node/bun worker. Skipped when neither is installed.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use snippet_diagnostics::{resolve_outcome, ExecutionRequest, Executor, ImportMap, Location, RunFailure};
use snippet_runner::{Runner, RunnerError};
use snippet_transformer::{compile, CompileOptions};
use std::time::Duration;

struct Fixture {
    runner: Runner,
    is_node: bool,
    _workspace: tempfile::TempDir,
}

/// A runner whose worker cannot resolve a real `react`, so the built-in element
/// factory is used.
fn fixture() -> Option<Fixture> {
    let Some(runtime) = Runner::find_runtime(None) else {
        eprintln!("skipping: no node or bun found");
        return None;
    };
    let workspace = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(workspace.path().to_path_buf()).unwrap();
    let is_node = runtime.file_stem() == Some("node");
    Some(Fixture {
        runner: Runner::new(runtime, root).unwrap(),
        is_node,
        _workspace: workspace,
    })
}

async fn run(
    runner: &mut Runner,
    source: &str,
    scope: IndexMap<String, Value>,
    imports: ImportMap,
) -> Result<Value, RunFailure> {
    let output = compile(source, &CompileOptions::default()).unwrap();
    let outcome = runner
        .execute(ExecutionRequest::new(&output, scope, imports))
        .await
        .unwrap();
    resolve_outcome(&output, outcome).unwrap()
}

#[tokio::test]
async fn test_returns_last_expression() {
    let Some(mut fixture) = fixture() else { return };
    let value = run(&mut fixture.runner, "const a = 2;\na * 21", IndexMap::new(), ImportMap::new())
        .await
        .unwrap();
    assert_eq!(value, json!(42));
    fixture.runner.shutdown().await;
}

#[tokio::test]
async fn test_renders_jsx_with_builtin_react() {
    let Some(mut fixture) = fixture() else { return };
    let value = run(
        &mut fixture.runner,
        r#"<div className="a">hi</div>"#,
        IndexMap::new(),
        ImportMap::new(),
    )
    .await
    .unwrap();
    assert_eq!(
        value,
        json!({ "type": "div", "key": null, "props": { "className": "a", "children": "hi" } })
    );

    let rendered = run(&mut fixture.runner, "render(<b />);\n1", IndexMap::new(), ImportMap::new())
        .await
        .unwrap();
    assert_eq!(rendered, json!({ "type": "b", "key": null, "props": {} }));
    fixture.runner.shutdown().await;
}

#[tokio::test]
async fn test_scope_and_imports() {
    let Some(mut fixture) = fixture() else { return };
    let mut scope = IndexMap::new();
    scope.insert("name".to_string(), json!("Ada"));
    let mut imports = ImportMap::new();
    imports.insert("./greeting", json!({ "default": "Hello" }));

    let value = run(
        &mut fixture.runner,
        "import greeting from './greeting';\n`${greeting}, ${name}`",
        scope,
        imports,
    )
    .await
    .unwrap();
    assert_eq!(value, json!("Hello, Ada"));
    fixture.runner.shutdown().await;
}

#[tokio::test]
async fn test_runtime_error_is_located() {
    let Some(mut fixture) = fixture() else { return };
    let failure = run(&mut fixture.runner, "const a = 1;\nboom(a);", IndexMap::new(), ImportMap::new())
        .await
        .unwrap_err();
    let RunFailure::Thrown(error) = &failure else {
        panic!("expected a thrown error, got {failure:?}");
    };
    assert_eq!(error.name, "ReferenceError");
    if fixture.is_node {
        assert_eq!(error.location, Some(Location { line: 2, column: 0 }));
    }

    let failure = run(&mut fixture.runner, "boom()", IndexMap::new(), ImportMap::new())
        .await
        .unwrap_err();
    if fixture.is_node {
        assert_eq!(failure.thrown().location, Some(Location { line: 1, column: 0 }));
    }
    fixture.runner.shutdown().await;
}

#[tokio::test]
async fn test_missing_module() {
    let Some(mut fixture) = fixture() else { return };
    let failure = run(
        &mut fixture.runner,
        "import x from './missing';\nx",
        IndexMap::new(),
        ImportMap::new(),
    )
    .await
    .unwrap_err();
    let RunFailure::ModuleNotFound(missing, _) = failure else {
        panic!("expected a missing module, got {failure:?}");
    };
    assert_eq!(missing.path, "./missing");
    fixture.runner.shutdown().await;
}

#[tokio::test]
async fn test_timeout_kills_and_respawns_worker() {
    let Some(fixture) = fixture() else { return };
    let mut runner = fixture.runner.with_timeout(Duration::from_millis(500));

    let output = compile("while (true) {}", &CompileOptions::default()).unwrap();
    let result = runner
        .execute(ExecutionRequest::new(&output, IndexMap::new(), ImportMap::new()))
        .await;
    assert!(matches!(result, Err(RunnerError::Timeout(_))));

    let value = run(&mut runner, "'alive'", IndexMap::new(), ImportMap::new())
        .await
        .unwrap();
    assert_eq!(value, json!("alive"));
    runner.shutdown().await;
}
