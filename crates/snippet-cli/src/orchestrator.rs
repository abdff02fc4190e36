//! Main orchestration logic.

use crate::cli::Args;
use crate::config::{ConfigError, SnippetConfig};
use crate::output::{Formatter, SnippetResult, Summary};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use snippet_diagnostics::{
    resolve_outcome, Diagnostic, ExecutionRequest, Executor, ImportMap, ModuleNotFound, ThrownError,
};
use snippet_runner::{Runner, RunnerError};
use snippet_transformer::{compile, CompileOptions, JsxRuntime};
use source_map::DecodeError;
use std::fs;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;
use walkdir::WalkDir;

/// File extensions compiled when a directory is given.
const SNIPPET_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx"];

/// Modules the worker provides without an import map entry.
const BUILTIN_MODULES: &[&str] = &["react", "react/jsx-runtime", "react/jsx-dev-runtime"];

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Failed to read a snippet.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The JS runtime failed outside of the snippet itself.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// A compiled source map could not be decoded.
    #[error("invalid source map: {0}")]
    SourceMap(#[from] DecodeError),

    /// Watch error.
    #[error("watch error: {0}")]
    WatchFailed(String),
}

/// A snippet read from disk or stdin.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub name: String,
    pub source: String,
}

/// Settings shared by every pass, and the worker when `--run` is set.
struct Session<'a> {
    args: &'a Args,
    workspace: Utf8PathBuf,
    options: CompileOptions,
    scope: IndexMap<String, Value>,
    imports: ImportMap,
    timeout: Option<Duration>,
    formatter: Formatter,
    runner: Option<Runner>,
}

/// Runs one pass over the inputs, or keeps recompiling with `--watch`.
pub async fn run(args: Args) -> Result<Summary, OrchestratorError> {
    let workspace = std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."));

    let (config_path, config) = SnippetConfig::resolve(args.config.as_deref(), &workspace)?;
    if let Some(path) = &config_path {
        tracing::info!(%path, "using config");
    }

    let mut options = config.options.clone();
    args.apply_to(&mut options);
    let mut scope = config.scope.clone();
    scope.extend(args.scope.iter().cloned());

    let mut session = Session {
        args: &args,
        workspace,
        options,
        scope,
        imports: config.imports.clone(),
        timeout: config.timeout(),
        formatter: Formatter::new(args.output),
        runner: None,
    };

    let summary = if args.watch {
        run_watch_mode(&mut session).await
    } else {
        let snippets = read_inputs(&args, &session.workspace)?;
        session.check(snippets).await
    };

    if let Some(runner) = session.runner.as_mut() {
        runner.shutdown().await;
    }
    summary
}

impl Session<'_> {
    /// Compiles (and runs) every snippet, prints the results, and returns the totals.
    async fn check(&mut self, snippets: Vec<Snippet>) -> Result<Summary, OrchestratorError> {
        let options = &self.options;
        let mut results: Vec<SnippetResult> = snippets
            .into_par_iter()
            .map(|snippet| compile_snippet(snippet, options))
            .collect();

        if self.args.run {
            for result in &mut results {
                self.run_snippet(result).await?;
            }
        }

        if self.formatter.renders_reports() {
            for result in &results {
                for report in result.reports() {
                    eprintln!("{:?}", miette::Report::new(report));
                }
            }
        }
        print!("{}", self.formatter.format(&results));

        let summary = Summary::of(&results);
        tracing::debug!(
            snippets = summary.snippet_count,
            errors = summary.error_count,
            warnings = summary.warning_count,
            "pass finished"
        );
        Ok(summary)
    }

    async fn run_snippet(&mut self, result: &mut SnippetResult) -> Result<(), OrchestratorError> {
        let Some(output) = &result.output else {
            return Ok(());
        };

        let builtins = builtin_modules(&self.options);
        for path in self.imports.missing(&output.imports, &builtins) {
            result.diagnostics.push(Diagnostic::unresolved_import(&ModuleNotFound {
                path: path.to_string(),
            }));
        }

        let request = ExecutionRequest::new(output, self.scope.clone(), self.imports.clone());
        let outcome = match self.runner()?.execute(request).await {
            Ok(outcome) => outcome,
            Err(RunnerError::Timeout(timeout)) => {
                let error = ThrownError::new("TimeoutError", format!("snippet did not finish within {timeout:?}"));
                result.diagnostics.push(Diagnostic::from_thrown(&result.source, &error));
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        match resolve_outcome(output, outcome)? {
            Ok(value) => result.value = Some(value),
            Err(failure) => result
                .diagnostics
                .push(Diagnostic::from_run_failure(&result.source, &failure)),
        }
        Ok(())
    }

    fn runner(&mut self) -> Result<&mut Runner, RunnerError> {
        if self.runner.is_none() {
            let runtime = Runner::find_runtime(Some(&self.workspace)).ok_or(RunnerError::NotFound)?;
            tracing::info!(%runtime, "using JS runtime");
            let mut runner = Runner::new(runtime, self.workspace.clone())?;
            if let Some(timeout) = self.timeout {
                runner = runner.with_timeout(timeout);
            }
            self.runner = Some(runner);
        }
        self.runner.as_mut().ok_or(RunnerError::NotFound)
    }
}

/// The runtime modules the worker supplies for these options.
fn builtin_modules(options: &CompileOptions) -> Vec<&str> {
    let mut modules = BUILTIN_MODULES.to_vec();
    if options.jsx_runtime == JsxRuntime::Automatic && options.jsx_import_source != "react" {
        modules.retain(|m| *m == "react");
    }
    modules
}

/// Compiles one snippet, turning a compile error into a diagnostic.
pub fn compile_snippet(snippet: Snippet, options: &CompileOptions) -> SnippetResult {
    let options = CompileOptions {
        file_path: Some(snippet.name.clone()),
        ..options.clone()
    };
    let (output, diagnostics) = match compile(&snippet.source, &options) {
        Ok(output) => (Some(output), Vec::new()),
        Err(error) => {
            tracing::debug!(name = %snippet.name, %error, "compile failed");
            (None, vec![Diagnostic::from_compile_error(&snippet.source, &error)])
        }
    };
    SnippetResult {
        name: snippet.name,
        source: snippet.source,
        output,
        diagnostics,
        value: None,
    }
}

/// Reads stdin or the files named on the command line.
fn read_inputs(args: &Args, workspace: &Utf8Path) -> Result<Vec<Snippet>, OrchestratorError> {
    let mut snippets = Vec::new();
    if args.reads_stdin() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|source| OrchestratorError::ReadFailed {
                path: "<stdin>".to_string(),
                source,
            })?;
        snippets.push(Snippet {
            name: "<stdin>".to_string(),
            source,
        });
    }
    for path in collect_files(&args.paths)? {
        snippets.push(read_snippet(&path, workspace)?);
    }
    Ok(snippets)
}

fn read_snippet(path: &Utf8Path, workspace: &Utf8Path) -> Result<Snippet, OrchestratorError> {
    let source = fs::read_to_string(path).map_err(|source| OrchestratorError::ReadFailed {
        path: path.to_string(),
        source,
    })?;
    Ok(Snippet {
        name: display_name(path, workspace),
        source,
    })
}

fn display_name(path: &Utf8Path, workspace: &Utf8Path) -> String {
    path.strip_prefix(workspace).unwrap_or(path).to_string()
}

/// Expands directories into the snippet files below them, sorted.
pub fn collect_files(paths: &[Utf8PathBuf]) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
    let mut files = Vec::new();
    for path in paths.iter().filter(|p| p.as_str() != "-") {
        if path.is_dir() {
            let mut found: Vec<Utf8PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| {
                    let name = e.file_name().to_string_lossy();
                    e.depth() == 0 || !(name == "node_modules" || name.starts_with('.'))
                })
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
                .filter(|p| is_snippet_file(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(OrchestratorError::ReadFailed {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }
    }
    Ok(files)
}

fn is_snippet_file(path: &Utf8Path) -> bool {
    path.extension()
        .map_or(false, |ext| SNIPPET_EXTENSIONS.contains(&ext))
}

/// Runs in watch mode.
async fn run_watch_mode(session: &mut Session<'_>) -> Result<Summary, OrchestratorError> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};

    let args = session.args;
    if args.reads_stdin() {
        return Err(OrchestratorError::WatchFailed(
            "cannot watch stdin; pass files or directories".to_string(),
        ));
    }

    eprintln!("Starting watch mode...\n");
    let snippets = read_inputs(args, &session.workspace)?;
    session.check(snippets).await?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )
    .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    for path in &args.paths {
        watcher
            .watch(path.as_std_path(), RecursiveMode::Recursive)
            .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;
    }

    eprintln!("Watching for changes... (Ctrl+C to stop)\n");

    while let Some(event) = rx.recv().await {
        let changed = event
            .paths
            .iter()
            .filter_map(|p| Utf8Path::from_path(p))
            .any(is_snippet_file);
        if !changed {
            continue;
        }

        // Clear screen
        eprint!("\x1B[2J\x1B[1;1H");
        eprintln!("File changed, recompiling...\n");
        match read_inputs(args, &session.workspace) {
            Ok(snippets) => {
                if let Err(error) = session.check(snippets).await {
                    eprintln!("Error: {error}");
                }
            }
            Err(error) => eprintln!("Error: {error}"),
        }
    }

    Err(OrchestratorError::WatchFailed(
        "watch channel closed unexpectedly".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snippet_diagnostics::DiagnosticCode;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let (_dir, root) = temp_root();
        fs::create_dir_all(root.join("src/node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("src/.cache")).unwrap();
        fs::write(root.join("src/b.tsx"), "").unwrap();
        fs::write(root.join("src/a.jsx"), "").unwrap();
        fs::write(root.join("src/notes.md"), "").unwrap();
        fs::write(root.join("src/node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join("src/.cache/x.js"), "").unwrap();

        let files = collect_files(&[root.join("src")]).unwrap();
        assert_eq!(files, vec![root.join("src/a.jsx"), root.join("src/b.tsx")]);
    }

    #[test]
    fn test_collect_files_missing_path() {
        let (_dir, root) = temp_root();
        let error = collect_files(&[root.join("missing.jsx")]).unwrap_err();
        assert!(matches!(error, OrchestratorError::ReadFailed { .. }));
    }

    #[test]
    fn test_compile_snippet_reports_syntax_error() {
        let snippet = Snippet {
            name: "a.jsx".to_string(),
            source: "let = 1;".to_string(),
        };
        let result = compile_snippet(snippet, &CompileOptions::default());
        assert!(result.output.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::SyntaxError);
    }

    #[test]
    fn test_compile_snippet_names_source_map() {
        let snippet = Snippet {
            name: "demo/a.jsx".to_string(),
            source: "<a />".to_string(),
        };
        let result = compile_snippet(snippet, &CompileOptions::default());
        let output = result.output.unwrap();
        assert_eq!(output.map.sources, vec!["demo/a.jsx".to_string()]);
    }

    #[test]
    fn test_display_name_is_relative() {
        let workspace = Utf8Path::new("/work");
        assert_eq!(display_name(Utf8Path::new("/work/src/a.jsx"), workspace), "src/a.jsx");
        assert_eq!(display_name(Utf8Path::new("/else/a.jsx"), workspace), "/else/a.jsx");
    }

    #[test]
    fn test_builtin_modules_follow_import_source() {
        let options = CompileOptions {
            jsx_runtime: JsxRuntime::Automatic,
            jsx_import_source: "preact".to_string(),
            ..CompileOptions::default()
        };
        assert_eq!(builtin_modules(&options), vec!["react"]);
        assert_eq!(builtin_modules(&CompileOptions::default()).len(), 3);
    }
}
