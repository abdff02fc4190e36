//! node/bun process runner.

use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snippet_diagnostics::{ExecutionOutcome, ExecutionRequest, Executor, ImportMap, ThrownError};
use std::fs;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

/// Overrides the JS runtime binary.
pub const RUNTIME_ENV: &str = "SNIPPETC_RUNTIME";

const WORKER_SCRIPT_FILENAME: &str = "snippetc-worker.mjs";
const WORKER_SCRIPT_SOURCE: &str = r#"import { createInterface } from 'node:readline';
import { stdin, stdout } from 'node:process';
import { createRequire } from 'node:module';
import { pathToFileURL } from 'node:url';

const hostRequire = createRequire(pathToFileURL(process.cwd() + '/'));

const Fragment = Symbol.for('react.fragment');

function typeName(type) {
  if (typeof type === 'string') return type;
  if (type === Fragment) return 'Fragment';
  return (type && (type.displayName || type.name)) || 'Component';
}

function element(type, props, key) {
  const { key: propKey, ...rest } = props || {};
  const resolved = key !== undefined ? key : propKey;
  return { type: typeName(type), key: resolved === undefined ? null : String(resolved), props: rest };
}

function createElement(type, props, ...children) {
  const merged = { ...(props || {}) };
  if (children.length === 1) merged.children = children[0];
  else if (children.length > 1) merged.children = children;
  return element(type, merged);
}

const fallbackReact = { createElement, Fragment };
const fallbackJsxRuntime = {
  Fragment,
  jsx: (type, props, key) => element(type, props, key),
  jsxs: (type, props, key) => element(type, props, key),
  jsxDEV: (type, props, key) => element(type, props, key)
};

const builtins = {
  'react': () => fallbackReact,
  'react/jsx-runtime': () => fallbackJsxRuntime,
  'react/jsx-dev-runtime': () => fallbackJsxRuntime
};

function loadBuiltin(path) {
  try {
    return hostRequire(path);
  } catch {
    return builtins[path]();
  }
}

function toJson(value) {
  const seen = new WeakSet();
  const text = JSON.stringify(value, (_key, v) => {
    if (typeof v === 'function') return `[Function ${v.name || 'anonymous'}]`;
    if (typeof v === 'symbol') return v.toString();
    if (typeof v === 'bigint') return v.toString();
    if (v && typeof v === 'object') {
      if (seen.has(v)) return '[Circular]';
      seen.add(v);
    }
    return v;
  });
  return text === undefined ? null : JSON.parse(text);
}

function describeError(err) {
  if (!(err instanceof Error)) {
    return { name: '', message: String(err) };
  }
  const error = { name: err.name, message: err.message, stack: err.stack };
  if (typeof err.lineNumber === 'number') error.lineNumber = err.lineNumber;
  if (typeof err.columnNumber === 'number') error.columnNumber = err.columnNumber;
  return error;
}

async function run(req) {
  const imports = req.imports || {};
  const scope = req.scope || {};
  const names = Object.keys(scope);
  const code = req.code;

  let rendered;
  let didRender = false;
  const render = (value) => {
    rendered = value;
    didRender = true;
  };
  const require = (path) => {
    if (Object.prototype.hasOwnProperty.call(imports, path)) return imports[path];
    if (Object.prototype.hasOwnProperty.call(builtins, path)) return loadBuiltin(path);
    throw new Error(`Module not found: ${path}`);
  };
  const exports = {};

  let fn;
  let prologue = '';
  try {
    fn = new Function('React', 'render', ...names, 'require', 'exports', code);
    const source = String(fn);
    const bodyAt = source.indexOf(code);
    prologue = bodyAt >= 0 ? source.slice(0, bodyAt) : '';
    const React = Object.prototype.hasOwnProperty.call(imports, 'react') ? imports['react'] : loadBuiltin('react');
    let value = fn(React, render, ...names.map((name) => scope[name]), require, exports);
    if (value && typeof value.then === 'function') value = await value;
    if (didRender) value = rendered;
    else if (value === undefined && Object.keys(exports).length > 0) value = exports;
    return { ok: true, value: toJson(value) };
  } catch (err) {
    return { error: describeError(err), prologue };
  }
}

stdout.write(JSON.stringify({ ready: true }) + '\n');

const rl = createInterface({ input: stdin, crlfDelay: Infinity });

for await (const line of rl) {
  if (!line.trim()) continue;

  let req;
  try {
    req = JSON.parse(line);
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    stdout.write(JSON.stringify({ id: null, protocolError: `invalid json: ${message}` }) + '\n');
    continue;
  }

  const response = await run(req);
  stdout.write(JSON.stringify({ id: req.id, ...response }) + '\n');
}
"#;

/// Error types for the runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Failed to spawn the runtime process.
    #[error("failed to spawn JS runtime: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// The runtime process exited.
    #[error("JS runtime exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// No node or bun binary was found.
    #[error("no JS runtime found; install node or bun, or set SNIPPETC_RUNTIME")]
    NotFound,

    /// Failed to write the worker script.
    #[error("failed to prepare worker script: {0}")]
    Setup(String),

    /// Worker protocol error.
    #[error("worker protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse a worker response.
    #[error("failed to parse worker response: {0}")]
    ParseError(String),

    /// The snippet did not finish in time; the worker was killed.
    #[error("snippet did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    id: u64,
    code: &'a str,
    scope: &'a IndexMap<String, Value>,
    imports: &'a ImportMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkerResponse {
    id: Option<u64>,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    error: Option<ThrownError>,
    #[serde(default)]
    prologue: String,
    protocol_error: Option<String>,
}

impl WorkerResponse {
    fn into_outcome(self) -> Result<ExecutionOutcome, RunnerError> {
        if let Some(error) = self.protocol_error {
            return Err(RunnerError::ProtocolError(error));
        }
        match (self.ok, self.error) {
            (_, Some(error)) => Ok(ExecutionOutcome::Threw {
                error,
                prologue: self.prologue,
            }),
            (true, None) => Ok(ExecutionOutcome::Completed(self.value)),
            (false, None) => Err(RunnerError::ProtocolError(
                "response has neither a value nor an error".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkerReady {
    ready: bool,
}

/// Executes compiled snippets in a persistent node or bun worker.
///
/// The worker is spawned on the first request and respawned after it exits or
/// times out.
#[derive(Debug)]
pub struct Runner {
    runtime_path: Utf8PathBuf,
    workspace_root: Utf8PathBuf,
    script_path: Utf8PathBuf,
    timeout: Duration,
    worker: Option<Worker>,
    next_id: u64,
}

impl Runner {
    /// Default time a single snippet may run.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a runner; `workspace_root` is where the worker resolves `react`.
    pub fn new(runtime_path: Utf8PathBuf, workspace_root: Utf8PathBuf) -> Result<Self, RunnerError> {
        let cache_dir = Self::get_cache_dir()
            .ok_or_else(|| RunnerError::Setup("could not determine cache directory".into()))?;
        let script_path = ensure_script(&cache_dir)?;
        Ok(Self {
            runtime_path,
            workspace_root,
            script_path,
            timeout: Self::DEFAULT_TIMEOUT,
            worker: None,
            next_id: 1,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn runtime_path(&self) -> &Utf8Path {
        &self.runtime_path
    }

    /// Finds a JS runtime:
    /// 1. `SNIPPETC_RUNTIME`
    /// 2. Workspace node_modules/.bin/bun (if workspace_root provided)
    /// 3. `node` on PATH
    /// 4. `bun` on PATH
    /// 5. ~/.bun/bin/bun (default bun install location)
    pub fn find_runtime(workspace_root: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        let env_override = std::env::var(RUNTIME_ENV).ok();
        find_runtime_with(env_override.as_deref(), workspace_root)
    }

    /// Gets the cache directory for snippetc.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("snippetc"))
    }

    /// Gets the version string of the runtime binary.
    pub async fn get_runtime_version(&self) -> Result<String, RunnerError> {
        let output = Command::new(&self.runtime_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(RunnerError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunnerError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Stops the worker process, if one is running.
    pub async fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.kill().await;
        }
    }

    async fn run(&mut self, request: ExecutionRequest) -> Result<ExecutionOutcome, RunnerError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut worker = match self.worker.take() {
            Some(worker) => worker,
            None => Worker::spawn(&self.runtime_path, &self.workspace_root, &self.script_path).await?,
        };

        let line = serde_json::to_string(&WorkerRequest {
            id,
            code: &request.code,
            scope: &request.scope,
            imports: &request.imports,
        })
        .map_err(|e| RunnerError::ProtocolError(format!("failed to serialize request: {e}")))?;

        match tokio::time::timeout(self.timeout, worker.exchange(id, &line)).await {
            Ok(Ok(outcome)) => {
                self.worker = Some(worker);
                Ok(outcome)
            }
            Ok(Err(error)) => {
                worker.kill().await;
                Err(error)
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "snippet timed out; killing worker");
                worker.kill().await;
                Err(RunnerError::Timeout(self.timeout))
            }
        }
    }
}

impl Executor for Runner {
    type Error = RunnerError;

    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> impl Future<Output = Result<ExecutionOutcome, Self::Error>> + Send {
        self.run(request)
    }
}

fn find_runtime_with(
    env_override: Option<&str>,
    workspace_root: Option<&Utf8Path>,
) -> Option<Utf8PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.trim().is_empty()) {
        let path = Utf8PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        if let Ok(found) = which::which(path.as_str()) {
            return Utf8PathBuf::try_from(found).ok();
        }
        tracing::warn!(%path, "SNIPPETC_RUNTIME does not name a runnable binary");
    }

    if let Some(workspace) = workspace_root {
        let bin = workspace.join("node_modules/.bin");
        if let Some(path) = find_in_bin(&bin, "bun") {
            return Some(path);
        }
    }

    for name in ["node", "bun"] {
        if let Ok(path) = which::which(name) {
            if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                return Some(utf8_path);
            }
        }
    }

    // Check ~/.bun/bin/bun (default install location from bun.sh/install)
    let home = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok())?;
    find_in_bin(&home.join(".bun/bin"), "bun")
}

fn find_in_bin(bin: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
    let candidates: Vec<String> = if cfg!(windows) {
        vec![format!("{name}.exe"), format!("{name}.cmd"), name.to_string()]
    } else {
        vec![name.to_string()]
    };

    candidates
        .iter()
        .map(|candidate| bin.join(candidate))
        .find(|path| path.exists())
}

/// Writes the worker script into `cache_dir` unless an identical copy is there.
fn ensure_script(cache_dir: &Utf8Path) -> Result<Utf8PathBuf, RunnerError> {
    fs::create_dir_all(cache_dir)
        .map_err(|e| RunnerError::Setup(format!("failed to create cache dir: {e}")))?;

    let script_path = cache_dir.join(WORKER_SCRIPT_FILENAME);
    let mut hasher = Hasher::new();
    hasher.update(WORKER_SCRIPT_SOURCE.as_bytes());
    let expected_hash = hasher.finalize();

    if let Ok(existing) = fs::read(&script_path) {
        let mut hasher = Hasher::new();
        hasher.update(&existing);
        if hasher.finalize() == expected_hash {
            return Ok(script_path);
        }
    }

    tracing::debug!(path = %script_path, "writing worker script");
    fs::write(&script_path, WORKER_SCRIPT_SOURCE)
        .map_err(|e| RunnerError::Setup(format!("failed to write worker script: {e}")))?;

    Ok(script_path)
}

#[derive(Debug)]
struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
}

impl Worker {
    async fn spawn(
        runtime_path: &Utf8Path,
        workspace_root: &Utf8Path,
        script_path: &Utf8Path,
    ) -> Result<Self, RunnerError> {
        tracing::debug!(runtime = %runtime_path, "spawning worker");
        let mut child = Command::new(runtime_path)
            .arg(script_path)
            .current_dir(workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(RunnerError::SpawnFailed)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RunnerError::ProtocolError("failed to open worker stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ProtocolError("failed to open worker stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ProtocolError("failed to open worker stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer).await;
            buffer
        });

        let mut worker = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr_task: Some(stderr_task),
        };

        let ready_line = worker.next_line().await?;
        let ready: WorkerReady = serde_json::from_str(&ready_line)
            .map_err(|e| RunnerError::ParseError(format!("invalid ready response: {e}")))?;
        if !ready.ready {
            return Err(RunnerError::ProtocolError(format!(
                "unexpected worker ready response: {ready_line}"
            )));
        }
        tracing::info!(runtime = %runtime_path, "worker ready");

        Ok(worker)
    }

    /// Sends one request line and waits for the response with the same id.
    async fn exchange(&mut self, id: u64, line: &str) -> Result<ExecutionOutcome, RunnerError> {
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RunnerError::ProtocolError(format!("failed to write to worker stdin: {e}")))?;
        self.stdin
            .write_all(b"\n")
            .await
            .map_err(|e| RunnerError::ProtocolError(format!("failed to write newline: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| RunnerError::ProtocolError(format!("failed to flush worker stdin: {e}")))?;

        loop {
            let line = self.next_line().await?;
            let response: WorkerResponse = serde_json::from_str(&line)
                .map_err(|e| RunnerError::ParseError(format!("invalid response: {e} ({line})")))?;
            match response.id {
                Some(response_id) if response_id == id => return response.into_outcome(),
                Some(stale) => tracing::debug!(stale, "discarding stale worker response"),
                None => return response.into_outcome(),
            }
        }
    }

    /// Reads the next stdout line, reporting the exit status if the worker is gone.
    async fn next_line(&mut self) -> Result<String, RunnerError> {
        let line = self
            .stdout
            .next_line()
            .await
            .map_err(|e| RunnerError::ProtocolError(format!("failed to read worker output: {e}")))?;

        match line {
            Some(line) => Ok(line),
            None => {
                let stderr = match self.stderr_task.take() {
                    Some(handle) => handle.await.unwrap_or_default(),
                    None => String::new(),
                };
                let status = self.child.wait().await.map_err(RunnerError::SpawnFailed)?;
                Err(RunnerError::ProcessFailed {
                    code: status.code().unwrap_or(-1),
                    stderr,
                })
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(error) = self.child.kill().await {
            tracing::debug!(%error, "worker already exited");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ensure_script_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let path = ensure_script(&cache_dir).unwrap();
        assert_eq!(path, cache_dir.join(WORKER_SCRIPT_FILENAME));
        assert_eq!(fs::read_to_string(&path).unwrap(), WORKER_SCRIPT_SOURCE);

        fs::write(&path, "stale").unwrap();
        ensure_script(&cache_dir).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), WORKER_SCRIPT_SOURCE);
    }

    #[test]
    fn test_find_runtime_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("my-node");
        fs::write(&fake, "").unwrap();
        let fake = Utf8PathBuf::try_from(fake).unwrap();
        assert_eq!(find_runtime_with(Some(fake.as_str()), None), Some(fake));
    }

    #[test]
    fn test_find_runtime_in_workspace_bin() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let bin = root.join("node_modules/.bin");
        fs::create_dir_all(&bin).unwrap();
        let bun = bin.join(if cfg!(windows) { "bun.exe" } else { "bun" });
        fs::write(&bun, "").unwrap();
        assert_eq!(find_runtime_with(None, Some(&root)), Some(bun));
    }

    #[test]
    fn test_request_shape() {
        let mut scope = IndexMap::new();
        scope.insert("name".to_string(), json!("Ada"));
        let imports: ImportMap = [("./data".to_string(), json!([1]))].into_iter().collect();
        let line = serde_json::to_string(&WorkerRequest {
            id: 7,
            code: "return name;",
            scope: &scope,
            imports: &imports,
        })
        .unwrap();
        assert_eq!(
            line,
            r#"{"id":7,"code":"return name;","scope":{"name":"Ada"},"imports":{"./data":[1]}}"#
        );
    }

    #[test]
    fn test_completed_response() {
        let response: WorkerResponse =
            serde_json::from_str(r#"{"id":1,"ok":true,"value":{"type":"div"}}"#).unwrap();
        assert_eq!(
            response.into_outcome().unwrap(),
            ExecutionOutcome::Completed(json!({ "type": "div" }))
        );
    }

    #[test]
    fn test_thrown_response() {
        let response: WorkerResponse = serde_json::from_str(
            r#"{"id":1,"error":{"name":"TypeError","message":"x is not a function","stack":"TypeError: x is not a function\n    at eval (<anonymous>:3:1)"},"prologue":"function anonymous(React,render,require,exports\n) {\n"}"#,
        )
        .unwrap();
        let ExecutionOutcome::Threw { error, prologue } = response.into_outcome().unwrap() else {
            panic!("expected a thrown error");
        };
        assert_eq!(error.name, "TypeError");
        assert_eq!(prologue, "function anonymous(React,render,require,exports\n) {\n");
    }

    #[test]
    fn test_protocol_error_response() {
        let response: WorkerResponse =
            serde_json::from_str(r#"{"id":null,"protocolError":"invalid json: Unexpected token"}"#)
                .unwrap();
        assert!(matches!(
            response.into_outcome(),
            Err(RunnerError::ProtocolError(message)) if message.starts_with("invalid json")
        ));
    }

    #[test]
    fn test_empty_response_is_protocol_error() {
        let response: WorkerResponse = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert!(matches!(response.into_outcome(), Err(RunnerError::ProtocolError(_))));
    }
}
