//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use snippet_diagnostics::ImportMap;
use snippet_transformer::CompileOptions;
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// File name searched for upward from the working directory.
pub const CONFIG_FILE_NAME: &str = "snippet.config.json";

/// Errors loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid config.
    #[error("invalid config {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of `snippet.config.json`.
///
/// Compile options sit at the top level next to the run settings:
///
/// ```json
/// {
///   "transforms": ["jsx", "typescript", "imports", "wrapLastExpression"],
///   "jsxRuntime": "automatic",
///   "scope": { "title": "Hello" },
///   "imports": { "./data": { "default": [1, 2, 3] } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnippetConfig {
    #[serde(flatten)]
    pub options: CompileOptions,
    /// Bindings passed to the snippet by `--run`.
    pub scope: IndexMap<String, Value>,
    /// Module values `require` returns under `--run`.
    pub imports: ImportMap,
    /// How long a run may take, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl SnippetConfig {
    /// Loads the config named by `--config`, or the nearest one above `cwd`.
    pub fn resolve(
        explicit: Option<&Utf8Path>,
        cwd: &Utf8Path,
    ) -> Result<(Option<Utf8PathBuf>, Self), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find(cwd),
        };
        match path {
            Some(path) => {
                let config = Self::load(&path)?;
                tracing::debug!(%path, "loaded config");
                Ok((Some(path), config))
            }
            None => Ok((None, Self::default())),
        }
    }

    /// Finds `snippet.config.json` in `start` or its ancestors.
    pub fn find(start: &Utf8Path) -> Option<Utf8PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Loads a config file. Comments are allowed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = remove_json_comments(&content);
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Removes single-line and multi-line comments from JSON.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use snippet_transformer::{JsxRuntime, Transform};

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_remove_comments_keeps_strings() {
        let json = r#"{
            // a comment
            "pragma": "h" /* inline */, "url": "http://x"
        }"#;
        let cleaned = remove_json_comments(json);
        assert!(!cleaned.contains("a comment"));
        assert!(!cleaned.contains("inline"));
        assert!(cleaned.contains("\"http://x\""));
    }

    #[test]
    fn test_load_flattened_options() {
        let (_dir, root) = temp_root();
        let path = root.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{
                // compile like the docs site
                "transforms": ["jsx", "typescript", "wrapLastExpression"],
                "jsxRuntime": "automatic",
                "jsxImportSource": "preact",
                "scope": { "title": "Hi" },
                "imports": { "./data": [1, 2] },
                "timeoutMs": 250
            }"#,
        )
        .unwrap();

        let config = SnippetConfig::load(&path).unwrap();
        assert_eq!(
            config.options.transforms,
            vec![Transform::Jsx, Transform::Typescript, Transform::WrapLastExpression]
        );
        assert_eq!(config.options.jsx_runtime, JsxRuntime::Automatic);
        assert_eq!(config.options.jsx_import_source, "preact");
        assert_eq!(config.options.jsx_pragma, "React.createElement");
        assert_eq!(config.scope.get("title"), Some(&json!("Hi")));
        assert!(config.imports.contains("./data"));
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_find_searches_upward() {
        let (_dir, root) = temp_root();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join(CONFIG_FILE_NAME), "{}").unwrap();

        assert_eq!(SnippetConfig::find(&nested), Some(root.join(CONFIG_FILE_NAME)));
        let (path, config) = SnippetConfig::resolve(None, &nested).unwrap();
        assert_eq!(path, Some(root.join(CONFIG_FILE_NAME)));
        assert_eq!(config, SnippetConfig::default());
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let (_dir, root) = temp_root();
        let missing = root.join("nope.json");
        let error = SnippetConfig::resolve(Some(&missing), &root).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_config() {
        let (_dir, root) = temp_root();
        let path = root.join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "jsxRuntime": "fancy" }"#).unwrap();
        let error = SnippetConfig::load(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert!(error.to_string().starts_with("invalid config"));
    }
}
