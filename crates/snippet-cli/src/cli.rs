//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};
use serde_json::Value;
use snippet_transformer::{CompileOptions, JsxRuntime, Transform};

/// Compile JSX/TypeScript snippets to runnable JavaScript.
#[derive(Debug, Parser)]
#[command(name = "snippetc")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Snippet files or directories; `-` or nothing reads stdin
    pub paths: Vec<Utf8PathBuf>,

    /// Transforms to apply (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub transforms: Option<Vec<TransformArg>>,

    /// JSX runtime to compile against
    #[arg(long = "jsx-runtime", value_enum)]
    pub jsx_runtime: Option<JsxRuntimeArg>,

    /// Use production JSX runtime calls
    #[arg(long)]
    pub production: bool,

    /// Module that provides the automatic JSX runtime
    #[arg(long = "jsx-import-source")]
    pub jsx_import_source: Option<String>,

    /// Element factory for the classic runtime
    #[arg(long = "jsx-pragma")]
    pub jsx_pragma: Option<String>,

    /// Fragment component for the classic runtime
    #[arg(long = "jsx-fragment-pragma")]
    pub jsx_fragment_pragma: Option<String>,

    /// Keep imports that are unused or only used as types
    #[arg(long = "keep-unused-imports")]
    pub keep_unused_imports: bool,

    /// Delete import statements instead of rewriting them
    #[arg(long = "remove-imports")]
    pub remove_imports: bool,

    /// Merge JSX props with this function instead of object spread
    #[arg(long = "object-assign")]
    pub object_assign: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Execute the compiled code and report runtime errors
    #[arg(long)]
    pub run: bool,

    /// Scope binding for --run, as KEY=JSON (repeatable)
    #[arg(long, value_parser = parse_scope_entry)]
    pub scope: Vec<(String, Value)>,

    /// Recompile when files change
    #[arg(long)]
    pub watch: bool,

    /// Path to snippet.config.json
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs as JSON lines
    #[arg(long = "log-json")]
    pub log_json: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Diagnostics and a summary (default)
    #[default]
    Human,
    /// One JSON object per snippet with code, imports, map and diagnostics
    Json,
    /// Only the generated code
    Code,
    /// Only the source map
    Map,
}

/// A transform name on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransformArg {
    Jsx,
    Typescript,
    Flow,
    Imports,
    #[value(alias = "wrapLastExpression")]
    WrapLastExpression,
}

impl From<TransformArg> for Transform {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Jsx => Transform::Jsx,
            TransformArg::Typescript => Transform::Typescript,
            TransformArg::Flow => Transform::Flow,
            TransformArg::Imports => Transform::Imports,
            TransformArg::WrapLastExpression => Transform::WrapLastExpression,
        }
    }
}

/// A JSX runtime name on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JsxRuntimeArg {
    Classic,
    Automatic,
    Preserve,
}

impl From<JsxRuntimeArg> for JsxRuntime {
    fn from(arg: JsxRuntimeArg) -> Self {
        match arg {
            JsxRuntimeArg::Classic => JsxRuntime::Classic,
            JsxRuntimeArg::Automatic => JsxRuntime::Automatic,
            JsxRuntimeArg::Preserve => JsxRuntime::Preserve,
        }
    }
}

impl Args {
    /// Overrides `options` with every compile flag given on the command line.
    pub fn apply_to(&self, options: &mut CompileOptions) {
        if let Some(transforms) = &self.transforms {
            options.transforms = transforms.iter().copied().map(Transform::from).collect();
        }
        if let Some(runtime) = self.jsx_runtime {
            options.jsx_runtime = runtime.into();
        }
        if self.production {
            options.production = true;
        }
        if let Some(source) = &self.jsx_import_source {
            options.jsx_import_source = source.clone();
        }
        if let Some(pragma) = &self.jsx_pragma {
            options.jsx_pragma = pragma.clone();
        }
        if let Some(pragma) = &self.jsx_fragment_pragma {
            options.jsx_fragment_pragma = pragma.clone();
        }
        if self.keep_unused_imports {
            options.keep_unused_imports = true;
        }
        if self.remove_imports {
            options.remove_imports = true;
        }
        if let Some(object_assign) = &self.object_assign {
            options.object_assign = Some(object_assign.clone());
        }
    }

    /// Whether the snippet comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.paths.is_empty() || self.paths.iter().any(|p| p.as_str() == "-")
    }
}

fn parse_scope_entry(entry: &str) -> Result<(String, Value), String> {
    let (key, json) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=JSON, got `{entry}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing scope name in `{entry}`"));
    }
    let value = serde_json::from_str(json).map_err(|e| format!("invalid JSON for `{key}`: {e}"))?;
    Ok((key.to_string(), value))
}
