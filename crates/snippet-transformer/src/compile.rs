//! The compile entry point.

use crate::error::CompileError;
use crate::imports::{mark_shadowed_globals, AnalyzerOptions, ImportExportAnalyzer, ImportRecord};
use crate::names::NameManager;
use crate::root::RootTransformer;
use crate::wrap::plan_wrap;
use serde::{Deserialize, Serialize};
use snippet_parser::{parse, JsxRole, ParseOptions, Token, TokenKind};
use source_map::SourceMap;

/// A source transform that can be enabled for a compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    /// Compile JSX elements to function calls.
    Jsx,
    /// Parse TypeScript and remove its type syntax.
    Typescript,
    /// Parse Flow and remove its type syntax.
    Flow,
    /// Rewrite ES module syntax to CommonJS.
    Imports,
    /// Return the value of the last top-level expression.
    WrapLastExpression,
}

/// The JSX runtime to compile against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsxRuntime {
    /// `React.createElement(tag, props, ...children)`
    #[default]
    Classic,
    /// `jsx(tag, { ...props, children }, key)` from `<source>/jsx-runtime`
    Automatic,
    /// Leave JSX in the output.
    Preserve,
}

/// Options for [`compile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub transforms: Vec<Transform>,
    pub jsx_runtime: JsxRuntime,
    /// Use `jsx`/`jsxs` instead of `jsxDEV` and omit source positions.
    pub production: bool,
    /// Module prefix for the automatic runtime (`<source>/jsx-runtime`).
    pub jsx_import_source: String,
    pub jsx_pragma: String,
    pub jsx_fragment_pragma: String,
    /// Keep imports whose bindings are unused or type-only, as bare `require` calls.
    pub keep_unused_imports: bool,
    /// Delete import statements instead of rewriting them.
    pub remove_imports: bool,
    /// Merge JSX props with this function instead of object spread.
    pub object_assign: Option<String>,
    /// File name used in the source map and in development JSX positions.
    pub file_path: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            transforms: vec![Transform::Jsx, Transform::Imports, Transform::WrapLastExpression],
            jsx_runtime: JsxRuntime::Classic,
            production: false,
            jsx_import_source: "react".to_string(),
            jsx_pragma: "React.createElement".to_string(),
            jsx_fragment_pragma: "React.Fragment".to_string(),
            keep_unused_imports: false,
            remove_imports: false,
            object_assign: None,
            file_path: None,
        }
    }
}

impl CompileOptions {
    /// Options with exactly these transforms and defaults otherwise.
    pub fn with_transforms(transforms: &[Transform]) -> Self {
        Self {
            transforms: transforms.to_vec(),
            ..Self::default()
        }
    }

    pub fn has(&self, transform: Transform) -> bool {
        self.transforms.contains(&transform)
    }

    /// The module the automatic runtime takes `jsx`/`jsxDEV` from.
    pub(crate) fn automatic_runtime_module(&self) -> String {
        if self.production {
            format!("{}/jsx-runtime", self.jsx_import_source)
        } else {
            format!("{}/jsx-dev-runtime", self.jsx_import_source)
        }
    }

    /// Modules the JSX transform will require for these tokens.
    fn runtime_paths(&self, tokens: &[Token]) -> Vec<String> {
        if !self.has(Transform::Jsx) || self.jsx_runtime != JsxRuntime::Automatic {
            return Vec::new();
        }
        let mut paths = Vec::new();
        let mut tags = tokens.iter().filter(|t| t.kind == TokenKind::JsxTagStart);
        if tags.clone().any(|t| t.jsx_role.is_some_and(|role| role != JsxRole::KeyAfterPropSpread)) {
            paths.push(self.automatic_runtime_module());
        }
        if tags.any(|t| t.jsx_role == Some(JsxRole::KeyAfterPropSpread)) {
            paths.push(self.jsx_import_source.clone());
        }
        paths
    }

    fn parse_options(&self) -> ParseOptions {
        let typescript = self.has(Transform::Typescript);
        ParseOptions {
            // `<T>x` is a type assertion in plain TypeScript.
            jsx: self.has(Transform::Jsx) || !typescript,
            typescript,
            flow: self.has(Transform::Flow),
        }
    }
}

/// The compiled snippet.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    pub code: String,
    /// Every module the code requires, in first-reference order.
    pub imports: Vec<ImportRecord>,
    pub map: SourceMap,
}

/// Compiles a JSX/TypeScript snippet to JavaScript that runs as a function body
/// with `require` and `exports` in scope.
///
/// # Example
///
/// ```
/// use snippet_transformer::{compile, CompileOptions};
///
/// let output = compile("<div />", &CompileOptions::default()).unwrap();
/// assert_eq!(output.code, ";\nreturn (React.createElement('div', null));");
/// ```
pub fn compile(source: &str, options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let span = tracing::debug_span!("compile", len = source.len(), transforms = ?options.transforms);
    let _enter = span.enter();

    let mut stream = parse(source, options.parse_options())?;
    let mut names = NameManager::new(source, &stream.tokens);

    let analyzer = if options.has(Transform::Imports) {
        let implicit_references = match options.jsx_runtime {
            JsxRuntime::Classic if options.has(Transform::Jsx) => [&options.jsx_pragma, &options.jsx_fragment_pragma]
                .into_iter()
                .filter_map(|pragma| pragma.split('.').next())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let analyzer_options = AnalyzerOptions {
            elide_unused: options.has(Transform::Typescript) && !options.keep_unused_imports,
            keep_unused_imports: options.keep_unused_imports,
            implicit_references,
            bound_paths: options.runtime_paths(&stream.tokens),
        };
        let mut analyzer = ImportExportAnalyzer::new(source, &stream, &analyzer_options);
        analyzer.generate(&mut names);
        mark_shadowed_globals(source, &mut stream.tokens, &stream.scopes, &analyzer.replaced_names());
        Some(analyzer)
    } else {
        None
    };

    let wrap = if options.has(Transform::WrapLastExpression) {
        plan_wrap(source, &stream.tokens, &stream.statements)
    } else {
        None
    };

    let transformed = RootTransformer::new(source, &stream, options, names, analyzer, wrap).transform()?;

    let code = format!("{}{}", transformed.prefix, transformed.code);
    let source_name = options.file_path.as_deref().unwrap_or("snippet");
    let mut builder = SourceMap::builder(source_name).include_content(true);
    let shift = transformed.prefix.len();
    for (generated, original) in transformed.mappings {
        builder.add_offsets(generated + shift, original);
    }
    let map = builder.build(source, &code);
    tracing::debug!(
        imports = transformed.imports.len(),
        output_len = code.len(),
        "compiled snippet"
    );

    Ok(CompileOutput {
        code,
        imports: transformed.imports,
        map,
    })
}
