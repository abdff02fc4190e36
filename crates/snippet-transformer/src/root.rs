//! The token walk that drives every transform.
//!
//! [`RootTransformer`] visits the tokens front to back. At each position it hands
//! the token to the first transform that claims it (type removal, JSX, import and
//! export rewriting, enums, import identifier rewriting) and copies it otherwise.
//! Nested code inside JSX expressions, enum initializers and exported declarations
//! goes back through [`RootTransformer::process_token`].

use crate::compile::{CompileOptions, JsxRuntime, Transform};
use crate::error::CompileError;
use crate::imports::{quote, ImportExportAnalyzer, ImportRecord};
use crate::names::NameManager;
use crate::processor::TokenProcessor;
use crate::wrap::WrapPlan;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use snippet_parser::{IdentifierRole, StatementKind, TokenKind as T, TokenStream, TopLevelStatement};
use source_map::LineIndex;

const ES_MODULE_MARKER: &str = "Object.defineProperty(exports, '__esModule', { value: true });";

/// Pragmas for the classic JSX runtime, after import rewriting.
#[derive(Debug, Clone)]
pub(crate) struct JsxSettings {
    pub(crate) pragma: String,
    pub(crate) fragment_pragma: String,
}

/// Output of the token walk, before the prefix is attached.
#[derive(Debug)]
pub(crate) struct Transformed {
    pub(crate) prefix: String,
    pub(crate) code: String,
    pub(crate) mappings: Vec<(usize, usize)>,
    pub(crate) imports: Vec<ImportRecord>,
}

pub(crate) struct RootTransformer<'a> {
    pub(crate) tokens: TokenProcessor<'a>,
    pub(crate) options: &'a CompileOptions,
    pub(crate) names: NameManager,
    pub(crate) analyzer: Option<ImportExportAnalyzer>,
    pub(crate) jsx: Option<JsxSettings>,
    pub(crate) line_index: LineIndex,
    typescript: bool,
    module_statements: FxHashMap<usize, TopLevelStatement>,
    wrap: Option<WrapPlan>,
    wrap_open: bool,
    runtime_imports: IndexMap<String, ImportRecord>,
}

impl<'a> RootTransformer<'a> {
    pub(crate) fn new(
        source: &'a str,
        stream: &'a TokenStream,
        options: &'a CompileOptions,
        names: NameManager,
        analyzer: Option<ImportExportAnalyzer>,
        wrap: Option<WrapPlan>,
    ) -> Self {
        let module_statements = if analyzer.is_some() {
            stream
                .statements
                .iter()
                .filter(|s| {
                    matches!(
                        s.kind,
                        StatementKind::Import | StatementKind::Export | StatementKind::ExportDefault
                    )
                })
                .map(|s| (s.start, *s))
                .collect()
        } else {
            FxHashMap::default()
        };

        let mut transformer = Self {
            tokens: TokenProcessor::new(source, &stream.tokens),
            options,
            names,
            analyzer,
            jsx: None,
            line_index: LineIndex::new(source),
            typescript: options.has(Transform::Typescript),
            module_statements,
            wrap,
            wrap_open: false,
            runtime_imports: IndexMap::new(),
        };
        if options.has(Transform::Jsx) && options.jsx_runtime != JsxRuntime::Preserve {
            transformer.jsx = Some(JsxSettings {
                pragma: transformer.resolve_pragma(&options.jsx_pragma),
                fragment_pragma: transformer.resolve_pragma(&options.jsx_fragment_pragma),
            });
        }
        transformer
    }

    /// Runs the walk to the end and assembles the prefix.
    pub(crate) fn transform(mut self) -> Result<Transformed, CompileError> {
        while !self.tokens.is_at_end() {
            self.process_top_level_token()?;
        }

        let mut prefix_parts = Vec::new();
        let mut imports = Vec::new();
        if let Some(analyzer) = &self.analyzer {
            if analyzer.has_exports() {
                prefix_parts.push(ES_MODULE_MARKER.to_string());
            }
            imports.extend(analyzer.records().cloned());
        }
        prefix_parts.extend(self.runtime_imports.values().map(|r| r.code.clone()));
        if let Some(analyzer) = &self.analyzer {
            prefix_parts.extend(analyzer.helper_definitions());
        }
        for record in self.runtime_imports.into_values() {
            if !imports.iter().any(|r: &ImportRecord| r.source == record.source) {
                imports.push(record);
            }
        }

        let prefix = if prefix_parts.is_empty() {
            String::new()
        } else {
            format!("{} ", prefix_parts.join(" "))
        };
        let processed = self.tokens.finish()?;
        Ok(Transformed {
            prefix,
            code: processed.code,
            mappings: processed.mappings,
            imports,
        })
    }

    fn process_top_level_token(&mut self) -> Result<(), CompileError> {
        if let Some(plan) = self.wrap {
            if self.tokens.current_index() == plan.start {
                self.tokens.prepend_code(plan.separator());
                self.tokens.prepend_mapped_code(plan.opening());
                self.wrap_open = true;
            }
        }

        self.process_token()?;

        if let Some(plan) = self.wrap {
            if self.wrap_open && self.tokens.current_index() >= plan.expression_end {
                self.tokens.append_code(plan.suffix());
                self.wrap = None;
                self.wrap_open = false;
            }
        }
        Ok(())
    }

    /// Emits the current token, or the whole construct it starts.
    pub(crate) fn process_token(&mut self) -> Result<(), CompileError> {
        let token = self.tokens.current_token();
        let index = self.tokens.current_index();

        if token.is_type {
            self.remove_type_range();
            return Ok(());
        }
        if self.process_possible_arrow_param_end() {
            return Ok(());
        }
        match token.kind {
            T::JsxTagStart if self.jsx.is_some() => return self.process_jsx_element(),
            T::Import | T::Export if self.module_statements.contains_key(&index) => {
                return self.process_module_statement(index);
            }
            T::Name | T::Const if self.typescript && self.is_enum_start() => {
                return self.process_enum();
            }
            T::Name | T::JsxName => {
                if self.process_identifier() {
                    return Ok(());
                }
            }
            _ => {}
        }
        self.tokens.copy_token();
        Ok(())
    }

    /// Processes tokens until an unmatched `}` or `)`, which is left current.
    pub(crate) fn process_balanced_code(&mut self) -> Result<(), CompileError> {
        let mut brace_depth = 0usize;
        let mut paren_depth = 0usize;
        while !self.tokens.is_at_end() {
            let token = self.tokens.current_token();
            if !token.is_type {
                match token.kind {
                    T::BraceL | T::DollarBraceL => brace_depth += 1,
                    T::BraceR if brace_depth == 0 => return Ok(()),
                    T::BraceR => brace_depth -= 1,
                    T::ParenL => paren_depth += 1,
                    T::ParenR if paren_depth == 0 => return Ok(()),
                    T::ParenR => paren_depth -= 1,
                    _ => {}
                }
            }
            self.process_token()?;
        }
        Ok(())
    }

    /// Rewrites a reference to a named import as a member of its module object.
    pub(crate) fn process_identifier(&mut self) -> bool {
        if self.options.remove_imports {
            return false;
        }
        let Some(analyzer) = &self.analyzer else {
            return false;
        };
        let token = self.tokens.current_token();
        let role = match token.identifier_role {
            Some(role @ (IdentifierRole::Access | IdentifierRole::ObjectShorthand)) => role,
            _ => return false,
        };
        if token.shadows_global {
            return false;
        }
        let name = self.tokens.current_text();
        let Some(replacement) = analyzer.identifier_replacement(name) else {
            return false;
        };

        let index = self.tokens.current_index();
        let code = if role == IdentifierRole::ObjectShorthand {
            format!("{name}: {replacement}")
        } else if self.is_called_at(index) {
            // Call without binding `this` to the module object.
            format!("(0, {replacement})")
        } else {
            replacement.to_string()
        };
        self.tokens.replace_token(code);
        true
    }

    /// Whether the identifier at `index` is called as a plain function: `f()`,
    /// `f?.()` or a tagged template, but not `new f()`.
    fn is_called_at(&self, index: usize) -> bool {
        let next = index + 1;
        let called = self.tokens.matches_at(next, &[T::ParenL])
            || self.tokens.matches_at(next, &[T::QuestionDot, T::ParenL])
            || self.tokens.matches_at(next, &[T::BackQuote]);
        called && !(index > 0 && self.tokens.matches_at(index - 1, &[T::New]))
    }

    /// The replacement for an identifier that names a named import, if any.
    pub(crate) fn replacement_for(&self, name: &str) -> Option<String> {
        if self.options.remove_imports {
            return None;
        }
        self.analyzer
            .as_ref()?
            .identifier_replacement(name)
            .map(str::to_string)
    }

    /// `React.createElement` with its first segment rewritten if it was imported by name.
    fn resolve_pragma(&self, pragma: &str) -> String {
        let (head, tail) = match pragma.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (pragma, None),
        };
        match (self.replacement_for(head), tail) {
            (Some(replacement), Some(tail)) => format!("{replacement}.{tail}"),
            (Some(replacement), None) => replacement,
            (None, _) => pragma.to_string(),
        }
    }

    /// Registers a `require` of `source` emitted in the prefix and returns its binding.
    pub(crate) fn runtime_import(&mut self, source: &str, base: &str) -> String {
        if let Some(record) = self.runtime_imports.get(source) {
            return record.base.clone();
        }
        if !self.options.remove_imports {
            if let Some(base) = self.analyzer.as_ref().and_then(|a| a.binding_for(source)) {
                tracing::debug!(source, binding = %base, "sharing imported module with JSX runtime");
                return base.to_string();
            }
        }
        let name = self.names.claim_free_name(base);
        tracing::debug!(source, binding = %name, "requiring JSX runtime");
        self.runtime_imports.insert(
            source.to_string(),
            ImportRecord {
                source: source.to_string(),
                base: name.clone(),
                keys: Vec::new(),
                code: format!("var {name} = require({});", quote(source)),
            },
        );
        name
    }

    pub(crate) fn module_statement(&self, index: usize) -> Option<TopLevelStatement> {
        self.module_statements.get(&index).copied()
    }
}
