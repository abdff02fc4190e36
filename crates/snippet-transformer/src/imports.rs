//! Import and export analysis.
//!
//! Runs in two passes over the top-level statements. The first pass aggregates
//! every import and re-export of a module path into one [`ImportInfo`]; the second
//! assigns each path a `require` binding and renders its interop scaffold. Rewriting
//! the statements themselves is left to the module transform, which claims each
//! path's scaffold exactly once.

use crate::names::{base_name_for_path, is_identifier, NameManager};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use snippet_parser::{
    ContextualKeyword as Kw, IdentifierRole, Scope, StatementKind, Token, TokenKind as T,
    TokenStream, TopLevelStatement,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImport {
    pub local_name: SmolStr,
    pub imported_name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedExport {
    pub exported_name: SmolStr,
    pub imported_name: SmolStr,
}

/// Everything the snippet imports from or re-exports out of one module path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportInfo {
    pub default_names: Vec<SmolStr>,
    pub wildcard_names: Vec<SmolStr>,
    pub named_imports: Vec<NamedImport>,
    pub named_exports: Vec<NamedExport>,
    pub has_bare_import: bool,
    /// Names bound by `export * as name from '...'`.
    pub export_star_names: Vec<SmolStr>,
    pub has_star_export: bool,
}

impl ImportInfo {
    fn needs_binding(&self) -> bool {
        !self.default_names.is_empty()
            || !self.wildcard_names.is_empty()
            || !self.named_imports.is_empty()
            || !self.named_exports.is_empty()
            || !self.export_star_names.is_empty()
            || self.has_star_export
    }
}

/// One name a compiled snippet takes from a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportKey {
    pub local: String,
    /// The exported name, `default`, or `*` for a namespace import.
    pub imported: String,
}

/// A module the compiled code requires, with the code that requires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub source: String,
    /// The variable holding the module object.
    pub base: String,
    pub keys: Vec<ImportKey>,
    pub code: String,
}

/// What the module transform does with one top-level import or re-export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementPlan {
    /// Replace the statement with the path's scaffold, if not yet claimed.
    Claim(SmolStr),
    /// Drop the statement: every binding it declares is type-only or unused.
    Elide,
}

/// Runtime helpers shared by all scaffolds, declared once before the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    InteropRequireWildcard,
    Reexport,
    ExportStar,
}

impl Helper {
    fn base_name(self) -> &'static str {
        match self {
            Self::InteropRequireWildcard => "interopRequireWildcard",
            Self::Reexport => "reexport",
            Self::ExportStar => "exportStar",
        }
    }

    fn definition(self, name: &str) -> String {
        match self {
            Self::InteropRequireWildcard => format!(
                "function {name}(obj) {{ if (obj && obj.__esModule) {{ return obj; }} \
                 var newObj = {{}}; if (obj != null) {{ for (var key in obj) {{ \
                 if (Object.prototype.hasOwnProperty.call(obj, key)) {{ newObj[key] = obj[key]; }} \
                 }} }} newObj.default = obj; return newObj; }}"
            ),
            Self::Reexport => format!(
                "function {name}(target, name, source, key) {{ Object.defineProperty(target, name, \
                 {{ enumerable: true, get: function () {{ return source[key]; }} }}); }}"
            ),
            Self::ExportStar => format!(
                "function {name}(target, source, skip) {{ Object.keys(source).forEach(function (key) {{ \
                 if (key === 'default' || key === '__esModule' || skip.indexOf(key) !== -1) {{ return; }} \
                 Object.defineProperty(target, key, {{ enumerable: true, \
                 get: function () {{ return source[key]; }} }}); }}); }}"
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Drop import bindings never referenced as values (TypeScript semantics).
    pub elide_unused: bool,
    /// Keep statements whose bindings were all elided, as bare `require` calls.
    pub keep_unused_imports: bool,
    /// Identifiers referenced by generated code, such as the JSX pragma.
    pub implicit_references: Vec<String>,
    /// Paths generated code requires itself. Imports of them always get a binding
    /// so the generated code can share it.
    pub bound_paths: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ImportExportAnalyzer {
    infos: IndexMap<SmolStr, ImportInfo>,
    plans: FxHashMap<usize, StatementPlan>,
    /// Every name the snippet exports itself, skipped by star re-exports.
    exported_names: Vec<SmolStr>,
    has_exports: bool,
    records: IndexMap<SmolStr, ImportRecord>,
    claimed: FxHashSet<SmolStr>,
    identifier_replacements: FxHashMap<SmolStr, String>,
    helpers: IndexMap<Helper, String>,
    bound_paths: FxHashSet<SmolStr>,
}

/// Quotes `value` as a single-quoted JavaScript string.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// `object.name`, or `object['name']` when `name` is not an identifier.
pub fn member(object: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", quote(name))
    }
}

/// The value of a string literal token, without quotes.
fn string_value(text: &str) -> &str {
    text.get(1..text.len().saturating_sub(1)).unwrap_or_default()
}

/// The name written by an identifier or string literal token.
fn name_at<'s>(source: &'s str, tokens: &[Token], index: usize) -> &'s str {
    match tokens.get(index) {
        Some(token) if token.kind == T::String => string_value(token.text(source)),
        Some(token) => token.text(source),
        None => "",
    }
}

/// The module path of an import or re-export statement: the string after `from`,
/// or the only string of a bare import.
fn statement_path<'s>(
    source: &'s str,
    tokens: &[Token],
    statement: &TopLevelStatement,
) -> Option<&'s str> {
    let range = statement.start..statement.end.min(tokens.len());
    let index = range.clone().find(|&i| {
        tokens[i].kind == T::String
            && i > 0
            && (tokens[i - 1].is_contextual(Kw::From) || tokens[i - 1].kind == T::Import)
    })?;
    Some(string_value(tokens[index].text(source)))
}

/// Identifiers referenced in value position.
fn value_references<'s>(source: &'s str, tokens: &[Token]) -> FxHashSet<&'s str> {
    tokens
        .iter()
        .filter(|t| !t.is_type && matches!(t.kind, T::Name | T::JsxName))
        .filter(|t| {
            matches!(
                t.identifier_role,
                Some(IdentifierRole::Access | IdentifierRole::ExportAccess | IdentifierRole::ObjectShorthand)
            )
        })
        .map(|t| t.text(source))
        .collect()
}

impl ImportExportAnalyzer {
    /// Aggregates every top-level import and export of the snippet.
    pub fn new(source: &str, stream: &TokenStream, options: &AnalyzerOptions) -> Self {
        let mut analyzer = Self {
            bound_paths: options.bound_paths.iter().map(SmolStr::new).collect(),
            ..Self::default()
        };
        let mut references = value_references(source, &stream.tokens);
        references.extend(options.implicit_references.iter().map(String::as_str));

        for statement in &stream.statements {
            match statement.kind {
                StatementKind::Import => {
                    analyzer.preprocess_import(source, &stream.tokens, statement, &references, options);
                }
                StatementKind::Export | StatementKind::ExportDefault => {
                    analyzer.preprocess_export(source, &stream.tokens, statement);
                }
                _ => {}
            }
        }
        analyzer
    }

    fn info_mut(&mut self, path: &str) -> &mut ImportInfo {
        self.infos.entry(SmolStr::new(path)).or_default()
    }

    fn preprocess_import(
        &mut self,
        source: &str,
        tokens: &[Token],
        statement: &TopLevelStatement,
        references: &FxHashSet<&str>,
        options: &AnalyzerOptions,
    ) {
        let Some(path) = statement_path(source, tokens, statement) else {
            return;
        };
        let kind_at = |i: usize| tokens.get(i).map(|t| t.kind);
        let mut index = statement.start + 1;

        if kind_at(index) == Some(T::String) {
            self.info_mut(path).has_bare_import = true;
            self.plans
                .insert(statement.start, StatementPlan::Claim(SmolStr::new(path)));
            return;
        }

        let mut had_bindings = false;
        let mut default_names = Vec::new();
        let mut wildcard_names = Vec::new();
        let mut named_imports = Vec::new();

        if kind_at(index) == Some(T::Name) && !tokens[index].is_contextual(Kw::From) {
            had_bindings = true;
            default_names.push(SmolStr::new(tokens[index].text(source)));
            index += 1;
            if kind_at(index) == Some(T::Comma) {
                index += 1;
            }
        }
        if kind_at(index) == Some(T::Star) {
            had_bindings = true;
            // `* as name`
            wildcard_names.push(SmolStr::new(name_at(source, tokens, index + 2)));
            index += 3;
        }
        if kind_at(index) == Some(T::BraceL) {
            index += 1;
            while index < statement.end && kind_at(index) != Some(T::BraceR) {
                if tokens[index].is_type {
                    had_bindings = true;
                    index += 1;
                    continue;
                }
                had_bindings = true;
                let imported = name_at(source, tokens, index);
                index += 1;
                let local = if tokens.get(index).is_some_and(|t| t.is_contextual(Kw::As)) {
                    index += 2;
                    name_at(source, tokens, index - 1)
                } else {
                    imported
                };
                named_imports.push(NamedImport {
                    local_name: SmolStr::new(local),
                    imported_name: SmolStr::new(imported),
                });
                if kind_at(index) == Some(T::Comma) {
                    index += 1;
                }
            }
        }

        let keep = |name: &str| !options.elide_unused || references.contains(name);
        default_names.retain(|name| keep(name));
        wildcard_names.retain(|name| keep(name));
        named_imports.retain(|named| keep(&named.local_name));

        let is_empty = default_names.is_empty() && wildcard_names.is_empty() && named_imports.is_empty();
        if is_empty && had_bindings && !options.keep_unused_imports {
            tracing::debug!(path, "eliding import without value bindings");
            self.plans.insert(statement.start, StatementPlan::Elide);
            return;
        }

        let info = self.info_mut(path);
        info.has_bare_import |= is_empty;
        info.default_names.extend(default_names);
        info.wildcard_names.extend(wildcard_names);
        info.named_imports.extend(named_imports);
        self.plans
            .insert(statement.start, StatementPlan::Claim(SmolStr::new(path)));
    }

    fn preprocess_export(&mut self, source: &str, tokens: &[Token], statement: &TopLevelStatement) {
        if tokens.get(statement.start).map(|t| t.kind) != Some(T::Export) {
            return;
        }
        self.has_exports = true;
        if statement.kind == StatementKind::ExportDefault {
            self.exported_names.push(SmolStr::new("default"));
            return;
        }

        let next = statement.start + 1;
        match tokens.get(next).map(|t| t.kind) {
            Some(T::Star) => {
                let Some(path) = statement_path(source, tokens, statement) else {
                    return;
                };
                if tokens.get(next + 1).is_some_and(|t| t.is_contextual(Kw::As)) {
                    let name = SmolStr::new(name_at(source, tokens, next + 2));
                    self.exported_names.push(name.clone());
                    self.info_mut(path).export_star_names.push(name);
                } else {
                    self.info_mut(path).has_star_export = true;
                }
                self.plans
                    .insert(statement.start, StatementPlan::Claim(SmolStr::new(path)));
            }
            Some(T::BraceL) => {
                let specifiers = export_specifiers(source, tokens, next, statement.end);
                self.exported_names
                    .extend(specifiers.iter().map(|(_, exported)| SmolStr::new(exported)));
                let Some(path) = statement_path(source, tokens, statement) else {
                    return;
                };
                let info = self.info_mut(path);
                for (local, exported) in specifiers {
                    info.named_exports.push(NamedExport {
                        exported_name: SmolStr::new(exported),
                        imported_name: SmolStr::new(local),
                    });
                }
                self.plans
                    .insert(statement.start, StatementPlan::Claim(SmolStr::new(path)));
            }
            _ => {
                let end = tokens[statement.start]
                    .rhs_end_index
                    .unwrap_or(statement.end);
                self.exported_names.extend(
                    declared_names(source, tokens, next, end)
                        .into_iter()
                        .map(SmolStr::new),
                );
            }
        }
    }

    /// Assigns each path its binding and renders the scaffolds.
    pub fn generate(&mut self, names: &mut NameManager) {
        let infos = std::mem::take(&mut self.infos);
        for (path, info) in &infos {
            let base = names.claim_free_name(&base_name_for_path(path));
            let mut lines = Vec::new();
            let mut keys = Vec::new();

            if self.has_binding(path, info) {
                lines.push(format!("var {base} = require({});", quote(path)));
            } else {
                lines.push(format!("require({});", quote(path)));
            }
            for name in &info.default_names {
                lines.push(format!("var {name} = {base}.default || {base};"));
                keys.push(ImportKey {
                    local: name.to_string(),
                    imported: "default".to_string(),
                });
            }
            for name in &info.wildcard_names {
                let helper = self.helper(Helper::InteropRequireWildcard, names);
                lines.push(format!("var {name} = {helper}({base});"));
                keys.push(ImportKey {
                    local: name.to_string(),
                    imported: "*".to_string(),
                });
            }
            for named in &info.named_imports {
                self.identifier_replacements
                    .insert(named.local_name.clone(), member(&base, &named.imported_name));
                keys.push(ImportKey {
                    local: named.local_name.to_string(),
                    imported: named.imported_name.to_string(),
                });
            }
            for export in &info.named_exports {
                let helper = self.helper(Helper::Reexport, names);
                lines.push(format!(
                    "{helper}(exports, {}, {base}, {});",
                    quote(&export.exported_name),
                    quote(&export.imported_name)
                ));
            }
            for name in &info.export_star_names {
                let helper = self.helper(Helper::InteropRequireWildcard, names);
                lines.push(format!("{} = {helper}({base});", member("exports", name)));
            }
            if info.has_star_export {
                let helper = self.helper(Helper::ExportStar, names);
                let skip = self
                    .exported_names
                    .iter()
                    .map(|name| quote(name))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!("{helper}(exports, {base}, [{skip}]);"));
            }

            let code = lines.join("\n");
            tracing::debug!(path = %path, %base, "generated import scaffold");
            self.records.insert(
                path.clone(),
                ImportRecord {
                    source: path.to_string(),
                    base,
                    keys,
                    code,
                },
            );
        }
        self.infos = infos;
    }

    fn has_binding(&self, path: &str, info: &ImportInfo) -> bool {
        info.needs_binding() || self.bound_paths.contains(path)
    }

    /// The variable holding the module object of `path`, if its scaffold declares one.
    pub fn binding_for(&self, path: &str) -> Option<&str> {
        let info = self.infos.get(path)?;
        if !self.has_binding(path, info) {
            return None;
        }
        self.records.get(path).map(|record| record.base.as_str())
    }

    fn helper(&mut self, helper: Helper, names: &mut NameManager) -> String {
        self.helpers
            .entry(helper)
            .or_insert_with(|| names.claim_free_name(helper.base_name()))
            .clone()
    }

    /// The scaffold for `path` the first time it is claimed, then `""`.
    pub fn claim_import_code(&mut self, path: &str) -> String {
        if !self.claimed.insert(SmolStr::new(path)) {
            return String::new();
        }
        self.records
            .get(path)
            .map(|record| record.code.clone())
            .unwrap_or_default()
    }

    pub fn plan(&self, statement_start: usize) -> Option<&StatementPlan> {
        self.plans.get(&statement_start)
    }

    /// The expression replacing references to a named import.
    pub fn identifier_replacement(&self, name: &str) -> Option<&str> {
        self.identifier_replacements.get(name).map(String::as_str)
    }

    /// Local names of named imports, which are rewritten wherever they are not shadowed.
    pub fn replaced_names(&self) -> FxHashSet<SmolStr> {
        self.identifier_replacements.keys().cloned().collect()
    }

    pub fn info(&self, path: &str) -> Option<&ImportInfo> {
        self.infos.get(path)
    }

    pub fn has_exports(&self) -> bool {
        self.has_exports
    }

    /// Helper definitions in first-use order.
    pub fn helper_definitions(&self) -> Vec<String> {
        self.helpers
            .iter()
            .map(|(helper, name)| helper.definition(name))
            .collect()
    }

    /// One record per path, in first-reference order.
    pub fn records(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records.values()
    }
}

/// `(local, exported)` pairs of a `{ a, b as c }` clause starting at `brace`,
/// skipping type-only specifiers.
pub fn export_specifiers<'s>(
    source: &'s str,
    tokens: &[Token],
    brace: usize,
    end: usize,
) -> Vec<(&'s str, &'s str)> {
    let mut specifiers = Vec::new();
    let mut index = brace + 1;
    while index < end && tokens.get(index).is_some_and(|t| t.kind != T::BraceR) {
        if tokens[index].is_type || tokens[index].kind == T::Comma {
            index += 1;
            continue;
        }
        let local = name_at(source, tokens, index);
        index += 1;
        let exported = if tokens.get(index).is_some_and(|t| t.is_contextual(Kw::As)) {
            index += 2;
            name_at(source, tokens, index - 1)
        } else {
            local
        };
        specifiers.push((local, exported));
    }
    specifiers
}

/// Top-level names declared by the tokens in `start..end`.
pub fn declared_names<'s>(source: &'s str, tokens: &[Token], start: usize, end: usize) -> Vec<&'s str> {
    tokens
        .get(start..end.min(tokens.len()))
        .unwrap_or_default()
        .iter()
        .filter(|t| !t.is_type && t.identifier_role.is_some_and(|r| r.is_top_level_declaration()))
        .map(|t| t.text(source))
        .collect()
}

/// Marks every reference to a replaced import name that resolves to a nested
/// declaration of the same name instead.
pub fn mark_shadowed_globals(
    source: &str,
    tokens: &mut [Token],
    scopes: &[Scope],
    globals: &FxHashSet<SmolStr>,
) {
    if globals.is_empty() {
        return;
    }
    for index in 0..tokens.len() {
        let token = tokens[index];
        let Some(role) = token.identifier_role else {
            continue;
        };
        if token.is_type
            || token.kind != T::Name
            || !role.is_declaration()
            || role.is_top_level_declaration()
            || role == IdentifierRole::ImportDeclaration
        {
            continue;
        }
        let name = token.text(source);
        if !globals.contains(name) {
            continue;
        }
        let Some(scope) = innermost_scope(scopes, index, role.is_function_scoped_declaration()) else {
            continue;
        };
        let end = scope.end_token_index.min(tokens.len());
        for other in &mut tokens[scope.start_token_index..end] {
            if matches!(other.kind, T::Name | T::JsxName) && other.text(source) == name {
                other.shadows_global = true;
            }
        }
    }
}

fn innermost_scope(scopes: &[Scope], index: usize, function_only: bool) -> Option<Scope> {
    scopes
        .iter()
        .filter(|s| s.start_token_index <= index && index < s.end_token_index)
        .filter(|s| !function_only || s.is_function_scope)
        .min_by_key(|s| s.end_token_index - s.start_token_index)
        .copied()
}
