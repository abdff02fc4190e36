//! Token annotation tests: type marking, identifier roles, JSX roles, scopes and
//! statement boundaries.

use pretty_assertions::assert_eq;
use snippet_parser::{
    parse, IdentifierRole, JsxRole, ParseErrorKind, ParseOptions, Scope, StatementKind,
    TokenStream,
};

fn js() -> ParseOptions {
    ParseOptions::default()
}

fn ts() -> ParseOptions {
    ParseOptions {
        jsx: false,
        typescript: true,
        flow: false,
    }
}

fn tsx() -> ParseOptions {
    ParseOptions {
        jsx: true,
        typescript: true,
        flow: false,
    }
}

fn parse_ok(source: &str, options: ParseOptions) -> TokenStream {
    match parse(source, options) {
        Ok(stream) => stream,
        Err(error) => panic!("failed to parse {source:?}: {error} at {}", error.offset()),
    }
}

fn type_texts<'a>(source: &'a str, options: ParseOptions) -> Vec<&'a str> {
    parse_ok(source, options)
        .tokens
        .iter()
        .filter(|t| t.is_type)
        .map(|t| t.text(source))
        .collect()
}

fn roles<'a>(source: &'a str, options: ParseOptions) -> Vec<(&'a str, IdentifierRole)> {
    parse_ok(source, options)
        .tokens
        .iter()
        .filter_map(|t| t.identifier_role.map(|role| (t.text(source), role)))
        .collect()
}

fn statement_kinds(source: &str, options: ParseOptions) -> Vec<StatementKind> {
    parse_ok(source, options)
        .statements
        .iter()
        .map(|s| s.kind)
        .collect()
}

fn jsx_role(source: &str) -> Option<JsxRole> {
    parse_ok(source, js()).tokens[0].jsx_role
}

// ============================================================================
// TYPE CONTEXT
// ============================================================================

#[test]
fn test_variable_annotation_is_type() {
    assert_eq!(type_texts("let x: number = 1;", ts()), vec![":", "number"]);
}

#[test]
fn test_nested_generics_close_separately() {
    assert_eq!(
        type_texts("let m: Map<string, Array<number>> = new Map();", ts()),
        vec![":", "Map", "<", "string", ",", "Array", "<", "number", ">", ">"]
    );
}

#[test]
fn test_as_expressions_are_type() {
    assert_eq!(
        type_texts("const x = y as unknown as T;", ts()),
        vec!["as", "unknown", "as", "T"]
    );
}

#[test]
fn test_generic_call_arguments_are_type() {
    assert_eq!(type_texts("f<string>(x);", ts()), vec!["<", "string", ">"]);
}

#[test]
fn test_comparison_is_not_generic_call() {
    assert_eq!(type_texts("a < b > c;", ts()), Vec::<&str>::new());
}

#[test]
fn test_class_modifiers_and_parameter_properties() {
    assert_eq!(
        type_texts(
            "class A { private x: number = 1; constructor(public y: string) {} }",
            ts()
        ),
        vec!["private", ":", "number", "public", ":", "string"]
    );
}

#[test]
fn test_non_null_assertion() {
    assert_eq!(type_texts("a!.b;", ts()), vec!["!"]);
}

#[test]
fn test_generic_arrow_in_tsx() {
    assert_eq!(
        type_texts("const id = <T,>(x: T) => x;", tsx()),
        vec!["<", "T", ",", ">", ":", "T"]
    );
}

#[test]
fn test_function_overload_is_type_only() {
    let source = "function f(a: string): void;\nfunction f(a) { return a; }";
    assert_eq!(
        statement_kinds(source, ts()),
        vec![StatementKind::TypeOnly, StatementKind::Declaration]
    );
}

#[test]
fn test_type_declarations_are_type_only() {
    let source = "interface A { x: string }\ntype B = A | null;\ndeclare const c: B;\nfoo();";
    assert_eq!(
        statement_kinds(source, ts()),
        vec![
            StatementKind::TypeOnly,
            StatementKind::TypeOnly,
            StatementKind::TypeOnly,
            StatementKind::Expression,
        ]
    );
}

#[test]
fn test_mapped_and_conditional_types() {
    let source = "type M<T> = { readonly [K in keyof T]?: T[K] extends string ? K : never };\nx;";
    assert_eq!(
        statement_kinds(source, ts()),
        vec![StatementKind::TypeOnly, StatementKind::Expression]
    );
}

#[test]
fn test_export_type_is_type_only() {
    assert_eq!(
        statement_kinds("export type { A } from './a';\nexport interface B {}", ts()),
        vec![StatementKind::TypeOnly, StatementKind::TypeOnly]
    );
}

// ============================================================================
// IDENTIFIER ROLES
// ============================================================================

#[test]
fn test_import_bindings_inside_blocks_stay_imports() {
    use IdentifierRole::*;
    let source = "import * as ns from 'm';\nimport { x } from 'n';\n{ ns.f(x); }";
    assert_eq!(
        roles(source, js()),
        vec![
            ("ns", ImportDeclaration),
            ("x", ImportDeclaration),
            ("ns", Access),
            ("x", Access),
        ]
    );
}

#[test]
fn test_import_and_declaration_roles() {
    use IdentifierRole::*;
    let source = "import React, { useState as useS } from 'react';\n\
                  const [a, b] = useS(0);\n\
                  function f(x) { return a + x; }";
    assert_eq!(
        roles(source, js()),
        vec![
            ("React", ImportDeclaration),
            ("useState", ImportAccess),
            ("useS", ImportDeclaration),
            ("a", TopLevelDeclaration),
            ("b", TopLevelDeclaration),
            ("useS", Access),
            ("f", TopLevelDeclaration),
            ("x", FunctionScopedDeclaration),
            ("a", Access),
            ("x", Access),
        ]
    );
}

#[test]
fn test_object_literal_roles() {
    use IdentifierRole::*;
    assert_eq!(
        roles("({ a, b: c, d() {} });", js()),
        vec![("a", ObjectShorthand), ("b", ObjectKey), ("c", Access), ("d", ObjectKey)]
    );
}

#[test]
fn test_block_scoped_declarations() {
    use IdentifierRole::*;
    assert_eq!(
        roles("{ let a = 1; var b = 2; }", js()),
        vec![("a", BlockScopedDeclaration), ("b", FunctionScopedDeclaration)]
    );
}

#[test]
fn test_export_specifier_roles() {
    use IdentifierRole::*;
    assert_eq!(
        roles("const a = 1;\nexport { a as b };", js()),
        vec![("a", TopLevelDeclaration), ("a", ExportAccess)]
    );
}

#[test]
fn test_member_names_are_not_accesses() {
    use IdentifierRole::*;
    assert_eq!(roles("a.default.b;", js()), vec![("a", Access)]);
}

#[test]
fn test_type_import_specifier_is_marked() {
    let source = "import { type B, C } from './c';";
    assert_eq!(type_texts(source, ts()), vec!["type", "B", ","]);
    assert_eq!(statement_kinds(source, ts()), vec![StatementKind::Import]);
}

#[test]
fn test_whole_type_import_is_type_only() {
    assert_eq!(
        statement_kinds("import type { A } from './a';", ts()),
        vec![StatementKind::TypeOnly]
    );
}

// ============================================================================
// JSX
// ============================================================================

#[test]
fn test_jsx_child_shapes() {
    assert_eq!(jsx_role("<div />"), Some(JsxRole::NoChildren));
    assert_eq!(jsx_role("<div>hi</div>"), Some(JsxRole::OneChild));
    assert_eq!(jsx_role("<div>a{b}</div>"), Some(JsxRole::StaticChildren));
    assert_eq!(jsx_role("<div>\n  <span />\n</div>"), Some(JsxRole::OneChild));
    assert_eq!(jsx_role("<div>{/* nothing */}</div>"), Some(JsxRole::NoChildren));
    assert_eq!(jsx_role("<></>"), Some(JsxRole::NoChildren));
}

#[test]
fn test_jsx_key_after_spread() {
    assert_eq!(
        jsx_role(r#"<div {...p} key="k" />"#),
        Some(JsxRole::KeyAfterPropSpread)
    );
    assert_eq!(jsx_role(r#"<div key="k" {...p} />"#), Some(JsxRole::NoChildren));
}

#[test]
fn test_jsx_component_names_are_accesses() {
    use IdentifierRole::*;
    assert_eq!(roles("<Foo.Bar />;", js()), vec![("Foo", Access)]);
    assert_eq!(roles("<foo-bar />;", js()), Vec::new());
    assert_eq!(roles("<Foo x={y} />;", js()), vec![("Foo", Access), ("y", Access)]);
}

#[test]
fn test_jsx_mismatched_closing_tag() {
    let error = parse("<div></span>", js()).unwrap_err();
    assert!(matches!(
        error.kind,
        ParseErrorKind::MismatchedClosingTag { .. }
    ));
    insta::assert_snapshot!(
        error.to_string(),
        @"Expected corresponding JSX closing tag for <div>, found </span>"
    );
}

#[test]
fn test_jsx_disabled_parses_comparison() {
    let options = ParseOptions {
        jsx: false,
        ..ParseOptions::default()
    };
    let stream = parse_ok("a <b> c;", options);
    assert!(stream.tokens.iter().all(|t| t.jsx_role.is_none()));
}

// ============================================================================
// SCOPES AND STATEMENTS
// ============================================================================

#[test]
fn test_arrow_function_scope() {
    use IdentifierRole::*;
    let source = "const f = (a, {b}) => a + b;";
    let stream = parse_ok(source, js());
    assert_eq!(
        stream.scopes,
        vec![
            Scope {
                start_token_index: 3,
                end_token_index: 14,
                is_function_scope: true,
            },
            Scope {
                start_token_index: 0,
                end_token_index: 16,
                is_function_scope: true,
            },
        ]
    );
    assert_eq!(
        roles(source, js()),
        vec![
            ("f", TopLevelDeclaration),
            ("a", FunctionScopedDeclaration),
            ("b", ObjectShorthandFunctionScopedDeclaration),
            ("a", Access),
            ("b", Access),
        ]
    );
}

#[test]
fn test_statement_boundaries() {
    let stream = parse_ok("a = 1;\nb", js());
    let bounds: Vec<_> = stream
        .statements
        .iter()
        .map(|s| (s.kind, s.start, s.end, s.expression_end))
        .collect();
    assert_eq!(
        bounds,
        vec![
            (StatementKind::Expression, 0, 4, 3),
            (StatementKind::Expression, 4, 5, 5),
        ]
    );
}

#[test]
fn test_automatic_semicolon_insertion() {
    assert_eq!(
        statement_kinds("let a = 1\nlet b = 2\nreturn a + b", js()),
        vec![
            StatementKind::Declaration,
            StatementKind::Declaration,
            StatementKind::Return,
        ]
    );
}

#[test]
fn test_rhs_end_index_on_assignment() {
    let stream = parse_ok("const a = b + c, d = 1;", js());
    assert_eq!(stream.tokens[2].rhs_end_index, Some(6));
    assert_eq!(stream.tokens[8].rhs_end_index, Some(10));
}

#[test]
fn test_statement_kinds() {
    use StatementKind::*;
    let source = "import x from 'x';\nexport default 1;\nexport const y = 2;\n;\nif (a) b();";
    assert_eq!(
        statement_kinds(source, js()),
        vec![Import, ExportDefault, Export, Empty, Other]
    );
}

#[test]
fn test_non_declare_namespace_is_unsupported() {
    let error = parse("namespace A { }", ts()).unwrap_err();
    assert_eq!(
        error.kind,
        ParseErrorKind::Unsupported("Non-declare namespace".to_string())
    );
}

#[test]
fn test_import_equals_is_unsupported() {
    let error = parse("import fs = require('fs');", ts()).unwrap_err();
    assert!(matches!(error.kind, ParseErrorKind::Unsupported(_)));
}
