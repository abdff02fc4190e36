//! End-to-end compile tests: exact output for each transform and their combinations.

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use snippet_transformer::{compile, CompileError, CompileOptions, JsxRuntime, Transform};

fn compile_ok(source: &str, options: &CompileOptions) -> String {
    match compile(source, options) {
        Ok(output) => output.code,
        Err(error) => panic!("failed to compile {source:?}: {error} at {}", error.offset()),
    }
}

fn compile_default(source: &str) -> String {
    compile_ok(source, &CompileOptions::default())
}

fn compile_with(source: &str, transforms: &[Transform]) -> String {
    compile_ok(source, &CompileOptions::with_transforms(transforms))
}

fn automatic(production: bool) -> CompileOptions {
    CompileOptions {
        transforms: vec![Transform::Jsx],
        jsx_runtime: JsxRuntime::Automatic,
        production,
        ..CompileOptions::default()
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_default_import() {
    assert_snapshot!(compile_default("import Foo from './foo';"), @r###"
    var foo$0 = require('./foo');
    var Foo = foo$0.default || foo$0;
    "###);
}

#[test]
fn test_bare_element_is_returned() {
    assert_eq!(
        compile_default("<div/>"),
        ";\nreturn (React.createElement('div', null));"
    );
}

#[test]
fn test_object_assign_props() {
    let options = CompileOptions {
        object_assign: Some("Object.assign".to_string()),
        ..CompileOptions::default()
    };
    assert_eq!(
        compile_ok("<div a={1} {...props} b={2} />;", &options),
        ";\nreturn (React.createElement('div', Object.assign({}, { a: 1 }, props, { b: 2 })));"
    );
}

#[test]
fn test_top_level_return_disables_wrapping() {
    let source = "return <span />;\n<div />;";
    assert_eq!(compile_with(source, &[Transform::WrapLastExpression]), source);
}

#[test]
fn test_text_and_expression_children() {
    assert_eq!(
        compile_with("<h1>Hello {name}!</h1>", &[Transform::Jsx]),
        "React.createElement('h1', null, \"Hello \", name, \"!\")"
    );
}

// ============================================================================
// IDENTITY
// ============================================================================

#[test]
fn test_untouched_code_is_identical() {
    let source = "#!/usr/bin/env node\nconst a = 1; // one\n/* block */ foo(a, `t${a}`)\n\n";
    assert_eq!(compile_with(source, &[Transform::Imports]), source);
}

#[test]
fn test_preserved_jsx_is_identical() {
    let source = "const el = <div a=\"1\" {...p}>\n  text {x}\n</div>;";
    assert_eq!(compile_with(source, &[Transform::Imports]), source);
}

// ============================================================================
// CLASSIC JSX
// ============================================================================

#[test]
fn test_spread_props() {
    assert_eq!(
        compile_with("<div a={1} {...props} b={2} />", &[Transform::Jsx]),
        "React.createElement('div', { a: 1, ...props, b: 2 })"
    );
}

#[test]
fn test_lone_spread_is_passed_directly() {
    assert_eq!(
        compile_with("<div {...props} />", &[Transform::Jsx]),
        "React.createElement('div', props)"
    );
}

#[test]
fn test_attribute_forms() {
    assert_eq!(
        compile_with(
            "<input aria-label=\"x\" xlink:href='#a' disabled value={v} />",
            &[Transform::Jsx]
        ),
        "React.createElement('input', { 'aria-label': \"x\", 'xlink:href': '#a', disabled: true, value: v })"
    );
}

#[test]
fn test_component_and_member_tags() {
    assert_eq!(
        compile_with("<Foo.Bar><Baz /></Foo.Bar>", &[Transform::Jsx]),
        "React.createElement(Foo.Bar, null, React.createElement(Baz, null))"
    );
}

#[test]
fn test_fragment() {
    assert_eq!(
        compile_with("<>a</>", &[Transform::Jsx]),
        "React.createElement(React.Fragment, null, \"a\")"
    );
}

#[test]
fn test_multiline_children_keep_lines() {
    assert_eq!(
        compile_with("<div>\n  <b />\n  text\n</div>", &[Transform::Jsx]),
        "React.createElement('div', null\n, React.createElement('b', null), \"text\"\n\n)"
    );
}

#[test]
fn test_entities_in_text() {
    assert_eq!(
        compile_with("<p>a &amp; b &#x41;</p>", &[Transform::Jsx]),
        "React.createElement('p', null, \"a & b A\")"
    );
}

#[test]
fn test_empty_expression_child() {
    assert_eq!(
        compile_with("<p>{/* note */}</p>", &[Transform::Jsx]),
        "React.createElement('p', null)"
    );
}

#[test]
fn test_custom_pragma() {
    let options = CompileOptions {
        transforms: vec![Transform::Jsx],
        jsx_pragma: "h".to_string(),
        jsx_fragment_pragma: "Fragment".to_string(),
        ..CompileOptions::default()
    };
    assert_eq!(compile_ok("<><i /></>", &options), "h(Fragment, null, h('i', null))");
}

// ============================================================================
// AUTOMATIC JSX
// ============================================================================

#[test]
fn test_automatic_single_child() {
    assert_eq!(
        compile_ok("<div className=\"a\">hi</div>", &automatic(true)),
        "var jsxRuntime$0 = require('react/jsx-runtime'); \
         jsxRuntime$0.jsx('div', { className: \"a\", children: \"hi\" })"
    );
}

#[test]
fn test_automatic_static_children() {
    assert_eq!(
        compile_ok("<ul><li /><li /></ul>", &automatic(true)),
        "var jsxRuntime$0 = require('react/jsx-runtime'); \
         jsxRuntime$0.jsxs('ul', { children: [jsxRuntime$0.jsx('li', {}), jsxRuntime$0.jsx('li', {})] })"
    );
}

#[test]
fn test_automatic_last_key_wins() {
    assert_eq!(
        compile_ok("<div key=\"a\" id=\"x\" key={b} />", &automatic(true)),
        "var jsxRuntime$0 = require('react/jsx-runtime'); \
         jsxRuntime$0.jsx('div', { id: \"x\" }, b)"
    );
}

#[test]
fn test_automatic_development_position() {
    let options = CompileOptions {
        file_path: Some("App.tsx".to_string()),
        ..automatic(false)
    };
    assert_eq!(
        compile_ok("<div />", &options),
        "var jsxRuntime$0 = require('react/jsx-dev-runtime'); \
         jsxRuntime$0.jsxDEV('div', {}, void 0, false, \
         { fileName: \"App.tsx\", lineNumber: 1, columnNumber: 1 }, this)"
    );
}

#[test]
fn test_key_after_spread_falls_back_to_create_element() {
    assert_eq!(
        compile_ok("<div {...p} key=\"k\" />", &automatic(true)),
        "var react$0 = require('react'); react$0.createElement('div', { ...p, key: \"k\" })"
    );
}

// ============================================================================
// IMPORTS AND EXPORTS
// ============================================================================

#[test]
fn test_key_after_spread_shares_imported_react() {
    let options = CompileOptions {
        transforms: vec![Transform::Jsx, Transform::Imports],
        ..automatic(true)
    };
    let output = compile("import React from 'react';\n<div {...props} key={1} />", &options).unwrap();
    assert_snapshot!(output.code, @r###"
    var react$0 = require('react');
    var React = react$0.default || react$0;
    react$0.createElement('div', { ...props, key: 1 })
    "###);
    let sources: Vec<_> = output.imports.iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["react"]);
}

#[test]
fn test_named_import_in_component_tag() {
    assert_eq!(
        compile_default("import { Button } from './ui';\n<Button onClick={go} />"),
        "var ui$0 = require('./ui');\nreturn (React.createElement(ui$0.Button, { onClick: go }));"
    );
}

#[test]
fn test_imported_function_call_drops_this() {
    assert_eq!(
        compile_default("import { f } from 'lib';\nf(1);"),
        "var lib$0 = require('lib');\nreturn ((0, lib$0.f)(1));"
    );
}

#[test]
fn test_imported_tag_function_drops_this() {
    assert_snapshot!(compile_default("import { a } from 'lib';\na`t`;"), @r###"
    var lib$0 = require('lib');
    return ((0, lib$0.a)`t`);
    "###);
}

#[test]
fn test_imported_optional_call_drops_this() {
    assert_snapshot!(compile_default("import { f } from 'lib';\nf?.(1);"), @r###"
    var lib$0 = require('lib');
    return ((0, lib$0.f)?.(1));
    "###);
}

#[test]
fn test_scaffold_emitted_once_per_path() {
    assert_eq!(
        compile_default("import a from './m';\nimport { b } from './m';\nb(a);"),
        "var m$0 = require('./m');\nvar a = m$0.default || m$0;\n\nreturn ((0, m$0.b)(a));"
    );
}

#[test]
fn test_shadowed_import_is_not_rewritten() {
    assert_eq!(
        compile_default("import { a } from 'm';\nfunction g(a) { return a; }\na;"),
        "var m$0 = require('m');\nfunction g(a) { return a; }\n;\nreturn (m$0.a);"
    );
}

#[test]
fn test_object_shorthand_of_import() {
    assert_eq!(
        compile_with("import { a } from 'm';\nx = { a };", &[Transform::Imports]),
        "var m$0 = require('m');\nx = { a: m$0.a };"
    );
}

#[test]
fn test_remove_imports() {
    let options = CompileOptions {
        remove_imports: true,
        ..CompileOptions::with_transforms(&[Transform::Imports])
    };
    assert_eq!(
        compile_ok("import { a } from 'm';\na();", &options),
        "\na();"
    );
}

#[test]
fn test_local_exports() {
    assert_eq!(
        compile_default("export const a = 1;\nexport function f() {}\nexport { a as b };"),
        "Object.defineProperty(exports, '__esModule', { value: true }); \
         const a = 1; exports.a = a;\nfunction f() {} exports.f = f;\nexports.b = a;"
    );
}

#[test]
fn test_export_default_expression() {
    assert_eq!(
        compile_default("export default 42;"),
        "Object.defineProperty(exports, '__esModule', { value: true }); exports.default = 42;"
    );
}

#[test]
fn test_export_default_named_function() {
    assert_eq!(
        compile_default("export default function App() {}"),
        "Object.defineProperty(exports, '__esModule', { value: true }); \
         function App() {} exports.default = App;"
    );
}

#[test]
fn test_star_reexport_uses_helper() {
    let code = compile_default("export * from './y';");
    assert!(code.starts_with("Object.defineProperty(exports, '__esModule', { value: true }); function exportStar$0("));
    assert!(code.ends_with("var y$0 = require('./y');\nexportStar$0(exports, y$0, []);"));
}

#[test]
fn test_assignment_to_exports_disables_wrapping() {
    assert_eq!(compile_default("exports.a = 1;\na;"), "exports.a = 1;\na;");
}

// ============================================================================
// TYPESCRIPT
// ============================================================================

#[test]
fn test_type_syntax_is_removed() {
    let source = "let x: number = 1;\n\
                  function f(a: string, b: number): void {}\n\
                  interface I { a: string }\n\
                  type T = string;\n\
                  const g = (a: number): number => a;";
    assert_eq!(
        compile_with(source, &[Transform::Typescript]),
        "let x = 1;\nfunction f(a, b) {}\n\n\nconst g = (a) => a;"
    );
}

#[test]
fn test_enum() {
    assert_eq!(
        compile_with("enum Color { Red, Green = 5, Blue }", &[Transform::Typescript]),
        "var Color; (function (Color) { const Red = 0; Color[Color[\"Red\"] = Red] = \"Red\"; \
         const Green = 5; Color[Color[\"Green\"] = Green] = \"Green\"; \
         const Blue = Green + 1; Color[Color[\"Blue\"] = Blue] = \"Blue\"; })(Color || (Color = {}));"
    );
}

#[test]
fn test_string_enum() {
    assert_eq!(
        compile_with("enum S { A = \"a\" }", &[Transform::Typescript]),
        "var S; (function (S) { const A = \"a\"; S[\"A\"] = A; })(S || (S = {}));"
    );
}

#[test]
fn test_unused_and_type_imports_are_elided() {
    assert_eq!(
        compile_with(
            "import { A, b } from './x';\nlet v: A = b;",
            &[Transform::Typescript, Transform::Imports]
        ),
        "var x$0 = require('./x');\nlet v = x$0.b;"
    );
}

#[test]
fn test_import_type_is_removed() {
    assert_eq!(
        compile_with(
            "import type { T } from './t';\nconst x = 1;",
            &[Transform::Typescript, Transform::Imports]
        ),
        "\nconst x = 1;"
    );
}

// ============================================================================
// OUTPUT
// ============================================================================

#[test]
fn test_import_records() {
    let output = compile("import R, { useState } from 'react';\n<R />", &CompileOptions::default()).unwrap();
    let records: Vec<_> = output
        .imports
        .iter()
        .map(|r| (r.source.as_str(), r.base.as_str(), r.keys.len()))
        .collect();
    assert_eq!(records, vec![("react", "react$0", 2)]);
}

#[test]
fn test_source_map_points_at_original_tokens() {
    let output = compile("let a = 1;\nfoo(a)", &CompileOptions::default()).unwrap();
    assert_eq!(output.code, "let a = 1;\nreturn (foo(a));");
    assert_eq!(output.map.sources, vec!["snippet".to_string()]);
    let position = output.map.original_position_for(1, 8).unwrap().unwrap();
    assert_eq!((position.line, position.column), (1, 0));
}

#[test]
fn test_return_maps_to_wrapped_expression() {
    let output = compile("const a = 1;\nboom(a);", &CompileOptions::default()).unwrap();
    assert_snapshot!(output.code, @r###"
    const a = 1;
    return (boom(a));
    "###);
    for column in [0, 8] {
        let position = output.map.original_position_for(1, column).unwrap().unwrap();
        assert_eq!((position.line, position.column), (1, 0));
    }

    let output = compile("boom()", &CompileOptions::default()).unwrap();
    assert_eq!(output.code, ";\nreturn (boom());");
    let position = output.map.original_position_for(1, 0).unwrap().unwrap();
    assert_eq!((position.line, position.column), (0, 0));
}

/// Mapped segments, read in generated order, never point backwards in the source.
fn assert_mappings_follow_source(source: &str, options: &CompileOptions) {
    let output = compile(source, options).unwrap();
    let mappings = output.map.decode().unwrap();
    let line_count = source.lines().count() as u32;
    let mut previous: Option<(u32, u32)> = None;
    let mut mapped = 0;
    for (generated_line, line) in mappings.lines().iter().enumerate() {
        for pair in line.windows(2) {
            assert!(pair[0].gen_column < pair[1].gen_column, "line {generated_line} of {:?}", output.code);
        }
        for segment in line {
            let Some(original) = segment.source else { continue };
            let position = (original.line, original.column);
            assert!(original.line < line_count, "{position:?} is outside {source:?}");
            if let Some(previous) = previous {
                assert!(
                    previous <= position,
                    "{previous:?} then {position:?} on generated line {generated_line} of {:?}",
                    output.code
                );
            }
            previous = Some(position);
            mapped += 1;
        }
    }
    assert!(mapped > 0, "no mapped segments for {source:?}");
}

#[test]
fn test_source_map_is_monotonic() {
    let typescript = CompileOptions::with_transforms(&[
        Transform::Typescript,
        Transform::Jsx,
        Transform::Imports,
        Transform::WrapLastExpression,
    ]);
    let development = CompileOptions {
        file_path: Some("List.tsx".to_string()),
        ..automatic(false)
    };
    let cases: [(&str, &CompileOptions); 5] = [
        (
            "import { Row } from './row';\nconst list = <ul\n  className=\"a\">\n  {items.map(i => <Row key={i} />)}\n</ul>;\nlist",
            &CompileOptions::default(),
        ),
        (
            "<ul key=\"a\"\n  id={x}>\n  <li>{x}</li>\n  <li />\n</ul>",
            &automatic(true),
        ),
        ("<ul\n  key={k}>\n  {x}\n</ul>", &development),
        (
            "enum Color {\n  Red,\n  Green = 5\n}\ntype T = { a: string };\ninterface I {\n  b: T\n}\nlet c: Color = Color.Red;\n<b>{c}</b>",
            &typescript,
        ),
        (
            "export * from './y';\nimport a from './a';\nconst b = a;\nb",
            &CompileOptions::default(),
        ),
    ];
    for (source, options) in cases {
        assert_mappings_follow_source(source, options);
    }
}

#[test]
fn test_source_map_segments_are_ordered() {
    let source = "import { x } from 'm';\nconst el = <div a={x}>\n  {x}\n</div>;\nel";
    let output = compile(source, &CompileOptions::default()).unwrap();
    let mappings = output.map.decode().unwrap();
    for line in mappings.lines() {
        for pair in line.windows(2) {
            assert!(pair[0].gen_column < pair[1].gen_column);
        }
    }
    assert!(mappings.lines().iter().flatten().any(|s| s.source.is_some()));
}

#[test]
fn test_syntax_error_is_reported() {
    let error = compile("let = 1;", &CompileOptions::default()).unwrap_err();
    assert!(matches!(error, CompileError::Syntax(_)));
    assert_eq!(error.offset(), 4);
}

#[test]
fn test_options_deserialize_from_camel_case() {
    let options: CompileOptions = serde_json::from_str(
        r#"{ "transforms": ["jsx", "typescript", "wrapLastExpression"], "jsxRuntime": "automatic", "keepUnusedImports": true }"#,
    )
    .unwrap();
    assert_eq!(
        options.transforms,
        vec![Transform::Jsx, Transform::Typescript, Transform::WrapLastExpression]
    );
    assert_eq!(options.jsx_runtime, JsxRuntime::Automatic);
    assert!(options.keep_unused_imports);
    assert_eq!(options.jsx_pragma, "React.createElement");
}
