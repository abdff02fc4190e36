//! Output formatting.

use crate::cli::OutputFormat;
use serde::Serialize;
use serde_json::Value;
use snippet_diagnostics::{Diagnostic, Severity, SnippetReport};
use snippet_transformer::{CompileOutput, ImportRecord};
use source_map::SourceMap;

/// Everything known about one snippet after compiling and, optionally, running it.
#[derive(Debug, Clone)]
pub struct SnippetResult {
    /// Display name: the path relative to the working directory, or `<stdin>`.
    pub name: String,
    pub source: String,
    pub output: Option<CompileOutput>,
    pub diagnostics: Vec<Diagnostic>,
    /// The value the run produced.
    pub value: Option<Value>,
}

impl SnippetResult {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// `miette` reports for every diagnostic, pointing into the snippet.
    pub fn reports(&self) -> Vec<SnippetReport> {
        self.diagnostics
            .iter()
            .cloned()
            .map(|d| d.into_report(&self.name, self.source.clone()))
            .collect()
    }
}

/// Totals over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub snippet_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl Summary {
    pub fn of(results: &[SnippetResult]) -> Self {
        Self {
            snippet_count: results.len(),
            error_count: results.iter().map(SnippetResult::error_count).sum(),
            warning_count: results.iter().map(SnippetResult::warning_count).sum(),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonSnippet<'a> {
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    imports: &'a [ImportRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    map: Option<&'a SourceMap>,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a Value>,
}

/// Formats results for stdout. Diagnostics go to stderr separately.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, results: &[SnippetResult]) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(results),
            OutputFormat::Json => self.format_json(results),
            OutputFormat::Code => self.format_raw(results, |output| output.code.clone()),
            OutputFormat::Map => self.format_raw(results, |output| output.map.to_json()),
        }
    }

    /// Whether diagnostics should also be rendered to stderr.
    pub fn renders_reports(&self) -> bool {
        self.format != OutputFormat::Json
    }

    fn format_human(&self, results: &[SnippetResult]) -> String {
        let mut output = String::new();
        for result in results {
            let Some(compiled) = &result.output else {
                continue;
            };
            output.push_str(&format!("// {}\n{}\n", result.name, compiled.code));
            if let Some(value) = &result.value {
                output.push_str(&format!("// => {value}\n"));
            }
            output.push('\n');
        }

        let summary = Summary::of(results);
        output.push_str(&format!(
            "{} {}, {} {}, {} {}\n",
            summary.snippet_count,
            plural(summary.snippet_count, "snippet"),
            summary.error_count,
            plural(summary.error_count, "error"),
            summary.warning_count,
            plural(summary.warning_count, "warning"),
        ));
        output
    }

    fn format_json(&self, results: &[SnippetResult]) -> String {
        let snippets: Vec<JsonSnippet<'_>> = results
            .iter()
            .map(|result| JsonSnippet {
                file: &result.name,
                code: result.output.as_ref().map(|o| o.code.as_str()),
                imports: result
                    .output
                    .as_ref()
                    .map(|o| o.imports.as_slice())
                    .unwrap_or_default(),
                map: result.output.as_ref().map(|o| &o.map),
                diagnostics: &result.diagnostics,
                value: result.value.as_ref(),
            })
            .collect();
        let mut json = serde_json::to_string_pretty(&snippets).unwrap_or_default();
        json.push('\n');
        json
    }

    /// One artifact per snippet; a `//` header separates snippets when there are several.
    fn format_raw(&self, results: &[SnippetResult], artifact: impl Fn(&CompileOutput) -> String) -> String {
        let many = results.len() > 1;
        let mut output = String::new();
        for result in results {
            let Some(compiled) = &result.output else {
                continue;
            };
            if many {
                output.push_str(&format!("// {}\n", result.name));
            }
            output.push_str(&artifact(compiled));
            output.push('\n');
        }
        output
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use serde_json::json;
    use snippet_diagnostics::{DiagnosticCode, ThrownError};
    use snippet_transformer::{compile, CompileOptions};

    fn compiled(name: &str, source: &str) -> SnippetResult {
        let options = CompileOptions {
            file_path: Some(name.to_string()),
            ..CompileOptions::default()
        };
        match compile(source, &options) {
            Ok(output) => SnippetResult {
                name: name.to_string(),
                source: source.to_string(),
                output: Some(output),
                diagnostics: Vec::new(),
                value: None,
            },
            Err(error) => SnippetResult {
                name: name.to_string(),
                source: source.to_string(),
                output: None,
                diagnostics: vec![Diagnostic::from_compile_error(source, &error)],
                value: None,
            },
        }
    }

    #[test]
    fn test_human_output() {
        let mut ok = compiled("a.jsx", "<div />");
        ok.value = Some(json!({ "type": "div" }));
        let broken = compiled("b.jsx", "<div>");
        let text = Formatter::new(OutputFormat::Human).format(&[ok, broken]);
        assert_snapshot!(text, @r###"
        // a.jsx
        ;
        return (React.createElement('div', null));
        // => {"type":"div"}

        2 snippets, 1 error, 0 warnings
        "###);
    }

    #[test]
    fn test_code_output_single_snippet_has_no_header() {
        let text = Formatter::new(OutputFormat::Code).format(&[compiled("a.jsx", "<br />")]);
        assert_eq!(text, ";\nreturn (React.createElement('br', null));\n");
    }

    #[test]
    fn test_code_output_many_snippets() {
        let text = Formatter::new(OutputFormat::Code)
            .format(&[compiled("a.jsx", "1"), compiled("b.jsx", "2")]);
        assert_snapshot!(text, @r###"
        // a.jsx
        ;
        return (1);
        // b.jsx
        ;
        return (2);
        "###);
    }

    #[test]
    fn test_map_output() {
        let text = Formatter::new(OutputFormat::Map).format(&[compiled("a.jsx", "x")]);
        let map: SourceMap = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["a.jsx".to_string()]);
    }

    #[test]
    fn test_json_output() {
        let mut result = compiled("a.jsx", "boom()");
        result.diagnostics.push(Diagnostic::from_thrown(
            &result.source,
            &ThrownError::new("ReferenceError", "boom is not defined"),
        ));
        let text = Formatter::new(OutputFormat::Json).format(&[result]);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["file"], json!("a.jsx"));
        assert_eq!(value[0]["code"], json!(";\nreturn (boom());"));
        assert_eq!(value[0]["diagnostics"][0]["code"], json!("runtime-error"));
        assert_eq!(value[0]["diagnostics"][0]["severity"], json!("error"));
        assert!(value[0].get("value").is_none());
        assert!(!Formatter::new(OutputFormat::Json).renders_reports());
    }

    #[test]
    fn test_summary_counts() {
        let mut result = compiled("a.jsx", "<div>");
        result.diagnostics.push(Diagnostic::new(DiagnosticCode::UnresolvedImport, "x"));
        assert_eq!(
            Summary::of(&[result]),
            Summary {
                snippet_count: 1,
                error_count: 1,
                warning_count: 1
            }
        );
    }
}
