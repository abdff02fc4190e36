//! Diagnostic types.

use crate::execution::{ModuleNotFound, RunFailure};
use crate::thrown::{Location, ThrownError};
use miette::{LabeledSpan, NamedSource, SourceCode};
use serde::Serialize;
use snippet_transformer::CompileError;
use source_map::{LineCol, LineIndex, Span};
use std::fmt;

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The diagnostic code.
    pub code: DiagnosticCode,
    /// The severity level.
    pub severity: Severity,
    /// The diagnostic message.
    pub message: String,
    /// Byte range in the snippet, when the problem could be located.
    #[serde(skip)]
    pub span: Option<Span>,
    /// 1-based line, 0-based column in the snippet.
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span: None,
            location: None,
        }
    }

    /// Points the diagnostic at `span`, deriving its location from `source`.
    pub fn with_span(mut self, source: &str, span: Span) -> Self {
        self.location = LineIndex::new(source)
            .line_col(source, span.start)
            .map(|lc| Location {
                line: lc.line + 1,
                column: lc.col,
            });
        self.span = Some(span);
        self
    }

    /// Points the diagnostic at `location`, covering the word that starts there.
    pub fn with_location(mut self, source: &str, location: Location) -> Self {
        let line_col = LineCol::new(location.line.saturating_sub(1), location.column);
        self.span = LineIndex::new(source)
            .offset(source, line_col)
            .and_then(|start| {
                let start = u32::from(start) as usize;
                let rest = source.get(start..)?;
                let word = rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                    .unwrap_or(rest.len());
                Some(Span::from_usize(start, start + word))
            });
        self.location = Some(location);
        self
    }

    /// A compile error, located at its span.
    pub fn from_compile_error(source: &str, error: &CompileError) -> Self {
        let code = match error {
            CompileError::Syntax(_) => DiagnosticCode::SyntaxError,
            CompileError::Invariant { .. } => DiagnosticCode::TransformError,
        };
        Self::new(code, error.to_string()).with_span(source, error.span())
    }

    /// An error thrown at runtime, located if the resolver found its position.
    pub fn from_thrown(source: &str, error: &ThrownError) -> Self {
        let message = if error.name.is_empty() {
            error.message.clone()
        } else {
            format!("{}: {}", error.name, error.message)
        };
        let diagnostic = Self::new(DiagnosticCode::RuntimeError, message);
        match error.location {
            Some(location) => diagnostic.with_location(source, location),
            None => diagnostic,
        }
    }

    pub fn from_run_failure(source: &str, failure: &RunFailure) -> Self {
        match failure {
            RunFailure::ModuleNotFound(missing, error) => Self {
                code: DiagnosticCode::ModuleNotFound,
                severity: DiagnosticCode::ModuleNotFound.default_severity(),
                message: missing.to_string(),
                ..Self::from_thrown(source, error)
            },
            RunFailure::Thrown(error) => Self::from_thrown(source, error),
        }
    }

    /// A module the compiled code requires but nothing provides.
    pub fn unresolved_import(missing: &ModuleNotFound) -> Self {
        Self::new(DiagnosticCode::UnresolvedImport, missing.to_string())
    }

    /// Wraps the diagnostic with its snippet for rendering by `miette`.
    pub fn into_report(self, name: impl AsRef<str>, source: impl Into<String>) -> SnippetReport {
        SnippetReport {
            diagnostic: self,
            source: NamedSource::new(name, source.into()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{location}: {}: {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but the snippet still compiles and runs.
    Warning,
    /// The snippet produced no code or failed at runtime.
    Error,
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// `syntax-error`
    SyntaxError,
    /// `transform-error`
    TransformError,
    /// `runtime-error`
    RuntimeError,
    /// `module-not-found`: `require` of a path the import map lacks
    ModuleNotFound,
    /// `unresolved-import`: found before running
    UnresolvedImport,
}

impl DiagnosticCode {
    /// Returns the default severity for this diagnostic code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnresolvedImport => Severity::Warning,
            DiagnosticCode::SyntaxError
            | DiagnosticCode::TransformError
            | DiagnosticCode::RuntimeError
            | DiagnosticCode::ModuleNotFound => Severity::Error,
        }
    }

    /// Returns the diagnostic code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::SyntaxError => "syntax-error",
            DiagnosticCode::TransformError => "transform-error",
            DiagnosticCode::RuntimeError => "runtime-error",
            DiagnosticCode::ModuleNotFound => "module-not-found",
            DiagnosticCode::UnresolvedImport => "unresolved-import",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A [`Diagnostic`] together with the snippet it points into.
#[derive(Debug)]
pub struct SnippetReport {
    diagnostic: Diagnostic,
    source: NamedSource<String>,
}

impl SnippetReport {
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }
}

impl fmt::Display for SnippetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic.message)
    }
}

impl std::error::Error for SnippetReport {}

impl miette::Diagnostic for SnippetReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.diagnostic.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.severity {
            Severity::Warning => miette::Severity::Warning,
            Severity::Error => miette::Severity::Error,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.diagnostic.span.map(|_| &self.source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.diagnostic.span?;
        let label = match self.diagnostic.code {
            DiagnosticCode::SyntaxError | DiagnosticCode::TransformError => "here",
            _ => "thrown here",
        };
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label.to_string()),
            (span.start_usize(), span.end_usize() - span.start_usize()),
        ))))
    }
}
