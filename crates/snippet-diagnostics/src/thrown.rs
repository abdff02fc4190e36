//! Values thrown by executed snippet code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the original snippet: 1-based line, 0-based UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An error thrown while the generated code ran.
///
/// `line_number`/`column_number` are the engine's own position fields, when it
/// provides them. `location` is filled in by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrownError {
    pub name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ThrownError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), &self.location) {
            (true, None) => write!(f, "{}", self.message),
            (true, Some(location)) => write!(f, "{} ({location})", self.message),
            (false, None) => write!(f, "{}: {}", self.name, self.message),
            (false, Some(location)) => write!(f, "{}: {} ({location})", self.name, self.message),
        }
    }
}

impl std::error::Error for ThrownError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_worker_error() {
        let json = r#"{"name":"TypeError","message":"x is not a function","stack":"TypeError: x\n    at eval (eval at run (worker.mjs:10:3), <anonymous>:3:1)","lineNumber":3}"#;
        let error: ThrownError = serde_json::from_str(json).unwrap();
        assert_eq!(error.name, "TypeError");
        assert_eq!(error.line_number, Some(3));
        assert_eq!(error.column_number, None);
        assert!(error.location.is_none());
    }

    #[test]
    fn test_display() {
        let mut error = ThrownError::new("ReferenceError", "foo is not defined");
        assert_eq!(error.to_string(), "ReferenceError: foo is not defined");
        error.location = Some(Location { line: 2, column: 4 });
        assert_eq!(error.to_string(), "ReferenceError: foo is not defined (2:4)");
        assert_eq!(ThrownError::new("", "boom").to_string(), "boom");
    }
}
