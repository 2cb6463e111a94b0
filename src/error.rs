use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const LEX_UNKNOWN_CHARACTER: &str = "TUI-LEX-001";
pub const LEX_UNTERMINATED_STRING: &str = "TUI-LEX-002";
pub const PARSE_UNEXPECTED_TOKEN: &str = "TUI-PARSE-001";
pub const PARSE_UNEXPECTED_EOF: &str = "TUI-PARSE-002";
pub const PARSE_REFERENCE_NOT_ALLOWED: &str = "TUI-PARSE-003";
pub const PARSE_NESTING_TOO_DEEP: &str = "TUI-PARSE-004";
pub const PARSE_NUMBER_OUT_OF_RANGE: &str = "TUI-PARSE-005";

fn get_hint(code: &str) -> &'static str {
    match code {
        LEX_UNKNOWN_CHARACTER => "Only identifiers, literals and ( ) { } . , are valid here.",
        LEX_UNTERMINATED_STRING => "Close the string literal with a matching quote.",
        PARSE_UNEXPECTED_TOKEN => {
            "Component calls look like `Name(args) { children }.modifier(args)`."
        }
        PARSE_UNEXPECTED_EOF => "A call, argument list or block was left open.",
        PARSE_REFERENCE_NOT_ALLOWED => {
            "Bare references are only accepted in .tachuix files; quote the value instead."
        }
        PARSE_NESTING_TOO_DEEP => "Split deeply nested blocks into separate components.",
        PARSE_NUMBER_OUT_OF_RANGE => "Numeric literals must fit in a 64-bit float.",
        _ => "Unknown diagnostic.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE DIAGNOSTIC
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{code} {file}:{line}:{column}: {message}")]
pub struct ParseDiagnostic {
    pub code: String,
    pub message: String,
    pub hint: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl ParseDiagnostic {
    pub fn new(code: &str, message: &str, file: &str, line: u32, column: u32) -> Self {
        ParseDiagnostic {
            code: code.to_string(),
            message: message.to_string(),
            hint: get_hint(code).to_string(),
            file: file.to_string(),
            line,
            column,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid file pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANALYSIS ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("syntax error in {file}: {message}")]
    Syntax { file: String, message: String },

    #[error("pattern analysis panicked for {file}")]
    Panicked { file: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display_and_hint() {
        let d = ParseDiagnostic::new(PARSE_UNEXPECTED_TOKEN, "expected '('", "app.tachui", 2, 7);
        assert_eq!(d.to_string(), "TUI-PARSE-001 app.tachui:2:7: expected '('");
        assert!(d.hint.contains("Name(args)"));
    }

    #[test]
    fn test_unknown_code_hint() {
        let d = ParseDiagnostic::new("X", "m", "f", 1, 1);
        assert_eq!(d.hint, "Unknown diagnostic.");
    }
}
