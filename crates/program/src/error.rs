//! Error types and error reporting for program loading.
//!
//! [`LoadError`] covers structural problems that make a program unusable.
//! Problems the loader can recover from are [`crate::ast::LoadWarning`]s
//! instead.
//!
//! # Pretty Printing
//!
//! Use [`ErrorReporter`] to point at the offending spot in malformed JSON,
//! using the [ariadne](https://crates.io/crates/ariadne) crate:
//!
//! ```rust
//! use botmaze_program::{load, ErrorReporter};
//!
//! let source = "{ \"version\": \"1\", \"actions\": [ }";
//! let error = load(source).unwrap_err();
//! let reporter = ErrorReporter::new("level.json", source);
//! // reporter.report_load_error(&error)?; // Prints a colorful report
//! ```

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Structural errors that stop a program from loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The input is not valid JSON.
    #[error("invalid JSON at line {line}, column {column}: {message}")]
    Json {
        message: String,
        line: usize,
        column: usize,
    },

    /// The top-level value is not an object.
    #[error("program must be a JSON object")]
    NotAnObject,

    /// A required top-level field is absent.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A top-level field has the wrong JSON type.
    #[error("field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// An entry of the `functions` list cannot be registered.
    #[error("function #{index} {reason}")]
    InvalidFunction { index: usize, reason: String },

    /// Static `repeat` blocks unroll into too many actions.
    #[error("repeat blocks expand to more than {limit} actions")]
    ExpansionLimit { limit: usize },
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Error reporter that uses ariadne for pretty error output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
}

impl<'src> ErrorReporter<'src> {
    /// Create a new error reporter.
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
        }
    }

    /// Report a load error to stderr.
    ///
    /// JSON syntax errors are labelled at their position in the source;
    /// structural errors are labelled at the start of the document.
    pub fn report_load_error(&self, error: &LoadError) -> std::io::Result<()> {
        let offset = match error {
            LoadError::Json { line, column, .. } => byte_offset(self.source, *line, *column),
            _ => 0,
        };
        let span = offset..(offset + 1).min(self.source.len()).max(offset);

        let label_message = match error {
            LoadError::Json { .. } => "here",
            _ => "in this program",
        };

        let mut report = Report::build(ReportKind::Error, &self.source_name, offset)
            .with_message(error.to_string())
            .with_label(
                Label::new((&self.source_name, span))
                    .with_color(Color::Red)
                    .with_message(label_message),
            );

        if let LoadError::MissingField { field } = error {
            report = report.with_help(format!("add a top-level \"{}\" field", field));
        }

        report
            .finish()
            .eprint((&self.source_name, Source::from(self.source)))
    }
}

/// Convert a 1-based line/column pair into a byte offset into `source`.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
