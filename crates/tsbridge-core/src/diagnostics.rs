//! Compiler diagnostics and the reporting layer.
//!
//! A [`Diagnostic`] is one compiler-reported condition: a severity, a
//! (possibly chained) message, and an optional source location given as a
//! file plus a 0-based character offset. Diagnostics are ephemeral; they are
//! reported once and discarded.
//!
//! Reporting has two backends behind one entry point, [`report`]:
//!
//! - **Live sink**: during a per-file transform the host supplies a
//!   [`DiagnosticSink`]. Errors go to the sink's error channel and abort the
//!   current file; warnings go to the warn channel; everything else is
//!   dropped.
//! - **Capture and throw**: with no sink (diagnostics arising before any
//!   per-file context exists, e.g. during configuration loading), the first
//!   diagnostic is turned into a structured [`DiagnosticError`] carrying a
//!   terminal-friendly code frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Join token between chained diagnostic messages.
const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Aborts the current file's transform when reported through a sink.
    Error,
    /// Advisory only.
    Warning,
    /// Editor-oriented suggestion; never forwarded.
    Suggestion,
    /// Informational message; never forwarded.
    Message,
}

impl DiagnosticSeverity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

/// A compiler-reported condition with an optional source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: DiagnosticSeverity,
    /// Numeric compiler code (e.g. 2322), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    /// Message chain; the first entry is the primary message. Never empty.
    pub messages: Vec<String>,
    /// Source file the diagnostic points into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 0-based character offset into the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
}

impl Diagnostic {
    fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            messages: vec![message.into()],
            file: None,
            start: None,
        }
    }

    /// Create a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    /// Create a new suggestion diagnostic.
    #[must_use]
    pub fn suggestion(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Suggestion, message)
    }

    /// Set the numeric compiler code.
    #[must_use]
    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    /// Append a chained message.
    #[must_use]
    pub fn chain(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Set the source location as a file and 0-based character offset.
    #[must_use]
    pub fn at(mut self, file: PathBuf, start: usize) -> Self {
        self.file = Some(file);
        self.start = Some(start);
        self
    }

    /// The primary message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.messages.first().map_or("", String::as_str)
    }

    /// Flatten the message chain into one string, joining chained messages
    /// with the platform line separator.
    #[must_use]
    pub fn flatten_message(&self) -> String {
        self.messages.join(LINE_SEPARATOR)
    }
}

/// A resolved source position: 1-based line, 0-based column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Live reporting channel supplied by the host during a per-file transform.
pub trait DiagnosticSink: Send + Sync {
    /// Report an error. The current file's transform is aborted afterwards.
    fn error(&self, message: &str, location: Option<&SourceLocation>);

    /// Report a warning. Non-aborting.
    fn warn(&self, message: &str, location: Option<&SourceLocation>);
}

/// Structured failure produced when reporting without a live sink, or as the
/// abort signal after forwarding an error through a sink.
#[derive(Debug, Clone, Error)]
#[error("{}", format_failure(.message, .id, .location, .frame))]
pub struct DiagnosticError {
    /// Flattened diagnostic message.
    pub message: String,
    /// The file the diagnostic points into, if any.
    pub id: Option<PathBuf>,
    /// Resolved source position, if derivable.
    pub location: Option<SourceLocation>,
    /// Short excerpt of the offending source line, caret-annotated.
    pub frame: Option<String>,
}

fn format_failure(
    message: &str,
    id: &Option<PathBuf>,
    location: &Option<SourceLocation>,
    frame: &Option<String>,
) -> String {
    let mut out = message.to_string();
    if let Some(loc) = location {
        out.push_str(&format!(" ({loc})"));
    } else if let Some(id) = id {
        out.push_str(&format!(" ({})", id.display()));
    }
    if let Some(frame) = frame {
        out.push('\n');
        out.push_str(frame);
    }
    out
}

/// Convert a 0-based character offset to a 1-based line / 0-based column
/// position within `text`.
///
/// The offset counts characters, not bytes; out-of-range offsets clamp to
/// the end of the text.
#[must_use]
pub fn offset_to_position(text: &str, offset: usize) -> (u32, u32) {
    let mut line: u32 = 1;
    let mut column: u32 = 0;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Render a short, gutter-annotated excerpt of the offending line with a
/// caret under the reported column.
#[must_use]
pub fn render_code_frame(text: &str, location: &SourceLocation) -> String {
    let line_idx = location.line.saturating_sub(1) as usize;
    let Some(line_text) = text.lines().nth(line_idx) else {
        return String::new();
    };

    let gutter = format!("{}", location.line);
    let pad = " ".repeat(gutter.len());
    let caret_pad = " ".repeat(location.column as usize);
    format!("{gutter} | {line_text}\n{pad} | {caret_pad}^")
}

fn locate(diagnostic: &Diagnostic) -> Option<(SourceLocation, String)> {
    let file = diagnostic.file.as_ref()?;
    let start = diagnostic.start?;
    let text = tsbridge_util::read_to_string_lossy(file).ok()?;
    let (line, column) = offset_to_position(&text, start);
    Some((
        SourceLocation {
            file: file.clone(),
            line,
            column,
        },
        text,
    ))
}

/// Report diagnostics through the live sink, or capture-and-throw.
///
/// With a sink: warnings are forwarded to the warn channel, the first error
/// is forwarded to the error channel and returned as the abort signal for
/// the current file; suggestions and messages are dropped.
///
/// Without a sink: the first diagnostic becomes a [`DiagnosticError`]
/// carrying a code frame for terminal display.
///
/// # Errors
///
/// Returns a `DiagnosticError` when an error-severity diagnostic was
/// forwarded (sink present) or when any diagnostic exists (sink absent).
pub fn report(
    diagnostics: &[Diagnostic],
    sink: Option<&dyn DiagnosticSink>,
) -> Result<(), DiagnosticError> {
    let Some(sink) = sink else {
        if let Some(diagnostic) = diagnostics.first() {
            return Err(into_failure(diagnostic));
        }
        return Ok(());
    };

    for diagnostic in diagnostics {
        let message = diagnostic.flatten_message();
        let location = locate(diagnostic).map(|(loc, _)| loc);
        match diagnostic.severity {
            DiagnosticSeverity::Error => {
                sink.error(&message, location.as_ref());
                return Err(DiagnosticError {
                    message,
                    id: diagnostic.file.clone(),
                    location,
                    frame: None,
                });
            }
            DiagnosticSeverity::Warning => sink.warn(&message, location.as_ref()),
            DiagnosticSeverity::Suggestion | DiagnosticSeverity::Message => {}
        }
    }
    Ok(())
}

fn into_failure(diagnostic: &Diagnostic) -> DiagnosticError {
    let located = locate(diagnostic);
    let frame = located
        .as_ref()
        .map(|(loc, text)| render_code_frame(text, loc))
        .filter(|f| !f.is_empty());
    DiagnosticError {
        message: diagnostic.flatten_message(),
        id: diagnostic.file.clone(),
        location: located.map(|(loc, _)| loc),
        frame,
    }
}
