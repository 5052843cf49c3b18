use std::fmt;

use super::code::ErrorCode;
use crate::core::Span;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with location and context.
///
/// Every compile-time failure surfaces as one of these: a code, a message,
/// and a span pointing at the offending token (or [`Span::DUMMY`] when no
/// source text was involved).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    severity: Severity,
    code: ErrorCode,
    message: String,
    span: Span,
    label: Option<String>,
    notes: Vec<String>,
}

impl Diagnostic {
    /// Start building an error diagnostic.
    pub fn error(code: ErrorCode, span: Span) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Error, code, span)
    }

    /// Start building a warning diagnostic.
    pub fn warning(code: ErrorCode, span: Span) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Warning, code, span)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", kind, self.code.as_str(), self.message)?;
        if !self.span.is_empty() {
            write!(
                f,
                " at {}..{}",
                self.span.start().offset(),
                self.span.end().offset()
            )?;
        }
        if let Some(label) = &self.label {
            write!(f, " ({})", label)?;
        }
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Builder for constructing diagnostics.
pub struct DiagnosticBuilder {
    severity: Severity,
    code: ErrorCode,
    span: Span,
    message: Option<String>,
    label: Option<String>,
    notes: Vec<String>,
}

impl DiagnosticBuilder {
    fn new(severity: Severity, code: ErrorCode, span: Span) -> Self {
        Self {
            severity,
            code,
            span,
            message: None,
            label: None,
            notes: Vec::new(),
        }
    }

    /// Set the main message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the primary label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Build the diagnostic.
    pub fn build(self) -> Diagnostic {
        Diagnostic {
            severity: self.severity,
            code: self.code,
            message: self
                .message
                .unwrap_or_else(|| self.code.message().to_string()),
            span: self.span,
            label: self.label,
            notes: self.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Pos;

    #[test]
    fn builder_basic() {
        let span = Span::new(Pos::new(10), Pos::new(15));
        let diag = Diagnostic::error(ErrorCode::E100, span)
            .message("custom message")
            .build();

        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.code(), ErrorCode::E100);
        assert_eq!(diag.message(), "custom message");
        assert_eq!(diag.span(), span);
    }

    #[test]
    fn builder_default_message() {
        let span = Span::new(Pos::new(0), Pos::new(5));
        let diag = Diagnostic::error(ErrorCode::E100, span).build();

        assert_eq!(diag.message(), "unknown word");
    }

    #[test]
    fn builder_with_label() {
        let span = Span::new(Pos::new(0), Pos::new(5));
        let diag = Diagnostic::error(ErrorCode::E101, span)
            .label("IF without THEN")
            .build();

        assert_eq!(diag.label(), Some("IF without THEN"));
    }

    #[test]
    fn builder_with_notes() {
        let span = Span::new(Pos::new(0), Pos::new(5));
        let diag = Diagnostic::error(ErrorCode::E201, span)
            .note("declared (0->1, peak 1)")
            .note("computed (1->1, peak 1)")
            .build();

        assert_eq!(diag.notes().len(), 2);
        assert_eq!(diag.notes()[0], "declared (0->1, peak 1)");
    }

    #[test]
    fn display_includes_code_and_span() {
        let span = Span::new(Pos::new(4), Pos::new(7));
        let diag = Diagnostic::error(ErrorCode::E100, span)
            .label("nothing named `FOO`")
            .build();
        let text = diag.to_string();
        assert!(text.contains("E100"));
        assert!(text.contains("4..7"));
        assert!(text.contains("FOO"));
    }

    #[test]
    fn warning_severity() {
        let diag = Diagnostic::warning(ErrorCode::E101, Span::DUMMY).build();
        assert_eq!(diag.severity(), Severity::Warning);
    }
}
