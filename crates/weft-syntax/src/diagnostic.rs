use codespan_reporting::diagnostic::{Diagnostic as Report, Label, Severity};
use rowan::TextRange;

/// A recoverable problem found while parsing, with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: TextRange,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            range,
        }
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            range,
        }
    }

    /// Convert to a codespan-reporting diagnostic for display.
    pub fn to_report(&self, file_id: usize) -> Report<usize> {
        Report::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, self.range)])
    }
}
