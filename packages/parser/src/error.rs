use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::Document;

/// Byte range into the converted source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn offset(self, by: usize) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
        }
    }
}

impl From<std::ops::Range<usize>> for SourceSpan {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Malformed or unsupported input met during conversion. Conversion never
/// fails: these are collected next to the tree and the offending segment is
/// kept as plain text.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversionError {
    #[error("Unknown element <{tag}> at {span:?}, kept as plain text")]
    UnknownElement { tag: String, span: SourceSpan },

    #[error("Unknown inline element <{tag}> at {span:?}, content kept")]
    UnknownInline { tag: String, span: SourceSpan },

    #[error("Dropped <{tag}> element at {span:?}")]
    DroppedElement { tag: String, span: SourceSpan },

    #[error("Stray closing tag </{tag}> at {span:?}")]
    StrayCloseTag { tag: String, span: SourceSpan },

    #[error("Element <{tag}> at {span:?} was never closed")]
    UnclosedElement { tag: String, span: SourceSpan },

    #[error("Malformed markup at {span:?}: {message}")]
    Malformed { message: String, span: SourceSpan },

    #[error("Duplicate comment anchor '{id}' at {span:?}, unwrapped")]
    DuplicateAnchor { id: String, span: SourceSpan },
}

impl ConversionError {
    pub fn span(&self) -> SourceSpan {
        match self {
            ConversionError::UnknownElement { span, .. }
            | ConversionError::UnknownInline { span, .. }
            | ConversionError::DroppedElement { span, .. }
            | ConversionError::StrayCloseTag { span, .. }
            | ConversionError::UnclosedElement { span, .. }
            | ConversionError::Malformed { span, .. }
            | ConversionError::DuplicateAnchor { span, .. } => *span,
        }
    }

    pub(crate) fn shifted(self, by: usize) -> Self {
        match self {
            ConversionError::UnknownElement { tag, span } => ConversionError::UnknownElement {
                tag,
                span: span.offset(by),
            },
            ConversionError::UnknownInline { tag, span } => ConversionError::UnknownInline {
                tag,
                span: span.offset(by),
            },
            ConversionError::DroppedElement { tag, span } => ConversionError::DroppedElement {
                tag,
                span: span.offset(by),
            },
            ConversionError::StrayCloseTag { tag, span } => ConversionError::StrayCloseTag {
                tag,
                span: span.offset(by),
            },
            ConversionError::UnclosedElement { tag, span } => ConversionError::UnclosedElement {
                tag,
                span: span.offset(by),
            },
            ConversionError::Malformed { message, span } => ConversionError::Malformed {
                message,
                span: span.offset(by),
            },
            ConversionError::DuplicateAnchor { id, span } => ConversionError::DuplicateAnchor {
                id,
                span: span.offset(by),
            },
        }
    }

    pub fn label(&self) -> String {
        match self {
            ConversionError::UnknownElement { .. } => "not a supported element".to_string(),
            ConversionError::UnknownInline { .. } => "formatting ignored".to_string(),
            ConversionError::DroppedElement { .. } => "removed from the document".to_string(),
            ConversionError::StrayCloseTag { .. } => "no matching open tag".to_string(),
            ConversionError::UnclosedElement { .. } => "closed at end of input".to_string(),
            ConversionError::Malformed { message, .. } => message.clone(),
            ConversionError::DuplicateAnchor { .. } => "id already used".to_string(),
        }
    }
}

/// Converted tree plus whatever had to be recovered along the way
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<ConversionError>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Pretty-print diagnostics with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_diagnostics(source: &str, filename: &str, diagnostics: &[ConversionError]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        let span = diagnostic.span();
        let start = span.start.min(source.len());
        let end = span.end.clamp(start, source.len());

        let report = Report::build(ReportKind::Warning, filename, start)
            .with_message(diagnostic.to_string())
            .with_label(
                Label::new((filename, start..end))
                    .with_color(Color::Yellow)
                    .with_message(diagnostic.label()),
            )
            .finish();

        if report
            .write((filename, Source::from(source)), &mut output)
            .is_err()
        {
            tracing::warn!("[Diagnostics] failed to render report for {}", filename);
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}
