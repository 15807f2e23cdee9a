//! Error types for component compilation.

use cotton_source::{LineCol, SourceText, Span};
use std::fmt;

/// Result type for scanning and compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// A fatal error that aborts the whole compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// The error message, without location.
    pub message: String,
    /// The span where the error occurred.
    pub span: Span,
    pub code: CompileErrorCode,
    /// 1-based position of `span.start`, filled in once the error leaves the compiler.
    pub location: Option<LineCol>,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, span: Span, code: CompileErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
            location: None,
        }
    }

    pub fn malformed(message: impl Into<String>, span: Span) -> Self {
        Self::new(message, span, CompileErrorCode::MalformedTag)
    }

    /// A quote that was opened at `span` and never closed.
    pub fn unterminated_quote(quote: char, span: Span) -> Self {
        Self::malformed(format!("Unterminated {quote} quote in attribute value"), span)
    }

    /// An opening component tag without `>`.
    pub fn unterminated_tag(tag: &str, span: Span) -> Self {
        Self::malformed(format!("Unterminated tag: <{tag}"), span)
    }

    pub fn invalid_attribute(detail: impl fmt::Display, span: Span) -> Self {
        Self::malformed(format!("Invalid attribute syntax: {detail}"), span)
    }

    /// An open tag that is never closed.
    pub fn unclosed_tag(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Unclosed tag: <{tag}> has no matching </{tag}>"),
            span,
            CompileErrorCode::UnmatchedTag,
        )
    }

    /// A close tag with no open tag to pair with.
    pub fn unexpected_close(tag: &str, expected: Option<&str>, span: Span) -> Self {
        let message = match expected {
            Some(open) => format!("Unexpected </{tag}>, expected </{open}>"),
            None => format!("Unexpected </{tag}> without a matching <{tag}>"),
        };
        Self::new(message, span, CompileErrorCode::UnmatchedTag)
    }

    pub fn unresolved_component(tag: &str, span: Span) -> Self {
        Self::new(
            format!("No template found for component <{tag}>"),
            span,
            CompileErrorCode::UnresolvedComponent,
        )
    }

    /// A template too long for its offsets to fit in a [`Span`].
    pub fn source_too_large(len: usize) -> Self {
        Self::new(
            format!(
                "Template is {len} bytes; at most {} bytes can be compiled",
                cotton_source::MAX_SOURCE_LEN
            ),
            Span::empty(0),
            CompileErrorCode::SourceTooLarge,
        )
    }

    /// Attach the `line:column` of this error's span in `source`.
    pub fn locate(mut self, source: &SourceText) -> Self {
        self.location = Some(source.line_col(self.span.start));
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} at {}", self.message, location),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// Error codes for categorizing compile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorCode {
    /// Unterminated quote or component tag, invalid attribute syntax, misplaced reserved tag.
    MalformedTag,
    /// Open tag without close, or close tag without open.
    UnmatchedTag,
    /// Tag name resolved to no template (strict mode only).
    UnresolvedComponent,
    SourceTooLarge,
}

impl CompileErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedTag => "malformed-tag",
            Self::UnmatchedTag => "unmatched-tag",
            Self::UnresolvedComponent => "unresolved-component",
            Self::SourceTooLarge => "source-too-large",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
