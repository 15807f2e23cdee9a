//! Source text handling for the cotton compiler.
//!
//! Templates are compiled from immutable text addressed by byte offsets.
//! This crate provides the [`Span`] type used by every token and error,
//! a [`LineIndex`] for turning offsets into `line:column` locations, and
//! [`SourceText`], which bundles a template's name, text and line index.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
pub use text_size::{TextRange, TextSize};

/// Largest template, in bytes, that spans can address.
pub const MAX_SOURCE_LEN: usize = u32::MAX as usize;

/// A half-open byte range `[start, end)` into a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at the given offset.
    #[inline]
    pub const fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Span between two `usize` offsets, as produced by string cursors.
    ///
    /// Offsets must not exceed [`MAX_SOURCE_LEN`]; callers check the text
    /// length once before scanning.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        debug_assert!(end <= MAX_SOURCE_LEN, "offset {end} does not fit in a span");
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The text this span covers in `source`.
    ///
    /// Spans are only ever produced on char boundaries of the text they were
    /// scanned from, so slicing the same text cannot panic.
    #[inline]
    pub fn slice(self, source: &str) -> &str {
        &source[self.to_range()]
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Self {
            start: range.start().into(),
            end: range.end().into(),
        }
    }
}

impl From<Span> for TextRange {
    fn from(span: Span) -> Self {
        TextRange::new(TextSize::new(span.start), TextSize::new(span.end))
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::from_offsets(range.start, range.end)
    }
}

/// Byte offsets of line starts, for converting offsets to line/column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                text.bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| (i + 1) as u32),
            )
            .collect();
        Self { line_starts }
    }

    /// Get the 0-indexed line and column for a byte offset.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }
}

/// A line and column position, both 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    /// Byte offset within the line.
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Displays 1-indexed, as editors and terminals expect.
impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// A named, immutable template source.
///
/// Cloning is cheap; the text and line index are shared.
#[derive(Debug, Clone)]
pub struct SourceText {
    name: Arc<str>,
    text: Arc<str>,
    lines: Arc<LineIndex>,
}

impl SourceText {
    pub fn new(name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let lines = Arc::new(LineIndex::new(&text));
        Self {
            name: name.into(),
            text,
            lines,
        }
    }

    /// An unnamed source, for strings compiled directly.
    pub fn anonymous(text: impl Into<Arc<str>>) -> Self {
        Self::new("<string>", text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_col(&self, offset: u32) -> LineCol {
        self.lines.line_col(offset)
    }

    pub fn slice(&self, span: Span) -> &str {
        span.slice(&self.text)
    }
}
