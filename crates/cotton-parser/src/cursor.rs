//! Character cursor shared by the scanner and the attribute parser.

use crate::token::HostTagKind;
use cotton_source::Span;

/// A forward-only cursor over template source.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the remaining source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume a string if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate is true.
    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.next_char();
        }
        &self.source[start..self.pos]
    }

    /// Consume through `s`, or to end of input if it never appears.
    /// Returns whether `s` was found.
    pub fn consume_through(&mut self, s: &str) -> bool {
        match self.remaining().find(s) {
            Some(idx) => {
                self.pos += idx + s.len();
                true
            }
            None => {
                self.pos = self.source.len();
                false
            }
        }
    }

    /// Length of the host-engine span starting here, if any.
    ///
    /// The engine matches `{% %}`, `{{ }}` and `{# #}` lazily within one
    /// line, so an opener without a closer on the same line is plain text.
    pub fn host_tag_len(&self) -> Option<(HostTagKind, usize)> {
        let rest = self.remaining();
        let kind = HostTagKind::from_opener(rest.get(..2)?)?;
        let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
        let close = line[2..].find(kind.closer())?;
        Some((kind, 2 + close + 2))
    }

    /// Consume a host-engine span if one starts here.
    pub fn read_host_tag(&mut self) -> Option<(HostTagKind, Span)> {
        let (kind, len) = self.host_tag_len()?;
        let start = self.pos;
        self.pos += len;
        Some((kind, self.span_from(start)))
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Get a span from start to current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::from_offsets(start, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_while() {
        let mut cursor = Cursor::new("card-item rest");
        assert_eq!(cursor.consume_while(|c| !c.is_whitespace()), "card-item");
        assert_eq!(cursor.skip_whitespace(), 1);
        assert_eq!(cursor.remaining(), "rest");
    }

    #[test]
    fn test_read_host_tag() {
        let mut cursor = Cursor::new("{% if a %}b");
        let (kind, span) = cursor.read_host_tag().unwrap();
        assert_eq!(kind, HostTagKind::Block);
        assert_eq!(span, Span::new(0, 10));
        assert_eq!(cursor.remaining(), "b");
    }

    #[test]
    fn test_host_tag_must_close_on_same_line() {
        let cursor = Cursor::new("{{ name\n}}");
        assert!(cursor.host_tag_len().is_none());
        let cursor = Cursor::new("{ not a tag }");
        assert!(cursor.host_tag_len().is_none());
    }

    #[test]
    fn test_consume_through_missing() {
        let mut cursor = Cursor::new("<!-- open");
        assert!(!cursor.consume_through("-->"));
        assert!(cursor.is_eof());
    }
}
