//! Tag scanner: splits a template into literal text, host-engine spans and
//! component tags.
//!
//! Literal HTML tags are never parsed, only stepped over. Their quote state
//! is tracked so that a `>` inside `title="a > b"` does not end the tag, and
//! host-engine spans are consumed as units wherever they appear, so a tag
//! such as `<div{% if x %} a="1"{% endif %}>` is copied exactly as written.

use crate::attributes::parse_attributes;
use crate::cursor::Cursor;
use crate::error::{CompileError, CompileResult};
use crate::token::{CloseTag, HostTag, HostTagKind, OpenTag, Token};
use cotton_source::Span;
use smol_str::SmolStr;

/// Tag prefix that marks a component, as in `<c-card>`.
pub const DEFAULT_PREFIX: &str = "c-";

/// Scan `source` with the default component prefix.
pub fn scan(source: &str) -> Scanner<'_> {
    Scanner::new(source, DEFAULT_PREFIX)
}

/// A lazy token stream over one template.
///
/// Adjacent literal text is merged into a single [`Token::Literal`]. The
/// stream ends after the first error.
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    prefix: &'a str,
    /// A token found right after a literal run, returned on the next call.
    pending: Option<Token>,
    /// Closing block name while inside `{% verbatim %}` or `{% comment %}`.
    raw_until: Option<String>,
    failed: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, prefix: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            prefix,
            pending: None,
            raw_until: None,
            failed: false,
        }
    }

    /// Consume one structural token, or step over literal text and return `None`.
    fn step(&mut self) -> Option<CompileResult<Token>> {
        if let Some((kind, span)) = self.cursor.read_host_tag() {
            let tag = HostTag { kind, span };
            if self.raw_until.is_some() {
                return self.step_raw(tag);
            }
            self.enter_raw_block(&tag);
            return Some(Ok(Token::HostTag(tag)));
        }

        if self.raw_until.is_some() {
            self.cursor.next_char();
            return None;
        }

        if self.cursor.starts_with("<!--") {
            self.cursor.consume_through("-->");
            return None;
        }

        if self.at_component("</") {
            return Some(self.read_close_tag());
        }
        if self.at_component("<") {
            return Some(self.read_open_tag());
        }

        if self.at_html_tag() {
            self.skip_html_tag();
            return None;
        }

        self.cursor.next_char();
        None
    }

    /// Whether `lead` + prefix + a name character starts here.
    fn at_component(&self, lead: &str) -> bool {
        let rest = self.cursor.remaining();
        rest.strip_prefix(lead)
            .and_then(|r| r.strip_prefix(self.prefix))
            .and_then(|r| r.chars().next())
            .is_some_and(|c| c.is_ascii_alphanumeric())
    }

    fn read_tag_name(&mut self) -> SmolStr {
        self.cursor
            .consume_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            .into()
    }

    fn read_open_tag(&mut self) -> CompileResult<Token> {
        let start = self.cursor.pos();
        self.cursor.consume("<");
        self.cursor.consume(self.prefix);
        let name = self.read_tag_name();
        let tag = format!("{}{}", self.prefix, name);

        match self.cursor.peek_char() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
            None => {
                return Err(CompileError::unterminated_tag(
                    &tag,
                    self.cursor.span_from(start),
                ))
            }
            Some(c) => {
                let at = self.cursor.pos();
                return Err(CompileError::malformed(
                    format!("Unexpected {c:?} after tag name <{tag}"),
                    Span::from_offsets(at, at + c.len_utf8()),
                ));
            }
        }

        let parsed = parse_attributes(&mut self.cursor, &tag, start)?;
        Ok(Token::ComponentOpen(OpenTag {
            name,
            attributes: parsed.attributes,
            self_closing: parsed.self_closing,
            span: self.cursor.span_from(start),
        }))
    }

    fn read_close_tag(&mut self) -> CompileResult<Token> {
        let start = self.cursor.pos();
        self.cursor.consume("</");
        self.cursor.consume(self.prefix);
        let name = self.read_tag_name();
        self.cursor.skip_whitespace();
        if !self.cursor.consume(">") {
            return Err(CompileError::malformed(
                format!("Expected '>' to close </{}{}", self.prefix, name),
                self.cursor.span_from(start),
            ));
        }
        Ok(Token::ComponentClose(CloseTag {
            name,
            span: self.cursor.span_from(start),
        }))
    }

    /// `<x`, `</x` or `<!x` with `x` alphabetic: the start of literal markup.
    fn at_html_tag(&self) -> bool {
        let rest = self.cursor.remaining();
        let Some(after) = rest.strip_prefix('<') else {
            return false;
        };
        let after = after
            .strip_prefix('/')
            .or_else(|| after.strip_prefix('!'))
            .unwrap_or(after);
        after.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Step over a literal HTML tag through its closing `>`.
    ///
    /// A quote only opens a value right after `=`. A stray `<` outside quotes
    /// ends the tag early so that a malformed tag cannot swallow a component
    /// that follows it.
    fn skip_html_tag(&mut self) {
        self.cursor.next_char();
        let mut quote: Option<char> = None;
        let mut after_equals = false;

        loop {
            if self.cursor.read_host_tag().is_some() {
                after_equals = false;
                continue;
            }
            let Some(c) = self.cursor.peek_char() else {
                return;
            };
            match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    '>' => {
                        self.cursor.next_char();
                        return;
                    }
                    '<' => return,
                    '"' | '\'' if after_equals => {
                        quote = Some(c);
                        after_equals = false;
                    }
                    '=' => after_equals = true,
                    c if c.is_whitespace() => {}
                    _ => after_equals = false,
                },
            }
            self.cursor.next_char();
        }
    }

    /// Start raw mode after `{% verbatim %}` or `{% comment %}`.
    fn enter_raw_block(&mut self, tag: &HostTag) {
        let source = self.cursor.source();
        let end = match tag.block_name(source) {
            Some("verbatim") => {
                let inner = tag.inner(source);
                format!("end{inner}")
            }
            Some("comment") => "endcomment".to_string(),
            _ => return,
        };
        self.raw_until = Some(end);
    }

    /// Inside a raw block only the matching end tag is structural.
    fn step_raw(&mut self, tag: HostTag) -> Option<CompileResult<Token>> {
        let source = self.cursor.source();
        let closes = tag.kind == HostTagKind::Block
            && self.raw_until.as_deref().is_some_and(|end| {
                let inner = tag.inner(source);
                if end == "endcomment" {
                    inner == end
                } else {
                    inner.split_whitespace().eq(end.split_whitespace())
                }
            });
        if closes {
            self.raw_until = None;
            Some(Ok(Token::HostTag(tag)))
        } else {
            None
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }
        if self.failed {
            return None;
        }

        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            let token_start = self.cursor.pos();
            match self.step() {
                None => continue,
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err));
                }
                Some(Ok(token)) => {
                    if token_start > start {
                        self.pending = Some(token);
                        return Some(Ok(Token::Literal(Span::from_offsets(start, token_start))));
                    }
                    return Some(Ok(token));
                }
            }
        }

        (self.cursor.pos() > start)
            .then(|| Ok(Token::Literal(self.cursor.span_from(start))))
    }
}
