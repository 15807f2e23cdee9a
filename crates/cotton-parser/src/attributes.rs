//! Attribute list parsing for component tags.
//!
//! Values come in four forms:
//!
//! - quoted: `title="a 'b' c"`, running to the matching quote. Newlines are
//!   kept and the other quote kind is ordinary text. There is no escape
//!   mechanism beyond quote matching.
//! - unquoted: `size=lg`, running to whitespace or the end of the tag.
//! - boolean: `disabled`, with no value at all.
//! - dynamic: `:items="rows"`, whose value is a host-engine expression.
//!   `::name` escapes the prefix and yields a literal attribute `:name`.
//!
//! Host-engine spans inside a value (`href="{% url "home" %}"`) are consumed
//! as units, so quotes inside them do not end the value.

use crate::cursor::Cursor;
use crate::error::{CompileError, CompileResult};
use cotton_source::Span;
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Attributes in source order, keyed by name.
pub type AttributeMap = IndexMap<SmolStr, AttributeValue>;

/// How an attribute value should be passed to the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A string, possibly containing host-engine syntax.
    Literal,
    /// A host-engine expression from a `:name` attribute.
    Expression,
    /// A value-less attribute; present means true.
    Boolean,
}

/// The raw value of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeValue {
    pub kind: ValueKind,
    /// The value between its quotes; empty for boolean attributes.
    pub span: Span,
    /// The quote the value was written with, if any.
    pub quote: Option<char>,
    /// The whole `name="value"` text.
    pub attr_span: Span,
}

impl AttributeValue {
    pub fn raw<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    pub fn is_boolean(&self) -> bool {
        self.kind == ValueKind::Boolean
    }
}

/// Output of attribute parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAttributes {
    pub attributes: AttributeMap,
    /// Whether the list ended with `/`.
    pub self_closing: bool,
}

/// Parse the attributes of an opening tag and consume through its `>`.
///
/// `tag` and `tag_start` are only used to report an unterminated tag.
pub fn parse_attributes(
    cursor: &mut Cursor<'_>,
    tag: &str,
    tag_start: usize,
) -> CompileResult<ParsedAttributes> {
    AttributeParser {
        cursor,
        tag: Some((tag, tag_start)),
    }
    .parse()
}

/// Parse a bare attribute list such as `a="1" b /`.
///
/// Spans in the result are relative to `raw`.
pub fn parse_attribute_list(raw: &str) -> CompileResult<ParsedAttributes> {
    let mut cursor = Cursor::new(raw);
    AttributeParser {
        cursor: &mut cursor,
        tag: None,
    }
    .parse()
}

struct AttributeParser<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    /// Tag name and start offset; `None` when parsing a bare list.
    tag: Option<(&'c str, usize)>,
}

impl AttributeParser<'_, '_> {
    fn parse(&mut self) -> CompileResult<ParsedAttributes> {
        let mut parsed = ParsedAttributes::default();

        loop {
            self.cursor.skip_whitespace();

            if self.cursor.is_eof() {
                return match self.tag {
                    Some((tag, start)) => Err(CompileError::unterminated_tag(
                        tag,
                        self.cursor.span_from(start),
                    )),
                    None => Ok(parsed),
                };
            }

            if self.cursor.starts_with("/") {
                let slash = self.cursor.pos();
                self.cursor.next_char();
                self.cursor.skip_whitespace();
                if self.at_end() {
                    parsed.self_closing = true;
                    self.consume_end();
                    return Ok(parsed);
                }
                return Err(CompileError::invalid_attribute(
                    "unexpected '/'",
                    Span::from_offsets(slash, slash + 1),
                ));
            }

            if self.at_end() {
                self.consume_end();
                return Ok(parsed);
            }

            let (name, value) = self.parse_attribute()?;
            if parsed.attributes.contains_key(&name) {
                return Err(CompileError::invalid_attribute(
                    format_args!("duplicate attribute '{name}'"),
                    value.attr_span,
                ));
            }
            parsed.attributes.insert(name, value);
        }
    }

    /// At `>` in a tag, or end of input in a bare list.
    fn at_end(&self) -> bool {
        match self.tag {
            Some(_) => self.cursor.starts_with(">"),
            None => self.cursor.is_eof(),
        }
    }

    fn consume_end(&mut self) {
        if self.tag.is_some() {
            self.cursor.consume(">");
        }
    }

    fn parse_attribute(&mut self) -> CompileResult<(SmolStr, AttributeValue)> {
        let start = self.cursor.pos();

        if let Some((_, len)) = self.cursor.host_tag_len() {
            return Err(CompileError::invalid_attribute(
                "template tags are not allowed between component attributes",
                Span::from_offsets(start, start + len),
            ));
        }

        let name = self.cursor.consume_while(is_attr_name_char);
        if name.is_empty() {
            let c = self.cursor.peek_char().unwrap_or(' ');
            return Err(CompileError::invalid_attribute(
                format_args!("unexpected {c:?}"),
                Span::from_offsets(start, start + c.len_utf8()),
            ));
        }

        let (key, dynamic) = if let Some(escaped) = name.strip_prefix("::") {
            (format!(":{escaped}"), false)
        } else if let Some(bound) = name.strip_prefix(':') {
            (bound.to_string(), true)
        } else {
            (name.to_string(), false)
        };
        if key.is_empty() || key == ":" {
            return Err(CompileError::invalid_attribute(
                format_args!("missing name after '{name}'"),
                self.cursor.span_from(start),
            ));
        }

        // Look past whitespace for `=`, but leave it unconsumed for a boolean.
        let mut probe = self.cursor.clone();
        probe.skip_whitespace();
        if !probe.starts_with("=") {
            if dynamic {
                return Err(CompileError::invalid_attribute(
                    format_args!("dynamic attribute '{name}' needs a value"),
                    self.cursor.span_from(start),
                ));
            }
            let end = self.cursor.pos();
            return Ok((
                key.into(),
                AttributeValue {
                    kind: ValueKind::Boolean,
                    span: Span::from_offsets(end, end),
                    quote: None,
                    attr_span: self.cursor.span_from(start),
                },
            ));
        }
        *self.cursor = probe;
        self.cursor.consume("=");
        self.cursor.skip_whitespace();

        let (span, quote) = match self.cursor.peek_char() {
            Some(q @ ('"' | '\'')) => (self.read_quoted(q)?, Some(q)),
            _ => (self.read_unquoted(name)?, None),
        };

        let kind = if dynamic {
            ValueKind::Expression
        } else {
            ValueKind::Literal
        };
        Ok((
            key.into(),
            AttributeValue {
                kind,
                span,
                quote,
                attr_span: self.cursor.span_from(start),
            },
        ))
    }

    /// Read a quoted value; the cursor is on the opening quote.
    fn read_quoted(&mut self, quote: char) -> CompileResult<Span> {
        let open = self.cursor.pos();
        self.cursor.next_char();
        let value_start = self.cursor.pos();

        loop {
            if self.cursor.read_host_tag().is_some() {
                continue;
            }
            match self.cursor.peek_char() {
                None => {
                    return Err(CompileError::unterminated_quote(
                        quote,
                        Span::from_offsets(open, open + 1),
                    ))
                }
                Some(c) if c == quote => {
                    let span = self.cursor.span_from(value_start);
                    self.cursor.next_char();
                    return Ok(span);
                }
                Some(_) => {
                    self.cursor.next_char();
                }
            }
        }
    }

    fn read_unquoted(&mut self, name: &str) -> CompileResult<Span> {
        let start = self.cursor.pos();

        loop {
            if self.cursor.read_host_tag().is_some() {
                continue;
            }
            match self.cursor.peek_char() {
                None => break,
                Some(c) if c.is_whitespace() || c == '>' => break,
                Some('/') if self.slash_closes_tag() => break,
                Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                    let at = self.cursor.pos();
                    return Err(CompileError::invalid_attribute(
                        format_args!("unexpected {c:?} in unquoted value of '{name}'"),
                        Span::from_offsets(at, at + 1),
                    ));
                }
                Some(_) => {
                    self.cursor.next_char();
                }
            }
        }

        let span = self.cursor.span_from(start);
        if span.is_empty() {
            return Err(CompileError::invalid_attribute(
                format_args!("expected a value after '{name}='"),
                Span::from_offsets(start, start),
            ));
        }
        Ok(span)
    }

    /// Whether a `/` at the cursor is the self-closing marker.
    fn slash_closes_tag(&self) -> bool {
        let after = self.cursor.remaining()[1..].trim_start();
        match self.tag {
            Some(_) => after.starts_with('>'),
            None => after.is_empty(),
        }
    }
}

fn is_attr_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '"' | '\'' | '=' | '<' | '>' | '/' | '{' | '}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    fn values(raw: &str) -> Vec<(String, ValueKind, String)> {
        let parsed = parse_attribute_list(raw).unwrap();
        parsed
            .attributes
            .iter()
            .map(|(name, value)| (name.to_string(), value.kind, value.raw(raw).to_string()))
            .collect()
    }

    #[test]
    fn test_quoted_unquoted_and_boolean() {
        assert_eq!(
            values(r#"title="Hello there" size=lg disabled"#),
            vec![
                ("title".into(), ValueKind::Literal, "Hello there".into()),
                ("size".into(), ValueKind::Literal, "lg".into()),
                ("disabled".into(), ValueKind::Boolean, "".into()),
            ]
        );
    }

    #[test]
    fn test_opposite_quote_kind_is_verbatim() {
        let raw = r#"something="var ? 'this' : 'that'" other='say "hi"'"#;
        let parsed = parse_attribute_list(raw).unwrap();
        assert_eq!(parsed.attributes["something"].raw(raw), "var ? 'this' : 'that'");
        assert_eq!(parsed.attributes["something"].quote, Some('"'));
        assert_eq!(parsed.attributes["other"].raw(raw), r#"say "hi""#);
    }

    #[test]
    fn test_multiline_value_preserved() {
        let raw = "x-data=\"{\n    open: false,\n    toggle() { this.open = !this.open }\n}\"";
        let parsed = parse_attribute_list(raw).unwrap();
        assert_eq!(
            parsed.attributes["x-data"].raw(raw),
            "{\n    open: false,\n    toggle() { this.open = !this.open }\n}"
        );
    }

    #[test]
    fn test_host_tag_inside_quoted_value() {
        let raw = r#"href="{% url "home" %}" label={{ page.title }}"#;
        let parsed = parse_attribute_list(raw).unwrap();
        assert_eq!(parsed.attributes["href"].raw(raw), r#"{% url "home" %}"#);
        assert_eq!(parsed.attributes["label"].raw(raw), "{{ page.title }}");
    }

    #[test]
    fn test_dynamic_and_escaped_attributes() {
        assert_eq!(
            values(r#":items="rows" ::class="{ open: isOpen }""#),
            vec![
                ("items".into(), ValueKind::Expression, "rows".into()),
                (":class".into(), ValueKind::Literal, "{ open: isOpen }".into()),
            ]
        );
    }

    #[test]
    fn test_spaces_around_equals() {
        assert_eq!(
            values(r#"title = "x" flag"#),
            vec![
                ("title".into(), ValueKind::Literal, "x".into()),
                ("flag".into(), ValueKind::Boolean, "".into()),
            ]
        );
    }

    #[test]
    fn test_self_closing_marker() {
        let parsed = parse_attribute_list(r#"href=/a/b active /"#).unwrap();
        assert!(parsed.self_closing);
        assert_eq!(parsed.attributes["href"].raw("href=/a/b active /"), "/a/b");
    }

    #[test]
    fn test_tag_mode_stops_after_close_bracket() {
        let source = r#"<c-card title="a > b" />rest"#;
        let mut cursor = Cursor::new(source);
        cursor.consume("<c-card");
        let parsed = parse_attributes(&mut cursor, "c-card", 0).unwrap();
        assert!(parsed.self_closing);
        assert_eq!(parsed.attributes["title"].raw(source), "a > b");
        assert_eq!(cursor.remaining(), "rest");
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_attribute_list(r#"title="never closed"#).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::MalformedTag);
        assert_eq!(err.span, Span::new(6, 7));
    }

    #[test]
    fn test_unterminated_tag() {
        let source = "<c-card title='x'";
        let mut cursor = Cursor::new(source);
        cursor.consume("<c-card");
        let err = parse_attributes(&mut cursor, "c-card", 0).unwrap_err();
        assert_eq!(err.message, "Unterminated tag: <c-card");
    }

    #[test]
    fn test_invalid_attributes() {
        for raw in [r#"="x""#, "a=", "a a", ":b", r#"{% if x %}a{% endif %}"#, "a / b"] {
            let err = parse_attribute_list(raw).unwrap_err();
            assert_eq!(err.code, CompileErrorCode::MalformedTag, "{raw}");
        }
    }
}
