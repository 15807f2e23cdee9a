//! Token types produced by the tag scanner.

use crate::attributes::AttributeMap;
use cotton_source::Span;
use smol_str::SmolStr;

/// A lexical unit of a template.
///
/// Tokens hold spans into the scanned source rather than copies, so literal
/// text is carried through compilation byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text the compiler does not touch: markup, entities, whitespace.
    Literal(Span),
    /// A host-engine tag, variable or comment.
    HostTag(HostTag),
    /// `<c-name ...>` or `<c-name ... />`.
    ComponentOpen(OpenTag),
    /// `</c-name>`.
    ComponentClose(CloseTag),
}

impl Token {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(span) => *span,
            Self::HostTag(tag) => tag.span,
            Self::ComponentOpen(tag) => tag.span,
            Self::ComponentClose(tag) => tag.span,
        }
    }
}

/// Which host-engine delimiter pair a span uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostTagKind {
    /// `{% ... %}`
    Block,
    /// `{{ ... }}`
    Variable,
    /// `{# ... #}`
    Comment,
}

impl HostTagKind {
    /// Classify a two-character opening delimiter.
    pub fn from_opener(opener: &str) -> Option<Self> {
        match opener {
            "{%" => Some(Self::Block),
            "{{" => Some(Self::Variable),
            "{#" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn closer(self) -> &'static str {
        match self {
            Self::Block => "%}",
            Self::Variable => "}}",
            Self::Comment => "#}",
        }
    }
}

/// A host-engine span, passed through verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTag {
    pub kind: HostTagKind,
    pub span: Span,
}

impl HostTag {
    /// The trimmed text between the delimiters.
    pub fn inner<'s>(&self, source: &'s str) -> &'s str {
        let raw = self.span.slice(source);
        raw[2..raw.len() - 2].trim()
    }

    /// First word of a block tag (`if`, `verbatim`, ...).
    pub fn block_name<'s>(&self, source: &'s str) -> Option<&'s str> {
        match self.kind {
            HostTagKind::Block => self.inner(source).split_whitespace().next(),
            _ => None,
        }
    }
}

/// An opening component tag with its parsed attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTag {
    /// Component name without the tag prefix (`card` for `<c-card>`).
    pub name: SmolStr,
    pub attributes: AttributeMap,
    pub self_closing: bool,
    /// From `<` through `>`.
    pub span: Span,
}

/// A closing component tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseTag {
    pub name: SmolStr,
    pub span: Span,
}
