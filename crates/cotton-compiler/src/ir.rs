//! Intermediate representation: a document plus an arena of invocations.
//!
//! Invocations are stored in a flat arena and referenced by [`NodeId`].
//! A node is appended when its closing tag is seen, so every nested
//! invocation has a lower id than the invocation containing it. Walking the
//! arena in id order therefore visits children before parents.

use crate::resolver::TemplateId;
use cotton_parser::AttributeMap;
use cotton_source::Span;
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Index of an invocation in [`Document::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One piece of content, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Literal text or a host-engine span, copied unchanged.
    Text(Span),
    /// A component invocation.
    Component(NodeId),
    /// The `<c-vars />` declaration of the template being compiled.
    Vars(VarsDeclaration),
}

/// A `<c-name>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInvocation {
    /// Component name without prefix.
    pub tag_name: SmolStr,
    pub template: TemplateId,
    /// False when the resolver had no template and resolution was left to the engine.
    pub resolved: bool,
    /// Pass-through attributes in source order.
    pub attributes: AttributeMap,
    /// Default slot: everything in the body outside named slots.
    pub slot_content: Vec<Piece>,
    pub named_slots: IndexMap<SmolStr, NamedSlot>,
    /// From the opening `<` to the end of the closing tag.
    pub span: Span,
}

/// A `<c-slot name="...">` section of an invocation body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSlot {
    pub content: Vec<Piece>,
    pub span: Span,
}

/// Scoped variables declared by `<c-vars ... />`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarsDeclaration {
    /// Declared names with their default values; boolean entries have none.
    pub defaults: AttributeMap,
    pub span: Span,
}

/// A parsed template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top-level content.
    pub content: Vec<Piece>,
    /// Arena of invocations, children before parents.
    pub nodes: Vec<ComponentInvocation>,
}

impl Document {
    pub fn node(&self, id: NodeId) -> &ComponentInvocation {
        &self.nodes[id.index()]
    }

    /// Append an invocation to the arena.
    pub(crate) fn push(&mut self, node: ComponentInvocation) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}

/// Append text to a piece list, merging with a directly preceding span.
pub(crate) fn push_text(pieces: &mut Vec<Piece>, span: Span) {
    if let Some(Piece::Text(last)) = pieces.last_mut() {
        if last.end == span.start {
            *last = last.merge(span);
            return;
        }
    }
    pieces.push(Piece::Text(span));
}
