//! Lowers a [`Document`] into host template text.
//!
//! An invocation becomes one include block:
//!
//! ```text
//! {% comp "cotton/card.html" with title="Hi" count=total only %}
//! {% attr x-data %}{ open: false }{% endattr %}
//! {% slot header %}<h1>Hi</h1>{% endslot %}
//! {% slot slot %}Body{% endslot %}
//! {% endcomp %}
//! ```
//!
//! Attributes that can be written as engine arguments are passed inline,
//! the rest as `attr` blocks so their text (quotes, newlines, nested tags)
//! reaches the component unchanged.
//!
//! A template's `<c-vars>` becomes `{% vars name=default ... %}` at its
//! position, closed by `{% endvars %}` at the end of the document.

use crate::extract::{
    is_identifier, is_inline_literal, is_single_argument, quote_literal, ContextValue,
    ScopedContext,
};
use crate::ir::{ComponentInvocation, Document, Piece, VarsDeclaration};
use crate::options::Syntax;

/// Emits host syntax for one document.
pub(crate) struct Emitter<'a> {
    source: &'a str,
    syntax: &'a Syntax,
    /// Output of each arena node, taken when its parent is emitted.
    compiled: Vec<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(source: &'a str, syntax: &'a Syntax) -> Self {
        Self {
            source,
            syntax,
            compiled: Vec::new(),
        }
    }

    pub fn emit(mut self, document: &Document) -> String {
        self.compiled.reserve(document.nodes.len());
        for node in &document.nodes {
            let output = self.component(node);
            self.compiled.push(output);
        }

        let mut out = String::with_capacity(self.source.len());
        let mut declared = false;
        for piece in &document.content {
            match piece {
                Piece::Vars(declaration) => declared |= self.vars(declaration, &mut out),
                _ => self.piece(piece, &mut out),
            }
        }
        if declared {
            self.tag(&mut out, &self.syntax.end_vars, "");
        }
        out
    }

    fn piece(&mut self, piece: &Piece, out: &mut String) {
        match piece {
            Piece::Text(span) => out.push_str(span.slice(self.source)),
            Piece::Component(id) => out.push_str(&std::mem::take(&mut self.compiled[id.index()])),
            // Only valid at document level.
            Piece::Vars(_) => {}
        }
    }

    fn pieces(&mut self, pieces: &[Piece]) -> String {
        let mut out = String::new();
        for piece in pieces {
            self.piece(piece, &mut out);
        }
        out
    }

    fn tag(&self, out: &mut String, name: &str, args: &str) {
        out.push_str("{% ");
        out.push_str(name);
        if !args.is_empty() {
            out.push(' ');
            out.push_str(args);
        }
        out.push_str(" %}");
    }

    fn component(&mut self, node: &ComponentInvocation) -> String {
        let context = ScopedContext::for_attributes(&node.attributes, self.source);
        let mut arguments = Vec::new();
        let mut blocks = String::new();
        for (name, value) in context.passed() {
            match inline_argument(name, value) {
                Some(argument) => arguments.push(argument),
                None => {
                    self.tag(&mut blocks, &self.syntax.attr, name);
                    match value {
                        ContextValue::Text(text) => blocks.push_str(text),
                        ContextValue::Expression(expression) => {
                            blocks.push_str("{{ ");
                            blocks.push_str(expression);
                            blocks.push_str(" }}");
                        }
                        ContextValue::Flag => {}
                    }
                    self.tag(&mut blocks, &self.syntax.end_attr, "");
                }
            }
        }

        let mut header = quote_literal(node.template.as_str());
        if !arguments.is_empty() {
            header.push_str(" with ");
            header.push_str(&arguments.join(" "));
        }
        header.push_str(" only");

        let mut out = String::new();
        self.tag(&mut out, &self.syntax.component, &header);
        out.push_str(&blocks);
        for (name, slot) in &node.named_slots {
            let body = self.pieces(&slot.content);
            self.tag(&mut out, &self.syntax.slot, name);
            out.push_str(&body);
            self.tag(&mut out, &self.syntax.end_slot, "");
        }
        let body = self.pieces(&node.slot_content);
        if !body.is_empty() {
            self.tag(&mut out, &self.syntax.slot, &self.syntax.default_slot);
            out.push_str(&body);
            self.tag(&mut out, &self.syntax.end_slot, "");
        }
        self.tag(&mut out, &self.syntax.end_component, "");
        out
    }

    /// Open the `vars` block with each declared default. Returns whether
    /// one was opened.
    ///
    /// The block only fills names missing from the caller's context; a
    /// value the caller passed is kept even when it is falsy.
    fn vars(&self, declaration: &VarsDeclaration, out: &mut String) -> bool {
        let context = ScopedContext::for_declaration(declaration, self.source);
        if context.is_empty() {
            return false;
        }
        let defaults: Vec<String> = context
            .defaults()
            .map(|(name, value)| {
                let default = match value {
                    ContextValue::Text(text) => quote_literal(text),
                    ContextValue::Expression(expression) => expression.clone(),
                    ContextValue::Flag => "\"\"".to_owned(),
                };
                format!("{name}={default}")
            })
            .collect();
        self.tag(out, &self.syntax.vars, &defaults.join(" "));
        true
    }
}

/// `name=value` for an attribute the engine can take as a tag argument.
fn inline_argument(name: &str, value: &ContextValue) -> Option<String> {
    if !is_identifier(name) {
        return None;
    }
    match value {
        ContextValue::Text(text) if is_inline_literal(text) => {
            Some(format!("{name}={}", quote_literal(text)))
        }
        ContextValue::Text(_) => None,
        ContextValue::Expression(expression) if is_single_argument(expression) => {
            Some(format!("{name}={expression}"))
        }
        ContextValue::Expression(_) => None,
        ContextValue::Flag => Some(format!("{name}=True")),
    }
}
