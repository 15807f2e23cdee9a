//! Builds a [`Document`] from the token stream.
//!
//! Open tags push a frame, close tags pop it. A frame collects its content
//! until it is closed, then becomes either an arena node (components) or a
//! named slot on the enclosing component frame.

use crate::extract::{self, SLOT_TAG, VARS_TAG};
use crate::ir::{push_text, ComponentInvocation, Document, NamedSlot, Piece};
use crate::options::CompileOptions;
use crate::resolver::{ComponentResolver, TemplateId};
use cotton_parser::{CloseTag, CompileError, CompileResult, OpenTag, Token};
use cotton_source::Span;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

enum FrameKind {
    Component(OpenTag),
    Slot { name: SmolStr, open: Span },
}

struct Frame {
    kind: FrameKind,
    content: Vec<Piece>,
    named_slots: IndexMap<SmolStr, NamedSlot>,
}

impl Frame {
    fn tag_name(&self) -> &str {
        match &self.kind {
            FrameKind::Component(open) => &open.name,
            FrameKind::Slot { .. } => SLOT_TAG,
        }
    }

    fn open_span(&self) -> Span {
        match &self.kind {
            FrameKind::Component(open) => open.span,
            FrameKind::Slot { open, .. } => *open,
        }
    }
}

/// Tree builder state for one template.
pub(crate) struct TreeBuilder<'a> {
    source: &'a str,
    options: &'a CompileOptions,
    resolver: &'a dyn ComponentResolver,
    document: Document,
    stack: Vec<Frame>,
    /// Open frames per tag name.
    depth: FxHashMap<SmolStr, u32>,
    vars_seen: bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        source: &'a str,
        options: &'a CompileOptions,
        resolver: &'a dyn ComponentResolver,
    ) -> Self {
        Self {
            source,
            options,
            resolver,
            document: Document::default(),
            stack: Vec::new(),
            depth: FxHashMap::default(),
            vars_seen: false,
        }
    }

    /// Consume every token and return the finished document.
    pub fn build<I>(mut self, tokens: I) -> CompileResult<Document>
    where
        I: IntoIterator<Item = CompileResult<Token>>,
    {
        for token in tokens {
            match token? {
                Token::Literal(span) => push_text(self.content(), span),
                Token::HostTag(tag) => push_text(self.content(), tag.span),
                Token::ComponentOpen(tag) => self.open(tag)?,
                Token::ComponentClose(tag) => self.close(tag)?,
            }
        }

        if let Some(frame) = self.stack.pop() {
            return Err(CompileError::unclosed_tag(
                &self.full_name(frame.tag_name()),
                frame.open_span(),
            ));
        }
        Ok(self.document)
    }

    fn content(&mut self) -> &mut Vec<Piece> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.content,
            None => &mut self.document.content,
        }
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}{}", self.options.prefix, name)
    }

    fn open(&mut self, tag: OpenTag) -> CompileResult<()> {
        match tag.name.as_str() {
            VARS_TAG => self.open_vars(tag),
            SLOT_TAG => self.open_slot(tag),
            _ => {
                extract::check_invocation(&tag, self.source)?;
                if tag.self_closing {
                    let span = tag.span;
                    let piece = self.finish_component(tag, Vec::new(), IndexMap::new(), span)?;
                    self.content().push(piece);
                } else {
                    self.push_frame(FrameKind::Component(tag));
                }
                Ok(())
            }
        }
    }

    fn push_frame(&mut self, kind: FrameKind) {
        let frame = Frame {
            kind,
            content: Vec::new(),
            named_slots: IndexMap::new(),
        };
        *self.depth.entry(frame.tag_name().into()).or_default() += 1;
        self.stack.push(frame);
    }

    fn open_vars(&mut self, tag: OpenTag) -> CompileResult<()> {
        let declaration = extract::declare_vars(&tag, self.source)?;
        if let Some(frame) = self.stack.last() {
            return Err(CompileError::malformed(
                format!(
                    "<{}> must be at the top level of the template, not inside <{}>",
                    self.full_name(VARS_TAG),
                    self.full_name(frame.tag_name())
                ),
                tag.span,
            ));
        }
        if self.vars_seen {
            return Err(CompileError::malformed(
                format!(
                    "<{}> may appear only once per template",
                    self.full_name(VARS_TAG)
                ),
                tag.span,
            ));
        }
        self.vars_seen = true;
        self.document.content.push(Piece::Vars(declaration));
        Ok(())
    }

    fn open_slot(&mut self, tag: OpenTag) -> CompileResult<()> {
        let name = extract::slot_name(&tag, self.source, &self.options.syntax)?;
        if !matches!(
            self.stack.last(),
            Some(Frame {
                kind: FrameKind::Component(_),
                ..
            })
        ) {
            return Err(CompileError::malformed(
                format!(
                    "<{}> must be placed directly inside a component",
                    self.full_name(SLOT_TAG)
                ),
                tag.span,
            ));
        }
        if tag.self_closing {
            self.attach_slot(
                name,
                NamedSlot {
                    content: Vec::new(),
                    span: tag.span,
                },
            )
        } else {
            self.push_frame(FrameKind::Slot {
                name,
                open: tag.span,
            });
            Ok(())
        }
    }

    fn close(&mut self, tag: CloseTag) -> CompileResult<()> {
        let open_count = self.depth.get(&tag.name).copied().unwrap_or(0);
        let full = self.full_name(&tag.name);
        let Some(frame) = self.stack.pop() else {
            return Err(CompileError::unexpected_close(&full, None, tag.span));
        };
        if frame.tag_name() != tag.name.as_str() {
            let expected = (open_count > 0).then(|| self.full_name(frame.tag_name()));
            return Err(CompileError::unexpected_close(
                &full,
                expected.as_deref(),
                tag.span,
            ));
        }
        if let Some(count) = self.depth.get_mut(&tag.name) {
            *count -= 1;
        }

        let span = frame.open_span().merge(tag.span);
        match frame.kind {
            FrameKind::Slot { name, .. } => self.attach_slot(
                name,
                NamedSlot {
                    content: frame.content,
                    span,
                },
            ),
            FrameKind::Component(open) => {
                let piece = self.finish_component(open, frame.content, frame.named_slots, span)?;
                self.content().push(piece);
                Ok(())
            }
        }
    }

    fn attach_slot(&mut self, name: SmolStr, slot: NamedSlot) -> CompileResult<()> {
        let options = self.options;
        let prefix = &options.prefix;
        let Some(Frame {
            kind: FrameKind::Component(open),
            named_slots,
            ..
        }) = self.stack.last_mut()
        else {
            return Err(CompileError::malformed(
                format!("<{prefix}{SLOT_TAG}> must be placed directly inside a component"),
                slot.span,
            ));
        };
        if named_slots.contains_key(&name) {
            return Err(CompileError::malformed(
                format!("Duplicate slot '{name}' in <{prefix}{}>", open.name),
                slot.span,
            ));
        }
        named_slots.insert(name, slot);
        Ok(())
    }

    /// Resolve a closed component and add it to the arena.
    fn finish_component(
        &mut self,
        open: OpenTag,
        slot_content: Vec<Piece>,
        named_slots: IndexMap<SmolStr, NamedSlot>,
        span: Span,
    ) -> CompileResult<Piece> {
        let (template, resolved) = match self.resolver.resolve(&open.name) {
            Ok(template) => (template, true),
            Err(_) if self.options.strict_components => {
                return Err(CompileError::unresolved_component(
                    &self.full_name(&open.name),
                    open.span,
                ));
            }
            Err(err) => {
                tracing::debug!(component = %open.name, "{err}, leaving resolution to the engine");
                (TemplateId::new(open.name.clone()), false)
            }
        };
        let id = self.document.push(ComponentInvocation {
            tag_name: open.name,
            template,
            resolved,
            attributes: open.attributes,
            slot_content,
            named_slots,
            span,
        });
        Ok(Piece::Component(id))
    }
}
