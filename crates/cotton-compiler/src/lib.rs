//! Source-to-source compiler for cotton component templates.
//!
//! Component tags are rewritten into include directives of the host template
//! engine. Everything else (markup, entities, whitespace and the engine's own
//! tags) is copied byte-for-byte.
//!
//! ```
//! use cotton_compiler::process;
//!
//! let out = process(r#"<c-card title="Hi">Body</c-card>"#).unwrap();
//! assert_eq!(
//!     out,
//!     r#"{% comp "cotton/card.html" with title="Hi" only %}{% slot slot %}Body{% endslot %}{% endcomp %}"#
//! );
//! ```

pub mod cache;
mod emit;
pub mod extract;
pub mod ir;
pub mod options;
pub mod resolver;
mod tree;

pub use cache::CompileCache;
pub use cotton_parser::{CompileError, CompileErrorCode, CompileResult};
pub use extract::{ContextValue, ScopedContext};
pub use ir::{ComponentInvocation, Document, NodeId, Piece};
pub use options::{CompileOptions, Syntax};
pub use resolver::{ComponentResolver, DirectoryResolver, NotFound, RegistryResolver, TemplateId};

use cotton_parser::{check_source_len, Scanner};
use cotton_source::SourceText;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Compiler version, part of every cache fingerprint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static NEXT_RESOLVER_ID: AtomicU64 = AtomicU64::new(0);

/// Compiles templates with fixed options and resolver.
#[derive(Clone)]
pub struct Compiler {
    options: CompileOptions,
    resolver: Arc<dyn ComponentResolver>,
    /// Distinct for every resolver a compiler is given; clones share it.
    resolver_id: u64,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl Compiler {
    /// Create a compiler resolving names under `cotton/`.
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            resolver: Arc::new(DirectoryResolver::default()),
            resolver_id: next_resolver_id(),
        }
    }

    pub fn with_resolver(self, resolver: impl ComponentResolver + 'static) -> Self {
        self.with_shared_resolver(Arc::new(resolver))
    }

    pub fn with_shared_resolver(mut self, resolver: Arc<dyn ComponentResolver>) -> Self {
        self.resolver = resolver;
        self.resolver_id = next_resolver_id();
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Identity of this compiler's resolver, part of cache fingerprints.
    pub(crate) fn resolver_id(&self) -> u64 {
        self.resolver_id
    }

    /// Parse a template into its document tree without emitting.
    pub fn parse(&self, source: &str) -> CompileResult<Document> {
        check_source_len(source.len())?;
        let scanner = Scanner::new(source, &self.options.prefix);
        tree::TreeBuilder::new(source, &self.options, self.resolver.as_ref()).build(scanner)
    }

    /// Compile a named source. Errors carry their line and column.
    pub fn compile(&self, source: &SourceText) -> CompileResult<String> {
        let text = source.text();
        if !self.mentions_components(text) {
            tracing::trace!(template = source.name(), "no component tags");
            return Ok(text.to_owned());
        }

        let document = self.parse(text).map_err(|err| err.locate(source))?;
        tracing::debug!(
            template = source.name(),
            components = document.nodes.len(),
            deferred = document.nodes.iter().filter(|node| !node.resolved).count(),
            "compiled template"
        );
        Ok(emit::Emitter::new(text, &self.options.syntax).emit(&document))
    }

    /// Compile an unnamed template string.
    pub fn process(&self, source: &str) -> CompileResult<String> {
        self.compile(&SourceText::anonymous(source))
    }

    fn mentions_components(&self, text: &str) -> bool {
        let prefix = self.options.prefix.as_str();
        text.match_indices('<').any(|(at, _)| {
            let rest = &text[at + 1..];
            rest.starts_with(prefix) || rest.strip_prefix('/').is_some_and(|r| r.starts_with(prefix))
        })
    }
}

fn next_resolver_id() -> u64 {
    NEXT_RESOLVER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Compile a template with the default options and directory resolver.
pub fn process(source: &str) -> CompileResult<String> {
    Compiler::default().process(source)
}
