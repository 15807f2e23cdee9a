//! Compiler options and the emitted directive vocabulary.

use cotton_parser::DEFAULT_PREFIX;
use smol_str::SmolStr;

/// Names of the host-engine tags the compiler emits.
///
/// The defaults match the tag library shipped for Django templates:
///
/// ```text
/// {% comp "cotton/card.html" with title="Hi" only %}
///     {% attr x-data %}...{% endattr %}
///     {% slot header %}...{% endslot %}
/// {% endcomp %}
///
/// {% vars size="md" open="" %}...{% endvars %}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Syntax {
    /// Include-with-explicit-context block.
    pub component: SmolStr,
    pub end_component: SmolStr,
    /// Attribute whose value is passed as a template body.
    pub attr: SmolStr,
    pub end_attr: SmolStr,
    /// Slot body capture.
    pub slot: SmolStr,
    pub end_slot: SmolStr,
    /// Variable the default slot is bound to.
    pub default_slot: SmolStr,
    /// Block binding `<c-vars>` defaults over the rest of the template. The
    /// engine applies a default only to a name the caller did not pass.
    pub vars: SmolStr,
    pub end_vars: SmolStr,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            component: "comp".into(),
            end_component: "endcomp".into(),
            attr: "attr".into(),
            end_attr: "endattr".into(),
            slot: "slot".into(),
            end_slot: "endslot".into(),
            default_slot: "slot".into(),
            vars: "vars".into(),
            end_vars: "endvars".into(),
        }
    }
}

/// Options for a [`Compiler`](crate::Compiler).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// Tag prefix marking components (`c-`).
    pub prefix: SmolStr,
    pub syntax: Syntax,
    /// Fail at compile time when a component does not resolve, instead of
    /// leaving the error to the engine at include time.
    pub strict_components: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            syntax: Syntax::default(),
            strict_components: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<SmolStr>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_strict_components(mut self, strict: bool) -> Self {
        self.strict_components = strict;
        self
    }
}
