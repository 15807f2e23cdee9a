//! Separates what a tag passes to its component: scoped variable defaults,
//! named slots and plain attributes.

use crate::ir::VarsDeclaration;
use crate::options::Syntax;
use cotton_parser::{
    AttributeMap, AttributeValue, CompileError, CompileResult, OpenTag, ValueKind,
};
use indexmap::IndexMap;
use smol_str::SmolStr;

/// Reserved tag declaring a template's scoped variables.
pub const VARS_TAG: &str = "vars";
/// Reserved tag delimiting a named slot inside an invocation body.
pub const SLOT_TAG: &str = "slot";

/// A value bound in a component's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    /// String literal, as written between its quotes.
    Text(String),
    /// Engine expression from a `:name` attribute.
    Expression(String),
    /// Attribute written without a value.
    Flag,
}

impl ContextValue {
    pub fn from_attribute(value: &AttributeValue, source: &str) -> Self {
        match value.kind {
            ValueKind::Literal => Self::Text(value.raw(source).to_owned()),
            ValueKind::Expression => Self::Expression(value.raw(source).trim().to_owned()),
            ValueKind::Boolean => Self::Flag,
        }
    }
}

/// The two layers of a component's variables: what one invocation passes
/// and the defaults the component declares.
///
/// The passed layer becomes the explicit context of the `comp ... only`
/// include, the defaults layer the component's `vars` tag. The engine binds
/// a default only for a name missing from the passed layer, so a passed
/// value wins even when it is falsy. Nothing else from the caller's context
/// is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopedContext {
    passed: IndexMap<SmolStr, ContextValue>,
    defaults: IndexMap<SmolStr, ContextValue>,
}

impl ScopedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding the attributes of one invocation.
    pub fn for_attributes(attributes: &AttributeMap, source: &str) -> Self {
        let mut context = Self::new();
        for (name, value) in attributes {
            context.pass(name.clone(), ContextValue::from_attribute(value, source));
        }
        context
    }

    /// Context holding only the defaults of a `<c-vars>` declaration.
    pub fn for_declaration(declaration: &VarsDeclaration, source: &str) -> Self {
        let mut context = Self::new();
        for (name, value) in &declaration.defaults {
            context.declare(name.clone(), ContextValue::from_attribute(value, source));
        }
        context
    }

    pub fn pass(&mut self, name: SmolStr, value: ContextValue) {
        self.passed.insert(name, value);
    }

    pub fn declare(&mut self, name: SmolStr, value: ContextValue) {
        self.defaults.insert(name, value);
    }

    pub fn passed(&self) -> impl Iterator<Item = (&SmolStr, &ContextValue)> {
        self.passed.iter()
    }

    pub fn defaults(&self) -> impl Iterator<Item = (&SmolStr, &ContextValue)> {
        self.defaults.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.passed.is_empty() && self.defaults.is_empty()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether text contains host-engine syntax.
pub fn has_host_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%") || text.contains("{#")
}

/// Whether text contains an opening or closing host delimiter. Inside a
/// `{% ... %}` header any of them would end or split the tag.
pub fn has_tag_delimiter(text: &str) -> bool {
    has_host_syntax(text) || text.contains("}}") || text.contains("%}") || text.contains("#}")
}

fn is_single_line(text: &str) -> bool {
    !text.contains(['\n', '\r'])
}

/// Whether a literal can be written as an engine string literal.
pub fn is_inline_literal(text: &str) -> bool {
    is_single_line(text)
        && !has_tag_delimiter(text)
        && !text.contains('\\')
        && !(text.contains('"') && text.contains('\''))
}

/// Whether an expression stays one tag argument, with whitespace only
/// inside string literals.
pub fn is_single_argument(expression: &str) -> bool {
    if has_tag_delimiter(expression) {
        return false;
    }
    let mut quote = None;
    for c in expression.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => return false,
            None => {}
        }
    }
    quote.is_none()
}

/// Quote a literal with whichever quote it does not contain.
pub fn quote_literal(text: &str) -> String {
    if text.contains('"') {
        format!("'{text}'")
    } else {
        format!("\"{text}\"")
    }
}

/// Check the attributes of a component invocation.
pub(crate) fn check_invocation(tag: &OpenTag, source: &str) -> CompileResult<()> {
    for (name, value) in &tag.attributes {
        if value.kind == ValueKind::Expression {
            check_expression(name, value, source)?;
        }
    }
    Ok(())
}

fn check_expression(name: &str, value: &AttributeValue, source: &str) -> CompileResult<()> {
    let expression = value.raw(source).trim();
    if expression.is_empty() {
        return Err(CompileError::invalid_attribute(
            format_args!("empty expression for ':{name}'"),
            value.attr_span,
        ));
    }
    // `}}` would close the `{{ }}` an attr block wraps the expression in.
    if !is_single_line(expression) || has_host_syntax(expression) || expression.contains("}}") {
        return Err(CompileError::invalid_attribute(
            format_args!("expression for ':{name}' must be a single line without template tags"),
            value.attr_span,
        ));
    }
    Ok(())
}

/// Read a `<c-vars ... />` tag into a declaration.
pub(crate) fn declare_vars(tag: &OpenTag, source: &str) -> CompileResult<VarsDeclaration> {
    if !tag.self_closing {
        return Err(CompileError::malformed(
            format!("<{}> must be self-closing", tag_text(tag, source)),
            tag.span,
        ));
    }
    for (name, value) in &tag.attributes {
        if !is_identifier(name) {
            return Err(CompileError::malformed(
                format!("Scoped variable '{name}' is not a valid variable name"),
                value.attr_span,
            ));
        }
        match value.kind {
            ValueKind::Literal if !is_inline_literal(value.raw(source)) => {
                return Err(CompileError::malformed(
                    format!(
                        "Default for '{name}' must be a single-line value without template tags"
                    ),
                    value.attr_span,
                ));
            }
            ValueKind::Expression => {
                check_expression(name, value, source)?;
                if !is_single_argument(value.raw(source).trim()) {
                    return Err(CompileError::malformed(
                        format!("Default for '{name}' must be a single expression"),
                        value.attr_span,
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(VarsDeclaration {
        defaults: tag.attributes.clone(),
        span: tag.span,
    })
}

/// Read the name of a `<c-slot name="...">` tag.
pub(crate) fn slot_name(tag: &OpenTag, source: &str, syntax: &Syntax) -> CompileResult<SmolStr> {
    if let Some((extra, value)) = tag.attributes.iter().find(|(name, _)| name.as_str() != "name") {
        return Err(CompileError::invalid_attribute(
            format_args!("unexpected attribute '{extra}' on a slot"),
            value.attr_span,
        ));
    }
    let Some(value) = tag.attributes.get("name") else {
        return Err(CompileError::malformed(
            "Slot is missing its 'name' attribute",
            tag.span,
        ));
    };
    let name = value.raw(source);
    if value.kind != ValueKind::Literal || !is_identifier(name) {
        return Err(CompileError::malformed(
            format!("Slot name '{name}' is not a valid variable name"),
            value.attr_span,
        ));
    }
    if name == syntax.default_slot.as_str() {
        return Err(CompileError::malformed(
            format!("Slot name '{name}' is reserved for the default slot"),
            value.attr_span,
        ));
    }
    Ok(SmolStr::new(name))
}

/// The tag as written, without angle brackets, for messages.
fn tag_text<'s>(tag: &OpenTag, source: &'s str) -> &'s str {
    let text = tag.span.slice(source);
    let text = text.strip_prefix('<').unwrap_or(text);
    text.split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cotton_parser::{tokenize, Token};
    use pretty_assertions::assert_eq;

    fn open_tag(source: &str) -> OpenTag {
        match tokenize(source).unwrap().into_iter().next() {
            Some(Token::ComponentOpen(tag)) => tag,
            other => panic!("expected component tag, got {other:?}"),
        }
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("title"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("x-data"));
        assert!(!is_identifier("2col"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_inline_literal() {
        assert!(is_inline_literal("Hello world"));
        assert!(is_inline_literal("it's"));
        assert!(!is_inline_literal("{{ name }}"));
        assert!(!is_inline_literal("a\nb"));
        assert!(!is_inline_literal(r#"both ' and ""#));
        assert!(!is_inline_literal("50%} off"));
        assert!(!is_inline_literal("a }} b"));
        assert!(!is_inline_literal("#} c"));
        assert_eq!(quote_literal("it's"), "\"it's\"");
        assert_eq!(quote_literal(r#"say "hi""#), r#"'say "hi"'"#);
    }

    #[test]
    fn test_single_argument() {
        assert!(is_single_argument("user.name|default:\"a b\""));
        assert!(is_single_argument("total"));
        assert!(!is_single_argument("a or b"));
        assert!(!is_single_argument("\"open"));
        assert!(!is_single_argument("x|default:'%}'"));
        assert!(!is_single_argument("x|default:'}}'"));
    }

    #[test]
    fn test_layers_stay_separate() {
        let mut context = ScopedContext::new();
        context.declare("size".into(), ContextValue::Text("md".into()));
        context.pass("size".into(), ContextValue::Expression("False".into()));
        let passed: Vec<_> = context.passed().map(|(k, v)| (k.as_str(), v.clone())).collect();
        let defaults: Vec<_> = context.defaults().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(passed, vec![("size", ContextValue::Expression("False".into()))]);
        assert_eq!(defaults, vec![("size", ContextValue::Text("md".into()))]);
        assert!(!context.is_empty());
        assert!(ScopedContext::new().is_empty());
    }

    #[test]
    fn test_context_from_attributes() {
        let source = r#"<c-x title="Hi" :count="n + 1" disabled />"#;
        let tag = open_tag(source);
        let context = ScopedContext::for_attributes(&tag.attributes, source);
        let passed: Vec<_> = context.passed().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(
            passed,
            vec![
                ("title", ContextValue::Text("Hi".into())),
                ("count", ContextValue::Expression("n + 1".into())),
                ("disabled", ContextValue::Flag),
            ]
        );
    }

    #[test]
    fn test_declare_vars() {
        let source = r#"<c-vars size="md" :items="[]" open />"#;
        let declaration = declare_vars(&open_tag(source), source).unwrap();
        let context = ScopedContext::for_declaration(&declaration, source);
        assert_eq!(context.passed().count(), 0);
        let defaults: Vec<_> = context.defaults().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(
            defaults,
            vec![
                ("size", ContextValue::Text("md".into())),
                ("items", ContextValue::Expression("[]".into())),
                ("open", ContextValue::Flag),
            ]
        );
    }

    #[test]
    fn test_vars_must_self_close() {
        let source = "<c-vars a=\"1\"></c-vars>";
        let err = declare_vars(&open_tag(source), source).unwrap_err();
        assert_eq!(err.message, "<c-vars> must be self-closing");
    }

    #[test]
    fn test_vars_default_rejects_template_tags() {
        let source = "<c-vars title=\"{{ x }}\" />";
        let err = declare_vars(&open_tag(source), source).unwrap_err();
        assert_eq!(
            err.message,
            "Default for 'title' must be a single-line value without template tags"
        );
    }

    #[test]
    fn test_vars_default_rejects_tag_closer() {
        let source = "<c-vars label=\"50%} off\" :tone=\"x|default:'%}'\" />";
        let err = declare_vars(&open_tag(source), source).unwrap_err();
        assert_eq!(
            err.message,
            "Default for 'label' must be a single-line value without template tags"
        );
        let source = "<c-vars :tone=\"x|default:'%}'\" />";
        let err = declare_vars(&open_tag(source), source).unwrap_err();
        assert_eq!(err.message, "Default for 'tone' must be a single expression");
    }

    #[test]
    fn test_vars_name_must_be_identifier() {
        let source = "<c-vars aria-label=\"x\" />";
        assert!(declare_vars(&open_tag(source), source).is_err());
    }

    #[test]
    fn test_slot_name() {
        let syntax = Syntax::default();
        let source = r#"<c-slot name="header">"#;
        assert_eq!(slot_name(&open_tag(source), source, &syntax).unwrap(), "header");

        for bad in [
            "<c-slot>",
            r#"<c-slot name="two words">"#,
            r#"<c-slot :name="x">"#,
            r#"<c-slot name="slot">"#,
            r#"<c-slot name="a" class="b">"#,
        ] {
            let err = slot_name(&open_tag(bad), bad, &syntax).unwrap_err();
            assert_eq!(err.code, cotton_parser::CompileErrorCode::MalformedTag, "{bad}");
        }
    }

    #[test]
    fn test_check_invocation_rejects_multiline_expression() {
        let source = "<c-x :a=\"one +\n two\" />";
        let err = check_invocation(&open_tag(source), source).unwrap_err();
        assert!(err.message.starts_with("Invalid attribute syntax"));
        let closes = "<c-x :a=\"x|default:'}}'\" />";
        assert!(check_invocation(&open_tag(closes), closes).is_err());
        let ok = "<c-x :a=\"one + two\" />";
        assert!(check_invocation(&open_tag(ok), ok).is_ok());
    }
}
