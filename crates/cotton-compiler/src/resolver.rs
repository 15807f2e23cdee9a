//! Component name to template resolution.
//!
//! The compiler never loads templates. It only needs to know which template
//! identity a tag name stands for, through the [`ComponentResolver`]
//! capability. Whether that identity exists is decided by the engine when it
//! renders the include, unless strict mode asks the resolver up front.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

/// The template a component tag includes, as the engine names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(SmolStr);

impl TemplateId {
    pub fn new(path: impl Into<SmolStr>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tag name with no template behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no template found for component '{name}'")]
pub struct NotFound {
    pub name: SmolStr,
}

impl NotFound {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self { name: name.into() }
    }
}

/// Maps a component name (the part after the tag prefix) to a template.
pub trait ComponentResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<TemplateId, NotFound>;
}

impl<F> ComponentResolver for F
where
    F: Fn(&str) -> Result<TemplateId, NotFound> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Result<TemplateId, NotFound> {
        self(name)
    }
}

/// Resolves names by convention inside a components directory.
///
/// `card` becomes `cotton/card.html`, `forms.text-input` becomes
/// `cotton/forms/text_input.html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryResolver {
    dir: SmolStr,
    extension: SmolStr,
}

impl Default for DirectoryResolver {
    fn default() -> Self {
        Self::new("cotton", "html")
    }
}

impl DirectoryResolver {
    pub fn new(dir: impl Into<SmolStr>, extension: impl Into<SmolStr>) -> Self {
        let dir: SmolStr = dir.into();
        let extension: SmolStr = extension.into();
        Self {
            dir: dir.trim_end_matches('/').into(),
            extension: extension.trim_start_matches('.').into(),
        }
    }

    /// Relative template path for a name, without the directory.
    pub fn relative_path(&self, name: &str) -> Option<String> {
        let mut segments = Vec::new();
        for segment in name.split('.') {
            if segment.is_empty() {
                return None;
            }
            segments.push(segment.replace('-', "_"));
        }
        Some(format!("{}.{}", segments.join("/"), self.extension))
    }
}

impl ComponentResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<TemplateId, NotFound> {
        let relative = self.relative_path(name).ok_or_else(|| NotFound::new(name))?;
        Ok(if self.dir.is_empty() {
            TemplateId::new(relative)
        } else {
            TemplateId::new(format!("{}/{}", self.dir, relative))
        })
    }
}

/// An explicit set of known components.
///
/// Lookups treat `-` and `_` alike, matching the directory convention.
#[derive(Debug, Clone, Default)]
pub struct RegistryResolver {
    entries: FxHashMap<SmolStr, TemplateId>,
}

impl RegistryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, template: TemplateId) -> &mut Self {
        self.entries.insert(normalize(name), template);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(SmolStr, TemplateId)> for RegistryResolver {
    fn from_iter<I: IntoIterator<Item = (SmolStr, TemplateId)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, template) in iter {
            registry.register(&name, template);
        }
        registry
    }
}

impl ComponentResolver for RegistryResolver {
    fn resolve(&self, name: &str) -> Result<TemplateId, NotFound> {
        self.entries
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| NotFound::new(name))
    }
}

fn normalize(name: &str) -> SmolStr {
    name.replace('_', "-").into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_resolver() {
        let resolver = DirectoryResolver::default();
        assert_eq!(resolver.resolve("card").unwrap().as_str(), "cotton/card.html");
        assert_eq!(
            resolver.resolve("forms.text-input").unwrap().as_str(),
            "cotton/forms/text_input.html"
        );
    }

    #[test]
    fn test_directory_resolver_custom_layout() {
        let resolver = DirectoryResolver::new("components/", ".jinja");
        assert_eq!(
            resolver.resolve("nav.item").unwrap().as_str(),
            "components/nav/item.jinja"
        );
        let flat = DirectoryResolver::new("", "html");
        assert_eq!(flat.resolve("card").unwrap().as_str(), "card.html");
    }

    #[test]
    fn test_empty_segment_is_not_found() {
        let resolver = DirectoryResolver::default();
        assert_eq!(resolver.resolve("a..b"), Err(NotFound::new("a..b")));
        assert!(resolver.resolve("trailing.").is_err());
    }

    #[test]
    fn test_registry_resolver() {
        let registry: RegistryResolver = [(
            SmolStr::new("text-input"),
            TemplateId::new("cotton/text_input.html"),
        )]
        .into_iter()
        .collect();
        assert_eq!(
            registry.resolve("text_input").unwrap().as_str(),
            "cotton/text_input.html"
        );
        assert_eq!(
            registry.resolve("text-input").unwrap().as_str(),
            "cotton/text_input.html"
        );
        let err = registry.resolve("missing").unwrap_err();
        assert_eq!(err.to_string(), "no template found for component 'missing'");
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| -> Result<TemplateId, NotFound> {
            Ok(TemplateId::new(format!("ui/{name}.html")))
        };
        assert_eq!(resolver.resolve("x").unwrap().as_str(), "ui/x.html");
    }
}
