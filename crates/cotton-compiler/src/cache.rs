//! Process-wide memoization of compiled templates.
//!
//! Entries are keyed by template name and validated by a fingerprint of the
//! compiler version, options, resolver and source text. A changed fingerprint replaces
//! the entry. Concurrent requests for the same entry share one compile.

use crate::{Compiler, VERSION};
use cotton_parser::CompileResult;
use cotton_source::SourceText;
use once_cell::sync::{Lazy, OnceCell};
use rustc_hash::{FxHashMap, FxHasher};
use smol_str::SmolStr;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Slot = Arc<OnceCell<CompileResult<Arc<str>>>>;

struct Entry {
    fingerprint: u64,
    slot: Slot,
}

/// Cache of compile results, safe to share between threads.
#[derive(Default)]
pub struct CompileCache {
    entries: Mutex<FxHashMap<SmolStr, Entry>>,
}

static GLOBAL: Lazy<CompileCache> = Lazy::new(CompileCache::new);

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> &'static CompileCache {
        &GLOBAL
    }

    /// Return the compiled form of `source`, compiling at most once per
    /// name and fingerprint.
    ///
    /// Errors are cached like successes, so a broken template is reported
    /// again without recompiling until its source changes.
    pub fn get_or_compile(
        &self,
        compiler: &Compiler,
        source: &SourceText,
    ) -> CompileResult<Arc<str>> {
        let fingerprint = fingerprint(compiler, source.text());
        let slot = {
            let mut entries = self.lock();
            match entries.get(source.name()) {
                Some(entry) if entry.fingerprint == fingerprint => {
                    tracing::trace!(template = source.name(), "compile cache hit");
                    entry.slot.clone()
                }
                _ => {
                    tracing::debug!(template = source.name(), "compile cache miss");
                    let slot = Slot::default();
                    entries.insert(
                        source.name().into(),
                        Entry {
                            fingerprint,
                            slot: slot.clone(),
                        },
                    );
                    slot
                }
            }
        };
        slot.get_or_init(|| compiler.compile(source).map(Arc::from))
            .clone()
    }

    /// Drop the entry for one template. Returns whether it existed.
    pub fn invalidate(&self, name: &str) -> bool {
        self.lock().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<SmolStr, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn fingerprint(compiler: &Compiler, text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    VERSION.hash(&mut hasher);
    compiler.options().hash(&mut hasher);
    compiler.resolver_id().hash(&mut hasher);
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{NotFound, RegistryResolver, TemplateId};
    use crate::{CompileErrorCode, CompileOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// A compiler whose resolver counts how often it runs.
    fn counting_compiler(calls: Arc<AtomicUsize>) -> Compiler {
        Compiler::new(CompileOptions::default()).with_resolver(
            move |name: &str| -> Result<TemplateId, NotFound> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(TemplateId::new(format!("cotton/{name}.html")))
            },
        )
    }

    #[test]
    fn test_hit_returns_same_output() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = counting_compiler(calls.clone());
        let cache = CompileCache::new();
        let source = SourceText::new("page.html", "<c-a />");

        let first = cache.get_or_compile(&compiler, &source).unwrap();
        let second = cache.get_or_compile(&compiler, &source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_changed_source_recompiles() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = counting_compiler(calls.clone());
        let cache = CompileCache::new();

        let v1 = cache
            .get_or_compile(&compiler, &SourceText::new("page.html", "<c-a />"))
            .unwrap();
        let v2 = cache
            .get_or_compile(&compiler, &SourceText::new("page.html", "<c-b />"))
            .unwrap();
        assert_ne!(v1, v2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_options_are_part_of_fingerprint() {
        let cache = CompileCache::new();
        let source = SourceText::new("page.html", "<x-a />");
        let plain = Compiler::default();
        let prefixed = Compiler::new(CompileOptions::default().with_prefix("x-"));

        let first = cache.get_or_compile(&plain, &source).unwrap();
        let second = cache.get_or_compile(&prefixed, &source).unwrap();
        assert_eq!(&*first, "<x-a />");
        assert_ne!(first, second);
    }

    #[test]
    fn test_new_resolver_recompiles() {
        let cache = CompileCache::new();
        let source = SourceText::new("page.html", "<c-card />");
        let strict = || Compiler::new(CompileOptions::default().with_strict_components(true));

        let missing = strict().with_resolver(RegistryResolver::new());
        let err = cache.get_or_compile(&missing, &source).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::UnresolvedComponent);

        let registry: RegistryResolver =
            [(SmolStr::new("card"), TemplateId::new("cotton/card.html"))]
                .into_iter()
                .collect();
        let found = strict().with_resolver(registry);
        assert_eq!(
            &*cache.get_or_compile(&found, &source).unwrap(),
            r#"{% comp "cotton/card.html" only %}{% endcomp %}"#
        );
        assert_eq!(cache.len(), 1);

        let clone = found.clone();
        let first = cache.get_or_compile(&found, &source).unwrap();
        let second = cache.get_or_compile(&clone, &source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_errors_are_cached() {
        let cache = CompileCache::new();
        let source = SourceText::new("bad.html", "<c-a>");
        let compiler = Compiler::default();
        let err = cache.get_or_compile(&compiler, &source).unwrap_err();
        assert_eq!(cache.get_or_compile(&compiler, &source).unwrap_err(), err);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = counting_compiler(calls.clone());
        let cache = CompileCache::new();
        let source = SourceText::new("page.html", "<c-a />");

        cache.get_or_compile(&compiler, &source).unwrap();
        assert!(cache.invalidate("page.html"));
        assert!(!cache.invalidate("page.html"));
        cache.get_or_compile(&compiler, &source).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_requests_compile_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let compiler = Arc::new(counting_compiler(calls.clone()));
        let cache = Arc::new(CompileCache::new());
        let source = SourceText::new("page.html", "<c-a /><c-b />");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let compiler = compiler.clone();
                let cache = cache.clone();
                let source = source.clone();
                thread::spawn(move || cache.get_or_compile(&compiler, &source).unwrap())
            })
            .collect();
        let outputs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(std::ptr::eq(CompileCache::global(), CompileCache::global()));
    }
}
