//! Orchestrator for compile runs.

use crate::cli::Args;
use crate::config::{template_name, Config};
use crate::error::FileError;
use crate::output::OutputFormatter;
use cotton_compiler::{
    CompileCache, CompileOptions, Compiler, ComponentResolver, DirectoryResolver,
    RegistryResolver, TemplateId,
};
use cotton_source::SourceText;
use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Result of a compile run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Number of templates compiled.
    pub file_count: usize,
    /// Number of templates that failed.
    pub error_count: usize,
    /// Number of compiled files written.
    pub written_count: usize,
    /// Time taken.
    pub duration_ms: u64,
}

/// Outcome for one template.
#[derive(Debug)]
pub struct FileReport {
    /// Workspace-relative path.
    pub path: PathBuf,
    /// The source, when it could be read.
    pub source: Option<SourceText>,
    /// Where the output was written; `None` in check mode.
    pub result: std::result::Result<Option<PathBuf>, FileError>,
}

/// Orchestrator for running cotton.
pub struct Orchestrator {
    config: Config,
    args: Args,
    formatter: OutputFormatter,
    compiler: Compiler,
    cache: &'static CompileCache,
}

impl Orchestrator {
    /// Create a new orchestrator.
    pub fn new(workspace: PathBuf, args: Args) -> Result<Self> {
        let config = Config::load(&workspace, &args)?;
        let formatter = OutputFormatter::new(args.output);
        let compiler = build_compiler(&config);

        Ok(Self {
            config,
            args,
            formatter,
            compiler,
            cache: CompileCache::global(),
        })
    }

    /// Compile every template once and report.
    pub fn run_once(&mut self) -> Result<RunResult> {
        let start = Instant::now();

        let files = self.find_templates();
        tracing::debug!(count = files.len(), workspace = %self.config.workspace.display(), "found templates");

        let mut reports: Vec<FileReport> = files
            .par_iter()
            .map(|file| self.compile_file(file))
            .collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        let mut result = RunResult {
            file_count: reports.len(),
            ..RunResult::default()
        };
        for report in &reports {
            match &report.result {
                Ok(output) => {
                    if output.is_some() {
                        result.written_count += 1;
                    }
                    self.formatter.print_compiled(report, output.as_deref());
                }
                Err(err) => {
                    result.error_count += 1;
                    self.formatter.print_failure(report, err);
                }
            }
        }
        result.duration_ms = start.elapsed().as_millis() as u64;

        if self.args.timings {
            eprintln!("\nTiming: {}ms", result.duration_ms);
        }

        self.formatter.print_summary(&result);

        Ok(result)
    }

    /// Run in watch mode.
    pub fn run_watch_mode(&mut self) -> Result<()> {
        use notify::{Config as NotifyConfig, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::sync::mpsc::channel;
        use std::time::Duration;

        eprintln!("Starting watch mode...\n");

        self.run_once()?;

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
        )
        .into_diagnostic()?;

        watcher
            .watch(&self.config.workspace, RecursiveMode::Recursive)
            .into_diagnostic()?;

        loop {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    let changed: Vec<&PathBuf> = event
                        .paths
                        .iter()
                        .filter(|p| self.config.should_process(p))
                        .collect();
                    if changed.is_empty() {
                        continue;
                    }
                    tracing::debug!(paths = ?changed, kind = ?event.kind, "templates changed");

                    if matches!(event.kind, EventKind::Remove(_)) {
                        for path in &changed {
                            if let Ok(relative) = path.strip_prefix(&self.config.workspace) {
                                self.cache.invalidate(&template_name(relative));
                            }
                        }
                    }
                    let components = self.config.components_path();
                    if self.config.strict && changed.iter().any(|p| p.starts_with(&components)) {
                        self.reload_components();
                    }

                    if !self.args.preserve_watch_output {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    eprintln!("File change detected. Recompiling...\n");
                    self.run_once()?;
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Rebuild the compiler after the components directory changed. Its new
    /// resolver changes the fingerprint of every cached template.
    fn reload_components(&mut self) {
        self.compiler = build_compiler(&self.config);
    }

    /// Find all templates in the workspace.
    fn find_templates(&self) -> Vec<PathBuf> {
        walkdir::WalkDir::new(&self.config.workspace)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.path() != self.config.out_dir)
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.config.should_process(path))
            .collect()
    }

    /// Compile a single template through the cache.
    fn compile_file(&self, path: &Path) -> FileReport {
        let relative = path
            .strip_prefix(&self.config.workspace)
            .unwrap_or(path)
            .to_path_buf();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                return FileReport {
                    path: relative,
                    source: None,
                    result: Err(FileError::Read {
                        path: path.to_path_buf(),
                        source,
                    }),
                }
            }
        };

        let source = SourceText::new(template_name(&relative), text);
        let result = self
            .cache
            .get_or_compile(&self.compiler, &source)
            .map_err(FileError::from)
            .and_then(|compiled| self.write_output(&relative, &compiled));

        FileReport {
            path: relative,
            source: Some(source),
            result,
        }
    }

    fn write_output(
        &self,
        relative: &Path,
        compiled: &str,
    ) -> std::result::Result<Option<PathBuf>, FileError> {
        if self.args.check {
            return Ok(None);
        }
        let output = self.config.output_path(relative);
        let write_error = |source| FileError::Write {
            path: output.clone(),
            source,
        };
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&output, compiled).map_err(write_error)?;
        Ok(Some(output))
    }
}

/// Compiler for a configuration: the directory convention, or the set of
/// existing component templates in strict mode.
fn build_compiler(config: &Config) -> Compiler {
    let options = CompileOptions::default().with_strict_components(config.strict);
    let resolver: Arc<dyn ComponentResolver> = if config.strict {
        let registry = component_registry(config);
        tracing::debug!(components = registry.len(), "built component registry");
        Arc::new(registry)
    } else {
        Arc::new(DirectoryResolver::new(
            config.components_dir.as_str(),
            config.extension.as_str(),
        ))
    };
    Compiler::new(options).with_shared_resolver(resolver)
}

/// Register every template under the components directory.
///
/// `forms/text_input.html` registers `forms.text_input`, which the registry
/// also matches as `forms.text-input`.
fn component_registry(config: &Config) -> RegistryResolver {
    let root = config.components_path();
    if !root.is_dir() {
        tracing::warn!(dir = %root.display(), "components directory not found");
        return RegistryResolver::new();
    }

    walkdir::WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext == config.extension.as_str())
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(&root).ok()?;
            let stem = relative.with_extension("");
            let name = template_name(&stem).replace('/', ".");
            let template = format!("{}/{}", config.components_dir, template_name(relative));
            Some((SmolStr::new(name), TemplateId::new(template)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn args(workspace: &Path, extra: &[&str]) -> Args {
        let workspace = workspace.to_string_lossy().into_owned();
        let mut argv = vec!["cotton".to_string(), "-w".to_string(), workspace];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::parse_from(argv)
    }

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn run(root: &Path, extra: &[&str]) -> RunResult {
        let mut orchestrator = Orchestrator::new(root.to_path_buf(), args(root, extra)).unwrap();
        orchestrator.run_once().unwrap()
    }

    #[test]
    fn test_compiles_tree_into_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "cotton/card.html", "<c-vars title />\n<div>{{ title }}</div>");
        write(root, "pages/index.html", "<c-card title=\"Home\">Hi</c-card>");
        write(root, "notes.txt", "<c-card />");

        let result = run(root, &[]);
        assert_eq!(result.file_count, 2);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.written_count, 2);

        let page = fs::read_to_string(root.join("compiled/pages/index.html")).unwrap();
        assert_eq!(
            page,
            r#"{% comp "cotton/card.html" with title="Home" only %}{% slot slot %}Hi{% endslot %}{% endcomp %}"#
        );
        let card = fs::read_to_string(root.join("compiled/cotton/card.html")).unwrap();
        assert_eq!(
            card,
            "{% vars title=\"\" %}\n<div>{{ title }}</div>{% endvars %}"
        );
        assert!(!root.join("compiled/notes.txt").exists());
    }

    #[test]
    fn test_second_run_skips_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.html", "<c-a />");

        let mut orchestrator = Orchestrator::new(root.to_path_buf(), args(root, &[])).unwrap();
        assert_eq!(orchestrator.run_once().unwrap().file_count, 1);
        assert_eq!(orchestrator.run_once().unwrap().file_count, 1);
        assert!(root.join("compiled/index.html").exists());
        assert!(!root.join("compiled/compiled").exists());
    }

    #[test]
    fn test_check_mode_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.html", "<c-a />");

        let result = run(root, &["--check"]);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.written_count, 0);
        assert!(!root.join("compiled").exists());
    }

    #[test]
    fn test_failures_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "good.html", "<c-a />");
        write(root, "bad.html", "<c-a>");

        let result = run(root, &["--output", "machine"]);
        assert_eq!(result.file_count, 2);
        assert_eq!(result.error_count, 1);
        assert!(root.join("compiled/good.html").exists());
        assert!(!root.join("compiled/bad.html").exists());
    }

    #[test]
    fn test_strict_mode_uses_components_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "cotton/forms/text_input.html", "<input>");
        write(root, "ok.html", "<c-forms.text-input />");
        write(root, "missing.html", "<c-forms.select />");

        let result = run(root, &["--strict", "--check", "--output", "json"]);
        assert_eq!(result.file_count, 3);
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn test_strict_mode_sees_component_added_later() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "page.html", "<c-card />");

        let mut orchestrator = Orchestrator::new(
            root.to_path_buf(),
            args(root, &["--strict", "--check", "--output", "machine"]),
        )
        .unwrap();
        assert_eq!(orchestrator.run_once().unwrap().error_count, 1);

        write(root, "cotton/card.html", "<div></div>");
        orchestrator.reload_components();
        let result = orchestrator.run_once().unwrap();
        assert_eq!(result.file_count, 2);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn test_component_registry() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "cotton/card.html", "");
        write(root, "cotton/forms/text_input.html", "");
        write(root, "cotton/readme.md", "");

        let config = Config::load(root, &args(root, &[])).unwrap();
        let registry = component_registry(&config);
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.resolve("forms.text-input").unwrap().as_str(),
            "cotton/forms/text_input.html"
        );
        assert_eq!(registry.resolve("card").unwrap().as_str(), "cotton/card.html");
    }
}
