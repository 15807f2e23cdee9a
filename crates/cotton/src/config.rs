//! Configuration loading and management.

use crate::cli::Args;
use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the workspace root.
pub const CONFIG_FILE: &str = "cotton.json";

/// Contents of `cotton.json`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub components_dir: Option<String>,
    pub extension: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub ignore: Vec<String>,
    pub strict: Option<bool>,
}

impl FileConfig {
    /// Read and parse a config file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Configuration for a compile run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Templates root; template names are relative to it.
    pub workspace: PathBuf,
    /// The config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    /// Components directory, relative to the workspace.
    pub components_dir: String,
    /// Template extension without the dot.
    pub extension: String,
    /// Where compiled templates are written.
    pub out_dir: PathBuf,
    pub strict: bool,
    /// Ignore patterns, matched against workspace-relative paths.
    pub ignore_patterns: Vec<String>,
    ignore: GlobSet,
}

impl Config {
    /// Load configuration from CLI arguments and workspace.
    pub fn load(workspace: &Path, args: &Args) -> Result<Self, ConfigError> {
        let config_path = args.config.clone().or_else(|| {
            let default = workspace.join(CONFIG_FILE);
            default.is_file().then_some(default)
        });
        let file = match &config_path {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };

        let components_dir = args
            .components_dir
            .clone()
            .or(file.components_dir)
            .unwrap_or_else(|| "cotton".to_string());
        let extension = args
            .extension
            .clone()
            .or(file.extension)
            .unwrap_or_else(|| "html".to_string())
            .trim_start_matches('.')
            .to_string();
        let out_dir = args
            .out_dir
            .clone()
            .or(file.out_dir)
            .unwrap_or_else(|| PathBuf::from("compiled"));
        let out_dir = if out_dir.is_absolute() {
            out_dir
        } else {
            workspace.join(out_dir)
        };

        let mut ignore_patterns = vec![
            "**/node_modules/**".to_string(),
            "**/.git/**".to_string(),
        ];
        ignore_patterns.extend(file.ignore);
        ignore_patterns.extend(args.ignore.iter().cloned());
        let ignore = build_globset(&ignore_patterns)?;

        Ok(Self {
            workspace: workspace.to_path_buf(),
            config_path,
            components_dir: components_dir.trim_matches('/').to_string(),
            extension,
            out_dir,
            strict: args.strict || file.strict.unwrap_or(false),
            ignore_patterns,
            ignore,
        })
    }

    /// Check if a file should be compiled.
    pub fn should_process(&self, path: &Path) -> bool {
        if path.extension().map_or(true, |ext| ext != self.extension.as_str()) {
            return false;
        }
        if path.starts_with(&self.out_dir) {
            return false;
        }
        match path.strip_prefix(&self.workspace) {
            Ok(relative) => !self.ignore.is_match(relative),
            Err(_) => false,
        }
    }

    /// Absolute path of the components directory.
    pub fn components_path(&self) -> PathBuf {
        self.workspace.join(&self.components_dir)
    }

    /// Where the compiled form of a workspace-relative template goes.
    pub fn output_path(&self, relative: &Path) -> PathBuf {
        self.out_dir.join(relative)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}

/// Template name for a workspace-relative path, with `/` separators.
pub fn template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("cotton").chain(extra.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path(), &args(&[])).unwrap();
        assert_eq!(config.components_dir, "cotton");
        assert_eq!(config.extension, "html");
        assert_eq!(config.out_dir, dir.path().join("compiled"));
        assert!(!config.strict);
        assert_eq!(config.config_path, None);
    }

    #[test]
    fn test_file_values_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "components_dir": "ui/", "extension": ".jinja", "out_dir": "build", "strict": true, "ignore": ["drafts/**"] }"#,
        )
        .unwrap();

        let config = Config::load(dir.path(), &args(&[])).unwrap();
        assert_eq!(config.components_dir, "ui");
        assert_eq!(config.extension, "jinja");
        assert_eq!(config.out_dir, dir.path().join("build"));
        assert!(config.strict);
        assert!(config.ignore_patterns.contains(&"drafts/**".to_string()));

        let config = Config::load(dir.path(), &args(&["--extension", "html", "-o", "/tmp/out"])).unwrap();
        assert_eq!(config.extension, "html");
        assert_eq!(config.out_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "prefix": "x-" }"#).unwrap();
        let err = Config::load(dir.path(), &args(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_glob() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path(), &args(&["--ignore", "a[b"])).unwrap_err();
        assert!(matches!(err, ConfigError::Glob { ref pattern, .. } if pattern == "a[b"));
    }

    #[test]
    fn test_should_process() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let config = Config::load(root, &args(&["--ignore", "drafts/**"])).unwrap();

        assert!(config.should_process(&root.join("index.html")));
        assert!(config.should_process(&root.join("cotton/card.html")));
        assert!(!config.should_process(&root.join("notes.txt")));
        assert!(!config.should_process(&root.join("drafts/old.html")));
        assert!(!config.should_process(&root.join("a/node_modules/x.html")));
        assert!(!config.should_process(&root.join("compiled/index.html")));
        assert!(!config.should_process(Path::new("/elsewhere/index.html")));
    }

    #[test]
    fn test_template_name() {
        assert_eq!(template_name(Path::new("pages/home/index.html")), "pages/home/index.html");
        assert_eq!(template_name(Path::new("index.html")), "index.html");
    }
}
