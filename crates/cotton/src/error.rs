//! Error types for the command-line tool.

use cotton_compiler::CompileError;
use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load `cotton.json` or the command-line overrides.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(cotton::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(
        code(cotton::config::parse),
        help("known keys are components_dir, extension, out_dir, ignore and strict")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid ignore pattern '{pattern}'")]
    #[diagnostic(code(cotton::config::ignore))]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Failure to compile one template file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl FileError {
    /// Stable code for reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Read { .. } | Self::Write { .. } => "io",
            Self::Compile(err) => err.code.as_str(),
        }
    }
}
