//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Cotton component compiler - rewrites component tags into template directives
#[derive(Parser, Debug, Clone)]
#[command(name = "cotton")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Templates directory to compile
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Path to cotton.json
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory compiled templates are written to
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Components directory, relative to the workspace
    #[arg(long)]
    pub components_dir: Option<String>,

    /// Template file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Only check that templates compile, write nothing
    #[arg(long)]
    pub check: bool,

    /// Recompile when templates change
    #[arg(long)]
    pub watch: bool,

    /// Output format
    #[arg(long, default_value = "human")]
    pub output: OutputFormat,

    /// Fail on components with no template in the components directory
    #[arg(long)]
    pub strict: bool,

    /// Ignore patterns (glob)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Show timing information
    #[arg(long)]
    pub timings: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long)]
    pub preserve_watch_output: bool,
}

/// Output format for compile reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// Human-readable with source snippets
    HumanVerbose,
    /// JSON lines
    Json,
    /// Machine-readable output
    Machine,
}

impl Args {
    /// Check if output should be verbose.
    pub fn is_verbose(&self) -> bool {
        self.verbose || matches!(self.output, OutputFormat::HumanVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["cotton"]);
        assert_eq!(args.output, OutputFormat::Human);
        assert!(!args.check && !args.watch && !args.strict);
        assert!(!args.is_verbose());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "cotton",
            "-w",
            "templates",
            "--check",
            "--strict",
            "--output",
            "human-verbose",
            "--ignore",
            "**/drafts/**",
            "--ignore",
            "legacy/*",
        ]);
        assert_eq!(args.workspace, Some(PathBuf::from("templates")));
        assert!(args.check && args.strict);
        assert!(args.is_verbose());
        assert_eq!(args.ignore, vec!["**/drafts/**", "legacy/*"]);
    }
}
