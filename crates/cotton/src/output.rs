//! Output formatting for compile reports.

use crate::cli::OutputFormat;
use crate::diagnostic::CompileDiagnostic;
use crate::error::FileError;
use crate::orchestrator::{FileReport, RunResult};
use std::path::Path;

/// Formatter for report output.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a failed file.
    pub fn print_failure(&self, report: &FileReport, error: &FileError) {
        match self.format {
            OutputFormat::Human => println!("{}", self.format_human(report, error)),
            OutputFormat::HumanVerbose => {
                println!("{}", self.format_human(report, error));
                if let (FileError::Compile(err), Some(source)) = (error, &report.source) {
                    let diagnostic = CompileDiagnostic::new(err, source);
                    eprintln!("{:?}", miette::Report::new(diagnostic));
                }
            }
            OutputFormat::Json => println!("{}", self.format_json(report, error)),
            OutputFormat::Machine => println!("{}", self.format_machine(report, error)),
        }
    }

    /// Print a compiled file, in verbose human output only.
    pub fn print_compiled(&self, report: &FileReport, output: Option<&Path>) {
        if self.format != OutputFormat::HumanVerbose {
            return;
        }
        match output {
            Some(output) => println!(
                "\x1b[32mcompiled\x1b[0m {} -> {}",
                report.path.display(),
                output.display()
            ),
            None => println!("\x1b[32mok\x1b[0m {}", report.path.display()),
        }
    }

    /// Print the summary.
    pub fn print_summary(&self, result: &RunResult) {
        match self.format {
            OutputFormat::Human | OutputFormat::HumanVerbose => {
                self.print_summary_human(result);
            }
            OutputFormat::Json => {
                println!("{}", self.summary_json(result));
            }
            OutputFormat::Machine => {
                // No summary for machine format
            }
        }
    }

    // Human format

    fn format_human(&self, report: &FileReport, error: &FileError) -> String {
        let (line, col) = location(error);
        format!(
            "{}:{}:{}: \x1b[31merror\x1b[0m[{}]: {}",
            report.path.display(),
            line,
            col,
            error.code(),
            message(error)
        )
    }

    fn print_summary_human(&self, result: &RunResult) {
        println!();
        if result.error_count == 0 {
            println!(
                "\x1b[32m✓\x1b[0m Compiled {} file{} ({}ms)",
                result.file_count,
                if result.file_count == 1 { "" } else { "s" },
                result.duration_ms
            );
        } else {
            println!(
                "\x1b[31m✗\x1b[0m {} of {} file{} failed to compile",
                result.error_count,
                result.file_count,
                if result.file_count == 1 { "" } else { "s" }
            );
            println!("Time: {}ms", result.duration_ms);
        }
    }

    // JSON format

    fn format_json(&self, report: &FileReport, error: &FileError) -> serde_json::Value {
        let (line, column) = location(error);
        let span = match error {
            FileError::Compile(err) => serde_json::json!({
                "start": err.span.start,
                "end": err.span.end
            }),
            _ => serde_json::Value::Null,
        };
        serde_json::json!({
            "type": "error",
            "file": report.path.to_string_lossy(),
            "code": error.code(),
            "message": message(error),
            "line": line,
            "column": column,
            "span": span
        })
    }

    fn summary_json(&self, result: &RunResult) -> serde_json::Value {
        serde_json::json!({
            "type": "summary",
            "files": result.file_count,
            "errors": result.error_count,
            "written": result.written_count,
            "duration_ms": result.duration_ms
        })
    }

    // Machine format

    fn format_machine(&self, report: &FileReport, error: &FileError) -> String {
        let (line, col) = location(error);
        format!(
            "{}:{}:{}:error:{}:{}",
            report.path.display(),
            line,
            col,
            error.code(),
            message(error).replace(':', "\\:")
        )
    }
}

/// 1-based line and column of a compile error, `0:0` otherwise.
fn location(error: &FileError) -> (u32, u32) {
    match error {
        FileError::Compile(err) => err
            .location
            .map_or((0, 0), |loc| (loc.line + 1, loc.col + 1)),
        _ => (0, 0),
    }
}

/// The message without the location suffix, which reports print separately.
fn message(error: &FileError) -> String {
    match error {
        FileError::Compile(err) => err.message.clone(),
        other => other.to_string(),
    }
}
