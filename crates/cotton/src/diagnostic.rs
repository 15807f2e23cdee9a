//! Rendering compile errors as miette diagnostics with source snippets.

use cotton_compiler::{CompileError, CompileErrorCode};
use cotton_source::SourceText;
use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use std::fmt;
use thiserror::Error;

/// A compile error bound to the template it came from.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompileDiagnostic {
    message: String,
    code: CompileErrorCode,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl CompileDiagnostic {
    pub fn new(error: &CompileError, source: &SourceText) -> Self {
        let start = error.span.start as usize;
        Self {
            message: error.message.clone(),
            code: error.code,
            src: NamedSource::new(source.name(), source.text().to_owned()),
            span: SourceSpan::from((start, error.span.len() as usize)),
        }
    }

    fn label(&self) -> &'static str {
        match self.code {
            CompileErrorCode::MalformedTag => "malformed here",
            CompileErrorCode::UnmatchedTag => "unmatched tag",
            CompileErrorCode::UnresolvedComponent => "unknown component",
            CompileErrorCode::SourceTooLarge => "template starts here",
        }
    }
}

impl Diagnostic for CompileDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("cotton::{}", self.code.as_str())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self.code {
            CompileErrorCode::UnresolvedComponent => Some(Box::new(
                "add a template for it to the components directory, or run without --strict",
            )),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.label().to_owned()),
            self.span,
        ))))
    }
}
