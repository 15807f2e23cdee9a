//! Scanner and attribute parser for cotton component templates.
//!
//! A template is ordinary HTML mixed with host-engine syntax (`{% %}`,
//! `{{ }}`, `{# #}`) and component tags (`<c-card title="x">...</c-card>`).
//! This crate turns such text into a stream of [`Token`]s without touching
//! anything that is not a component tag.

pub mod attributes;
pub mod cursor;
pub mod error;
pub mod scanner;
pub mod token;

pub use attributes::{
    parse_attribute_list, AttributeMap, AttributeValue, ParsedAttributes, ValueKind,
};
pub use error::{CompileError, CompileErrorCode, CompileResult};
pub use scanner::{scan, Scanner, DEFAULT_PREFIX};
pub use token::{CloseTag, HostTag, HostTagKind, OpenTag, Token};

/// Fail for a template of `len` bytes whose offsets would not fit in a span.
pub fn check_source_len(len: usize) -> CompileResult<()> {
    if len > cotton_source::MAX_SOURCE_LEN {
        return Err(CompileError::source_too_large(len));
    }
    Ok(())
}

/// Scan a whole template into tokens, stopping at the first error.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    check_source_len(source.len())?;
    scan(source).collect()
}
