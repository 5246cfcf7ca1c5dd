//! Parser and loader for proto files.
//!
//! [`parse_source`] parses a single file into a shared reflection tree and
//! returns its import statements. [`load`] drives the whole front end:
//! it parses a set of entry files, resolves their imports against a list of
//! import-root directories, and finally resolves every type reference in the
//! tree. The result is a fully resolved [`protots_model::Root`] ready for
//! code generation.

mod loader;
mod parser;

pub use loader::{load, resolve_references, LoadError};
pub use parser::{parse_source, ParseError};

/// Options controlling how proto sources are parsed.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Preserve original field-name casing instead of converting to
    /// lowerCamelCase.
    pub keep_case: bool,
}
