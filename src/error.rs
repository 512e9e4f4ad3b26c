//! Diagnostics raised by the front-end.
//!
//! Lexical, syntax and semantic failures all surface as [`PdlError`]; only
//! the message text tells them apart.

use crate::ast::Loc;

/// A fatal diagnostic, with the chain of includes that led to the file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{loc}: error: {message}", include_trail(.included_from))]
pub struct PdlError {
    pub loc: Loc,
    pub message: String,
    /// Locations of the enclosing `include` statements, innermost first.
    pub included_from: Vec<Loc>,
}

impl PdlError {
    pub fn new(loc: Loc, message: impl Into<String>) -> Self {
        PdlError {
            loc,
            message: message.into(),
            included_from: Vec::new(),
        }
    }

    pub fn with_include_trail(mut self, trail: Vec<Loc>) -> Self {
        self.included_from = trail;
        self
    }
}

fn include_trail(locs: &[Loc]) -> String {
    locs.iter()
        .map(|loc| format!("  in file included from `{}', line {}:\n", loc.file, loc.line))
        .collect()
}
