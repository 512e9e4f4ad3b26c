//! # pdl-frontend: Protocol Description Language front-end
//!
//! Tokenizer, PEST grammar, AST construction and include resolution for PDL,
//! a small interface-definition language for inter-process message
//! protocols. The output is an immutable [`TranslationUnit`] tree for a code
//! generator to consume.
//!
//! ## PDL structure
//!
//! - **Preamble**: `include "foo.h";` (C++ include), `include protocol PFoo;`,
//!   `include Types;` (a `.pdlh` header), and `using` declarations binding a
//!   C++ type to a PDL name
//! - **Declarations**: `struct`, `union` and at most one `protocol`, optionally
//!   nested in `namespace` blocks
//! - **Messages**: direction labels (`parent:`, `child:`, `both:`), send
//!   semantics (`async`, `sync`, `intr`) with `nested(...)`/`prio(...)`
//!   qualifiers, parameter lists, `returns (...)`, and modifiers
//!
//! ## Example PDL
//!
//! ```text
//! include protocol PContent;
//! using class mozilla::dom::TabId from "mozilla/dom/TabMessageUtils.h";
//!
//! namespace mozilla {
//! namespace dom {
//!
//! sync protocol PBrowser {
//!   manager PContent;
//!   manages PColorPicker;
//!
//! parent:
//!   nested(inside_sync) sync SyncMessage(nsString msg) returns (bool ok);
//!   async Destroy();
//! child:
//!   prio(high) async Show(TabId tab, UniquePtr<Blob> blob) compress;
//! };
//!
//! }
//! }
//! ```
//!
//! ## Usage
//!
//! [`parse_file`] parses a root file and everything it includes; a
//! [`CompileContext`] can be reused to share the cache across several roots.

pub mod ast;
pub mod context;
pub mod dump;
pub mod error;
pub mod lexer;
pub mod parser;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use ast::{
    Direction, FileType, Loc, MessageDecl, MessageModifier, Nesting, Priority, Protocol,
    QualifiedId, SendSemantics, StructOrUnion, TranslationUnit, TypeSpec,
};
pub use context::CompileContext;
pub use dump::dump_translation_unit;
pub use error::PdlError;
pub use lexer::{tokenize, Token, TokenKind, Tokenizer};

/// Parse in-memory source as the root of a compile with no include directories
/// (includes are looked up in the working directory only).
pub fn parse(
    source: &str,
    filename: impl AsRef<Path>,
    filetype: FileType,
) -> Result<Arc<TranslationUnit>, PdlError> {
    CompileContext::new(Vec::<PathBuf>::new()).parse_source(source, filename, filetype)
}

/// Parse a root file from disk, searching `include_dirs` for its includes.
pub fn parse_file<I, P>(
    path: impl AsRef<Path>,
    filetype: FileType,
    include_dirs: I,
) -> Result<Arc<TranslationUnit>, PdlError>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    CompileContext::new(include_dirs).parse_file(path, filetype)
}
