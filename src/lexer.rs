//! Tokenizer for PDL source, driven by the lexical rules of the grammar.
//!
//! [`Tokenizer`] is a lazy, fused iterator: each call to `next` skips
//! whitespace and comments, then matches exactly one token. Line numbers are
//! counted from the skipped text, so a block comment spanning several lines
//! moves the following tokens down by the number of newlines it contains.
//! Words are matched with the identifier pattern and classified as reserved
//! by membership in [`RESERVED`].

use crate::ast::Loc;
use crate::error::PdlError;
use crate::parser::{PdlParser, Rule};
use pest::Parser;
use std::sync::Arc;

/// Reserved words. Must agree with the `kw_*` rules in `grammar.pest`.
pub const RESERVED: &[&str] = &[
    "async",
    "both",
    "child",
    "class",
    "compress",
    "compressall",
    "from",
    "include",
    "intr",
    "manager",
    "manages",
    "moveonly",
    "namespace",
    "nested",
    "nullable",
    "or",
    "parent",
    "prio",
    "protocol",
    "refcounted",
    "returns",
    "struct",
    "sync",
    "tainted",
    "union",
    "UniquePtr",
    "upto",
    "using",
    "verify",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Reserved,
    /// String literal; the token value excludes the quotes.
    Str,
    /// `::`
    ScopeOp,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    /// Byte offsets into the source.
    pub start: usize,
    pub end: usize,
}

pub struct Tokenizer<'a> {
    source: &'a str,
    file: Arc<str>,
    offset: usize,
    line: usize,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(file: impl Into<Arc<str>>, source: &'a str) -> Self {
        Tokenizer {
            source,
            file: file.into(),
            offset: 0,
            line: 1,
            done: false,
        }
    }

    /// Current line: that of the last token, or of the end of input once exhausted.
    pub fn line(&self) -> usize {
        self.line
    }

    fn skip_trivia(&mut self) {
        let rest = &self.source[self.offset..];
        let skipped = PdlParser::parse(Rule::trivia, rest)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .map(|pair| pair.as_str())
            .unwrap_or("");
        self.line += skipped.matches('\n').count();
        self.offset += skipped.len();
    }

    fn invalid_characters(&self, rest: &str) -> PdlError {
        let text: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
        PdlError::new(
            Loc::new(self.file.clone(), self.line),
            format!("lexically invalid characters `{}'", text),
        )
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, PdlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.skip_trivia();
        let source = self.source;
        let rest = &source[self.offset..];
        let token = PdlParser::parse(Rule::next_token, rest)
            .ok()
            .and_then(|mut pairs| pairs.next())
            .and_then(|pair| pair.into_inner().next());
        let Some(token) = token else {
            self.done = true;
            return Some(Err(self.invalid_characters(rest)));
        };

        let kind = match token.as_rule() {
            Rule::EOI => {
                self.done = true;
                return None;
            }
            Rule::scope_op => TokenKind::ScopeOp,
            Rule::punct => TokenKind::Punct,
            Rule::string => TokenKind::Str,
            Rule::word if is_reserved(token.as_str()) => TokenKind::Reserved,
            _ => TokenKind::Ident,
        };
        let text = token.as_str();
        let value = match kind {
            TokenKind::Str => text[1..text.len() - 1].to_string(),
            _ => text.to_string(),
        };
        let span = token.as_span();
        let start = self.offset + span.start();
        let end = self.offset + span.end();
        self.offset = end;
        Some(Ok(Token {
            kind,
            value,
            line: self.line,
            start,
            end,
        }))
    }
}

/// Tokenize a whole source, stopping at the first lexical error.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn tokenize(file: impl Into<Arc<str>>, source: &str) -> Result<Vec<Token>, PdlError> {
    Tokenizer::new(file, source).collect()
}
