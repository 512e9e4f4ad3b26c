//! Abstract Syntax Tree for the Protocol Description Language.
//!
//! Every node carries a [`Loc`]. A [`TranslationUnit`] is built once per file
//! and shared through [`Include`] edges as an `Arc`; nothing here is mutated
//! after the parser hands it out.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source position used for diagnostics. Line 0 stands for the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub file: Arc<str>,
    pub line: usize,
}

impl Loc {
    pub fn new(file: impl Into<Arc<str>>, line: usize) -> Self {
        Loc {
            file: file.into(),
            line,
        }
    }

    /// A location for errors about a file as a whole (e.g. it can't be read).
    pub fn whole_file(file: impl Into<Arc<str>>) -> Self {
        Loc::new(file, 0)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}", self.file, self.line)
        }
    }
}

/// Kind of a PDL source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `.pdlh`: structs, unions and `using` declarations only.
    Header,
    /// `.pdl`: may define one protocol.
    Protocol,
}

impl FileType {
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Header => "pdlh",
            FileType::Protocol => "pdl",
        }
    }

    /// File name an `include` of `name` refers to.
    pub fn file_name(self, name: &str) -> String {
        format!("{}.{}", name, self.extension())
    }

    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<FileType> {
        match path.extension()?.to_str()? {
            "pdlh" => Some(FileType::Header),
            "pdl" => Some(FileType::Protocol),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::Header => "header",
            FileType::Protocol => "protocol",
        })
    }
}

/// The AST of one parsed file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub loc: Loc,
    pub filename: PathBuf,
    pub filetype: FileType,
    pub name: String,
    pub namespaces: Vec<Namespace>,
    pub cxx_includes: Vec<CxxInclude>,
    pub includes: Vec<Include>,
    pub using_stmts: Vec<UsingStmt>,
    pub structs_and_unions: Vec<StructOrUnion>,
    pub protocol: Option<Protocol>,
}

impl TranslationUnit {
    pub fn new(loc: Loc, filename: PathBuf, filetype: FileType, name: String) -> Self {
        TranslationUnit {
            loc,
            filename,
            filetype,
            name,
            namespaces: Vec::new(),
            cxx_includes: Vec::new(),
            includes: Vec::new(),
            using_stmts: Vec::new(),
            structs_and_unions: Vec::new(),
            protocol: None,
        }
    }

    pub fn struct_or_union(&self, name: &str) -> Option<&StructOrUnion> {
        self.structs_and_unions.iter().find(|d| d.name() == name)
    }

    /// Every unit reachable through `include` edges, depth-first, each once.
    pub fn transitive_includes(&self) -> Vec<Arc<TranslationUnit>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        collect_includes(self, &mut seen, &mut out);
        out
    }
}

fn collect_includes(
    tu: &TranslationUnit,
    seen: &mut HashSet<PathBuf>,
    out: &mut Vec<Arc<TranslationUnit>>,
) {
    for inc in &tu.includes {
        if seen.insert(inc.unit.filename.clone()) {
            out.push(inc.unit.clone());
            collect_includes(&inc.unit, seen, out);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub loc: Loc,
    pub name: String,
}

impl Namespace {
    pub fn new(loc: Loc, name: impl Into<String>) -> Self {
        Namespace {
            loc,
            name: name.into(),
        }
    }
}

/// `include "header.h";`: recorded for the code generator only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxxInclude {
    pub loc: Loc,
    pub file: String,
}

/// `include protocol Foo;` or `include Foo;`, with the unit it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub loc: Loc,
    pub kind: FileType,
    pub name: String,
    pub file: String,
    pub unit: Arc<TranslationUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsingKind {
    Class,
    Struct,
}

/// `using [refcounted] [moveonly] [class|struct] a::B from "a/B.h";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingStmt {
    pub loc: Loc,
    pub refcounted: bool,
    pub moveonly: bool,
    pub kind: Option<UsingKind>,
    pub cxx_type: TypeSpec,
    pub header: String,
}

impl UsingStmt {
    /// The PDL-visible name (the terminal identifier of the C++ type).
    pub fn name(&self) -> &str {
        &self.cxx_type.spec.base_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub loc: Loc,
    pub name: String,
    pub namespaces: Vec<Namespace>,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub loc: Loc,
    pub type_spec: TypeSpec,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDecl {
    pub loc: Loc,
    pub name: String,
    pub namespaces: Vec<Namespace>,
    pub components: Vec<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructOrUnion {
    Struct(StructDecl),
    Union(UnionDecl),
}

impl StructOrUnion {
    pub fn name(&self) -> &str {
        match self {
            StructOrUnion::Struct(s) => &s.name,
            StructOrUnion::Union(u) => &u.name,
        }
    }

    pub fn loc(&self) -> &Loc {
        match self {
            StructOrUnion::Struct(s) => &s.loc,
            StructOrUnion::Union(u) => &u.loc,
        }
    }

    pub fn namespaces(&self) -> &[Namespace] {
        match self {
            StructOrUnion::Struct(s) => &s.namespaces,
            StructOrUnion::Union(u) => &u.namespaces,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendSemantics {
    Async,
    Sync,
    Intr,
}

impl SendSemantics {
    pub fn is_sync(self) -> bool {
        matches!(self, SendSemantics::Sync | SendSemantics::Intr)
    }
}

impl fmt::Display for SendSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SendSemantics::Async => "async",
            SendSemantics::Sync => "sync",
            SendSemantics::Intr => "intr",
        })
    }
}

/// Reentrancy level; the discriminant is the numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Nesting {
    #[default]
    NotNested = 1,
    InsideSync = 2,
    InsideCpow = 3,
}

impl Nesting {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Nesting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Nesting::NotNested => "not",
            Nesting::InsideSync => "inside_sync",
            Nesting::InsideCpow => "inside_cpow",
        })
    }
}

/// Scheduling priority; the discriminant is the numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[default]
    Normal = 1,
    Input = 2,
    High = 3,
    MediumHigh = 4,
}

impl Priority {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Normal => "normal",
            Priority::Input => "input",
            Priority::High => "high",
            Priority::MediumHigh => "mediumhigh",
        })
    }
}

/// Message direction relative to the parent side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `parent:` messages are received by the parent.
    In,
    /// `child:` messages are received by the child.
    Out,
    /// `both:`
    InOut,
}

impl Direction {
    pub fn is_in(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    pub fn is_out(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::In => "parent",
            Direction::Out => "child",
            Direction::InOut => "both",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageModifier {
    Verify,
    Compress,
    CompressAll,
    Tainted,
}

impl fmt::Display for MessageModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageModifier::Verify => "verify",
            MessageModifier::Compress => "compress",
            MessageModifier::CompressAll => "compressall",
            MessageModifier::Tainted => "tainted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    pub loc: Loc,
    pub name: String,
    pub namespaces: Vec<Namespace>,
    pub send_semantics: SendSemantics,
    /// Upper bound from `nested(upto ...)`.
    pub nested: Nesting,
    pub refcounted: bool,
    pub managers: Vec<Manager>,
    pub manages: Vec<ManagesStmt>,
    pub messages: Vec<MessageDecl>,
}

impl Protocol {
    pub fn message(&self, name: &str) -> Option<&MessageDecl> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// `ns1::ns2::Name`
    pub fn qualified_name(&self) -> String {
        self.namespaces
            .iter()
            .map(|ns| ns.name.as_str())
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join("::")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    pub loc: Loc,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagesStmt {
    pub loc: Loc,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDecl {
    pub loc: Loc,
    pub name: String,
    pub direction: Direction,
    pub send_semantics: SendSemantics,
    pub nested: Nesting,
    pub priority: Priority,
    pub in_params: Vec<Param>,
    pub out_params: Vec<Param>,
    /// In source order; duplicates are kept.
    pub modifiers: Vec<MessageModifier>,
}

impl MessageDecl {
    pub fn has_modifier(&self, modifier: MessageModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub loc: Loc,
    pub type_spec: TypeSpec,
    pub name: String,
}

/// A (possibly qualified) type reference with its PDL decorations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub loc: Loc,
    pub spec: QualifiedId,
    pub nullable: bool,
    pub array: bool,
    pub maybe: bool,
    pub uniqueptr: bool,
}

impl TypeSpec {
    pub fn new(loc: Loc, spec: QualifiedId) -> Self {
        TypeSpec {
            loc,
            spec,
            nullable: false,
            array: false,
            maybe: false,
            uniqueptr: false,
        }
    }

    pub fn basename(&self) -> &str {
        &self.spec.base_id
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("nullable ")?;
        }
        if self.uniqueptr {
            write!(f, "UniquePtr<{}>", self.spec)?;
        } else {
            write!(f, "{}", self.spec)?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        if self.maybe {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Namespace segments plus a terminal identifier. A template instance such
/// as `nsTArray<Foo>` is kept whole as the terminal identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedId {
    pub loc: Loc,
    pub quals: Vec<String>,
    pub base_id: String,
}

impl QualifiedId {
    pub fn new(loc: Loc, base_id: impl Into<String>) -> Self {
        QualifiedId {
            loc,
            quals: Vec::new(),
            base_id: base_id.into(),
        }
    }

    /// `a::B` qualified by `C` becomes `a::B::C`.
    pub fn qualify(&mut self, id: impl Into<String>) {
        let prev = std::mem::replace(&mut self.base_id, id.into());
        self.quals.push(prev);
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for q in &self.quals {
            write!(f, "{}::", q)?;
        }
        f.write_str(&self.base_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Loc {
        Loc::new("t.pdl", 1)
    }

    #[test]
    fn loc_display_omits_line_for_whole_file() {
        assert_eq!(Loc::new("a/PFoo.pdl", 12).to_string(), "a/PFoo.pdl:12");
        assert_eq!(Loc::whole_file("a/PFoo.pdl").to_string(), "a/PFoo.pdl");
    }

    #[test]
    fn qualify_moves_base_into_quals() {
        let mut q = QualifiedId::new(loc(), "mozilla");
        q.qualify("ipc");
        q.qualify("Shmem");
        assert_eq!(q.quals, vec!["mozilla".to_string(), "ipc".to_string()]);
        assert_eq!(q.base_id, "Shmem");
        assert_eq!(q.to_string(), "mozilla::ipc::Shmem");
    }

    #[test]
    fn type_spec_display_uses_pdl_syntax() {
        let mut t = TypeSpec::new(loc(), QualifiedId::new(loc(), "PFoo"));
        t.nullable = true;
        t.array = true;
        assert_eq!(t.to_string(), "nullable PFoo[]");

        let mut u = TypeSpec::new(loc(), QualifiedId::new(loc(), "Blob"));
        u.uniqueptr = true;
        assert_eq!(u.to_string(), "UniquePtr<Blob>");
    }

    #[test]
    fn levels_match_numeric_encoding() {
        assert_eq!(Nesting::NotNested.level(), 1);
        assert_eq!(Nesting::InsideCpow.level(), 3);
        assert_eq!(Priority::Normal.level(), 1);
        assert_eq!(Priority::MediumHigh.level(), 4);
        assert_eq!(Nesting::default(), Nesting::NotNested);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn file_type_from_extension() {
        assert_eq!(FileType::from_path(Path::new("a/PFoo.pdl")), Some(FileType::Protocol));
        assert_eq!(FileType::from_path(Path::new("Types.pdlh")), Some(FileType::Header));
        assert_eq!(FileType::from_path(Path::new("x.txt")), None);
        assert_eq!(FileType::Header.file_name("Types"), "Types.pdlh");
    }
}
