//! Parse PDL source into a [`TranslationUnit`] using PEST.
//!
//! The preamble is parsed and its includes resolved first, so diagnostics
//! come out in source order. The grammar then validates the whole file and
//! the `build_*` functions walk the parse tree bottom-up, applying the
//! semantic rules (direction tracking, qualifier merging, one protocol per
//! file).

use crate::ast::*;
use crate::context::CompileContext;
use crate::error::PdlError;
use crate::lexer::{TokenKind, Tokenizer};
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;
use std::sync::Arc;

/// Deepest `{` nesting accepted. The grammar recurses once per level.
pub const MAX_NESTING: usize = 64;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub(crate) struct PdlParser;

/// Preamble statements, in source order.
enum PreambleStmt {
    CxxInclude(CxxInclude),
    Include(Include),
    Using(UsingStmt),
}

/// Declarations that may appear inside `namespace { }` blocks.
enum NamespacedItem {
    Struct(StructDecl),
    Union(UnionDecl),
    Protocol(Protocol),
}

impl NamespacedItem {
    /// Namespaces are prepended as the enclosing blocks unwind, so the
    /// outermost ends up first.
    fn add_outer_namespace(&mut self, namespace: Namespace) {
        let namespaces = match self {
            NamespacedItem::Struct(s) => &mut s.namespaces,
            NamespacedItem::Union(u) => &mut u.namespaces,
            NamespacedItem::Protocol(p) => &mut p.namespaces,
        };
        namespaces.insert(0, namespace);
    }
}

/// Parse one file's source. Includes are resolved through `ctx`.
pub(crate) fn parse_unit(
    ctx: &mut CompileContext,
    source: &str,
    path: &Path,
    filetype: FileType,
) -> Result<TranslationUnit, PdlError> {
    let mut parser = FileParser {
        ctx,
        file: path.display().to_string().into(),
        filetype,
        line_starts: line_starts(source),
    };
    let preamble = match PdlParser::parse(Rule::preamble_prefix, source) {
        Ok(mut pairs) => pairs
            .next()
            .and_then(|prefix| prefix.into_inner().find(|p| p.as_rule() == Rule::preamble))
            .ok_or_else(|| parser.error(parser.loc_at(1), "empty parse"))?,
        Err(e) => return Err(parser.syntax_error(source, &e)),
    };
    let preamble = parser.build_preamble(preamble)?;

    parser.check_nesting(source)?;
    let pair = match PdlParser::parse(Rule::translation_unit, source) {
        Ok(mut pairs) => pairs
            .next()
            .ok_or_else(|| parser.error(parser.loc_at(1), "empty parse"))?,
        Err(e) => return Err(parser.syntax_error(source, &e)),
    };
    parser.build_translation_unit(pair, path, preamble)
}

/// Byte offset at which each line starts.
fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

struct FileParser<'a> {
    ctx: &'a mut CompileContext,
    file: Arc<str>,
    filetype: FileType,
    line_starts: Vec<usize>,
}

impl FileParser<'_> {
    fn loc_at(&self, line: usize) -> Loc {
        Loc::new(self.file.clone(), line)
    }

    fn loc(&self, pair: &Pair<Rule>) -> Loc {
        let offset = pair.as_span().start();
        self.loc_at(self.line_starts.partition_point(|&start| start <= offset))
    }

    fn error(&self, loc: Loc, message: impl Into<String>) -> PdlError {
        self.ctx.error(loc, message)
    }

    /// Map a grammar failure onto the token it happened at. A lexical error
    /// at or before that point takes precedence.
    fn syntax_error(&self, source: &str, err: &pest::error::Error<Rule>) -> PdlError {
        let offset = match err.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let mut tokens = Tokenizer::new(self.file.clone(), source);
        for token in tokens.by_ref() {
            match token {
                Ok(token) if token.end <= offset => {}
                Ok(token) => {
                    return self.error(
                        self.loc_at(token.line),
                        format!("bad syntax near `{}'", token.value),
                    )
                }
                Err(lexical) => return lexical.with_include_trail(self.ctx.include_trail()),
            }
        }
        self.error(self.loc_at(tokens.line()), "bad syntax near end of file")
    }

    /// Reject `{` nesting deeper than [`MAX_NESTING`] before the recursive
    /// grammar runs. Lexical errors are left for the grammar to report.
    fn check_nesting(&self, source: &str) -> Result<(), PdlError> {
        let mut depth = 0usize;
        for token in Tokenizer::new(self.file.clone(), source) {
            let Ok(token) = token else { break };
            if token.kind != TokenKind::Punct {
                continue;
            }
            match token.value.as_str() {
                "{" => {
                    depth += 1;
                    if depth > MAX_NESTING {
                        return Err(self.error(
                            self.loc_at(token.line),
                            format!("declarations nested more than {} levels deep", MAX_NESTING),
                        ));
                    }
                }
                "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        Ok(())
    }

    fn build_translation_unit(
        &mut self,
        pair: Pair<Rule>,
        path: &Path,
        preamble: Vec<PreambleStmt>,
    ) -> Result<TranslationUnit, PdlError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut tu = TranslationUnit::new(self.loc_at(1), path.to_path_buf(), self.filetype, name);
        for stmt in preamble {
            match stmt {
                PreambleStmt::CxxInclude(inc) => tu.cxx_includes.push(inc),
                PreambleStmt::Include(inc) => tu.includes.push(inc),
                PreambleStmt::Using(using) => tu.using_stmts.push(using),
            }
        }

        // The preamble pair was already built above.
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::namespaced_stuff => {
                    for thing in self.build_namespaced_stuff(inner)? {
                        match thing {
                            NamespacedItem::Struct(s) => {
                                tu.structs_and_unions.push(StructOrUnion::Struct(s))
                            }
                            NamespacedItem::Union(u) => {
                                tu.structs_and_unions.push(StructOrUnion::Union(u))
                            }
                            NamespacedItem::Protocol(p) => {
                                if tu.protocol.is_some() {
                                    return Err(
                                        self.error(p.loc, "only one protocol definition per file")
                                    );
                                }
                                tu.protocol = Some(p);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // The unit's canonical namespace: the protocol's, or for headers the
        // namespace of the last struct or union declared.
        if let Some(protocol) = &tu.protocol {
            tu.namespaces = protocol.namespaces.clone();
            tu.name = protocol.name.clone();
        } else if let Some(last) = tu.structs_and_unions.last() {
            tu.namespaces = last.namespaces().to_vec();
        }
        Ok(tu)
    }

    // ==================== Preamble ====================

    fn build_preamble(&mut self, pair: Pair<Rule>) -> Result<Vec<PreambleStmt>, PdlError> {
        let mut stmts = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::cxx_include_stmt => {
                    let loc = self.loc(&inner);
                    let file = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::string)
                        .map(|p| string_value(&p))
                        .ok_or_else(|| self.error(loc.clone(), "include: missing file name"))?;
                    stmts.push(PreambleStmt::CxxInclude(CxxInclude { loc, file }));
                }
                Rule::include_stmt => stmts.push(PreambleStmt::Include(self.build_include(inner)?)),
                Rule::using_stmt => stmts.push(PreambleStmt::Using(self.build_using(inner)?)),
                _ => {}
            }
        }
        Ok(stmts)
    }

    fn build_include(&mut self, pair: Pair<Rule>) -> Result<Include, PdlError> {
        let loc = self.loc(&pair);
        let mut kind = FileType::Header;
        let mut name = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_protocol => kind = FileType::Protocol,
                Rule::ident => name = inner.as_str().to_string(),
                _ => {}
            }
        }
        let file = kind.file_name(&name);
        let path = self
            .ctx
            .resolve_include_path(&file)
            .ok_or_else(|| self.error(loc.clone(), format!("can't locate include file `{}'", file)))?;
        let unit = self.ctx.parse_included(path, kind, loc.clone())?;
        Ok(Include {
            loc,
            kind,
            name,
            file,
            unit,
        })
    }

    fn build_using(&self, pair: Pair<Rule>) -> Result<UsingStmt, PdlError> {
        let loc = self.loc(&pair);
        let mut refcounted = false;
        let mut moveonly = false;
        let mut kind = None;
        let mut cxx_type = None;
        let mut header = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_refcounted => refcounted = true,
                Rule::kw_moveonly => moveonly = true,
                Rule::using_kind => {
                    kind = Some(match inner.as_str() {
                        "class" => UsingKind::Class,
                        _ => UsingKind::Struct,
                    })
                }
                Rule::cxx_type => cxx_type = Some(self.build_cxx_type(inner)?),
                Rule::string => header = Some(string_value(&inner)),
                _ => {}
            }
        }
        Ok(UsingStmt {
            cxx_type: cxx_type.ok_or_else(|| self.error(loc.clone(), "using: missing type"))?,
            header: header.ok_or_else(|| self.error(loc.clone(), "using: missing header"))?,
            loc,
            refcounted,
            moveonly,
            kind,
        })
    }

    /// `a::b::C<D>`: each `::` segment folds the previous terminal into the
    /// namespace chain.
    fn build_cxx_type(&self, pair: Pair<Rule>) -> Result<TypeSpec, PdlError> {
        let loc = self.loc(&pair);
        let mut qid: Option<QualifiedId> = None;
        for inner in pair.into_inner() {
            if inner.as_rule() != Rule::cxx_id {
                continue;
            }
            let id = cxx_id_text(inner);
            match qid.as_mut() {
                Some(q) => q.qualify(id),
                None => qid = Some(QualifiedId::new(loc.clone(), id)),
            }
        }
        let qid = qid.ok_or_else(|| self.error(loc.clone(), "missing C++ type name"))?;
        Ok(TypeSpec::new(loc, qid))
    }

    // ==================== Namespaced declarations ====================

    fn build_namespaced_stuff(&mut self, pair: Pair<Rule>) -> Result<Vec<NamespacedItem>, PdlError> {
        let mut things = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::namespace_block => things.extend(self.build_namespace_block(inner)?),
                Rule::struct_decl => things.push(NamespacedItem::Struct(self.build_struct(inner)?)),
                Rule::union_decl => things.push(NamespacedItem::Union(self.build_union(inner)?)),
                Rule::protocol_defn => {
                    things.push(NamespacedItem::Protocol(self.build_protocol(inner)?))
                }
                _ => {}
            }
        }
        Ok(things)
    }

    fn build_namespace_block(&mut self, pair: Pair<Rule>) -> Result<Vec<NamespacedItem>, PdlError> {
        let loc = self.loc(&pair);
        let mut namespace = None;
        let mut things = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => namespace = Some(Namespace::new(loc.clone(), inner.as_str())),
                Rule::namespaced_stuff => things = self.build_namespaced_stuff(inner)?,
                _ => {}
            }
        }
        let namespace = namespace.ok_or_else(|| self.error(loc, "namespace: missing name"))?;
        for thing in &mut things {
            thing.add_outer_namespace(namespace.clone());
        }
        Ok(things)
    }

    fn build_struct(&self, pair: Pair<Rule>) -> Result<StructDecl, PdlError> {
        let loc = self.loc(&pair);
        let mut name = String::new();
        let mut fields = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => name = inner.as_str().to_string(),
                Rule::struct_field => fields.push(self.build_struct_field(inner)?),
                _ => {}
            }
        }
        Ok(StructDecl {
            loc,
            name,
            namespaces: Vec::new(),
            fields,
        })
    }

    fn build_struct_field(&self, pair: Pair<Rule>) -> Result<StructField, PdlError> {
        let loc = self.loc(&pair);
        let mut type_spec = None;
        let mut name = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::type_spec => type_spec = Some(self.build_type_spec(inner)?),
                Rule::ident => name = inner.as_str().to_string(),
                _ => {}
            }
        }
        Ok(StructField {
            type_spec: type_spec.ok_or_else(|| self.error(loc.clone(), "Missing type in field"))?,
            loc,
            name,
        })
    }

    fn build_union(&self, pair: Pair<Rule>) -> Result<UnionDecl, PdlError> {
        let loc = self.loc(&pair);
        let mut name = String::new();
        let mut components = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::ident => name = inner.as_str().to_string(),
                Rule::type_spec => components.push(self.build_type_spec(inner)?),
                _ => {}
            }
        }
        Ok(UnionDecl {
            loc,
            name,
            namespaces: Vec::new(),
            components,
        })
    }

    // ==================== Protocols ====================

    fn build_protocol(&self, pair: Pair<Rule>) -> Result<Protocol, PdlError> {
        let mut loc = self.loc(&pair);
        let mut name = String::new();
        let mut nested = Nesting::NotNested;
        let mut send_semantics = SendSemantics::Async;
        let mut refcounted = false;
        let mut body = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::protocol_send_semantics => {
                    (nested, send_semantics) = self.build_protocol_send_semantics(inner)?
                }
                Rule::kw_refcounted => refcounted = true,
                Rule::kw_protocol => loc = self.loc(&inner),
                Rule::ident => name = inner.as_str().to_string(),
                Rule::protocol_body => body = Some(self.build_protocol_body(inner)?),
                _ => {}
            }
        }
        let body = body.unwrap_or_default();

        if self.filetype == FileType::Header {
            return Err(self.error(
                loc,
                "can't define a protocol in a header.  Do it in a protocol spec instead.",
            ));
        }
        Ok(Protocol {
            loc,
            name,
            namespaces: Vec::new(),
            send_semantics,
            nested,
            refcounted,
            managers: body.managers,
            manages: body.manages,
            messages: body.messages,
        })
    }

    fn build_protocol_send_semantics(
        &self,
        pair: Pair<Rule>,
    ) -> Result<(Nesting, SendSemantics), PdlError> {
        let mut nested = Nesting::NotNested;
        let mut bound = None;
        let mut send_semantics = SendSemantics::Async;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::nesting_bound => {
                    let loc = self.loc(&inner);
                    let level = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::ident)
                        .ok_or_else(|| self.error(loc.clone(), "nested(upto): missing level"))?;
                    nested = self.nesting(&level)?;
                    bound = Some(loc);
                }
                Rule::kw_async => send_semantics = SendSemantics::Async,
                Rule::kw_sync => send_semantics = SendSemantics::Sync,
                Rule::kw_intr => send_semantics = SendSemantics::Intr,
                _ => {}
            }
        }
        if let (SendSemantics::Intr, Some(loc)) = (send_semantics, bound) {
            return Err(self.error(loc, "intr protocols can't carry a nesting qualifier"));
        }
        Ok((nested, send_semantics))
    }

    fn build_protocol_body(&self, pair: Pair<Rule>) -> Result<ProtocolBody, PdlError> {
        let mut body = ProtocolBody::default();
        // Set by `parent:`/`child:`/`both:` and inherited by unlabeled declarations.
        let mut direction = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::managers_stmt => {
                    for id in inner.into_inner().filter(|p| p.as_rule() == Rule::ident) {
                        body.managers.push(Manager {
                            loc: self.loc(&id),
                            name: id.as_str().to_string(),
                        });
                    }
                }
                Rule::manages_stmt => {
                    let loc = self.loc(&inner);
                    let name = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::ident)
                        .map(|p| p.as_str().to_string())
                        .ok_or_else(|| self.error(loc.clone(), "manages: missing protocol name"))?;
                    body.manages.push(ManagesStmt { loc, name });
                }
                Rule::message_decl_thing => {
                    body.messages.push(self.build_message_decl_thing(inner, &mut direction)?)
                }
                _ => {}
            }
        }
        Ok(body)
    }

    fn build_message_decl_thing(
        &self,
        pair: Pair<Rule>,
        direction: &mut Option<Direction>,
    ) -> Result<MessageDecl, PdlError> {
        let loc = self.loc(&pair);
        let mut decl = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::direction_label => {
                    *direction = Some(match inner.as_str() {
                        "parent" => Direction::In,
                        "child" => Direction::Out,
                        _ => Direction::InOut,
                    })
                }
                Rule::message_decl => decl = Some(inner),
                _ => {}
            }
        }
        let decl = decl.ok_or_else(|| self.error(loc, "missing message declaration"))?;
        self.build_message_decl(decl, *direction)
    }

    fn build_message_decl(
        &self,
        pair: Pair<Rule>,
        direction: Option<Direction>,
    ) -> Result<MessageDecl, PdlError> {
        let mut loc = self.loc(&pair);
        let mut name = String::new();
        let mut quals = SendQualifiers::default();
        let mut send_semantics = SendSemantics::Async;
        let mut in_params = Vec::new();
        let mut out_params = Vec::new();
        let mut modifiers = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::send_semantics => (quals, send_semantics) = self.build_send_semantics(inner)?,
                Rule::ident => {
                    loc = self.loc(&inner);
                    name = inner.as_str().to_string();
                }
                Rule::in_params => in_params = self.build_params(inner)?,
                Rule::out_params => out_params = self.build_params(inner)?,
                Rule::message_modifier => modifiers.push(match inner.as_str() {
                    "verify" => MessageModifier::Verify,
                    "compress" => MessageModifier::Compress,
                    "compressall" => MessageModifier::CompressAll,
                    _ => MessageModifier::Tainted,
                }),
                _ => {}
            }
        }
        let direction = direction.ok_or_else(|| self.error(loc.clone(), "missing message direction"))?;
        Ok(MessageDecl {
            loc,
            name,
            direction,
            send_semantics,
            nested: quals.nested.unwrap_or_default(),
            priority: quals.priority.unwrap_or_default(),
            in_params,
            out_params,
            modifiers,
        })
    }

    fn build_send_semantics(
        &self,
        pair: Pair<Rule>,
    ) -> Result<(SendQualifiers, SendSemantics), PdlError> {
        let mut quals = SendQualifiers::default();
        let mut send_semantics = SendSemantics::Async;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::send_qualifier => quals = quals.merge(self.build_send_qualifier(inner)?),
                Rule::kw_async => send_semantics = SendSemantics::Async,
                Rule::kw_sync => send_semantics = SendSemantics::Sync,
                Rule::kw_intr => send_semantics = SendSemantics::Intr,
                _ => {}
            }
        }
        Ok((quals, send_semantics))
    }

    fn build_send_qualifier(&self, pair: Pair<Rule>) -> Result<SendQualifiers, PdlError> {
        let loc = self.loc(&pair);
        let qualifier = pair
            .into_inner()
            .next()
            .ok_or_else(|| self.error(loc.clone(), "empty send qualifier"))?;
        let rule = qualifier.as_rule();
        let level = qualifier
            .into_inner()
            .find(|p| p.as_rule() == Rule::ident)
            .ok_or_else(|| self.error(loc, "send qualifier: missing level"))?;
        let mut quals = SendQualifiers::default();
        match rule {
            Rule::nested_qualifier => quals.nested = Some(self.nesting(&level)?),
            _ => quals.priority = Some(self.priority(&level)?),
        }
        Ok(quals)
    }

    fn nesting(&self, pair: &Pair<Rule>) -> Result<Nesting, PdlError> {
        match pair.as_str() {
            "not" => Ok(Nesting::NotNested),
            "inside_sync" => Ok(Nesting::InsideSync),
            "inside_cpow" => Ok(Nesting::InsideCpow),
            _ => Err(self.error(
                self.loc(pair),
                "Expected not, inside_sync, or inside_cpow for nested()",
            )),
        }
    }

    fn priority(&self, pair: &Pair<Rule>) -> Result<Priority, PdlError> {
        match pair.as_str() {
            "normal" => Ok(Priority::Normal),
            "input" => Ok(Priority::Input),
            "high" => Ok(Priority::High),
            "mediumhigh" => Ok(Priority::MediumHigh),
            _ => Err(self.error(
                self.loc(pair),
                "Expected normal, input, high, or mediumhigh for prio()",
            )),
        }
    }

    fn build_params(&self, pair: Pair<Rule>) -> Result<Vec<Param>, PdlError> {
        let mut params = Vec::new();
        for param in pair.into_inner().filter(|p| p.as_rule() == Rule::param) {
            let loc = self.loc(&param);
            let mut type_spec = None;
            let mut name = String::new();
            for inner in param.into_inner() {
                match inner.as_rule() {
                    Rule::type_spec => type_spec = Some(self.build_type_spec(inner)?),
                    Rule::ident => name = inner.as_str().to_string(),
                    _ => {}
                }
            }
            params.push(Param {
                type_spec: type_spec.ok_or_else(|| self.error(loc.clone(), "Missing type in param"))?,
                loc,
                name,
            });
        }
        Ok(params)
    }

    // ==================== Types ====================

    fn build_type_spec(&self, pair: Pair<Rule>) -> Result<TypeSpec, PdlError> {
        let loc = self.loc(&pair);
        let mut nullable = false;
        let mut spec = None;
        let mut array = false;
        let mut maybe = false;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::kw_nullable => nullable = true,
                Rule::cxx_id => {
                    let id_loc = self.loc(&inner);
                    spec = Some(TypeSpec::new(
                        id_loc.clone(),
                        QualifiedId::new(id_loc, cxx_id_text(inner)),
                    ));
                }
                Rule::unique_ptr => {
                    let id_loc = self.loc(&inner);
                    let id = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::ident)
                        .ok_or_else(|| self.error(id_loc.clone(), "UniquePtr<T>: missing type"))?;
                    let mut unique = TypeSpec::new(
                        id_loc.clone(),
                        QualifiedId::new(id_loc, id.as_str()),
                    );
                    unique.uniqueptr = true;
                    spec = Some(unique);
                }
                Rule::array_suffix => array = true,
                Rule::maybe_suffix => maybe = true,
                _ => {}
            }
        }
        let mut spec = spec.ok_or_else(|| self.error(loc, "Empty type_spec"))?;
        spec.nullable = nullable;
        spec.array = array;
        spec.maybe = maybe;
        Ok(spec)
    }
}

#[derive(Default)]
struct ProtocolBody {
    managers: Vec<Manager>,
    manages: Vec<ManagesStmt>,
    messages: Vec<MessageDecl>,
}

/// `nested(...)` / `prio(...)` clauses of one declaration, merged into a
/// single mapping. Unset entries resolve to the defaults.
#[derive(Debug, Clone, Copy, Default)]
struct SendQualifiers {
    nested: Option<Nesting>,
    priority: Option<Priority>,
}

impl SendQualifiers {
    /// Entries of `later` override those of `self`.
    fn merge(self, later: SendQualifiers) -> SendQualifiers {
        SendQualifiers {
            nested: later.nested.or(self.nested),
            priority: later.priority.or(self.priority),
        }
    }
}

/// `Foo` or the opaque template instance `Foo<Bar>`.
fn cxx_id_text(pair: Pair<Rule>) -> String {
    let text = pair.as_str();
    match pair.into_inner().next() {
        Some(inst) if inst.as_rule() == Rule::template_inst => {
            let ids: Vec<&str> = inst
                .into_inner()
                .filter(|p| p.as_rule() == Rule::ident)
                .map(|p| p.as_str())
                .collect();
            format!("{}<{}>", ids.first().unwrap_or(&""), ids.get(1).unwrap_or(&""))
        }
        _ => text.to_string(),
    }
}

fn string_value(pair: &Pair<Rule>) -> String {
    let s = pair.as_str();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
        .to_string()
}
