//! Format a translation unit as an indented text tree (used by `pdl_check --dump`).

use crate::ast::*;
use std::fmt::Write;

/// Render `tu` and, nested under each include, the unit it resolved to.
pub fn dump_translation_unit(tu: &TranslationUnit) -> String {
    let mut out = String::new();
    dump_unit(&mut out, tu, 0);
    out
}

fn dump_unit(out: &mut String, tu: &TranslationUnit, indent: usize) {
    let pad = "  ".repeat(indent);
    let _ = writeln!(
        out,
        "{}{} {} ({}){}",
        pad,
        tu.filetype,
        tu.name,
        tu.filename.display(),
        namespace_suffix(&tu.namespaces)
    );
    for inc in &tu.cxx_includes {
        let _ = writeln!(out, "{}  include \"{}\"", pad, inc.file);
    }
    for inc in &tu.includes {
        let _ = writeln!(out, "{}  include {} {}", pad, inc.kind, inc.name);
        dump_unit(out, &inc.unit, indent + 2);
    }
    for using in &tu.using_stmts {
        let mut flags = String::new();
        if using.refcounted {
            flags.push_str("refcounted ");
        }
        if using.moveonly {
            flags.push_str("moveonly ");
        }
        match using.kind {
            Some(UsingKind::Class) => flags.push_str("class "),
            Some(UsingKind::Struct) => flags.push_str("struct "),
            None => {}
        }
        let _ = writeln!(
            out,
            "{}  using {}{} from \"{}\"",
            pad, flags, using.cxx_type, using.header
        );
    }
    for decl in &tu.structs_and_unions {
        match decl {
            StructOrUnion::Struct(s) => {
                let _ = writeln!(out, "{}  struct {}{}", pad, s.name, namespace_suffix(&s.namespaces));
                for field in &s.fields {
                    let _ = writeln!(out, "{}    {} {}", pad, field.type_spec, field.name);
                }
            }
            StructOrUnion::Union(u) => {
                let _ = writeln!(out, "{}  union {}{}", pad, u.name, namespace_suffix(&u.namespaces));
                for component in &u.components {
                    let _ = writeln!(out, "{}    {}", pad, component);
                }
            }
        }
    }
    if let Some(protocol) = &tu.protocol {
        dump_protocol(out, protocol, &pad);
    }
}

fn dump_protocol(out: &mut String, p: &Protocol, pad: &str) {
    let _ = writeln!(
        out,
        "{}  {}{} protocol {} (nested upto {}){}",
        pad,
        if p.refcounted { "refcounted " } else { "" },
        p.send_semantics,
        p.qualified_name(),
        p.nested,
        if p.managers.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = p.managers.iter().map(|m| m.name.as_str()).collect();
            format!(" managed by {}", names.join(" or "))
        }
    );
    for manages in &p.manages {
        let _ = writeln!(out, "{}    manages {}", pad, manages.name);
    }
    for m in &p.messages {
        let mut line = format!(
            "{}    {}: nested({}) prio({}) {} {}({})",
            pad,
            m.direction,
            m.nested,
            m.priority,
            m.send_semantics,
            m.name,
            params(&m.in_params)
        );
        if !m.out_params.is_empty() {
            let _ = write!(line, " returns ({})", params(&m.out_params));
        }
        for modifier in &m.modifiers {
            let _ = write!(line, " {}", modifier);
        }
        let _ = writeln!(out, "{}", line);
    }
}

fn params(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{} {}", p.type_spec, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn namespace_suffix(namespaces: &[Namespace]) -> String {
    if namespaces.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = namespaces.iter().map(|ns| ns.name.as_str()).collect();
    format!(" [{}]", names.join("::"))
}
