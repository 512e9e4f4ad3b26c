//! Integration tests on files laid out in a temporary directory: include
//! resolution, the per-context cache, cycles and include trails.

use pdl_frontend::{parse_file, CompileContext, FileType};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, src: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, src).expect("write fixture");
    path
}

fn fixture() -> TempDir {
    tempfile::tempdir().expect("tempdir")
}

const TYPES: &str = r#"
namespace mozilla {
struct Point { int32_t x; int32_t y; };
}
"#;

#[test]
fn test_include_header_and_protocol() {
    let dir = fixture();
    write(dir.path(), "Types.pdlh", TYPES);
    write(
        dir.path(),
        "PChild.pdl",
        "include Types;\nprotocol PChild { manager PRoot; child: async Go(Point p); };\n",
    );
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include protocol PChild;\ninclude Types;\nprotocol PRoot { manages PChild; parent: async Hi(); };\n",
    );

    let tu = parse_file(&root, FileType::Protocol, [dir.path()]).expect("parse");
    assert_eq!(tu.includes.len(), 2);

    let child = &tu.includes[0];
    assert_eq!(child.kind, FileType::Protocol);
    assert_eq!(child.name, "PChild");
    assert_eq!(child.file, "PChild.pdl");
    assert_eq!(child.loc.line, 1);
    assert_eq!(child.unit.filetype, FileType::Protocol);
    assert_eq!(child.unit.protocol.as_ref().map(|p| p.name.as_str()), Some("PChild"));

    let types = &tu.includes[1];
    assert_eq!(types.kind, FileType::Header);
    assert_eq!(types.file, "Types.pdlh");
    assert_eq!(types.loc.line, 2);
    assert_eq!(types.unit.name, "Types");
    assert!(types.unit.struct_or_union("Point").is_some());
    assert_eq!(types.unit.namespaces.len(), 1);
    assert_eq!(types.unit.namespaces[0].name, "mozilla");
}

#[test]
fn test_same_file_is_parsed_once() {
    let dir = fixture();
    write(dir.path(), "Types.pdlh", TYPES);
    write(
        dir.path(),
        "PChild.pdl",
        "include Types;\nprotocol PChild { child: async Go(); };\n",
    );
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include protocol PChild;\ninclude Types;\nprotocol PRoot { parent: async Hi(); };\n",
    );

    let mut ctx = CompileContext::new([dir.path()]);
    let tu = ctx.parse_file(&root, FileType::Protocol).expect("parse");

    let via_child = &tu.includes[0].unit.includes[0].unit;
    let direct = &tu.includes[1].unit;
    assert!(Arc::ptr_eq(via_child, direct), "Types.pdlh must be shared");
    assert_eq!(ctx.parsed_files().count(), 3);

    let types_path = dir.path().join("Types.pdlh").canonicalize().expect("canonicalize");
    let cached = ctx.cached(&types_path).expect("Types.pdlh cached");
    assert!(Arc::ptr_eq(cached, direct));
}

#[test]
fn test_context_reuse_shares_units_across_roots() {
    let dir = fixture();
    write(dir.path(), "Types.pdlh", TYPES);
    let a = write(dir.path(), "PA.pdl", "include Types;\nprotocol PA { both: async X(); };\n");
    let b = write(dir.path(), "PB.pdl", "include Types;\nprotocol PB { both: async Y(); };\n");

    let mut ctx = CompileContext::new([dir.path()]);
    let ta = ctx.parse_file(&a, FileType::Protocol).expect("parse PA");
    let tb = ctx.parse_file(&b, FileType::Protocol).expect("parse PB");
    assert!(Arc::ptr_eq(&ta.includes[0].unit, &tb.includes[0].unit));

    let again = ctx.parse_file(&a, FileType::Protocol).expect("parse PA again");
    assert!(Arc::ptr_eq(&ta, &again));
}

#[test]
fn test_include_not_found() {
    let dir = fixture();
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "// header\ninclude protocol PMissing;\nprotocol PRoot { parent: async Hi(); };\n",
    );
    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("missing include");
    assert_eq!(err.message, "can't locate include file `PMissing.pdl'");
    assert_eq!(err.loc.line, 2);
    assert!(err.loc.file.ends_with("PRoot.pdl"), "{}", err.loc.file);
    assert!(err.included_from.is_empty());
}

#[test]
fn test_include_dirs_searched_in_order() {
    let first = fixture();
    let second = fixture();
    write(first.path(), "Types.pdlh", "struct First { };\n");
    write(second.path(), "Types.pdlh", "struct Second { };\n");
    write(second.path(), "Extra.pdlh", "struct Extra { };\n");
    let root = write(
        second.path(),
        "PRoot.pdl",
        "include Types;\ninclude Extra;\nprotocol PRoot { parent: async Hi(); };\n",
    );

    let tu = parse_file(&root, FileType::Protocol, [first.path(), second.path()]).expect("parse");
    assert!(tu.includes[0].unit.struct_or_union("First").is_some());
    assert!(tu.includes[0].unit.struct_or_union("Second").is_none());
    assert!(tu.includes[1].unit.struct_or_union("Extra").is_some());
}

#[test]
fn test_cyclic_include_is_an_error() {
    let dir = fixture();
    write(
        dir.path(),
        "PB.pdl",
        "include protocol PA;\nprotocol PB { child: async B(); };\n",
    );
    let a = write(
        dir.path(),
        "PA.pdl",
        "include protocol PB;\nprotocol PA { parent: async A(); };\n",
    );

    let mut ctx = CompileContext::new([dir.path()]);
    let err = ctx.parse_file(&a, FileType::Protocol).expect_err("cycle");
    assert!(err.message.starts_with("cyclic include of `"), "{}", err.message);
    assert!(err.message.contains("PA.pdl"), "{}", err.message);
    assert!(err.loc.file.ends_with("PB.pdl"), "{}", err.loc.file);
    assert_eq!(err.loc.line, 1);
    assert_eq!(err.included_from.len(), 1);
    assert!(err.included_from[0].file.ends_with("PA.pdl"));

    // Nothing half-built is left behind.
    assert_eq!(ctx.parsed_files().count(), 0);
}

#[test]
fn test_error_in_included_file_carries_trail() {
    let dir = fixture();
    write(dir.path(), "Bad.pdlh", "struct Bad {\n  int32_t x\n};\n");
    write(dir.path(), "Mid.pdlh", "\ninclude Bad;\nstruct Mid { };\n");
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include Mid;\nprotocol PRoot { parent: async Hi(); };\n",
    );

    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("bad header");
    assert!(err.loc.file.ends_with("Bad.pdlh"), "{}", err.loc.file);
    assert_eq!(err.loc.line, 3);
    assert_eq!(err.message, "bad syntax near `}'");

    // Innermost include first.
    assert_eq!(err.included_from.len(), 2);
    assert!(err.included_from[0].file.ends_with("Mid.pdlh"));
    assert_eq!(err.included_from[0].line, 2);
    assert!(err.included_from[1].file.ends_with("PRoot.pdl"));
    assert_eq!(err.included_from[1].line, 1);

    let text = err.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{}", text);
    assert!(lines[0].starts_with("  in file included from `"), "{}", text);
    assert!(lines[0].ends_with("Mid.pdlh', line 2:"), "{}", text);
    assert!(lines[1].ends_with("PRoot.pdl', line 1:"), "{}", text);
    assert!(lines[2].ends_with("Bad.pdlh:3: error: bad syntax near `}'"), "{}", text);
}

#[test]
fn test_semantic_error_in_included_protocol() {
    let dir = fixture();
    write(
        dir.path(),
        "PChild.pdl",
        "protocol PChild {\n  async Orphan();\n};\n",
    );
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include protocol PChild;\nprotocol PRoot { parent: async Hi(); };\n",
    );
    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("no direction");
    assert_eq!(err.message, "missing message direction");
    assert!(err.loc.file.ends_with("PChild.pdl"));
    assert_eq!(err.loc.line, 2);
    assert_eq!(err.included_from.len(), 1);
}

#[test]
fn test_transitive_includes() {
    let dir = fixture();
    write(dir.path(), "Leaf.pdlh", "struct Leaf { };\n");
    write(dir.path(), "Mid.pdlh", "include Leaf;\nstruct Mid { Leaf l; };\n");
    write(
        dir.path(),
        "PChild.pdl",
        "include Leaf;\nprotocol PChild { child: async Go(); };\n",
    );
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include Mid;\ninclude protocol PChild;\nprotocol PRoot { parent: async Hi(); };\n",
    );

    let tu = parse_file(&root, FileType::Protocol, [dir.path()]).expect("parse");
    let units = tu.transitive_includes();
    let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Mid", "Leaf", "PChild"]);
}

#[test]
fn test_missing_root_file() {
    let dir = fixture();
    let err = parse_file(dir.path().join("PNope.pdl"), FileType::Protocol, Vec::<PathBuf>::new())
        .expect_err("missing root");
    assert!(err.message.starts_with("can't read `"), "{}", err.message);
    assert!(err.included_from.is_empty());

    let text = err.to_string();
    assert!(text.contains("PNope.pdl: error: can't read `"), "{}", text);
    assert!(!text.contains(":0:"), "{}", text);
}

#[test]
fn test_missing_include_reported_before_later_syntax_error() {
    let dir = fixture();
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include protocol PMissing;
protocol PRoot {
parent:
  async M(int32_t x y);
};
",
    );
    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("missing include");
    assert_eq!(err.message, "can't locate include file `PMissing.pdl'");
    assert_eq!(err.loc.line, 1);
}

#[test]
fn test_bad_include_reported_before_later_syntax_error() {
    let dir = fixture();
    write(dir.path(), "Bad.pdlh", "struct Bad {
  async x;
};
");
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include Bad;
protocol PRoot {
parent:
  async M(int32_t x y);
};
",
    );
    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("bad include");
    assert!(err.loc.file.ends_with("Bad.pdlh"), "{}", err.loc.file);
    assert_eq!(err.loc.line, 2);
    assert_eq!(err.included_from.len(), 1);
    assert_eq!(err.included_from[0].line, 1);
}

#[test]
fn test_syntax_error_in_preamble_precedes_later_include() {
    let dir = fixture();
    let root = write(
        dir.path(),
        "PRoot.pdl",
        "include \"a.h\"
include protocol PMissing;
protocol PRoot { parent: async Hi(); };
",
    );
    let err = parse_file(&root, FileType::Protocol, [dir.path()]).expect_err("syntax error");
    assert_eq!(err.message, "bad syntax near `include'");
    assert_eq!(err.loc.line, 2);
}

#[test]
fn test_deterministic_across_contexts() {
    let dir = fixture();
    write(dir.path(), "Types.pdlh", TYPES);
    let root = write(
        dir.path(),
        "PRoot.pdl",
        r#"include Types;
using class mozilla::dom::TabId from "TabId.h";
namespace mozilla {
sync protocol PRoot {
parent:
  prio(high) async Hello(Point p, TabId t) verify;
  nested(inside_sync) sync Ask() returns (bool ok);
};
}
"#,
    );
    let first = parse_file(&root, FileType::Protocol, [dir.path()]).expect("first");
    let second = parse_file(&root, FileType::Protocol, [dir.path()]).expect("second");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}
