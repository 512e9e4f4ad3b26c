//! Check PDL files: parse each root (and its includes) and report diagnostics.
//!
//! Usage:
//!   pdl_check [-I DIR]... [--dump] [--header] FILE...
//!
//! The file kind comes from the extension (`.pdl` protocol, `.pdlh` header)
//! unless `--header` is given. Exit code 1 if any file fails to parse.
//! Set `RUST_LOG=pdl_frontend=debug` to trace include resolution.

use anyhow::Context;
use clap::Parser;
use pdl_frontend::{dump_translation_unit, CompileContext, FileType};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdl_check", version, about = "Parse PDL files and report diagnostics")]
struct Args {
    /// Include search directory; may be repeated, searched in order.
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Print the parsed AST of each file.
    #[arg(long)]
    dump: bool,

    /// Treat every input as a header regardless of its extension.
    #[arg(long)]
    header: bool,

    /// Root files to check.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args = Args::parse();
    let mut ctx = CompileContext::new(args.include_dirs);
    let mut failed = 0usize;

    for path in &args.files {
        let filetype = if args.header {
            FileType::Header
        } else {
            FileType::from_path(path).with_context(|| {
                format!(
                    "{}: unknown file kind (expected .pdl or .pdlh, or pass --header)",
                    path.display()
                )
            })?
        };
        match ctx.parse_file(path, filetype) {
            Ok(tu) => {
                if args.dump {
                    print!("{}", dump_translation_unit(&tu));
                } else {
                    eprintln!("{}: ok", path.display());
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("pdl_check: {} of {} file(s) failed", failed, args.files.len());
        std::process::exit(1);
    }
    Ok(())
}
