//! Parser fuzz target: feed arbitrary text to the tokenizer and the PDL parser.
//! Neither may panic; both return Ok or a located PdlError.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let _ = pdl_frontend::tokenize("fuzz.pdl", s);
    for filetype in [pdl_frontend::FileType::Protocol, pdl_frontend::FileType::Header] {
        let _ = pdl_frontend::parse(s, "fuzz.pdl", filetype);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
