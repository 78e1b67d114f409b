//! Fuzz target for the hook tool argument codec
//!
//! # Strategy
//!
//! - Raw token lists: arbitrary strings fed straight to the decoder
//! - Built lines: flags, options, pairs and trailing text encoded with `CommandLine`
//!
//! # Invariants
//!
//! - Decoding never panics
//! - Every built line decodes to the flags, options and pairs it was built from
//! - A built line never fails to decode
//! - Trailing text comes back as the last positional, dashes and all

#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use hooksim_proto::{CommandLine, Format, HookArgs, HookCommand};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    raw: Vec<String>,
    flags: Vec<String>,
    options: BTreeMap<String, String>,
    pairs: BTreeMap<String, String>,
    json: bool,
    text: Option<String>,
}

/// Names a long flag or option can carry without changing meaning.
fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name != "format"
        && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'-')
}

/// Keys a positional pair can carry without being read as an option.
fn is_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('-') && !key.contains('=')
}

fuzz_target!(|input: Input| {
    let _ = HookArgs::parse(&input.raw);

    let flags: Vec<&String> = input
        .flags
        .iter()
        .filter(|f| is_name(f) && !input.options.contains_key(*f))
        .collect();
    let options: Vec<(&String, &String)> =
        input.options.iter().filter(|(k, _)| is_name(k)).collect();
    let pairs: Vec<(&String, &String)> = input.pairs.iter().filter(|(k, _)| is_key(k)).collect();

    let mut line = CommandLine::new(HookCommand::StateSet);
    for flag in &flags {
        line = line.flag(flag);
    }
    for (key, value) in &options {
        line = line.option(key, value);
    }
    line = line.pairs(pairs.iter().copied());
    if input.json {
        line = line.json();
    }
    let text = input.text.as_ref().filter(|t| !t.contains('='));
    if let Some(text) = text {
        line = line.text(text.clone());
    }

    let Ok(decoded) = HookArgs::parse(line.args()) else {
        panic!("built line failed to decode: {line:?}");
    };
    for flag in &flags {
        assert!(decoded.flag(flag), "flag {flag} lost");
    }
    for (key, value) in &options {
        assert_eq!(decoded.option(key), Some(value.as_str()), "option {key} changed");
    }
    let expected: BTreeMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).clone(), (*v).clone())).collect();
    assert_eq!(decoded.pairs(), expected);
    assert_eq!(decoded.format() == Format::Json, input.json);
    if let Some(text) = text {
        assert_eq!(decoded.positionals().last(), Some(text), "text {text:?} changed");
    }
});
