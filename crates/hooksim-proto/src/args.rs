//! Argument codec shared by all hook tools.
//!
//! The tools use one grammar:
//!
//! - bare positional tokens: ids, keys, and `key=value` pairs for bulk data
//! - `--flag` boolean switches
//! - `--key=value` value options (`--label=`, `--owner=`, `--rotate=`, ...)
//! - short options `-r <relation>` and `-l <level>`, with or without `=`
//! - a `--format=json` marker selecting JSON output
//!
//! Flags and options may appear anywhere. Positional order is preserved, and
//! the literal `-` token stays a positional so `relation-get` can locate the
//! unit token that follows it. A bare `--` ends option parsing: every token
//! after it is positional, so free-form messages may start with dashes.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    command::HookCommand,
    errors::{ProtocolError, Result},
};

/// Marker token selecting JSON output.
pub const FORMAT_JSON: &str = "--format=json";

/// Token ending option parsing.
pub const END_OF_OPTIONS: &str = "--";

/// Short options and the long option each one aliases.
const SHORT_OPTIONS: &[(&str, &str)] = &[("-r", "relation"), ("-l", "log-level")];

/// Output encoding requested by a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Plain text for scalars, YAML for structures.
    #[default]
    Smart,
    /// Compact JSON.
    Json,
}

impl Format {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "json" => Ok(Self::Json),
            "smart" | "yaml" => Ok(Self::Smart),
            other => Err(ProtocolError::InvalidFormat(other.to_string())),
        }
    }
}

/// Decoded command line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HookArgs {
    positionals: Vec<String>,
    flags: BTreeSet<String>,
    options: BTreeMap<String, String>,
    format: Format,
}

impl HookArgs {
    /// Decode a raw argument list.
    ///
    /// Fails only when a short option has no value or `--format=` names an
    /// unknown encoding. Semantic validation belongs to the command handler.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut parsed = Self::default();
        let mut tokens = args.iter().map(AsRef::as_ref);

        while let Some(token) = tokens.next() {
            if token == END_OF_OPTIONS {
                parsed.positionals.extend(tokens.by_ref().map(str::to_string));
                break;
            }

            if let Some(long) = token.strip_prefix("--").filter(|long| !long.is_empty()) {
                match long.split_once('=') {
                    Some(("format", value)) => parsed.format = Format::from_name(value)?,
                    Some((key, value)) => {
                        parsed.options.insert(key.to_string(), value.to_string());
                    },
                    None => {
                        parsed.flags.insert(long.to_string());
                    },
                }
                continue;
            }

            if let Some(long) = short_option(token) {
                let value = match token.split_once('=') {
                    Some((_, value)) => value.to_string(),
                    None => tokens
                        .next()
                        .ok_or_else(|| ProtocolError::MissingValue(token.to_string()))?
                        .to_string(),
                };
                parsed.options.insert(long.to_string(), value);
                continue;
            }

            parsed.positionals.push(token.to_string());
        }

        Ok(parsed)
    }

    /// All positional tokens, in order.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Positional tokens that are not `key=value` pairs, in order.
    pub fn bare(&self) -> impl Iterator<Item = &str> {
        self.positionals.iter().map(String::as_str).filter(|token| !token.contains('='))
    }

    /// Positional `key=value` pairs, split at the first `=`.
    ///
    /// A repeated key keeps its last value.
    pub fn pairs(&self) -> BTreeMap<String, String> {
        self.positionals
            .iter()
            .filter_map(|token| token.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    /// Whether `--name` was given.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    /// Value of `--name=value`, or of the short option aliasing it.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Requested output encoding.
    pub fn format(&self) -> Format {
        self.format
    }
}

fn short_option(token: &str) -> Option<&'static str> {
    let head = token.split_once('=').map_or(token, |(head, _)| head);
    SHORT_OPTIONS.iter().find(|(short, _)| *short == head).map(|(_, long)| *long)
}

/// Builder producing the argument list for one command.
///
/// The encoding side of [`HookArgs`]: every command line it produces decodes
/// back to the same positionals, flags and options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    command: HookCommand,
    args: Vec<String>,
}

impl CommandLine {
    /// Start a command line with no arguments.
    pub fn new(command: HookCommand) -> Self {
        Self { command, args: Vec::new() }
    }

    /// Append a positional token.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append free-form text as a positional.
    ///
    /// Text that would otherwise read as an option is preceded by
    /// [`END_OF_OPTIONS`]; nothing may be appended after it.
    pub fn text(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.starts_with('-') && value != "-" {
            self.args.push(END_OF_OPTIONS.to_string());
        }
        self.args.push(value);
        self
    }

    /// Append `--name`.
    pub fn flag(mut self, name: &str) -> Self {
        self.args.push(format!("--{name}"));
        self
    }

    /// Append `--name` when `enabled` holds.
    pub fn flag_if(self, name: &str, enabled: bool) -> Self {
        if enabled { self.flag(name) } else { self }
    }

    /// Append `--name=value`.
    pub fn option(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.args.push(format!("--{name}={}", value.as_ref()));
        self
    }

    /// Append `--name=value` when a value is present.
    pub fn option_opt(self, name: &str, value: Option<impl AsRef<str>>) -> Self {
        match value {
            Some(value) => self.option(name, value),
            None => self,
        }
    }

    /// Append a `key=value` pair.
    pub fn pair(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.args.push(format!("{}={}", key.as_ref(), value.as_ref()));
        self
    }

    /// Append every pair of a mapping, in iteration order.
    pub fn pairs<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs.into_iter().fold(self, |line, (key, value)| line.pair(key, value))
    }

    /// Append the trailing [`FORMAT_JSON`] marker.
    pub fn json(mut self) -> Self {
        self.args.push(FORMAT_JSON.to_string());
        self
    }

    /// Command this line invokes.
    pub fn command(&self) -> HookCommand {
        self.command
    }

    /// Arguments produced so far.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Split into command and argument list.
    pub fn into_parts(self) -> (HookCommand, Vec<String>) {
        (self.command, self.args)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn parse(tokens: &[&str]) -> HookArgs {
        HookArgs::parse(tokens).unwrap()
    }

    #[test]
    fn relation_get_grammar() {
        let args = parse(&["-r", "certificates:0", "-", "provider/0", "--app", "--format=json"]);

        assert_eq!(args.option("relation"), Some("certificates:0"));
        assert_eq!(args.bare().collect::<Vec<_>>(), vec!["-", "provider/0"]);
        assert!(args.flag("app"));
        assert_eq!(args.format(), Format::Json);
    }

    #[test]
    fn short_option_with_equals() {
        let args = parse(&["-r=db:3", "key=value"]);

        assert_eq!(args.option("relation"), Some("db:3"));
        assert_eq!(args.pairs().get("key").map(String::as_str), Some("value"));
        assert_eq!(args.format(), Format::Smart);
    }

    #[test]
    fn short_option_without_value_fails() {
        assert_eq!(HookArgs::parse(&["-r"]), Err(ProtocolError::MissingValue("-r".to_string())));
    }

    #[test]
    fn unknown_format_fails() {
        assert_eq!(
            HookArgs::parse(&["--format=xml"]),
            Err(ProtocolError::InvalidFormat("xml".to_string()))
        );
    }

    #[test]
    fn pair_value_keeps_later_equals() {
        let args = parse(&["dsn=host=db port=5432"]);

        assert_eq!(args.pairs().get("dsn").map(String::as_str), Some("host=db port=5432"));
        assert_eq!(args.bare().count(), 0);
    }

    #[test]
    fn empty_option_value_is_kept() {
        let args = parse(&["--label=", "secret:abc"]);

        assert_eq!(args.option("label"), Some(""));
        assert_eq!(args.bare().collect::<Vec<_>>(), vec!["secret:abc"]);
    }

    #[test]
    fn command_line_decodes_to_same_arguments() {
        let (command, tokens) = CommandLine::new(HookCommand::SecretAdd)
            .pair("username", "admin")
            .option("label", "db")
            .option_opt("owner", Some("unit"))
            .option_opt("rotate", None::<&str>)
            .flag_if("peek", false)
            .json()
            .into_parts();

        assert_eq!(command, HookCommand::SecretAdd);
        assert_eq!(tokens, vec!["username=admin", "--label=db", "--owner=unit", FORMAT_JSON]);

        let args = HookArgs::parse(&tokens).unwrap();
        assert_eq!(args.option("label"), Some("db"));
        assert_eq!(args.option("owner"), Some("unit"));
        assert!(!args.flag("peek"));
        assert_eq!(args.format(), Format::Json);
    }

    #[test]
    fn end_of_options_keeps_dashed_text() {
        let args = parse(&["--log-level=INFO", "--", "--- migration done ---", "--format=xml"]);

        assert_eq!(args.option("log-level"), Some("INFO"));
        assert_eq!(args.positionals(), ["--- migration done ---", "--format=xml"]);
        assert_eq!(args.format(), Format::Smart);
    }

    #[test]
    fn text_guards_leading_dashes() {
        let (_, plain) = CommandLine::new(HookCommand::JujuLog).text("done").into_parts();
        assert_eq!(plain, vec!["done"]);

        let (_, dashed) = CommandLine::new(HookCommand::ActionLog).text("--format=xml").into_parts();
        assert_eq!(dashed, vec![END_OF_OPTIONS, "--format=xml"]);
        assert_eq!(HookArgs::parse(&dashed).unwrap().positionals(), ["--format=xml"]);
    }

    proptest! {
        /// Flags and options may be interleaved with positionals in any order.
        #[test]
        fn prop_option_placement_is_irrelevant(
            split in 0usize..4,
            positionals in prop::collection::vec("[a-z][a-z0-9/:]{0,8}", 0..4),
        ) {
            let split = split.min(positionals.len());
            let mut tokens: Vec<String> = positionals[..split].to_vec();
            tokens.push("--label=db".to_string());
            tokens.push("--peek".to_string());
            tokens.extend(positionals[split..].iter().cloned());
            tokens.push(FORMAT_JSON.to_string());

            let args = HookArgs::parse(&tokens).unwrap();
            prop_assert_eq!(args.positionals(), positionals.as_slice());
            prop_assert_eq!(args.option("label"), Some("db"));
            prop_assert!(args.flag("peek"));
            prop_assert_eq!(args.format(), Format::Json);
        }
    }
}
