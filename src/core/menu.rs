//! PC-003: Command registry — option schemas, defaults, and statement tokenizing.
//!
//! Each menu entry names a command, declares the options it understands
//! (with typed defaults), and points at the handler that appends the
//! command's effect to a dish description. Statements are parsed by a
//! clap command built from the schema. Tokens a command does not
//! recognize are collected and ignored, never rejected.

use super::chef::{self, Session};
use super::error::ChefError;
use super::types::Value;
use indexmap::IndexMap;

/// Appends one parsed command's effect to the session's description.
pub type Handler = fn(&mut Session<'_>, &ParsedCommand) -> Result<(), ChefError>;

/// Value type and default of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Int { default: i64 },
    Text { default: &'static str },
}

impl ArgKind {
    fn default_value(&self) -> Value {
        match self {
            Self::Int { default } => Value::Int(*default),
            Self::Text { default } => Value::Text((*default).to_string()),
        }
    }
}

/// A single option or positional argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    /// Kwarg name the value is stored under
    pub dest: &'static str,
    /// Short flag (`-t`)
    pub short: Option<char>,
    /// Long flag without dashes (`turns`); `None` for positionals
    pub long: Option<&'static str>,
    pub kind: ArgKind,
    pub help: &'static str,
}

impl ArgSpec {
    pub fn flag(dest: &'static str, short: char, long: &'static str, kind: ArgKind) -> Self {
        Self {
            dest,
            short: Some(short),
            long: Some(long),
            kind,
            help: "",
        }
    }

    pub fn positional(dest: &'static str, kind: ArgKind) -> Self {
        Self {
            dest,
            short: None,
            long: None,
            kind,
            help: "",
        }
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    fn is_positional(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }

    fn clap_arg(&self) -> clap::Arg {
        let mut arg = clap::Arg::new(self.dest)
            .action(clap::ArgAction::Set)
            .help(self.help);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(long) = self.long {
            arg = arg.long(long);
        }
        match self.kind {
            ArgKind::Int { default } => arg
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .default_value(default.to_string()),
            ArgKind::Text { default } => {
                let arg = arg.value_parser(clap::value_parser!(String));
                if default.is_empty() {
                    arg
                } else {
                    arg.default_value(default)
                }
            }
        }
    }
}

/// A registered command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    pub about: &'static str,
    pub args: Vec<ArgSpec>,
    pub handler: Handler,
}

impl CommandSpec {
    fn find_long(&self, long: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.long == Some(long))
    }

    fn find_short(&self, short: char) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.short == Some(short))
    }

    /// Runtime clap command for this schema. Later occurrences of an option
    /// override earlier ones.
    fn command(&self) -> clap::Command {
        self.args.iter().fold(
            clap::Command::new(self.name)
                .no_binary_name(true)
                .disable_help_flag(true)
                .disable_version_flag(true)
                .args_override_self(true),
            |command, arg| command.arg(arg.clap_arg()),
        )
    }

    /// Split tokens into those the schema understands and those it does not.
    ///
    /// clap rejects unknown options and surplus positionals, so they are
    /// pulled out here. A value token directly after a known option that
    /// has no inline value stays with that option.
    fn partition_tokens<'t>(
        &self,
        tokens: impl Iterator<Item = &'t str>,
    ) -> (Vec<&'t str>, Vec<String>) {
        let mut known = Vec::new();
        let mut ignored = Vec::new();
        let mut positionals = self.args.iter().filter(|a| a.is_positional()).count();
        let mut awaiting_value = false;

        for tok in tokens {
            let is_option = tok.starts_with("--") || is_short_flag(tok);
            if awaiting_value && !is_option {
                awaiting_value = false;
                known.push(tok);
                continue;
            }
            awaiting_value = false;

            if let Some(long) = tok.strip_prefix("--") {
                let (flag, inline) = match long.split_once('=') {
                    Some((flag, _)) => (flag, true),
                    None => (long, false),
                };
                if self.find_long(flag).is_some() {
                    awaiting_value = !inline;
                    known.push(tok);
                } else {
                    ignored.push(tok.to_string());
                }
            } else if is_short_flag(tok) {
                let short = tok[1..].chars().next().unwrap_or('-');
                if self.find_short(short).is_some() {
                    awaiting_value = tok.len() == 1 + short.len_utf8();
                    known.push(tok);
                } else {
                    ignored.push(tok.to_string());
                }
            } else if positionals > 0 {
                positionals -= 1;
                known.push(tok);
            } else {
                ignored.push(tok.to_string());
            }
        }
        (known, ignored)
    }
}

/// Where a parsed value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Explicit,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedValue {
    pub value: Value,
    pub source: ValueSource,
}

/// A statement tokenized against a command's schema.
#[derive(Debug, Clone)]
pub struct ParsedCommand {
    pub name: &'static str,
    /// Every declared argument, in schema order, with defaults filled in
    pub values: IndexMap<&'static str, ParsedValue>,
    /// Tokens the schema did not recognize
    pub ignored: Vec<String>,
}

impl ParsedCommand {
    pub fn get(&self, dest: &str) -> Option<&ParsedValue> {
        self.values.get(dest)
    }

    pub fn int(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(|v| v.value.as_int())
    }

    pub fn text(&self, dest: &str) -> Option<&str> {
        match self.get(dest).map(|v| &v.value) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_explicit(&self, dest: &str) -> bool {
        self.get(dest)
            .is_some_and(|v| v.source == ValueSource::Explicit)
    }
}

/// Result of tokenizing one statement.
#[derive(Debug)]
pub enum Parsed<'m> {
    /// Nothing but whitespace.
    Empty,
    /// First token is not on the menu.
    Unknown(String),
    Command(&'m CommandSpec, ParsedCommand),
}

/// The command registry.
#[derive(Debug, Clone)]
pub struct Menu {
    commands: IndexMap<&'static str, CommandSpec>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::standard()
    }
}

impl Menu {
    pub fn empty() -> Self {
        Self {
            commands: IndexMap::new(),
        }
    }

    /// The built-in commands: pierogi, sort, quantize, recipe.
    pub fn standard() -> Self {
        let mut menu = Self::empty();
        menu.register(CommandSpec {
            name: "pierogi",
            about: "Load an image",
            args: vec![ArgSpec::positional("image_path", ArgKind::Text { default: "" })],
            handler: chef::add_pierogi_desc,
        });
        menu.register(CommandSpec {
            name: "sort",
            about: "Sort pixels in an image by intensity",
            args: vec![
                ArgSpec::flag("turns", 't', "turns", ArgKind::Int { default: 0 }),
                ArgSpec::flag(
                    "lower_threshold",
                    'l',
                    "lower-threshold",
                    ArgKind::Int { default: 64 },
                )
                .help("Pixels with lightness below this threshold will not get sorted"),
                ArgSpec::flag(
                    "upper_threshold",
                    'u',
                    "upper-threshold",
                    ArgKind::Int { default: 180 },
                )
                .help("Pixels with lightness above this threshold will not get sorted"),
            ],
            handler: chef::add_sort_desc,
        });
        menu.register(CommandSpec {
            name: "quantize",
            about: "Reduce an image to a palette",
            args: vec![ArgSpec::flag(
                "colors",
                'k',
                "colors",
                ArgKind::Int { default: 8 },
            )],
            handler: chef::add_quantize_desc,
        });
        menu.register(CommandSpec {
            name: "recipe",
            about: "Splice in the statements of another recipe file",
            args: vec![ArgSpec::positional(
                "recipe_path",
                ArgKind::Text {
                    default: "./recipe.txt",
                },
            )],
            handler: chef::add_recipe_desc,
        });
        menu
    }

    /// Add or replace a command.
    pub fn register(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Tokenize a statement by whitespace and match it against the menu.
    pub fn parse(&self, statement: &str) -> Result<Parsed<'_>, ChefError> {
        let statement = statement.trim();
        let mut words = statement.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Parsed::Empty);
        };
        let Some(spec) = self.commands.get(name) else {
            return Ok(Parsed::Unknown(name.to_string()));
        };

        let (known, ignored) = spec.partition_tokens(words);
        let matches = spec
            .command()
            .try_get_matches_from(known)
            .map_err(|e| ChefError::RecipeSyntax {
                statement: statement.to_string(),
                reason: clap_reason(&e),
            })?;

        let values = spec
            .args
            .iter()
            .map(|arg| {
                let value = match arg.kind {
                    ArgKind::Int { .. } => matches.get_one::<i64>(arg.dest).copied().map(Value::Int),
                    ArgKind::Text { .. } => {
                        matches.get_one::<String>(arg.dest).cloned().map(Value::Text)
                    }
                };
                let source = match matches.value_source(arg.dest) {
                    Some(clap::parser::ValueSource::CommandLine) => ValueSource::Explicit,
                    _ => ValueSource::Default,
                };
                let parsed = ParsedValue {
                    value: value.unwrap_or_else(|| arg.kind.default_value()),
                    source,
                };
                (arg.dest, parsed)
            })
            .collect();

        Ok(Parsed::Command(
            spec,
            ParsedCommand {
                name: spec.name,
                values,
                ignored,
            },
        ))
    }
}

/// First line of a clap error, without its `error: ` prefix.
fn clap_reason(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).trim().to_string()
}

/// `-x`, `-xVALUE`, but not a bare `-` or a negative number.
fn is_short_flag(tok: &str) -> bool {
    tok.len() > 1 && tok.starts_with('-') && !tok.starts_with("--") && tok[1..].parse::<i64>().is_err()
}
