use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A slash command split into its target service, action and arguments.
///
/// `args` holds `key=value` tokens; bare tokens stay in `positional`, in the
/// order they were typed, and are bound to parameter names at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub service: String,
    pub action: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positional: Vec<String>,
}

impl Command {
    pub fn new(service: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            action: action.into(),
            args: BTreeMap::new(),
            positional: Vec::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional.push(value.into());
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

// ---------------------------------------------------------------------------
// Parsed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Command(Command),
    /// Free-form chat text, carried verbatim.
    NotACommand(String),
}

impl Parsed {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Parsed::Command(c) => Some(c),
            Parsed::NotACommand(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"))
}

/// Parse raw chat input. Total over all strings: never panics, never errors.
///
/// Unknown services are passed through; deciding whether a service exists is
/// the dispatcher's job.
pub fn parse(input: &str) -> Parsed {
    let Some(body) = input.strip_prefix('/') else {
        return Parsed::NotACommand(input.to_string());
    };

    let (service, rest) = split_word(body);
    if service.is_empty() {
        return Parsed::NotACommand(input.to_string());
    }
    let (action, rest) = split_word(rest.trim_start());

    let mut command = Command::new(service, action);
    for token in tokenize(rest) {
        match token.key {
            Some(key) => {
                command.args.insert(key, token.value);
            }
            None => command.positional.push(token.value),
        }
    }
    Parsed::Command(command)
}

/// Split off the leading run of non-whitespace characters.
fn split_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

struct Token {
    key: Option<String>,
    value: String,
}

/// Whitespace tokenizer with double-quote grouping. Inside quotes a backslash
/// escapes the next character. A `key=` prefix is only recognised before any
/// quote in the token, so `"a=b"` stays a positional value.
fn tokenize(s: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut buf = String::new();
        let mut key: Option<String> = None;
        let mut saw_quote = false;
        let mut in_quotes = false;

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            buf.push(escaped);
                        }
                    }
                    '"' => in_quotes = false,
                    _ => buf.push(c),
                }
                continue;
            }
            match c {
                c if c.is_whitespace() => break,
                '"' => {
                    in_quotes = true;
                    saw_quote = true;
                }
                '=' if key.is_none() && !saw_quote && identifier_re().is_match(&buf) => {
                    key = Some(std::mem::take(&mut buf));
                }
                _ => buf.push(c),
            }
        }

        tokens.push(Token { key, value: buf });
    }

    tokens
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a command back to canonical text: positional values first, then
/// named arguments in key order, quoting any value that would not survive a
/// re-parse unquoted.
pub fn format(command: &Command) -> String {
    let mut out = format!("/{}", command.service);
    if !command.action.is_empty() {
        out.push(' ');
        out.push_str(&command.action);
    }
    for value in &command.positional {
        out.push(' ');
        out.push_str(&quote_if_needed(value));
    }
    for (key, value) in &command.args {
        out.push(' ');
        out.push_str(key);
        out.push('=');
        out.push_str(&quote_if_needed(value));
    }
    out
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\' | '='));
    if !needs_quotes {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
