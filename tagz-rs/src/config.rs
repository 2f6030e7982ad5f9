//! `.tagzrc` configuration file parser.
//!
//! A line-oriented file that seeds the evaluation context and tunes the
//! engine:
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | set a context variable |
//! | `/option <name>=<value>` | set an engine option (`max_depth`) |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |

use std::path::Path;

use crate::context::Context;
use crate::script::EngineOptions;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parsed configuration: initial variables and engine options.
#[derive(Debug, Default)]
pub struct Config {
    pub vars: Context,
    pub options: EngineOptions,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of problems on recognised lines; a bad
    /// line is skipped and the rest of the file still applies.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            // blank lines and comments (`;` or `;;` prefix)
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected a /command, found {line:?}"),
                });
                continue;
            };

            // split off the command name
            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let tokens = split_args(args_str.trim());

            let result = match cmd {
                "set" => parse_set(&tokens, &mut config.vars),
                "option" => parse_option(&tokens, &mut config.options),
                _ => {
                    tracing::debug!(line = lineno, command = cmd, "skipping unknown command");
                    Ok(())
                }
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

/// Split `name=value` or `name value...` into its two halves.
fn name_value(cmd: &str, tokens: &[String]) -> Result<(String, String), String> {
    if tokens.is_empty() {
        return Err(format!("/{cmd}: requires an argument"));
    }

    let (name, value) = if let Some((n, v)) = tokens[0].split_once('=') {
        (n.to_owned(), v.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/{cmd}: missing value for '{}'", tokens[0]));
    };

    if name.is_empty() {
        return Err(format!("/{cmd}: name cannot be empty"));
    }
    Ok((name, value))
}

// ── /set ─────────────────────────────────────────────────────────────────────

fn parse_set(tokens: &[String], vars: &mut Context) -> Result<(), String> {
    let (name, value) = name_value("set", tokens)?;
    vars.set(name, value);
    Ok(())
}

// ── /option ──────────────────────────────────────────────────────────────────

fn parse_option(tokens: &[String], options: &mut EngineOptions) -> Result<(), String> {
    let (name, value) = name_value("option", tokens)?;
    match name.as_str() {
        "max_depth" => {
            options.max_depth = value
                .parse()
                .map_err(|_| format!("/option: invalid max_depth '{value}'"))?;
            Ok(())
        }
        other => Err(format!("/option: unknown option '{other}'")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
