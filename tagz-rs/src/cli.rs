//! Command-line argument parsing.
//!
//! Usage:
//!   tagz [-f[<file>]] [-D<name>=<value>]... [-m<depth>] [-d] [<script>]
//!
//! With a script argument the script is evaluated once.  Without one, each
//! line of standard input is evaluated as a script against the same context.

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which config file to load.
    pub config: ConfigFile,
    /// Context entries given with `-D<name>=<value>`, in command-line order.
    pub defines: Vec<(String, String)>,
    /// Override for the nesting limit (`-m<depth>`).
    pub max_depth: Option<usize>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Script to evaluate; `None` means read scripts from stdin.
    pub script: Option<String>,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `~/.tagzrc`, `./.tagzrc` in order (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the config file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        // Embedded: -f<file>
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len(); // consumed rest of this arg
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        // Separate: -f <file>
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        // -f alone → skip config
                        args.config = ConfigFile::Skip;
                    }
                }

                // -D<name>=<value>
                'D' => {
                    let def = flag_value(&chars, &mut j, argv, &mut i)
                        .ok_or("-D requires a name=value argument")?;
                    let (name, value) = def
                        .split_once('=')
                        .ok_or_else(|| format!("-D expects name=value, got '{def}'"))?;
                    if name.is_empty() {
                        return Err("-D: variable name cannot be empty".to_owned());
                    }
                    args.defines.push((name.to_owned(), value.to_owned()));
                }

                // -m<depth>
                'm' => {
                    let depth = flag_value(&chars, &mut j, argv, &mut i)
                        .ok_or("-m requires a depth argument")?;
                    let depth: usize = depth
                        .parse()
                        .map_err(|_| format!("invalid depth: {depth}"))?;
                    args.max_depth = Some(depth);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 => args.script = positional.pop(),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

/// Value of a flag that takes one: the rest of this token, or the next one.
fn flag_value(chars: &[char], j: &mut usize, argv: &[String], i: &mut usize) -> Option<String> {
    if *j + 1 < chars.len() {
        let s: String = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Some(s)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Some(argv[*i].clone())
    } else {
        None
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_default();
    [format!("{home}/.tagzrc"), "./.tagzrc".to_owned()]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
