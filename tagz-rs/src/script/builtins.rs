//! Builtin tagger script functions.
//!
//! Every function receives the [`Context`] and its already-evaluated string
//! arguments and returns a string.  Booleans are `"1"` for true and `""` for
//! false; any non-empty string counts as true.  The comparison functions
//! compare the raw strings lexicographically, so `$lt(9,10)` is false.

use regex::Regex;

use crate::context::Context;

use super::error::{ScriptError, ScriptResult};

/// Upper bound, in bytes, on the padding `$pad` and `$num` will generate.
pub const MAX_PADDING: usize = 1 << 20;

/// Signature shared by all builtins.
pub type Builtin = fn(&mut Context, &[String]) -> ScriptResult<String>;

/// The default catalog, in registration order.
pub const CATALOG: &[(&str, Builtin)] = &[
    ("noop", func_noop),
    ("if", func_if),
    ("if2", func_if2),
    ("eq", func_eq),
    ("ne", func_ne),
    ("lt", func_lt),
    ("lte", func_lte),
    ("gt", func_gt),
    ("gte", func_gte),
    ("left", func_left),
    ("right", func_right),
    ("lower", func_lower),
    ("upper", func_upper),
    ("pad", func_pad),
    ("strip", func_strip),
    ("trim", func_trim),
    ("replace", func_replace),
    ("rreplace", func_rreplace),
    ("rsearch", func_rsearch),
    ("num", func_num),
    ("set", func_set),
    ("get", func_get),
    ("add", func_add),
    ("sub", func_sub),
    ("mul", func_mul),
    ("div", func_div),
    ("mod", func_mod),
    ("or", func_or),
    ("and", func_and),
    ("not", func_not),
];

// ── Conditionals ─────────────────────────────────────────────────────────────

fn func_noop(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    Ok(args.concat())
}

/// `$if(cond,then[,else])`
fn func_if(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("if", args, 2, Some(3))?;
    Ok(if !args[0].is_empty() {
        args[1].clone()
    } else {
        args.get(2).cloned().unwrap_or_default()
    })
}

/// First non-empty argument, or the last one if all are empty.
fn func_if2(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("if2", args, 1, None)?;
    Ok(args
        .iter()
        .find(|a| !a.is_empty())
        .or(args.last())
        .cloned()
        .unwrap_or_default())
}

// ── Comparison ───────────────────────────────────────────────────────────────

fn func_eq(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("eq", args)?;
    Ok(truth(x == y))
}

fn func_ne(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("ne", args)?;
    Ok(truth(x != y))
}

fn func_lt(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("lt", args)?;
    Ok(truth(x < y))
}

fn func_lte(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("lte", args)?;
    Ok(truth(x <= y))
}

fn func_gt(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("gt", args)?;
    Ok(truth(x > y))
}

fn func_gte(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("gte", args)?;
    Ok(truth(x >= y))
}

// ── String functions ─────────────────────────────────────────────────────────

/// `$left(text,n)`: like `text[:n]`: a negative `n` drops characters from the end.
fn func_left(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [text, length] = two("left", args)?;
    let n = int_arg("left", length)?;
    let chars: Vec<char> = text.chars().collect();
    let end = slice_index(n, chars.len());
    Ok(chars[..end].iter().collect())
}

/// `$right(text,n)`: like `text[-n:]`, which makes `n == 0` the whole text.
fn func_right(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [text, length] = two("right", args)?;
    let n = int_arg("right", length)?;
    let chars: Vec<char> = text.chars().collect();
    let start = slice_index(n.saturating_neg(), chars.len());
    Ok(chars[start..].iter().collect())
}

fn func_lower(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("lower", args, 1, Some(1))?;
    Ok(args[0].to_lowercase())
}

fn func_upper(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("upper", args, 1, Some(1))?;
    Ok(args[0].to_uppercase())
}

/// `$pad(text,length,fill)`: prepend `fill` until `text` is `length` chars long.
///
/// A length whose padding would exceed [`MAX_PADDING`] bytes leaves `text`
/// unchanged.
fn func_pad(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("pad", args, 3, Some(3))?;
    let (text, fill) = (&args[0], &args[2]);
    let length = int_arg("pad", &args[1])?;
    let cur = text.chars().count() as i64;
    let missing = usize::try_from(length.saturating_sub(cur)).unwrap_or(0);
    match missing.checked_mul(fill.len()) {
        Some(bytes) if bytes <= MAX_PADDING => Ok(fill.repeat(missing) + text),
        _ => {
            tracing::debug!(length, "pad length out of range, text left unchanged");
            Ok(text.clone())
        }
    }
}

/// Collapse whitespace runs to one space and trim both ends.
fn func_strip(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("strip", args, 1, Some(1))?;
    Ok(args[0].split_whitespace().collect::<Vec<_>>().join(" "))
}

/// `$trim(text[,chars])`: whitespace, or any of `chars`, from both ends.
fn func_trim(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("trim", args, 1, Some(2))?;
    let text = &args[0];
    Ok(match args.get(1).filter(|c| !c.is_empty()) {
        Some(set) => text.trim_matches(|c: char| set.contains(c)).to_owned(),
        None => text.trim().to_owned(),
    })
}

fn func_replace(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("replace", args, 3, Some(3))?;
    Ok(args[0].replace(args[1].as_str(), &args[2]))
}

/// `$rreplace(text,pattern,replacement)`: regex replace of every match.
fn func_rreplace(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("rreplace", args, 3, Some(3))?;
    let re = compile("rreplace", &args[1])?;
    let template = replacement_template(&args[2]);
    Ok(re.replace_all(&args[0], template.as_str()).into_owned())
}

/// `$rsearch(text,pattern)`: capture group 1 of the first match.
fn func_rsearch(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [text, pattern] = two("rsearch", args)?;
    let re = compile("rsearch", pattern)?;
    let Some(caps) = re.captures(text) else {
        return Ok(String::new());
    };
    if re.captures_len() < 2 {
        return Err(ScriptError::argument("rsearch", "pattern has no capture group 1"));
    }
    Ok(caps.get(1).map(|m| m.as_str().to_owned()).unwrap_or_default())
}

/// `$num(value,width)`: zero-padded decimal; a negative width left-justifies.
/// Widths above [`MAX_PADDING`] are rejected.
fn func_num(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [text, length] = two("num", args)?;
    let n = int_arg("num", text)?;
    let width = int_arg("num", length)?;
    let w = usize::try_from(width.unsigned_abs())
        .ok()
        .filter(|&w| w <= MAX_PADDING)
        .ok_or_else(|| ScriptError::argument("num", format!("width out of range: {width}")))?;
    let sign = if n < 0 { "-" } else { "" };
    let digits = n.unsigned_abs().to_string();
    let used = sign.len() + digits.len();
    Ok(if width >= 0 {
        format!("{sign}{}{digits}", "0".repeat(w.saturating_sub(used)))
    } else {
        format!("{sign}{digits}{}", " ".repeat(w.saturating_sub(used)))
    })
}

// ── Variables ────────────────────────────────────────────────────────────────

fn func_set(ctx: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [name, value] = two("set", args)?;
    ctx.set(name, value.clone());
    Ok(String::new())
}

fn func_get(ctx: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("get", args, 1, Some(1))?;
    Ok(ctx.lookup(&args[0]).to_owned())
}

// ── Arithmetic ───────────────────────────────────────────────────────────────

fn func_add(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arith("add", args, i64::checked_add)
}

fn func_sub(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arith("sub", args, i64::checked_sub)
}

fn func_mul(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arith("mul", args, i64::checked_mul)
}

/// Floor division: `$div(-7,2)` is `-4`.
fn func_div(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let (x, y) = int_pair("div", args)?;
    if y == 0 {
        return Err(ScriptError::argument("div", "division by zero"));
    }
    let q = x.checked_div(y).ok_or_else(|| overflow("div"))?;
    Ok((if x % y != 0 && (x < 0) != (y < 0) { q - 1 } else { q }).to_string())
}

/// Floor modulo: the result takes the sign of the divisor.
fn func_mod(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let (x, y) = int_pair("mod", args)?;
    if y == 0 {
        return Err(ScriptError::argument("mod", "modulo by zero"));
    }
    let r = x.checked_rem(y).unwrap_or(0); // only MIN % -1 overflows, and that is 0
    Ok((if r != 0 && (r < 0) != (y < 0) { r + y } else { r }).to_string())
}

// ── Boolean ──────────────────────────────────────────────────────────────────

fn func_or(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("or", args)?;
    Ok(truth(!x.is_empty() || !y.is_empty()))
}

fn func_and(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    let [x, y] = two("and", args)?;
    Ok(truth(!x.is_empty() && !y.is_empty()))
}

fn func_not(_: &mut Context, args: &[String]) -> ScriptResult<String> {
    arity("not", args, 1, Some(1))?;
    Ok(truth(args[0].is_empty()))
}

// ── Argument helpers ─────────────────────────────────────────────────────────

fn truth(b: bool) -> String {
    if b { "1".to_owned() } else { String::new() }
}

fn arity(name: &str, args: &[String], min: usize, max: Option<usize>) -> ScriptResult<()> {
    let n = args.len();
    let ok = n >= min && max.map_or(true, |m| n <= m);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(m) if m == min => format!("{min}"),
        Some(m) => format!("{min} to {m}"),
        None => format!("at least {min}"),
    };
    Err(ScriptError::argument(
        name,
        format!("expected {expected} argument(s), got {n}"),
    ))
}

fn two<'a>(name: &str, args: &'a [String]) -> ScriptResult<[&'a String; 2]> {
    arity(name, args, 2, Some(2))?;
    Ok([&args[0], &args[1]])
}

/// Parse a decimal integer, tolerating surrounding whitespace and a sign.
fn int_arg(name: &str, s: &str) -> ScriptResult<i64> {
    s.trim()
        .parse()
        .map_err(|_| ScriptError::argument(name, format!("invalid integer: {s:?}")))
}

fn int_pair(name: &str, args: &[String]) -> ScriptResult<(i64, i64)> {
    let [x, y] = two(name, args)?;
    Ok((int_arg(name, x)?, int_arg(name, y)?))
}

fn arith(name: &str, args: &[String], op: fn(i64, i64) -> Option<i64>) -> ScriptResult<String> {
    let (x, y) = int_pair(name, args)?;
    op(x, y).map(|v| v.to_string()).ok_or_else(|| overflow(name))
}

fn overflow(name: &str) -> ScriptError {
    ScriptError::argument(name, "integer overflow")
}

/// Clamp a possibly negative sequence index the way slicing does.
fn slice_index(i: i64, len: usize) -> usize {
    let len = len as i64;
    (if i < 0 { len + i } else { i }).clamp(0, len) as usize
}

fn compile(name: &str, pattern: &str) -> ScriptResult<Regex> {
    Regex::new(pattern).map_err(|e| ScriptError::Pattern {
        function: name.to_owned(),
        message: e.to_string(),
    })
}

/// Translate a backslash-style replacement (`\1`, `\g<name>`, `\\`) into the
/// `$`-style template the `regex` crate expands.  Literal `$` is escaped.
fn replacement_template(repl: &str) -> String {
    let mut out = String::with_capacity(repl.len());
    let mut chars = repl.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while group.len() < 2 && matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
                        group.extend(chars.next());
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') => {
                    let mut ahead = chars.clone();
                    ahead.next(); // 'g'
                    let named = if ahead.next() == Some('<') {
                        let mut name = String::new();
                        let mut closed = false;
                        for ch in ahead.by_ref() {
                            if ch == '>' {
                                closed = true;
                                break;
                            }
                            name.push(ch);
                        }
                        (closed
                            && !name.is_empty()
                            && name.chars().all(|ch| ch.is_alphanumeric() || ch == '_'))
                            .then_some(name)
                    } else {
                        None
                    };
                    match named {
                        Some(name) => {
                            out.push_str(&format!("${{{name}}}"));
                            chars = ahead;
                        }
                        None => out.push('\\'),
                    }
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
