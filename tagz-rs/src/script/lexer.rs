//! Scanner for tagger script text.
//!
//! A script is a run of three kinds of fragment, recognised in this order of
//! priority at each position:
//!
//! | Fragment  | Form                 | Notes                                     |
//! |-----------|----------------------|-------------------------------------------|
//! | literal   | anything else        | stops at `%` / `$` (and `,` in arguments) |
//! | variable  | `%name%`             | `name` is one or more word characters     |
//! | call      | `$name(arguments)`   | arguments span up to the balancing `)`    |
//!
//! Inside a call's argument span an unescaped `,` is an argument separator
//! and is tried before everything else.  A backslash makes the following
//! character opaque: `\%`, `\$`, `\,` stay in the literal run, and `\(` / `\)`
//! do not count towards parenthesis balancing.
//!
//! The lexer is an iterator so the evaluator can act on each fragment as soon
//! as it is recognised.  After the first error it yields nothing further.

use std::borrow::Cow;

use super::error::ScriptError;

// ── Public types ─────────────────────────────────────────────────────────────

/// Which token set the lexer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole script: literals, variables, calls.
    TopLevel,
    /// A call's argument span: additionally splits on top-level `,`.
    Arguments,
}

/// One recognised piece of script text, borrowing from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Raw literal text, escapes not yet resolved (see [`unescape`]).
    Literal(&'a str),
    /// `%name%`: holds `name` as written.
    Variable(&'a str),
    /// `$name(args)`: `args` is the raw text between the outer parentheses.
    Call { name: &'a str, args: &'a str },
    /// Unescaped top-level `,` inside an argument span.
    Separator,
}

/// Iterator over the fragments of `src`.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    mode: Mode,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, mode: Mode) -> Self {
        Lexer {
            src,
            pos: 0,
            mode,
            failed: false,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Fragment<'a>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.src.len() {
            return None;
        }
        let rest = &self.src[self.pos..];

        if self.mode == Mode::Arguments && rest.starts_with(',') {
            self.pos += 1;
            return Some(Ok(Fragment::Separator));
        }

        let n = literal_len(rest, self.mode);
        if n > 0 {
            self.pos += n;
            return Some(Ok(Fragment::Literal(&rest[..n])));
        }

        if let Some(n) = variable_len(rest) {
            self.pos += n;
            return Some(Ok(Fragment::Variable(&rest[1..n - 1])));
        }

        if let Some((name_end, close)) = call_bounds(rest) {
            self.pos += close + 1;
            return Some(Ok(Fragment::Call {
                name: &rest[1..name_end],
                args: &rest[name_end + 1..close],
            }));
        }

        self.failed = true;
        Some(Err(ScriptError::parse(self.pos, rest)))
    }
}

/// Resolve the three escapes the language rewrites: `\(`, `\)` and `\\`.
///
/// Any other `\x` pair is left as the two characters `\x`, even though the
/// scanner accepted it as an escape.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("\\(", "(")
            .replace("\\)", ")")
            .replace("\\\\", "\\"),
    )
}

/// Returns `true` if `c` may appear in a variable or function name.
pub fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

// ── Matchers ──────────────────────────────────────────────────────────────────

/// Length of the literal run at the start of `s` (0 if none).
///
/// Stop characters are all ASCII, so every stop index is a char boundary even
/// though the loop steps over bytes.
fn literal_len(s: &str, mode: Mode) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'\\' => i = (i + 2).min(b.len()),
            b'%' | b'$' => break,
            b',' if mode == Mode::Arguments => break,
            _ => i += 1,
        }
    }
    i
}

fn word_len(b: &[u8]) -> usize {
    b.iter().take_while(|&&c| is_word_byte(c)).count()
}

/// `%name%` → total length including both `%`.
fn variable_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    if b.first() != Some(&b'%') {
        return None;
    }
    let n = word_len(&b[1..]);
    (n > 0 && b.get(n + 1) == Some(&b'%')).then_some(n + 2)
}

/// `$name(...)` → (index of `(`, index of the balancing `)`).
fn call_bounds(s: &str) -> Option<(usize, usize)> {
    let b = s.as_bytes();
    if b.first() != Some(&b'$') {
        return None;
    }
    let n = word_len(&b[1..]);
    let open = n + 1;
    if n == 0 || b.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 1usize;
    let mut i = open + 1;
    while i < b.len() {
        match b[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, i));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str, mode: Mode) -> Result<Vec<Fragment<'_>>, ScriptError> {
        Lexer::new(src, mode).collect()
    }

    #[test]
    fn empty_input() {
        assert!(lex("", Mode::TopLevel).unwrap().is_empty());
    }

    #[test]
    fn mixed_fragments() {
        let frags = lex("%artist% - $upper(%title%)!", Mode::TopLevel).unwrap();
        assert_eq!(
            frags,
            vec![
                Fragment::Variable("artist"),
                Fragment::Literal(" - "),
                Fragment::Call { name: "upper", args: "%title%" },
                Fragment::Literal("!"),
            ]
        );
    }

    #[test]
    fn commas_are_literal_at_top_level() {
        assert_eq!(
            lex("a,b", Mode::TopLevel).unwrap(),
            vec![Fragment::Literal("a,b")]
        );
    }

    #[test]
    fn argument_separators() {
        assert_eq!(
            lex(",a,,%x%,", Mode::Arguments).unwrap(),
            vec![
                Fragment::Separator,
                Fragment::Literal("a"),
                Fragment::Separator,
                Fragment::Separator,
                Fragment::Variable("x"),
                Fragment::Separator,
            ]
        );
    }

    #[test]
    fn nested_call_keeps_its_commas() {
        assert_eq!(
            lex("$left(abcd,2),Z", Mode::Arguments).unwrap(),
            vec![
                Fragment::Call { name: "left", args: "abcd,2" },
                Fragment::Separator,
                Fragment::Literal("Z"),
            ]
        );
    }

    #[test]
    fn escapes_stay_in_literal() {
        assert_eq!(
            lex(r"50\% off\, \$5", Mode::Arguments).unwrap(),
            vec![Fragment::Literal(r"50\% off\, \$5")]
        );
    }

    #[test]
    fn escaped_parens_do_not_balance() {
        assert_eq!(
            lex(r"$noop(a\)b)", Mode::TopLevel).unwrap(),
            vec![Fragment::Call { name: "noop", args: r"a\)b" }]
        );
        assert!(lex(r"$noop(a\)", Mode::TopLevel).is_err());
    }

    #[test]
    fn literal_parens_inside_call() {
        assert_eq!(
            lex("$noop((x)(y))", Mode::TopLevel).unwrap(),
            vec![Fragment::Call { name: "noop", args: "(x)(y)" }]
        );
    }

    #[test]
    fn deep_paren_nesting_has_no_ceiling() {
        let src = format!("$noop({}{})", "(".repeat(200), ")".repeat(200));
        let frags = lex(&src, Mode::TopLevel).unwrap();
        assert_eq!(frags.len(), 1);
    }

    #[test]
    fn stray_percent_is_an_error() {
        let mut lexer = Lexer::new("100%", Mode::TopLevel);
        assert_eq!(lexer.next(), Some(Ok(Fragment::Literal("100"))));
        assert_eq!(lexer.next(), Some(Err(ScriptError::parse(3, "%"))));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn dollar_without_call_is_an_error() {
        assert_eq!(lex("$x", Mode::TopLevel), Err(ScriptError::parse(0, "$x")));
        assert_eq!(
            lex("$upper(abc", Mode::TopLevel),
            Err(ScriptError::parse(0, "$upper(abc"))
        );
    }

    #[test]
    fn trailing_backslash_is_literal() {
        assert_eq!(lex("a\\", Mode::TopLevel).unwrap(), vec![Fragment::Literal("a\\")]);
    }

    #[test]
    fn escaped_multibyte_char() {
        assert_eq!(
            lex("\\é%x%", Mode::TopLevel).unwrap(),
            vec![Fragment::Literal("\\é"), Fragment::Variable("x")]
        );
    }

    #[test]
    fn unescape_only_rewrites_three_pairs() {
        assert_eq!(unescape(r"\(a\)"), "(a)");
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape(r"\%\,\n"), r"\%\,\n");
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }
}
