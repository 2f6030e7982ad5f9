//! Script evaluator.
//!
//! Walks the [`Lexer`] output for a script, resolving each fragment as soon
//! as it is recognised:
//!
//! - literal text is unescaped,
//! - `%name%` is looked up in the [`Context`] (missing → `""`),
//! - `$name(...)` has its argument span lexed in [`Mode::Arguments`], every
//!   argument fragment evaluated left to right, the results grouped at the
//!   separators, and the function from the [`FunctionRegistry`] invoked.
//!
//! Arguments are always evaluated eagerly, so `$if(x,$set(a,1),$set(b,2))`
//! sets both variables.  Side effects of calls that ran before a failure are
//! kept in the context.

use std::sync::LazyLock;

use crate::context::Context;

use super::error::{ScriptError, ScriptResult};
use super::lexer::{unescape, Fragment, Lexer, Mode};
use super::registry::FunctionRegistry;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Tunables for an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum number of function calls that may be nested inside one another.
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A function registry plus options; evaluates scripts against a caller's
/// [`Context`].  Immutable once built, so it can be shared between threads.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: FunctionRegistry,
    options: EngineOptions,
}

impl Engine {
    /// Engine with the builtin functions and default options.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::new())
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Engine {
            registry,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluate `script` against `ctx`.
    ///
    /// On error no output is returned, but `$set` calls that already ran
    /// have updated `ctx`.
    pub fn evaluate(&self, script: &str, ctx: &mut Context) -> ScriptResult<String> {
        let mut out = String::with_capacity(script.len());
        for frag in Lexer::new(script, Mode::TopLevel) {
            let frag = frag.inspect_err(|e| tracing::debug!(error = %e, "script rejected"))?;
            self.fragment(frag, ctx, 0, &mut out)?;
        }
        Ok(out)
    }

    /// Append the value of one non-separator fragment to `out`.
    fn fragment(
        &self,
        frag: Fragment<'_>,
        ctx: &mut Context,
        depth: usize,
        out: &mut String,
    ) -> ScriptResult<()> {
        match frag {
            Fragment::Literal(text) => out.push_str(&unescape(text)),
            Fragment::Variable(name) => out.push_str(ctx.lookup(name)),
            Fragment::Call { name, args } => out.push_str(&self.call(name, args, ctx, depth + 1)?),
            Fragment::Separator => {}
        }
        Ok(())
    }

    /// Evaluate `$name(args)` at nesting level `depth` (outermost call is 1).
    fn call(&self, name: &str, args: &str, ctx: &mut Context, depth: usize) -> ScriptResult<String> {
        if depth > self.options.max_depth {
            return Err(ScriptError::TooDeep {
                limit: self.options.max_depth,
            });
        }

        // Offset of the argument span within the call text `$name(`.
        let args_offset = name.len() + 2;
        let mut values: Vec<String> = Vec::new();
        let mut current: Option<String> = None;
        for frag in Lexer::new(args, Mode::Arguments) {
            let frag = frag.map_err(|e| match e {
                ScriptError::Parse { position, remainder } => {
                    ScriptError::parse(args_offset + position, remainder)
                }
                other => other,
            })?;
            match frag {
                Fragment::Separator => values.push(current.take().unwrap_or_default()),
                frag => {
                    let arg = current.get_or_insert_with(String::new);
                    self.fragment(frag, ctx, depth, arg)?;
                }
            }
        }
        // `$f()` has no arguments; `$f(,)` has two empty ones.
        if current.is_some() || !values.is_empty() {
            values.push(current.unwrap_or_default());
        }

        let Some(f) = self.registry.get(name) else {
            tracing::debug!(function = name, "unknown function");
            return Err(ScriptError::UnknownFunction {
                name: name.to_owned(),
            });
        };
        tracing::trace!(function = name, args = ?values, depth, "call");
        f(ctx, &values)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_ENGINE: LazyLock<Engine> = LazyLock::new(Engine::new);

/// Evaluate `script` with the builtin functions and default options.
pub fn evaluate(script: &str, ctx: &mut Context) -> ScriptResult<String> {
    DEFAULT_ENGINE.evaluate(script, ctx)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> String {
        evaluate(src, &mut Context::new()).expect("evaluation failed")
    }

    /// Builtins plus `args`, which reports the arguments it received.
    fn arg_echo() -> Engine {
        let mut reg = FunctionRegistry::new();
        reg.register("args", |_: &mut Context, args: &[String]| {
            Ok(format!("{}:{}", args.len(), args.join("|")))
        });
        Engine::with_registry(reg)
    }

    fn echo(src: &str) -> String {
        arg_echo().evaluate(src, &mut Context::new()).expect("evaluation failed")
    }

    #[test]
    fn empty_script() {
        assert_eq!(eval(""), "");
    }

    #[test]
    fn plain_text_round_trips() {
        assert_eq!(eval("Hello, world (live)!"), "Hello, world (live)!");
    }

    #[test]
    fn escapes_in_literals() {
        assert_eq!(eval(r"\(a\)"), "(a)");
        assert_eq!(eval(r"a\\b"), r"a\b");
        assert_eq!(eval(r"100\%"), r"100\%");
        assert_eq!(eval(r"\$5"), r"\$5");
    }

    #[test]
    fn variables() {
        let mut ctx = Context::new();
        ctx.set("artist", "X");
        assert_eq!(evaluate("%artist%/%ARTIST%", &mut ctx).unwrap(), "X/X");
        assert_eq!(evaluate("[%missing%]", &mut ctx).unwrap(), "[]");
    }

    #[test]
    fn argument_splitting() {
        assert_eq!(echo("$args()"), "0:");
        assert_eq!(echo("$args(a)"), "1:a");
        assert_eq!(echo("$args(,)"), "2:|");
        assert_eq!(echo("$args(a,,b)"), "3:a||b");
        assert_eq!(echo("$args(,a,)"), "3:|a|");
        assert_eq!(echo("$args(%none%)"), "1:");
        assert_eq!(echo("$args(x%none%y,z)"), "2:xy|z");
    }

    #[test]
    fn nested_commas_stay_private() {
        assert_eq!(eval("$noop($left(abcd,2),Z)"), "abZ");
        assert_eq!(echo("$args($noop(a,b),c)"), "2:ab|c");
    }

    #[test]
    fn escaped_comma_is_not_a_separator() {
        assert_eq!(echo(r"$args(a\,b)"), r"1:a\,b");
    }

    #[test]
    fn escaped_parens_in_arguments() {
        assert_eq!(eval(r"$noop(\(x\))"), "(x)");
        assert_eq!(eval("$noop((x))"), "(x)");
    }

    #[test]
    fn nested_calls() {
        assert_eq!(eval("$if($eq(1,1),yes,no)"), "yes");
        assert_eq!(eval("$if($eq(1,2),yes,no)"), "no");
        assert_eq!(eval("$upper($left($lower(ABCD),2))"), "AB");
    }

    #[test]
    fn set_is_visible_later() {
        let mut ctx = Context::new();
        assert_eq!(evaluate("$set(x,5)%x%", &mut ctx).unwrap(), "5");
        assert_eq!(ctx.get("x"), Some("5"));
        assert_eq!(evaluate("%X%$get(x)", &mut ctx).unwrap(), "55");
    }

    #[test]
    fn arguments_evaluated_eagerly() {
        let mut ctx = Context::new();
        evaluate("$if(1,$set(a,1),$set(b,2))", &mut ctx).unwrap();
        assert_eq!(ctx.lookup("a"), "1");
        assert_eq!(ctx.lookup("b"), "2");
    }

    #[test]
    fn unknown_function() {
        let err = evaluate("ok $nope(1)", &mut Context::new()).unwrap_err();
        assert_eq!(err, ScriptError::UnknownFunction { name: "nope".into() });
        assert_eq!(err.to_string(), "Unknown function $nope");
    }

    #[test]
    fn function_names_are_case_sensitive() {
        assert!(matches!(
            evaluate("$UPPER(a)", &mut Context::new()),
            Err(ScriptError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn unbalanced_parens() {
        assert_eq!(
            evaluate("$upper(abc", &mut Context::new()),
            Err(ScriptError::parse(0, "$upper(abc"))
        );
    }

    #[test]
    fn parse_error_inside_arguments_is_relative_to_call() {
        // `$noop(` is 6 bytes; the stray `%` sits at offset 1 of the span.
        assert_eq!(
            evaluate("ab$noop(x%)", &mut Context::new()),
            Err(ScriptError::parse(7, "%"))
        );
    }

    #[test]
    fn side_effects_survive_failures() {
        let mut ctx = Context::new();
        assert!(evaluate("$set(a,1)$nope()", &mut ctx).is_err());
        assert!(evaluate("$set(b,2)%", &mut ctx).is_err());
        assert_eq!(ctx.lookup("a"), "1");
        assert_eq!(ctx.lookup("b"), "2");
    }

    #[test]
    fn function_errors_propagate() {
        assert_eq!(
            evaluate("$add(1,x)", &mut Context::new()),
            Err(ScriptError::argument("add", "invalid integer: \"x\""))
        );
    }

    #[test]
    fn depth_limit() {
        let engine = Engine::new().with_options(EngineOptions { max_depth: 2 });
        let mut ctx = Context::new();
        assert_eq!(engine.evaluate("$noop($noop(a))", &mut ctx).unwrap(), "a");
        assert_eq!(
            engine.evaluate("$noop($noop($noop(a)))", &mut ctx),
            Err(ScriptError::TooDeep { limit: 2 })
        );
    }

    #[test]
    fn deep_nesting_within_default_limit() {
        let depth = DEFAULT_MAX_DEPTH;
        let src = format!("{}x{}", "$noop(".repeat(depth), ")".repeat(depth));
        assert_eq!(eval(&src), "x");
    }
}
