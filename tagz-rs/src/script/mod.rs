//! Tagger script language.
//!
//! A script mixes literal text, `%variable%` references and `$function(...)`
//! calls, and evaluates to a single string:
//!
//! ```rust
//! use tagz::context::Context;
//! use tagz::script::evaluate;
//!
//! let mut ctx: Context = [("artist", "Queen"), ("tracknumber", "7")].into_iter().collect();
//! let path = evaluate("$upper(%artist%)/$num(%tracknumber%,2)", &mut ctx).unwrap();
//! assert_eq!(path, "QUEEN/07");
//! ```
//!
//! Extra functions are added through a [`FunctionRegistry`] handed to
//! [`Engine::with_registry`].

pub mod builtins;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod registry;

// Re-exports for convenience.
pub use error::{ScriptError, ScriptResult};
pub use eval::{evaluate, Engine, EngineOptions, DEFAULT_MAX_DEPTH};
pub use registry::{FunctionProvider, FunctionRegistry, ScriptFn};
