//! Tagger script engine.
//!
//! Turns per-item metadata (a [`Context`](context::Context) of named string
//! values) into derived strings such as tag values or file paths, using a
//! small template language of `%variable%` references and `$function(...)`
//! calls.  See [`script`] for the language and [`config`] / [`cli`] for the
//! `tagz` command-line front end.

pub mod cli;
pub mod config;
pub mod context;
pub mod script;
