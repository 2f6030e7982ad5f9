//! Function table consulted by `$name(...)` calls.
//!
//! A registry starts from the builtin catalog and is then extended, in a
//! caller-chosen order, by zero or more [`FunctionProvider`]s.  A later entry
//! replaces an earlier one with the same name, so providers can override
//! builtins.  Once handed to an [`Engine`](super::Engine) the table is never
//! mutated again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;

use super::builtins;
use super::error::ScriptResult;

/// A script function: receives the context and its already-evaluated
/// arguments, returns the replacement text.
pub type ScriptFn = Arc<dyn Fn(&mut Context, &[String]) -> ScriptResult<String> + Send + Sync>;

/// An external supplier of script functions.
///
/// The returned list is ordered; when it names the same function twice the
/// last entry wins.
pub trait FunctionProvider {
    fn functions(&self) -> Vec<(String, ScriptFn)>;
}

impl FunctionProvider for Vec<(String, ScriptFn)> {
    fn functions(&self) -> Vec<(String, ScriptFn)> {
        self.clone()
    }
}

impl FunctionProvider for [(String, ScriptFn)] {
    fn functions(&self) -> Vec<(String, ScriptFn)> {
        self.to_vec()
    }
}

/// Name → implementation table.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ScriptFn>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

impl FunctionRegistry {
    /// A registry with no functions at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the builtin catalog.
    pub fn new() -> Self {
        let mut reg = Self::empty();
        for &(name, f) in builtins::CATALOG {
            reg.register(name, f);
        }
        reg
    }

    /// Builtins, then each provider in slice order.
    pub fn with_providers(providers: &[&dyn FunctionProvider]) -> Self {
        let mut reg = Self::new();
        for provider in providers {
            reg.extend_from(*provider);
        }
        reg
    }

    /// Add or replace a function.  Returns the implementation it displaced.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> Option<ScriptFn>
    where
        F: Fn(&mut Context, &[String]) -> ScriptResult<String> + Send + Sync + 'static,
    {
        self.register_arc(name, Arc::new(f))
    }

    pub fn register_arc(&mut self, name: impl Into<String>, f: ScriptFn) -> Option<ScriptFn> {
        let name = name.into();
        let previous = self.functions.insert(name.clone(), f);
        if previous.is_some() {
            tracing::debug!(function = %name, "function overridden");
        }
        previous
    }

    /// Merge a provider's table, its entries taking precedence.
    pub fn extend_from(&mut self, provider: &dyn FunctionProvider) {
        for (name, f) in provider.functions() {
            self.register_arc(name, f);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScriptFn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
