//! Named-value store that scripts read from and `$set` writes into.
//!
//! Names are case-insensitive: every key is ASCII lower-cased on the way in
//! and on lookup, so `%Artist%`, `%ARTIST%` and `$get(artist)` all see the
//! same entry.  The store belongs to the caller and may be reused across many
//! evaluations; the engine only ever inserts or overwrites entries.

use std::borrow::Cow;
use std::collections::BTreeMap;

/// Mutable variable table handed to [`Engine::evaluate`](crate::script::Engine::evaluate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    vars: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.vars
            .insert(normalize(name.as_ref()).into_owned(), value.into());
    }

    /// Get the value of a variable, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(normalize(name).as_ref()).map(String::as_str)
    }

    /// Value of a variable, or `""` when it is not set.
    pub fn lookup(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(normalize(name).as_ref()).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(normalize(name).as_ref())
    }

    /// Iterate over all variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        ctx.extend(iter);
        ctx
    }
}

fn normalize(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
