//! Errors raised while evaluating a tagger script.

use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Every way an evaluation can fail.
///
/// Unknown *variables* are not errors (they resolve to `""`); unknown
/// *functions* are.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Input the scanner could not match.  `position` is a byte offset: into
    /// the script for top-level failures, into the enclosing call text
    /// (starting at its `$`) for failures inside an argument list.
    #[error("parse error at offset {position}: unexpected {remainder:?}")]
    Parse { position: usize, remainder: String },

    /// Function calls nested deeper than the engine allows.
    #[error("function calls nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    #[error("Unknown function ${name}")]
    UnknownFunction { name: String },

    /// A function rejected its arguments (bad count, malformed integer, …).
    #[error("${function}: {issue}")]
    Argument { function: String, issue: String },

    #[error("${function}: invalid pattern: {message}")]
    Pattern { function: String, message: String },
}

impl ScriptError {
    #[inline]
    pub fn parse(position: usize, remainder: impl Into<String>) -> Self {
        Self::Parse {
            position,
            remainder: remainder.into(),
        }
    }

    #[inline]
    pub fn argument(function: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::Argument {
            function: function.into(),
            issue: issue.into(),
        }
    }
}
