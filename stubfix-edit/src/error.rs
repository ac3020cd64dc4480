//! Error types for stubfix-edit.
//!
//! Two failure classes:
//! - Rule errors: the supplied rule set is unusable (nothing is read or written).
//! - Runtime errors: I/O failures while reading, backing up, or replacing the target.

use stubfix_types::rule::RuleError;
use thiserror::Error;

/// The top-level error type for stubfix-edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// A rule failed validation before any file access.
    #[error("invalid rule: {0}")]
    Rule(#[from] RuleError),

    /// A runtime/tool error occurred, typically I/O with path context attached.
    #[error("runtime error: {0}")]
    Runtime(#[from] anyhow::Error),
}

impl EditError {
    pub fn is_rule_error(&self) -> bool {
        matches!(self, EditError::Rule(_))
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
