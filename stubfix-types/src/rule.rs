use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absolute import emitted by the protocol compiler.
pub const DEFAULT_PATTERN: &str = "import llmserver_pb2 as llmserver__pb2";

/// Package-relative form of [`DEFAULT_PATTERN`].
pub const DEFAULT_REPLACEMENT: &str = "from . import llmserver_pb2 as llmserver__pb2";

/// A literal substitution applied to the stub contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRule {
    pub pattern: String,
    pub replacement: String,
}

impl ImportRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Every byte offset at which `pattern` starts inside `replacement`,
    /// overlapping occurrences included.
    ///
    /// Occurrences lined up with one of these offsets inside an already-applied
    /// replacement are left alone, which keeps the rewrite idempotent.
    pub fn pattern_offsets_in_replacement(&self) -> Vec<usize> {
        if self.pattern.is_empty() {
            return vec![];
        }
        self.replacement
            .char_indices()
            .map(|(i, _)| i)
            .filter(|&i| self.replacement[i..].starts_with(&self.pattern))
            .collect()
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.pattern.is_empty() {
            return Err(RuleError::EmptyPattern {
                replacement: self.replacement.clone(),
            });
        }
        Ok(())
    }
}

impl Default for ImportRule {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN, DEFAULT_REPLACEMENT)
    }
}

/// The rule set used when no configuration overrides it.
pub fn default_rules() -> Vec<ImportRule> {
    vec![ImportRule::default()]
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule pattern must not be empty (replacement: {replacement:?})")]
    EmptyPattern { replacement: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_is_the_llmserver_pair() {
        let rule = ImportRule::default();
        assert_eq!(rule.pattern, "import llmserver_pb2 as llmserver__pb2");
        assert_eq!(
            rule.replacement,
            "from . import llmserver_pb2 as llmserver__pb2"
        );
        assert_eq!(default_rules(), vec![rule]);
    }

    #[test]
    fn default_rule_pattern_sits_after_from_prefix() {
        assert_eq!(
            ImportRule::default().pattern_offsets_in_replacement(),
            vec!["from . ".len()]
        );
    }

    #[test]
    fn unrelated_replacement_has_no_offset() {
        let rule = ImportRule::new("import a", "import b");
        assert!(rule.pattern_offsets_in_replacement().is_empty());
    }

    #[test]
    fn repeated_pattern_reports_every_offset() {
        let rule = ImportRule::new("import a_pb2", "import a_pb2  # noqa\nimport a_pb2");
        assert_eq!(rule.pattern_offsets_in_replacement(), vec![0, 21]);
    }

    #[test]
    fn overlapping_occurrences_are_all_reported() {
        let rule = ImportRule::new("aa", "aaa");
        assert_eq!(rule.pattern_offsets_in_replacement(), vec![0, 1]);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let rule = ImportRule::new("", "x");
        let err = rule.validate().expect_err("empty pattern");
        assert!(err.to_string().contains("must not be empty"));
        assert!(rule.pattern_offsets_in_replacement().is_empty());
    }
}
