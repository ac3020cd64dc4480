use serde::{Deserialize, Serialize};

/// Result of one fixer run against a single target file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixOutcome {
    pub schema: String,
    pub path: String,
    pub status: FixStatus,
    pub replacements: u64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleHits>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
}

impl FixOutcome {
    pub fn new(path: impl Into<String>, status: FixStatus) -> Self {
        Self {
            schema: crate::schema::STUBFIX_OUTCOME_V1.to_string(),
            path: path.into(),
            status,
            replacements: 0,
            rules: vec![],
            sha256_before: None,
            sha256_after: None,
            backup_path: None,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(path, FixStatus::NotFound)
    }

    /// True when the file content differs (or would differ) after the rewrite.
    pub fn needs_fix(&self) -> bool {
        matches!(self.status, FixStatus::Fixed | FixStatus::WouldFix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    /// Replacements were written to disk.
    Fixed,
    /// No pattern occurrence needed rewriting.
    Unchanged,
    /// Replacements are pending but were not written (dry-run or check).
    WouldFix,
    /// The target file does not exist.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHits {
    pub pattern: String,
    pub replacements: u64,
}
