//! Configuration file loading for stubfix.
//!
//! Discovers and loads `stubfix.toml` from the base directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use stubfix_types::DEFAULT_STUB_FILE;
use stubfix_types::rule::{ImportRule, default_rules};
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "stubfix.toml";

/// Top-level configuration from stubfix.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StubfixConfig {
    /// Stub file name relative to the base directory.
    pub target: Option<String>,

    /// Substitution rules. Empty means the built-in default rule.
    pub rules: Vec<ImportRule>,

    /// Backup settings.
    pub backups: BackupsConfig,
}

/// Backups section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Whether to keep a copy of the original before rewriting.
    pub enabled: bool,

    /// Suffix for backup files.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            suffix: ".stubfix.bak".to_string(),
        }
    }
}

/// Discover the stubfix.toml config file in `base_dir`.
pub fn discover_config(base_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = base_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a stubfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<StubfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string. Rules are validated here.
pub fn parse_config(contents: &str) -> anyhow::Result<StubfixConfig> {
    let config: StubfixConfig = toml::from_str(contents).context("invalid TOML")?;
    for (i, rule) in config.rules.iter().enumerate() {
        rule.validate().with_context(|| format!("rules[{}]", i))?;
    }
    Ok(config)
}

/// Load an explicit config path, or discover one in `base_dir`, or fall back to defaults.
pub fn load_or_default(
    base_dir: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> anyhow::Result<StubfixConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(base_dir) {
        Some(path) => load_config(&path),
        None => Ok(StubfixConfig::default()),
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    /// Stub file name (CLI, then config, then the compiler's default name).
    pub target: String,

    /// Rules to apply, never empty.
    pub rules: Vec<ImportRule>,

    /// Backup suffix when backups are enabled.
    pub backup_suffix: Option<String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: StubfixConfig,
}

impl ConfigMerger {
    pub fn new(config: StubfixConfig) -> Self {
        Self { config }
    }

    /// CLI `file` overrides the config target; CLI `backup` enables backups
    /// even when the config leaves them off.
    pub fn merge_args(self, cli_file: Option<&str>, cli_backup: bool) -> MergedConfig {
        let target = cli_file
            .map(str::to_string)
            .or(self.config.target)
            .unwrap_or_else(|| DEFAULT_STUB_FILE.to_string());

        let rules = if self.config.rules.is_empty() {
            default_rules()
        } else {
            self.config.rules
        };

        let backup_suffix = if cli_backup || self.config.backups.enabled {
            Some(self.config.backups.suffix)
        } else {
            None
        };

        MergedConfig {
            target,
            rules,
            backup_suffix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stubfix_types::rule::{DEFAULT_PATTERN, DEFAULT_REPLACEMENT};
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
target = "llmserver_pb2_grpc.py"

[[rules]]
pattern = "import llmserver_pb2 as llmserver__pb2"
replacement = "from . import llmserver_pb2 as llmserver__pb2"

[[rules]]
pattern = "import health_pb2 as health__pb2"
replacement = "from . import health_pb2 as health__pb2"

[backups]
enabled = true
suffix = ".orig"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.target.as_deref(), Some("llmserver_pb2_grpc.py"));
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].pattern, DEFAULT_PATTERN);
        assert_eq!(config.rules[1].replacement, "from . import health_pb2 as health__pb2");
        assert!(config.backups.enabled);
        assert_eq!(config.backups.suffix, ".orig");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert!(config.target.is_none());
        assert!(config.rules.is_empty());
        assert!(!config.backups.enabled);
        assert_eq!(config.backups.suffix, ".stubfix.bak");
    }

    #[test]
    fn test_parse_rejects_empty_pattern() {
        let contents = r#"
[[rules]]
pattern = ""
replacement = "from . import x"
"#;
        let err = parse_config(contents).expect_err("empty pattern");
        assert!(format!("{:#}", err).contains("rules[0]"));
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let err = parse_config("rules = 3").expect_err("bad shape");
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_merge_defaults() {
        let merged = ConfigMerger::new(StubfixConfig::default()).merge_args(None, false);

        assert_eq!(merged.target, DEFAULT_STUB_FILE);
        assert_eq!(merged.rules.len(), 1);
        assert_eq!(merged.rules[0].replacement, DEFAULT_REPLACEMENT);
        assert!(merged.backup_suffix.is_none());
    }

    #[test]
    fn test_merge_cli_file_overrides_config_target() {
        let config = StubfixConfig {
            target: Some("from_config.py".to_string()),
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_args(Some("from_cli.py"), false);
        assert_eq!(merged.target, "from_cli.py");
    }

    #[test]
    fn test_merge_config_target_used_without_cli() {
        let config = StubfixConfig {
            target: Some("from_config.py".to_string()),
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_args(None, false);
        assert_eq!(merged.target, "from_config.py");
    }

    #[test]
    fn test_merge_cli_backup_uses_config_suffix() {
        let config = StubfixConfig {
            backups: BackupsConfig {
                enabled: false,
                suffix: ".orig".to_string(),
            },
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_args(None, true);
        assert_eq!(merged.backup_suffix.as_deref(), Some(".orig"));
    }

    #[test]
    fn test_merge_config_rules_replace_default() {
        let config = StubfixConfig {
            rules: vec![ImportRule::new("import a_pb2", "from . import a_pb2")],
            ..Default::default()
        };
        let merged = ConfigMerger::new(config).merge_args(None, false);
        assert_eq!(merged.rules, vec![ImportRule::new("import a_pb2", "from . import a_pb2")]);
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        std::fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_prefers_explicit_path() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::write(root.join(CONFIG_FILE_NAME), "target = \"discovered.py\"\n").unwrap();
        let explicit = root.join("other.toml");
        std::fs::write(&explicit, "target = \"explicit.py\"\n").unwrap();

        let cfg = load_or_default(&root, Some(&explicit)).expect("load explicit");
        assert_eq!(cfg.target.as_deref(), Some("explicit.py"));

        let cfg = load_or_default(&root, None).expect("load discovered");
        assert_eq!(cfg.target.as_deref(), Some("discovered.py"));
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(&root, None).expect("load default");
        assert!(cfg.rules.is_empty());
        assert!(cfg.target.is_none());
    }

    #[test]
    fn test_load_config_missing_explicit_file_errors() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let err = load_or_default(&root, Some(&root.join("nope.toml"))).expect_err("missing");
        assert!(err.to_string().contains("read config file"));
    }
}
