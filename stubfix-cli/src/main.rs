mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use config::{ConfigMerger, MergedConfig};
use std::process::ExitCode;
use stubfix_edit::{FixOptions, fix_target};
use stubfix_types::outcome::{FixOutcome, FixStatus};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Exit status when `--check` finds imports that still need rewriting.
const EXIT_NEEDS_FIX: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "stubfix",
    version,
    about = "Rewrite absolute imports in generated gRPC Python stubs to package-relative form."
)]
struct Cli {
    /// Directory holding the generated stubs (default: current directory).
    #[arg(long, env = "STUBFIX_DIR", default_value = ".")]
    dir: Utf8PathBuf,

    /// Stub file name inside --dir (default: config `target`, then llmserver_pb2_grpc.py).
    #[arg(long)]
    file: Option<String>,

    /// Config file (default: <dir>/stubfix.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Do not write; print the pending change as a unified diff.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Do not write; exit with status 2 if the stub needs fixing.
    #[arg(long, default_value_t = false, conflicts_with = "dry_run")]
    check: bool,

    /// Keep a copy of the original next to the stub before rewriting it.
    #[arg(long, default_value_t = false)]
    backup: bool,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print the effective rewrite rules and exit.
    #[arg(long, default_value_t = false)]
    list_rules: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file_config = config::load_or_default(&cli.dir, cli.config.as_deref())
        .context("load stubfix.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_args(cli.file.as_deref(), cli.backup);

    debug!(
        "merged config: dir={}, target={}, rules={}, backup_suffix={:?}",
        cli.dir,
        merged.target,
        merged.rules.len(),
        merged.backup_suffix
    );

    if cli.list_rules {
        cmd_list_rules(&merged, cli.format)?;
        return Ok(0);
    }

    cmd_fix(&cli, &merged)
}

fn cmd_fix(cli: &Cli, merged: &MergedConfig) -> anyhow::Result<u8> {
    let opts = FixOptions {
        dry_run: cli.dry_run || cli.check,
        backup_suffix: merged.backup_suffix.clone(),
    };

    let (outcome, patch) = fix_target(&cli.dir, &merged.target, &merged.rules, &opts)
        .with_context(|| format!("fix imports in {}", merged.target))?;
    let patch = (cli.dry_run && outcome.needs_fix()).then_some(patch);

    match cli.format {
        OutputFormat::Text => print_text(&outcome, cli.check, patch.as_deref()),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    if cli.check && outcome.needs_fix() {
        return Ok(EXIT_NEEDS_FIX);
    }
    Ok(0)
}

fn print_text(outcome: &FixOutcome, check: bool, patch: Option<&str>) {
    match outcome.status {
        FixStatus::NotFound => {
            println!("File not found: {}", outcome.path);
            println!("Generate the Python stubs first.");
        }
        FixStatus::WouldFix if check => {
            println!("Imports need fixing in {}", outcome.path);
        }
        FixStatus::WouldFix => {
            println!("Would fix imports in {}", outcome.path);
            if let Some(patch) = patch {
                print!("{}", patch);
            }
        }
        FixStatus::Unchanged if check => {
            println!("Imports already fixed in {}", outcome.path);
        }
        FixStatus::Fixed | FixStatus::Unchanged => {
            println!("Fixed imports in {}", outcome.path);
        }
    }
}

fn cmd_list_rules(merged: &MergedConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Rules for {}:\n", merged.target);
            for (i, rule) in merged.rules.iter().enumerate() {
                println!("  {}. {:?}", i + 1, rule.pattern);
                println!("     -> {:?}", rule.replacement);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&merged.rules)?);
        }
    }
    Ok(())
}
