//! Edit engine for generated gRPC stubs.
//!
//! Responsibilities:
//! - Rewrite import statements in stub contents (in memory, no I/O).
//! - Apply the rewrite to the target file with an atomic replace.
//! - Generate a unified diff preview.

mod error;

pub use error::{EditError, EditResult};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use std::io::Write;
use stubfix_hash::sha256_hex;
use stubfix_types::outcome::{FixOutcome, FixStatus, RuleHits};
use stubfix_types::rule::ImportRule;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Compute the outcome without touching the file.
    pub dry_run: bool,
    /// When set, copy the original to `<path><suffix>` before replacing it.
    pub backup_suffix: Option<String>,
}

/// Rewritten contents plus per-rule hit counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub hits: Vec<RuleHits>,
}

impl Rewrite {
    pub fn replacements(&self) -> u64 {
        self.hits.iter().map(|h| h.replacements).sum()
    }
}

/// Resolve the stub path inside `base_dir` to an absolute path.
pub fn target_path(base_dir: &Utf8Path, file_name: &str) -> EditResult<Utf8PathBuf> {
    let joined = base_dir.join(file_name);
    let abs = std::path::absolute(&joined).with_context(|| format!("resolve {}", joined))?;
    let abs = Utf8PathBuf::from_path_buf(abs)
        .map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))?;
    Ok(abs)
}

/// Apply `rules` in order to `contents`.
///
/// Each rule replaces literal, non-overlapping occurrences left to right.
/// Occurrences that already sit inside an applied replacement are kept as-is.
pub fn rewrite_content(contents: &str, rules: &[ImportRule]) -> EditResult<Rewrite> {
    let mut text = contents.to_string();
    let mut hits = Vec::with_capacity(rules.len());

    for rule in rules {
        rule.validate()?;
        let (next, replacements) = rewrite_with_rule(&text, rule);
        hits.push(RuleHits {
            pattern: rule.pattern.clone(),
            replacements,
        });
        text = next;
    }

    Ok(Rewrite { text, hits })
}

fn rewrite_with_rule(contents: &str, rule: &ImportRule) -> (String, u64) {
    let offsets = rule.pattern_offsets_in_replacement();
    let mut out = String::with_capacity(contents.len());
    let mut last = 0;
    let mut count = 0;

    for (idx, _) in contents.match_indices(rule.pattern.as_str()) {
        out.push_str(&contents[last..idx]);
        if already_rewritten(contents, idx, &offsets, &rule.replacement) {
            out.push_str(&rule.pattern);
        } else {
            out.push_str(&rule.replacement);
            count += 1;
        }
        last = idx + rule.pattern.len();
    }
    out.push_str(&contents[last..]);

    (out, count)
}

fn already_rewritten(contents: &str, idx: usize, offsets: &[usize], replacement: &str) -> bool {
    offsets.iter().any(|&offset| {
        idx.checked_sub(offset)
            .and_then(|start| contents.get(start..))
            .is_some_and(|tail| tail.starts_with(replacement))
    })
}

/// Fix the stub named `file_name` under `base_dir`.
///
/// A missing file is reported as [`FixStatus::NotFound`] with an empty patch;
/// nothing is created.
pub fn fix_target(
    base_dir: &Utf8Path,
    file_name: &str,
    rules: &[ImportRule],
    opts: &FixOptions,
) -> EditResult<(FixOutcome, String)> {
    let path = target_path(base_dir, file_name)?;
    if !path.exists() {
        debug!("target {} does not exist", path);
        return Ok((FixOutcome::not_found(path.as_str()), String::new()));
    }
    fix_imports(&path, rules, opts)
}

/// Rewrite the imports of an existing stub file in place.
///
/// Returns the outcome together with a unified diff of the rewrite, both
/// computed from a single read. The caller is expected to have checked that
/// `path` exists; a missing file surfaces as a runtime error from the read.
pub fn fix_imports(
    path: &Utf8Path,
    rules: &[ImportRule],
    opts: &FixOptions,
) -> EditResult<(FixOutcome, String)> {
    let before = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
    let rewrite = rewrite_content(&before, rules)?;
    let patch = render_patch(path, &before, &rewrite.text);

    let mut outcome = FixOutcome::new(path.as_str(), FixStatus::Unchanged);
    outcome.replacements = rewrite.replacements();
    outcome.sha256_before = Some(sha256_hex(before.as_bytes()));
    outcome.sha256_after = Some(sha256_hex(rewrite.text.as_bytes()));
    for hit in &rewrite.hits {
        debug!("rule {:?}: {} replacement(s)", hit.pattern, hit.replacements);
    }
    outcome.rules = rewrite.hits;

    if rewrite.text == before {
        debug!("{} already up to date", path);
        return Ok((outcome, patch));
    }

    if opts.dry_run {
        outcome.status = FixStatus::WouldFix;
        return Ok((outcome, patch));
    }

    if let Some(suffix) = &opts.backup_suffix {
        let backup = backup_path(path, suffix);
        fs::copy(path, &backup).with_context(|| format!("backup {} to {}", path, backup))?;
        debug!("backed up {} to {}", path, backup);
        outcome.backup_path = Some(backup.to_string());
    }

    write_atomic(path, &rewrite.text)?;
    info!(
        "rewrote {} import(s) in {} ({} bytes)",
        outcome.replacements,
        path,
        rewrite.text.len()
    );

    outcome.status = FixStatus::Fixed;
    Ok((outcome, patch))
}

/// Produce a unified diff of the pending rewrite without writing anything.
pub fn preview_patch(path: &Utf8Path, rules: &[ImportRule]) -> EditResult<String> {
    let opts = FixOptions {
        dry_run: true,
        ..Default::default()
    };
    let (_, patch) = fix_imports(path, rules, &opts)?;
    Ok(patch)
}

pub fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    // Absolute paths would otherwise render as `a//tmp/...`.
    let display = path.as_str().trim_start_matches('/');
    let mut out = String::new();
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", display));

    let patch = diffy::create_patch(before, after);
    let formatter = PatchFormatter::new();
    // The formatter repeats the ---/+++ header; keep only the hunks.
    let rendered = formatter.fmt_patch(&patch).to_string();
    for line in rendered.lines().skip_while(|l| !l.starts_with("@@")) {
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Canonical path of `path` when it exists, `path` itself otherwise.
fn resolve_existing(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(path.to_path_buf());
    }
    let real = fs::canonicalize(path).with_context(|| format!("resolve {}", path))?;
    Utf8PathBuf::from_path_buf(real)
        .map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))
}

fn backup_path(path: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}{}", path, suffix))
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// Symlinks are resolved first so the link stays in place and its target is
/// the file that gets replaced. The original file's permissions carry over to
/// the replacement.
pub fn write_atomic(path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
    let resolved = resolve_existing(path)?;
    let path = resolved.as_path();
    let dir = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("write temp file for {}", path))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", path))?;

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("copy permissions of {}", path))?;
    }

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {}", path))?;
    Ok(())
}
