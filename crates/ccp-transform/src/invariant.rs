// SPDX-License-Identifier: MIT OR Apache-2.0
//! Invariant runner: dispatches a [`ccp_core::Invariant`] by its `type` tag
//! and reports a pass/fail result. A single invariant's failure never aborts
//! the remaining ones — `verify` runs every invariant and aggregates.

use ccp_core::{Invariant, InvariantType, Language};
use ccp_glob::resolve::resolve_scope_path;
use regex::Regex;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const INVARIANT_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_CAPTURED_OUTPUT_CHARS: usize = 8192;

/// Outcome of running one [`Invariant`].
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InvariantResult {
    /// Copied from the invariant's own name.
    pub name: String,
    /// Whether the post-condition held.
    pub passed: bool,
    /// Human-readable explanation.
    pub message: String,
    /// Captured command output, truncated, for `typecheck` failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl InvariantResult {
    fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.into(),
            output: None,
        }
    }

    fn fail(name: &str, message: impl Into<String>, output: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.into(),
            output,
        }
    }
}

/// Run one invariant against `workdir`. Never panics or returns `Err` — every
/// failure mode (bad regex, unreachable tool, timeout) is surfaced as a
/// failing [`InvariantResult`] so the caller can keep going.
pub async fn run_invariant(invariant: &Invariant, language: Language, workdir: &Path) -> InvariantResult {
    match invariant.kind {
        InvariantType::Typecheck => run_typecheck(invariant, workdir).await,
        InvariantType::SymbolExists => run_symbol_exists(invariant, language, workdir),
        InvariantType::Regex => run_regex(invariant, language, workdir),
        InvariantType::SemanticRule => run_semantic_rule(invariant, language, workdir),
        InvariantType::ApiCompat => InvariantResult {
            name: invariant.name.clone(),
            passed: true,
            message: "apiCompat is reserved; treated as a pass with a warning in v1".to_string(),
            output: None,
        },
    }
}

async fn run_typecheck(invariant: &Invariant, workdir: &Path) -> InvariantResult {
    let mut command = Command::new("sh");
    command.arg("-c").arg(&invariant.spec).current_dir(workdir);

    match timeout(INVARIANT_TIMEOUT, command.output()).await {
        Err(_) => InvariantResult::fail(
            &invariant.name,
            format!(
                "typecheck command timed out after {}s",
                INVARIANT_TIMEOUT.as_secs()
            ),
            None,
        ),
        Ok(Err(e)) => InvariantResult::fail(
            &invariant.name,
            format!("failed to execute typecheck command: {e}"),
            None,
        ),
        Ok(Ok(output)) => {
            let combined = format!(
                "{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            if output.status.success() {
                InvariantResult::pass(&invariant.name, "typecheck command exited 0")
            } else {
                InvariantResult::fail(
                    &invariant.name,
                    format!("typecheck command exited with status {}", output.status),
                    Some(truncate(&combined)),
                )
            }
        }
    }
}

fn run_symbol_exists(invariant: &Invariant, language: Language, workdir: &Path) -> InvariantResult {
    let symbol = invariant.spec.trim();
    match language_files(workdir, language) {
        Err(message) => InvariantResult::fail(&invariant.name, message, None),
        Ok(files) => {
            if any_file_contains(&files, symbol) {
                InvariantResult::pass(&invariant.name, format!("found `{symbol}`"))
            } else {
                InvariantResult::fail(
                    &invariant.name,
                    format!("no occurrence of `{symbol}` found under scope"),
                    None,
                )
            }
        }
    }
}

fn run_regex(invariant: &Invariant, language: Language, workdir: &Path) -> InvariantResult {
    let re = match Regex::new(&invariant.spec) {
        Ok(re) => re,
        Err(e) => {
            return InvariantResult::fail(
                &invariant.name,
                format!("invalid regex `{}`: {e}", invariant.spec),
                None,
            );
        }
    };

    match language_files(workdir, language) {
        Err(message) => InvariantResult::fail(&invariant.name, message, None),
        Ok(files) => {
            let matched = files
                .iter()
                .any(|f| std::fs::read_to_string(f).is_ok_and(|c| re.is_match(&c)));
            if matched {
                InvariantResult::pass(&invariant.name, "at least one match found")
            } else {
                InvariantResult::fail(&invariant.name, "no match found under scope", None)
            }
        }
    }
}

fn run_semantic_rule(invariant: &Invariant, language: Language, workdir: &Path) -> InvariantResult {
    let rule = invariant.spec.trim();
    let Some(target) = rule.strip_prefix("no calls to ") else {
        return InvariantResult::pass(
            &invariant.name,
            format!("unrecognized semantic rule `{rule}`; basic validation only"),
        );
    };
    let target = target.trim();

    match language_files(workdir, language) {
        Err(message) => InvariantResult::fail(&invariant.name, message, None),
        Ok(files) => match files
            .iter()
            .find(|f| std::fs::read_to_string(f).is_ok_and(|c| c.contains(target)))
        {
            Some(file) => InvariantResult::fail(
                &invariant.name,
                format!("found a call to `{target}` in {}", file.display()),
                None,
            ),
            None => InvariantResult::pass(&invariant.name, format!("no calls to `{target}` found")),
        },
    }
}

/// Enumerate every source file under `workdir` with one of `language`'s
/// extensions, excluding build output and dependency directories (the same
/// rules [`ccp_glob::resolve`] applies to patch scopes).
fn language_files(workdir: &Path, language: Language) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for ext in language.extensions() {
        let pattern = format!("**/*.{ext}");
        let matched = resolve_scope_path(workdir, &pattern)
            .map_err(|e| format!("failed to enumerate `*.{ext}` files: {e}"))?;
        files.extend(matched);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn any_file_contains(files: &[PathBuf], needle: &str) -> bool {
    files
        .iter()
        .any(|f| std::fs::read_to_string(f).is_ok_and(|c| c.contains(needle)))
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_CAPTURED_OUTPUT_CHARS {
        return s.to_string();
    }
    let truncated: String = s.chars().take(MAX_CAPTURED_OUTPUT_CHARS).collect();
    format!("{truncated}... [truncated]")
}
