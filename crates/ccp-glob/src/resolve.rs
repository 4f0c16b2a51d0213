// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolve a `Patch`'s `path` field into a concrete, deterministically
//! ordered file list, per `spec.md` §4.1:
//!
//! > Resolve each patch's `path` to a concrete file set (literal if the path
//! > exists; glob expansion otherwise, excluding build output and dependency
//! > directories).

use crate::IncludeExcludeGlobs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories that are always excluded from glob expansion, regardless of a
/// [`ChangeSpec`](../../ccp_core/change_spec/struct.ChangeSpec.html)'s own
/// exclude list: build output and dependency directories across the
/// language packs this engine supports.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
    "**/build/**",
    "**/.git/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "**/venv/**",
    "**/.mypy_cache/**",
];

/// Resolve `pattern` against `root`.
///
/// If `root.join(pattern)` exists as a literal file, that single path is
/// returned. Otherwise `pattern` is treated as a glob and expanded by
/// walking `root`, always excluding [`DEFAULT_EXCLUDES`]. The result is
/// sorted lexicographically so callers get the deterministic ordering
/// `spec.md` §4.1/§5 requires.
///
/// # Errors
///
/// Returns an error if `pattern` (or any of [`DEFAULT_EXCLUDES`]) is not a
/// well-formed glob.
pub fn resolve_scope_path(root: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let literal = root.join(pattern);
    if literal.is_file() {
        return Ok(vec![literal]);
    }

    let excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    let matcher = IncludeExcludeGlobs::new(&[pattern.to_string()], &excludes)?;

    let mut matched: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            matcher
                .decide_path(relative)
                .is_allowed()
                .then(|| entry.into_path())
        })
        .collect();

    matched.sort();
    Ok(matched)
}

/// Resolve every scope entry in `scope` against `root`, deduplicating and
/// sorting the combined result.
///
/// # Errors
///
/// Returns an error if any entry in `scope` is not a well-formed glob.
pub fn resolve_scope(root: &Path, scope: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut all = Vec::new();
    for pattern in scope {
        all.extend(resolve_scope_path(root, pattern)?);
    }
    all.sort();
    all.dedup();
    Ok(all)
}
