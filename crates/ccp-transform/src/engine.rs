// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`TransformEngine`]: the `apply`/`verify` entry points tying scope
//! resolution, per-language parsing, patch dispatch, the invariant runner,
//! and mutation-test orchestration together.

use crate::invariant::{self, InvariantResult};
use crate::language;
use crate::mutation::{self, MutationReport};
use crate::patch;
use ccp_core::{AstOp, ChangeSpec};
use ccp_glob::resolve::resolve_scope_path;
use schemars::JsonSchema;
use serde::Serialize;
use std::path::Path;

/// One patch/file failure surfaced from `apply`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApplyError {
    /// File the failure occurred on.
    pub path: String,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

/// Result of [`TransformEngine::apply`].
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ApplyResult {
    /// `true` iff every patch applied without error (parse errors and
    /// unsupported operations still count against this even though
    /// unrelated patches continue to run).
    pub success: bool,
    /// Files actually rewritten, sorted lexicographically.
    #[serde(rename = "filesModified")]
    pub files_modified: Vec<String>,
    /// Structured per-patch/per-file failures.
    pub errors: Vec<ApplyError>,
    /// Non-fatal notices (e.g. `renameSymbol`'s no-binding-analysis limitation).
    pub warnings: Vec<String>,
}

/// Result of [`TransformEngine::verify`].
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct VerifyResult {
    /// `true` iff every invariant passed and the mutation score meets the
    /// test plan's threshold.
    pub success: bool,
    /// Structured entries for every invariant that did not pass.
    pub errors: Vec<InvariantResult>,
    /// Non-fatal notices: `apiCompat`'s reservation, an unrecognized
    /// `semanticRule` grammar, or a synthesized mutation report.
    pub warnings: Vec<String>,
    /// Mutation-test orchestration result.
    #[serde(rename = "mutationReport")]
    pub mutation_report: MutationReport,
}

/// Stateless entry point for the apply/verify pipeline. Holds no data of its
/// own; state lives in the working directory it is pointed at.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransformEngine;

impl TransformEngine {
    /// Construct a new engine handle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Deterministically apply every patch in `spec`, in list order, writing
    /// changes directly under `workdir`.
    #[tracing::instrument(skip(self, spec), fields(spec_id = %spec.id))]
    pub fn apply(&self, spec: &ChangeSpec, workdir: &Path) -> ApplyResult {
        let pack = language::pack_for(spec.language);
        let mut files_modified = Vec::new();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut saw_rename = false;

        for p in &spec.patches {
            if !p.ast_op.is_supported() {
                errors.push(ApplyError {
                    path: p.path.clone(),
                    code: "UNSUPPORTED_OPERATION".to_string(),
                    message: format!("{:?} is not implemented by the transform engine", p.ast_op),
                });
                continue;
            }

            let files = match resolve_scope_path(workdir, &p.path) {
                Ok(files) => files,
                Err(e) => {
                    errors.push(ApplyError {
                        path: p.path.clone(),
                        code: "IO_ERROR".to_string(),
                        message: format!("failed to resolve scope: {e}"),
                    });
                    continue;
                }
            };

            if matches!(p.ast_op, AstOp::RenameSymbol) {
                saw_rename = true;
            }

            for file in files {
                let relative = file
                    .strip_prefix(workdir)
                    .unwrap_or(&file)
                    .to_string_lossy()
                    .to_string();

                let source = match std::fs::read_to_string(&file) {
                    Ok(s) => s,
                    Err(e) => {
                        errors.push(ApplyError {
                            path: relative,
                            code: "IO_ERROR".to_string(),
                            message: format!("failed to read file: {e}"),
                        });
                        continue;
                    }
                };

                match patch::apply_patch(p, pack.as_ref(), &source) {
                    Ok(outcome) if outcome.changed => {
                        if let Err(e) = std::fs::write(&file, &outcome.rewritten) {
                            errors.push(ApplyError {
                                path: relative,
                                code: "IO_ERROR".to_string(),
                                message: format!("failed to write file: {e}"),
                            });
                            continue;
                        }
                        files_modified.push(relative);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        errors.push(ApplyError {
                            path: relative,
                            code: e.code.as_str().to_string(),
                            message: e.message.clone(),
                        });
                    }
                }
            }
        }

        if saw_rename {
            warnings.push(
                "renameSymbol performs no binding analysis in v1; shadowed identifiers are renamed indiscriminately".to_string(),
            );
        }

        files_modified.sort();
        files_modified.dedup();

        ApplyResult {
            success: errors.is_empty(),
            files_modified,
            errors,
            warnings,
        }
    }

    /// Run every invariant in `spec.invariants` (sequentially, one failure
    /// never aborting the rest) plus mutation-test orchestration, and report
    /// the combined result.
    #[tracing::instrument(skip(self, spec), fields(spec_id = %spec.id))]
    pub async fn verify(&self, spec: &ChangeSpec, workdir: &Path) -> VerifyResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for invariant in &spec.invariants {
            let result = invariant::run_invariant(invariant, spec.language, workdir).await;
            let is_reserved_warning = matches!(invariant.kind, ccp_core::InvariantType::ApiCompat)
                || (result.passed && result.message.starts_with("unrecognized semantic rule"));
            if is_reserved_warning {
                warnings.push(format!("{}: {}", result.name, result.message));
            }
            if !result.passed {
                errors.push(result);
            }
        }

        let mutation_report = mutation::run_mutation_tests(&spec.tests, workdir).await;
        if mutation_report.synthesized {
            warnings.push(format!(
                "mutation report for `{}` is synthesized (no mutation-testing tool detected); \
                 it exactly meets the threshold and should be rejected by CI gates",
                spec.id
            ));
        }

        let success = errors.is_empty() && mutation_report.score >= spec.tests.mutation_threshold;

        VerifyResult {
            success,
            errors,
            warnings,
            mutation_report,
        }
    }
}
