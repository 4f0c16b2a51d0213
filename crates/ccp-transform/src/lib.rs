// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-transform
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! AST parse/query/mutate per language, the invariant runner, and
//! mutation-test orchestration: the Transform Engine (C4).
//!
//! [`TransformEngine::apply`] deterministically rewrites source files per a
//! [`ccp_core::ChangeSpec`]'s patches; [`TransformEngine::verify`] runs its
//! invariants and mutation-test orchestration. Both are driven by a
//! [`language::LanguagePack`] registered per [`ccp_core::Language`] variant.

/// The apply/verify entry points ([`TransformEngine`]).
pub mod engine;
/// Invariant runner dispatch.
pub mod invariant;
/// Per-language grammar knowledge ([`language::LanguagePack`]).
pub mod language;
/// Mutation-test orchestration.
pub mod mutation;
/// `renameSymbol`/`replaceAPI` patch dispatch.
pub mod patch;
/// Tree walking and text-splicing helpers.
pub mod rewrite;

pub use engine::{ApplyError, ApplyResult, TransformEngine, VerifyResult};
pub use invariant::InvariantResult;
pub use language::{CallParts, LanguagePack, pack_for};
pub use mutation::{MutantResult, MutantStatus, MutationReport};
pub use patch::{PatchOutcome, apply_patch};
