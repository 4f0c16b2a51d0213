// SPDX-License-Identifier: MIT OR Apache-2.0
//! The transform contract: [`ChangeSpec`], [`Patch`], [`Invariant`], and [`TestPlan`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A declarative description of a code transformation and its post-conditions.
///
/// Immutable once created; every field that would otherwise mutate state
/// (risk, assumptions, telemetry) is fixed at construction time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChangeSpec {
    /// Unique identifier matching `CS-<digits>`.
    pub id: String,
    /// Human-readable description of the intended change.
    pub intent: String,
    /// Scope paths or globs the patches are permitted to touch.
    pub scope: Vec<String>,
    /// Target language; every patch in this spec is interpreted under it.
    pub language: Language,
    /// Known limitations the author is accepting (e.g. shadowing under
    /// `renameSymbol`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
    /// Ordered list of AST-level operations to apply.
    pub patches: Vec<Patch>,
    /// Post-conditions that must hold after all patches are applied.
    pub invariants: Vec<Invariant>,
    /// Verification strategy and mutation-score threshold.
    pub tests: TestPlan,
    /// Declared risk level; defaults to `medium`.
    #[serde(default)]
    pub risk: RiskLevel,
    /// Free-form telemetry attached by the submitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<BTreeMap<String, serde_json::Value>>,
}

/// Target language for a [`ChangeSpec`]'s patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// TypeScript.
    Typescript,
    /// JavaScript.
    Javascript,
    /// Python.
    Python,
    /// Java.
    Java,
}

impl Language {
    /// File extensions the transform engine should consider for this
    /// language when resolving scope globs and running textual invariants.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Typescript => &["ts", "tsx"],
            Self::Javascript => &["js", "jsx"],
            Self::Python => &["py"],
            Self::Java => &["java"],
        }
    }
}

/// Declared risk level of a [`ChangeSpec`]; defaults to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low-impact, mechanically reversible change.
    Low,
    /// Default risk level for a change spec that doesn't declare one.
    #[default]
    Medium,
    /// High-impact change warranting closer review.
    High,
}

/// One AST-level operation targeting one path or glob.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Patch {
    /// Literal path (if it exists) or glob pattern to resolve against the
    /// working directory.
    pub path: String,
    /// Operation to dispatch on.
    #[serde(rename = "astOp")]
    pub ast_op: AstOp,
    /// Attribute-predicate selector string; required for `renameSymbol` and
    /// `replaceAPI`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Operation-specific parameters (e.g. `newName`, `newProperty`, `argsMap`).
    #[serde(default)]
    pub details: serde_json::Value,
}

/// The AST operation a [`Patch`] dispatches on.
///
/// Only [`AstOp::RenameSymbol`] and [`AstOp::ReplaceApi`] are specified as
/// v1 behavior; every other variant must fail with `UnsupportedOperation`
/// when the transform engine attempts to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AstOp {
    /// Rename every identifier matching the selector.
    #[serde(rename = "renameSymbol")]
    RenameSymbol,
    /// Rewrite a call expression's property name and/or argument keys.
    #[serde(rename = "replaceAPI")]
    ReplaceApi,
    /// Relocate a module. Not implemented in v1.
    #[serde(rename = "moveModule")]
    MoveModule,
    /// Insert a new AST node. Not implemented in v1.
    #[serde(rename = "insertNode")]
    InsertNode,
    /// Delete an AST node. Not implemented in v1.
    #[serde(rename = "deleteNode")]
    DeleteNode,
    /// Edit a literal string node. Not implemented in v1.
    #[serde(rename = "editString")]
    EditString,
    /// Edit via regex substitution. Not implemented in v1.
    #[serde(rename = "editRegex")]
    EditRegex,
}

impl AstOp {
    /// Whether this operation is implemented by the v1 transform engine.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::RenameSymbol | Self::ReplaceApi)
    }
}

/// A post-condition that must hold after all of a [`ChangeSpec`]'s patches
/// are applied.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Invariant {
    /// Human-readable, spec-unique name.
    pub name: String,
    /// Dispatch tag for the invariant runner.
    #[serde(rename = "type")]
    pub kind: InvariantType,
    /// Type-dependent payload: a shell invocation for `typecheck`, a symbol
    /// identifier for `symbolExists`, a natural-language rule for
    /// `semanticRule`, or a regex string for `regex`.
    pub spec: String,
}

/// Dispatch tag for [`Invariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum InvariantType {
    /// Execute `spec` as a shell command; exit 0 passes.
    Typecheck,
    /// Recursive textual search for the symbol named in `spec`.
    SymbolExists,
    /// Reserved; always passes with a warning in v1.
    ApiCompat,
    /// Recursive regex search; passes iff a match exists.
    Regex,
    /// Restricted natural-language rule grammar (`"no calls to <X>"`).
    SemanticRule,
}

/// Verification strategy and mutation-score threshold for a [`ChangeSpec`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestPlan {
    /// How tests are derived.
    pub strategy: TestStrategy,
    /// Files or modules the strategy targets.
    pub targets: Vec<String>,
    /// Minimum mutation score in `[0, 1]` for `verify` to succeed.
    #[serde(rename = "mutationThreshold")]
    pub mutation_threshold: f64,
}

/// How a [`TestPlan`]'s tests are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestStrategy {
    /// Extend the existing test suite.
    Augment,
    /// Generate a fresh test suite.
    Generate,
    /// Both augment and generate.
    Hybrid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> ChangeSpec {
        ChangeSpec {
            id: "CS-1".into(),
            intent: "rename UserId to AccountId".into(),
            scope: vec!["src/**/*.ts".into()],
            language: Language::Typescript,
            assumptions: None,
            patches: vec![Patch {
                path: "src/types.ts".into(),
                ast_op: AstOp::RenameSymbol,
                selector: Some("Identifier[name='UserId']".into()),
                details: serde_json::json!({"newName": "AccountId"}),
            }],
            invariants: vec![Invariant {
                name: "no-leftover-userid".into(),
                kind: InvariantType::Regex,
                spec: "UserId".into(),
            }],
            tests: TestPlan {
                strategy: TestStrategy::Augment,
                targets: vec!["src/types.ts".into()],
                mutation_threshold: 0.5,
            },
            risk: RiskLevel::Medium,
            telemetry: None,
        }
    }

    #[test]
    fn ast_op_serializes_to_spec_tags() {
        assert_eq!(
            serde_json::to_value(AstOp::ReplaceApi).unwrap(),
            serde_json::json!("replaceAPI")
        );
        assert_eq!(
            serde_json::to_value(AstOp::RenameSymbol).unwrap(),
            serde_json::json!("renameSymbol")
        );
    }

    #[test]
    fn only_rename_and_replace_are_supported() {
        assert!(AstOp::RenameSymbol.is_supported());
        assert!(AstOp::ReplaceApi.is_supported());
        assert!(!AstOp::MoveModule.is_supported());
        assert!(!AstOp::InsertNode.is_supported());
        assert!(!AstOp::DeleteNode.is_supported());
        assert!(!AstOp::EditString.is_supported());
        assert!(!AstOp::EditRegex.is_supported());
    }

    #[test]
    fn risk_defaults_to_medium() {
        let json = serde_json::json!({
            "id": "CS-2",
            "intent": "no-op",
            "scope": ["src/**"],
            "language": "python",
            "patches": [],
            "invariants": [],
            "tests": {"strategy": "augment", "targets": [], "mutationThreshold": 0.0},
        });
        let spec: ChangeSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.risk, RiskLevel::Medium);
    }

    #[test]
    fn change_spec_roundtrips_through_json() {
        let spec = sample_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: ChangeSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, spec.id);
        assert_eq!(back.patches.len(), 1);
    }

    #[test]
    fn language_extensions_are_language_specific() {
        assert_eq!(Language::Typescript.extensions(), &["ts", "tsx"]);
        assert_eq!(Language::Java.extensions(), &["java"]);
    }
}
