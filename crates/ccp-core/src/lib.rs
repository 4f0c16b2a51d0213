// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The stable data model for the change control plane: [`ChangeSpec`],
//! [`Mission`], [`Checkpoint`], [`Batch`], [`Snapshot`], and [`Budget`].
//!
//! If you only take one dependency from this workspace, take this one.

/// `ChangeSpec`, `Patch`, `Invariant`, and `TestPlan` — the transform contract.
pub mod change_spec;
/// `Mission`, `Checkpoint`, `Batch`, and `Snapshot` — the coordinator's state model.
pub mod mission;
/// The restricted attribute-predicate selector grammar.
pub mod selector;
/// Shared validation helpers and error accumulation.
pub mod validate;

pub use change_spec::{
    AstOp, ChangeSpec, Invariant, InvariantType, Language, Patch, RiskLevel, TestPlan,
    TestStrategy,
};
pub use mission::{
    ApplyState, Actor, Batch, BatchStatus, Checkpoint, CheckpointName, CheckpointSlot,
    CheckpointStatus, Mission, PatchApplicationRecord, Snapshot,
};
pub use selector::{Selector, parse_selector};
pub use validate::ValidationError;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Current data-model contract version embedded in audit packs.
pub const CONTRACT_VERSION: &str = "ccp/v1";

/// Budget model shared between the Mission Coordinator and the Cost Ledger.
pub mod budget {
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};

    /// Per-scope monetary cap with per-model sub-caps and alert threshold.
    #[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
    pub struct Budget {
        /// Unique budget identifier.
        pub id: String,
        /// Hard ceiling in USD.
        #[serde(rename = "maxCost")]
        pub max_cost: f64,
        /// Cumulative spend recorded so far, in USD.
        #[serde(rename = "currentCost")]
        pub current_cost: f64,
        /// Percentage of `max_cost` (0-100) at which an alert fires.
        #[serde(rename = "alertThreshold")]
        pub alert_threshold_pct: f64,
        /// Models this budget governs, in priority order of registration.
        pub models: Vec<ModelBudget>,
    }

    /// A single model's participation in a [`Budget`].
    #[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
    pub struct ModelBudget {
        /// Pricing-table key for this model.
        #[serde(rename = "modelId")]
        pub model_id: String,
        /// Routing priority; higher is preferred by `routeRequest`.
        pub priority: u32,
        /// Optional sub-cap in USD tighter than the budget's overall ceiling.
        #[serde(rename = "maxCost", skip_serializing_if = "Option::is_none")]
        pub max_cost: Option<f64>,
    }

    impl Budget {
        /// Construct an empty budget with no models registered.
        #[must_use]
        pub fn new(id: impl Into<String>, max_cost: f64, alert_threshold_pct: f64) -> Self {
            Self {
                id: id.into(),
                max_cost,
                current_cost: 0.0,
                alert_threshold_pct,
                models: Vec::new(),
            }
        }

        /// `currentCost >= maxCost`.
        #[must_use]
        pub fn is_breached(&self) -> bool {
            self.current_cost >= self.max_cost
        }

        /// `currentCost >= alertThreshold% * maxCost`.
        #[must_use]
        pub fn crossed_alert_threshold(&self) -> bool {
            self.current_cost >= (self.alert_threshold_pct / 100.0) * self.max_cost
        }

        /// Remaining headroom before the budget is breached; never negative.
        #[must_use]
        pub fn remaining(&self) -> f64 {
            (self.max_cost - self.current_cost).max(0.0)
        }
    }
}

pub use budget::{Budget, ModelBudget};

/// Serialize `value` to a canonical JSON string.
///
/// `serde_json::Map` is backed by a `BTreeMap` unless the `preserve_order`
/// feature is enabled, so round-tripping through [`serde_json::Value`] sorts
/// object keys and yields a stable byte representation for hashing.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if `value` cannot be represented as JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string(&v)
}

/// Compute the hex-encoded SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Compute the canonical content hash of any serializable value.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if `value` cannot be represented as JSON.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(value)?.as_bytes()))
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn canonical_json_sorts_object_keys() {
        let mut unsorted = std::collections::HashMap::new();
        unsorted.insert("zeta", 1);
        unsorted.insert("alpha", 2);
        let json = canonical_json(&unsorted).unwrap();
        assert!(json.find("alpha").unwrap() < json.find("zeta").unwrap());
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }

    #[test]
    fn content_hash_changes_with_content() {
        let a = content_hash(&serde_json::json!({"x": 1})).unwrap();
        let b = content_hash(&serde_json::json!({"x": 2})).unwrap();
        assert_ne!(a, b);
    }
}
