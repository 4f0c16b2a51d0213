// SPDX-License-Identifier: MIT OR Apache-2.0
//! Request/response shapes that aren't already part of a lower crate's data
//! model.

use ccp_core::ChangeSpec;
use ccp_redactor::Finding;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /gateway/preflight` request body.
#[derive(Debug, Deserialize)]
pub struct PreflightRequest {
    /// Content to scan before it reaches a model provider.
    pub content: String,
    /// Destination provider, for future provider-specific policy. Unused
    /// in v1 beyond being accepted.
    #[serde(default)]
    pub provider: Option<String>,
    /// Free-form caller metadata, accepted but not interpreted.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// `POST /gateway/preflight` response body.
#[derive(Debug, Serialize)]
pub struct PreflightResponse {
    /// `false` if any finding blocked the scan or met
    /// [`ccp_redactor::Severity::Critical`].
    pub ok: bool,
    /// Findings severe enough to be treated as a policy violation
    /// (`high`/`critical`).
    pub violations: Vec<Finding>,
    /// Findings a `redact`-shaped policy would mask (`low`/`medium`).
    pub redactions: Vec<Finding>,
    /// The scanned content with redactions applied, when scanning did not
    /// abort outright.
    #[serde(rename = "sanitizedContent", skip_serializing_if = "Option::is_none")]
    pub sanitized_content: Option<String>,
}

/// `POST /gateway/route` request body.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// The task text to be routed to a model; only its length is used, as
    /// a rough token-count proxy.
    pub task: String,
    /// Budget to route within. Required unless `preferred_provider` is set.
    #[serde(default)]
    pub budget: Option<String>,
    /// Bypass budget-aware routing and use this provider directly.
    #[serde(rename = "preferredProvider", default)]
    pub preferred_provider: Option<String>,
}

/// `POST /gateway/route` response body.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    /// The chosen model id.
    pub provider: String,
    /// Whether budget-aware routing policy picked `provider` (`false` when
    /// `preferredProvider` was honored directly).
    #[serde(rename = "policyApplied")]
    pub policy_applied: bool,
    /// Estimated cost in USD for this routing decision.
    #[serde(rename = "estimatedCost")]
    pub estimated_cost: f64,
}

/// `POST /missions` request body.
#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    /// Mission title.
    pub title: String,
    /// Declared risk; defaults to `medium` via [`ccp_core::RiskLevel`]'s own default.
    #[serde(default)]
    pub risk: ccp_core::RiskLevel,
}

/// `POST /missions/:missionId/rollback/:batchId` response body.
#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    /// Whether the rollback completed.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
}

/// `POST /dte/verify` request body — the only `/dte/*` endpoint that
/// carries an explicit working directory.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The change spec to verify.
    pub spec: ChangeSpec,
    /// Directory the invariants and mutation tests run against.
    #[serde(rename = "workingDir")]
    pub working_dir: String,
}

/// `POST /finops/forecast` request body.
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    /// The change spec being costed out.
    #[serde(rename = "changeSpec")]
    pub change_spec: ChangeSpec,
    /// Model to forecast against; defaults to the cheap tier.
    #[serde(default)]
    pub provider: Option<String>,
}

/// `POST /finops/forecast` response body.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Estimated cost in USD.
    #[serde(rename = "usdEstimate")]
    pub usd_estimate: f64,
    /// Estimated total tokens (input + output) the spec will consume.
    pub tokens: u64,
    /// Synthetic p95 latency estimate in milliseconds, scaled with token
    /// count. Not a measured percentile in v1.
    #[serde(rename = "p95Latency")]
    pub p95_latency: f64,
}

/// `POST /finops/budget` request body.
#[derive(Debug, Deserialize, Default)]
pub struct BudgetUpdateRequest {
    /// Additional USD to record as consumed against the budget, outside
    /// the per-model `trackUsage` flow.
    #[serde(default)]
    pub consumed: Option<f64>,
}

/// `GET`/`POST /finops/budget` response body.
#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    /// Budget identifier.
    pub id: String,
    /// Hard ceiling in USD.
    #[serde(rename = "maxCost")]
    pub max_cost: f64,
    /// Cumulative spend recorded so far, in USD.
    #[serde(rename = "currentCost")]
    pub current_cost: f64,
    /// `currentCost >= maxCost`.
    pub breached: bool,
    /// `currentCost >= alertThreshold% * maxCost`.
    #[serde(rename = "crossedAlertThreshold")]
    pub crossed_alert_threshold: bool,
}

impl From<ccp_core::Budget> for BudgetStatus {
    fn from(b: ccp_core::Budget) -> Self {
        Self {
            breached: b.is_breached(),
            crossed_alert_threshold: b.crossed_alert_threshold(),
            id: b.id,
            max_cost: b.max_cost,
            current_cost: b.current_cost,
        }
    }
}

/// A routing preference published/updated through `/policies/models`.
///
/// Distinct from [`ccp_core::ModelBudget`]: a `ModelPolicy` is a
/// standalone, budget-scoped routing preference a caller can publish
/// without necessarily owning or having registered that budget with the
/// Cost Ledger, whereas `ModelBudget` only exists nested inside a `Budget`
/// the ledger actively tracks spend against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelPolicy {
    /// Pricing-table key for this model.
    #[serde(rename = "modelId")]
    pub model_id: String,
    /// Budget this policy applies under.
    #[serde(rename = "budgetId")]
    pub budget_id: String,
    /// Routing priority; higher is preferred.
    pub priority: u32,
    /// Optional sub-cap in USD tighter than the budget's overall ceiling.
    #[serde(rename = "maxCost", skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
}

/// `POST /evidence/events` request body.
#[derive(Debug, Deserialize)]
pub struct AppendEventRequest {
    /// The event type.
    #[serde(rename = "type")]
    pub event_type: ccp_evidence::EventType,
    /// Mission this event belongs to, if any.
    #[serde(rename = "missionId", default)]
    pub mission_id: Option<Uuid>,
    /// Event-type-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `POST /evidence/export` request body.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// Mission to export.
    #[serde(rename = "missionId")]
    pub mission_id: Uuid,
    /// The change spec this mission executed, bundled into the pack
    /// verbatim.
    #[serde(rename = "changeSpec")]
    pub change_spec: serde_json::Value,
}
