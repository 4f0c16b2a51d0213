// SPDX-License-Identifier: MIT OR Apache-2.0
//! The gateway: preflight content scanning and budget-aware model routing,
//! the two entry points an agent harness calls before and during a model
//! request.

use crate::models::{PreflightRequest, PreflightResponse, RouteRequest, RouteResponse};
use crate::{ApiError, ApiJson, AppState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, http::HeaderValue};
use ccp_error::{CcpError, ErrorCode};
use ccp_redactor::{Finding, Redactor, Severity};
use std::sync::Arc;
use std::time::Instant;

/// Run `content` through `redactor`, returning every finding regardless of
/// whether a `block`-action policy turned the scan into an `Err`.
///
/// Mirrors `ccp-coordinator`'s `scan_findings` helper; duplicated here
/// rather than exposed across the crate boundary since the two callers
/// need slightly different downstream handling (this one also wants the
/// redacted text back).
fn scan(redactor: &Redactor, content: &str) -> (Vec<Finding>, Option<String>, bool) {
    match redactor.scan(content, "preflight") {
        Ok(result) => (result.findings, Some(result.redacted), result.blocked),
        Err(err) => {
            let findings = err
                .context
                .get("findings")
                .and_then(|v| serde_json::from_value::<Vec<Finding>>(v.clone()).ok())
                .unwrap_or_default();
            (findings, None, true)
        }
    }
}

/// `POST /gateway/preflight`.
pub async fn preflight(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PreflightRequest>,
) -> impl IntoResponse {
    let started = Instant::now();

    let (findings, sanitized_content, blocked) = scan(&state.redactor, &req.content);
    let has_critical = Redactor::has_critical_finding(&findings);

    let (violations, redactions): (Vec<Finding>, Vec<Finding>) = findings
        .into_iter()
        .partition(|f| matches!(f.severity, Severity::High | Severity::Critical));

    let ok = !blocked && !has_critical;
    let response = PreflightResponse {
        ok,
        violations,
        redactions,
        sanitized_content,
    };

    let latency_ms = started.elapsed().as_millis();
    let mut resp = Json(response).into_response();
    if let Ok(value) = HeaderValue::from_str(&latency_ms.to_string()) {
        resp.headers_mut().insert("X-Preflight-Latency-Ms", value);
    }
    resp
}

/// `POST /gateway/route`.
pub async fn route(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    // ~4 characters per token is a coarse but standard estimate; there is
    // no tokenizer in this workspace's dependency stack.
    let estimated_input_tokens = (req.task.chars().count() as u64 / 4).max(1);

    let (provider, policy_applied) = match (&req.budget, &req.preferred_provider) {
        (Some(budget_id), _) => {
            let provider = state.cost.route_request(budget_id, estimated_input_tokens)?;
            (provider, true)
        }
        (None, Some(preferred)) => (preferred.clone(), false),
        (None, None) => {
            return Err(CcpError::new(
                ErrorCode::InvalidChangeSpec,
                "route request must supply either `budget` or `preferredProvider`",
            )
            .into());
        }
    };

    let estimated_cost = state
        .cost
        .forecast_cost(&provider, estimated_input_tokens, 0)
        .map(|f| f.estimated_cost)
        .unwrap_or(0.0);

    Ok(Json(RouteResponse {
        provider,
        policy_applied,
        estimated_cost,
    }))
}
