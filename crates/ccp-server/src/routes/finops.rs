// SPDX-License-Identifier: MIT OR Apache-2.0
//! `/finops/forecast` and `/finops/budget`: pre-flight cost estimation and
//! live budget status, fronting [`ccp_cost::CostLedger`].

use crate::models::{BudgetStatus, BudgetUpdateRequest, ForecastRequest, ForecastResponse};
use crate::{ApiError, ApiJson, AppState};
use axum::Json;
use axum::extract::{Query, State};
use ccp_core::Budget;
use ccp_error::{CcpError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_FORECAST_MODEL: &str = "cheap-v1";

/// Rough token estimate for a change spec: the serialized spec's character
/// count divided by four, the same tokens-per-character heuristic used by
/// `/gateway/route`. `ChangeSpec` carries no token count of its own.
fn estimate_tokens(spec: &ccp_core::ChangeSpec) -> u64 {
    let serialized = serde_json::to_string(spec).unwrap_or_default();
    (serialized.chars().count() as u64 / 4).max(1)
}

/// `POST /finops/forecast`.
pub async fn forecast(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ForecastRequest>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let tokens = estimate_tokens(&req.change_spec);
    let model = req.provider.as_deref().unwrap_or(DEFAULT_FORECAST_MODEL);
    let forecast = state.cost.forecast_cost(model, tokens, 0)?;

    Ok(Json(ForecastResponse {
        usd_estimate: forecast.estimated_cost,
        tokens,
        p95_latency: 50.0 + tokens as f64 * 0.05,
    }))
}

fn budget_id_from_query(params: &HashMap<String, String>) -> Result<&str, ApiError> {
    params
        .get("budgetId")
        .map(String::as_str)
        .ok_or_else(|| {
            ApiError::from(CcpError::new(
                ErrorCode::BudgetNotFound,
                "query parameter `budgetId` is required",
            ))
        })
}

/// `GET /finops/budget?budgetId=...`.
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<BudgetStatus>, ApiError> {
    let budget_id = budget_id_from_query(&params)?;
    let budget = state.cost.get_budget(budget_id).ok_or_else(|| {
        ApiError::from(CcpError::new(ErrorCode::BudgetNotFound, "no such budget"))
    })?;
    Ok(Json(budget.into()))
}

/// `POST /finops/budget?budgetId=...`.
///
/// Records `consumed` USD directly against the budget's running total —
/// for spend that didn't flow through [`ccp_cost::CostLedger::track_usage`]
/// (e.g. a flat per-mission surcharge). `CostLedger` has no public mutator
/// for an existing budget's spend outside `track_usage`, so this
/// re-registers the budget with an adjusted `currentCost`, which
/// `register_budget`'s replace-by-id semantics make safe to do.
pub async fn post_budget(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
    ApiJson(req): ApiJson<BudgetUpdateRequest>,
) -> Result<Json<BudgetStatus>, ApiError> {
    let budget_id = budget_id_from_query(&params)?;
    let mut budget: Budget = state.cost.get_budget(budget_id).ok_or_else(|| {
        ApiError::from(CcpError::new(ErrorCode::BudgetNotFound, "no such budget"))
    })?;

    if let Some(consumed) = req.consumed {
        budget.current_cost += consumed;
        state.cost.register_budget(budget.clone());
    }

    Ok(Json(budget.into()))
}
