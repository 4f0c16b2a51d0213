// SPDX-License-Identifier: MIT OR Apache-2.0
//! `/policies/models`: the published routing-preference table.

use crate::models::ModelPolicy;
use crate::{ApiJson, AppState};
use axum::Json;
use axum::extract::State;
use std::sync::Arc;

/// `GET /policies/models`.
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelPolicy>> {
    let mut policies = state
        .model_policies
        .read()
        .expect("model policies lock poisoned")
        .clone();
    policies.sort_by(|a, b| a.model_id.cmp(&b.model_id));
    Json(policies)
}

/// `PUT /policies/models`.
///
/// Upserts by `(modelId, budgetId)`; returns the full, updated table.
pub async fn put_model(
    State(state): State<Arc<AppState>>,
    ApiJson(policy): ApiJson<ModelPolicy>,
) -> Json<Vec<ModelPolicy>> {
    let mut policies = state.model_policies.write().expect("model policies lock poisoned");
    if let Some(existing) = policies
        .iter_mut()
        .find(|p| p.model_id == policy.model_id && p.budget_id == policy.budget_id)
    {
        *existing = policy;
    } else {
        policies.push(policy);
    }
    let mut out = policies.clone();
    out.sort_by(|a, b| a.model_id.cmp(&b.model_id));
    Json(out)
}
