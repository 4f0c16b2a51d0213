// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-server
#![deny(unsafe_code)]
//!
//! HTTP surface for the change control plane: the gateway (preflight scan +
//! model routing), the mission lifecycle, the Transform Engine's
//! apply/verify entry points, FinOps forecasting and budgets, model
//! routing policy, and the Evidence Log.

/// Request/response DTOs that don't already live in a lower crate
/// ([`models::ModelPolicy`], [`models::BudgetStatus`], gateway shapes).
pub mod models;
/// Route handlers, grouped by the module they front.
pub mod routes;

use axum::{
    Json,
    extract::FromRequest,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use ccp_coordinator::MissionCoordinator;
use ccp_cost::CostLedger;
use ccp_error::{CcpError, ErrorCategory};
use ccp_evidence::EvidenceStore;
use ccp_redactor::Redactor;
use ccp_transform::TransformEngine;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::models::ModelPolicy;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Mission lifecycle state machine and `applyCheckpoint` pipeline.
    pub coordinator: Arc<MissionCoordinator>,
    /// Append-only event log and audit pack assembly.
    pub evidence: Arc<EvidenceStore>,
    /// Secret/PII scanning for `/gateway/preflight`.
    pub redactor: Arc<Redactor>,
    /// Pricing, budgets, and routing for the FinOps endpoints.
    pub cost: Arc<CostLedger>,
    /// Stateless AST apply/verify entry point for `/dte/*`.
    pub transform: Arc<TransformEngine>,
    /// Root directory `/dte/apply` and `/dte/verify` (absent an explicit
    /// `workingDir`) resolve patches against.
    pub workspace_root: PathBuf,
    /// Root directory mission batches are snapshotted/restored under,
    /// namespaced per mission id.
    pub missions_root: PathBuf,
    /// In-memory routing-preference table backing `/policies/models`. Kept
    /// separate from [`CostLedger`]'s budgets: a `ModelPolicy` expresses a
    /// routing preference, not a spending cap.
    pub model_policies: Arc<RwLock<Vec<ModelPolicy>>>,
}

impl AppState {
    /// Path mission `mission_id`'s batches/rollback operate against.
    #[must_use]
    pub fn mission_workdir(&self, mission_id: uuid::Uuid) -> PathBuf {
        self.missions_root.join(mission_id.to_string())
    }
}

/// Build the Axum router with every route from the HTTP surface table.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/gateway/preflight", post(routes::gateway::preflight))
        .route("/gateway/route", post(routes::gateway::route))
        .route("/missions", post(routes::missions::create))
        .route("/missions/{id}", get(routes::missions::get))
        .route(
            "/missions/{id}/checkpoints/{name}/approve",
            post(routes::missions::approve_checkpoint),
        )
        .route("/missions/{id}/batches", post(routes::missions::create_batch))
        .route(
            "/missions/{mission_id}/rollback/{batch_id}",
            post(routes::missions::rollback),
        )
        .route("/dte/apply", post(routes::dte::apply))
        .route("/dte/verify", post(routes::dte::verify))
        .route("/finops/forecast", post(routes::finops::forecast))
        .route(
            "/finops/budget",
            get(routes::finops::get_budget).post(routes::finops::post_budget),
        )
        .route(
            "/policies/models",
            get(routes::policies::list_models).put(routes::policies::put_model),
        )
        .route("/evidence/events", post(routes::evidence::append_event))
        .route("/evidence/mission/{id}", get(routes::evidence::mission_provenance))
        .route("/evidence/export", post(routes::evidence::export))
        .with_state(state)
}

/// Uniform error response: `{error, details?}`, per `spec.md` §6.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Construct an error with an explicit status, bypassing the
    /// `CcpError` category mapping (used for transport-level failures like
    /// an unparsable body).
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: message.into(),
            details: None,
        }
    }

    /// Attach structured details to an existing error.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<CcpError> for ApiError {
    fn from(err: CcpError) -> Self {
        let status = match err.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Security => StatusCode::BAD_REQUEST,
            ErrorCategory::Resource => StatusCode::BAD_REQUEST,
            ErrorCategory::Execution | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let details = if err.context.is_empty() {
            None
        } else {
            Some(json!(err.context))
        };
        Self {
            status,
            error: err.message,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// `Json<T>` that rejects a non-`application/json` content type with `415`
/// instead of axum's default `415`-via-rejection-string, so the body shape
/// matches `{error, details?}` like every other error on the surface.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<axum::body::Body>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/json") {
            return Err(ApiError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "expected content-type application/json",
            ));
        }

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
        Ok(Self(value))
    }
}
