// SPDX-License-Identifier: MIT OR Apache-2.0
//! `/dte/apply` and `/dte/verify`: the Transform Engine's HTTP face.
//!
//! `apply`'s body is a bare `ChangeSpec` with no working directory, so it
//! resolves patches against [`AppState::workspace_root`]; `verify` carries
//! an explicit `workingDir` per `spec.md` §6 and uses that instead.

use crate::models::VerifyRequest;
use crate::{ApiError, ApiJson, AppState};
use axum::Json;
use axum::extract::State;
use ccp_core::ChangeSpec;
use ccp_core::validate::{to_ccp_error, validate_change_spec};
use ccp_error::{CcpError, ErrorCode};
use ccp_transform::{ApplyResult, VerifyResult};
use schemars::schema_for;
use std::path::Path;
use std::sync::Arc;

/// Generic JSON-Schema validation: type/shape/enum-membership checks that
/// `schemars`' derived schema can express. Catches malformed wire shapes
/// (wrong field types, unknown `astOp` values) before the body is even
/// deserialized into a [`ChangeSpec`].
fn validate_schema(value: &serde_json::Value) -> Result<(), ApiError> {
    let schema = serde_json::to_value(schema_for!(ChangeSpec)).map_err(|e| {
        ApiError::from(CcpError::new(
            ErrorCode::InvalidChangeSpec,
            format!("failed to build change spec schema: {e}"),
        ))
    })?;
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        ApiError::from(CcpError::new(
            ErrorCode::InvalidChangeSpec,
            format!("change spec schema failed to compile: {e}"),
        ))
    })?;
    if let Err(first) = validator.validate(value) {
        let details: Vec<String> = std::iter::once(first.to_string())
            .chain(validator.iter_errors(value).skip(1).map(|e| e.to_string()))
            .collect();
        return Err(ApiError::from(CcpError::new(
            ErrorCode::InvalidChangeSpec,
            "change spec failed schema validation",
        ))
        .with_details(serde_json::json!({ "errors": details })));
    }
    Ok(())
}

/// Structural validation beyond what a JSON schema can express: the `CS-\d+`
/// id pattern, duplicate invariant names, selector/`astOp` shape agreement,
/// and an empty `scope` — the boundary cases `spec.md` §8 assigns to
/// `InvalidChangeSpec`/`InvalidSelector`.
fn validate_structure(spec: &ChangeSpec) -> Result<(), ApiError> {
    validate_change_spec(spec).map_err(|errors| ApiError::from(to_ccp_error(&spec.id, &errors)))
}

/// `POST /dte/apply`.
pub async fn apply(
    State(state): State<Arc<AppState>>,
    ApiJson(raw): ApiJson<serde_json::Value>,
) -> Result<Json<ApplyResult>, ApiError> {
    validate_schema(&raw)?;
    let spec: ChangeSpec = serde_json::from_value(raw).map_err(|e| {
        ApiError::from(CcpError::new(
            ErrorCode::InvalidChangeSpec,
            format!("change spec did not deserialize: {e}"),
        ))
    })?;
    validate_structure(&spec)?;

    let result = state.transform.apply(&spec, &state.workspace_root);
    Ok(Json(result))
}

/// `POST /dte/verify`.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Result<Json<VerifyResult>, ApiError> {
    validate_structure(&req.spec)?;
    let result = state.transform.verify(&req.spec, Path::new(&req.working_dir)).await;
    Ok(Json(result))
}
