// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mission lifecycle: creation, checkpoint approval, and the reversible
//! batches created under the `execute` checkpoint.
//!
//! `/missions/:id/batches` and `/missions/:missionId/rollback/:batchId`
//! carry no body on the surface table (`spec.md` §6 lists `—`), so there is
//! nowhere in the request to name which files a batch covers. This server
//! resolves that by giving every mission a dedicated working directory —
//! `<missionsRoot>/<missionId>/` — that a batch snapshots in full; callers
//! stage files there out of band (e.g. via a shared volume) before calling
//! `batches`.

use crate::models::{CreateMissionRequest, RollbackResponse};
use crate::{ApiError, ApiJson, AppState};
use axum::extract::{Path, State};
use axum::{Json, http::StatusCode};
use ccp_core::{CheckpointName, Mission};
use ccp_error::{CcpError, ErrorCode};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

fn parse_checkpoint_name(raw: &str) -> Result<CheckpointName, ApiError> {
    match raw {
        "plan" => Ok(CheckpointName::Plan),
        "execute" => Ok(CheckpointName::Execute),
        "verify" => Ok(CheckpointName::Verify),
        "finalize" => Ok(CheckpointName::Finalize),
        other => Err(CcpError::new(
            ErrorCode::CheckpointNotFound,
            format!("unknown checkpoint name '{other}'"),
        )
        .into()),
    }
}

/// `POST /missions`.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateMissionRequest>,
) -> Result<Json<Mission>, ApiError> {
    let mission = state.coordinator.create_mission(req.title, req.risk)?;
    Ok(Json(mission))
}

/// `GET /missions/:id`.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Mission>, ApiError> {
    Ok(Json(state.coordinator.get_mission(id)?))
}

/// `POST /missions/:id/checkpoints/:name/approve`.
pub async fn approve_checkpoint(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<Mission>, ApiError> {
    let name = parse_checkpoint_name(&name)?;
    Ok(Json(state.coordinator.approve_checkpoint(id, name)?))
}

/// Every path under `root`, relative to `root`, skipping directories.
/// Returns an empty list (rather than erroring) if `root` does not exist
/// yet — a mission with no staged files is a valid, empty batch.
fn list_files_relative(root: &std::path::Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(PathBuf::from))
        .collect()
}

/// `POST /missions/:id/batches`.
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ccp_core::Batch>, ApiError> {
    let workdir = state.mission_workdir(id);
    std::fs::create_dir_all(&workdir).map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to prepare mission working directory: {e}"),
        )
    })?;
    let paths = list_files_relative(&workdir);
    let batch = state.coordinator.create_batch(id, &workdir, &paths)?;
    Ok(Json(batch))
}

/// `POST /missions/:missionId/rollback/:batchId`.
pub async fn rollback(
    State(state): State<Arc<AppState>>,
    Path((mission_id, batch_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RollbackResponse>, ApiError> {
    let workdir = state.mission_workdir(mission_id);
    let outcome = state.coordinator.rollback_batch(mission_id, batch_id, &workdir)?;
    Ok(Json(RollbackResponse {
        success: true,
        message: format!(
            "restored {} file(s) from batch {}",
            outcome.restored_files.len(),
            outcome.batch_id
        ),
    }))
}
