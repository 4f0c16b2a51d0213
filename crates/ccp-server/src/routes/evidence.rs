// SPDX-License-Identifier: MIT OR Apache-2.0
//! `/evidence/events`, `/evidence/mission/:id`, `/evidence/export`: direct
//! access to the append-only log, its derived provenance view, and audit
//! pack assembly.

use crate::models::{AppendEventRequest, ExportRequest};
use crate::{ApiError, ApiJson, AppState};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use ccp_error::{CcpError, ErrorCode};
use ccp_evidence::{AuditPack, Event, EventType, ProvenanceGraph};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// `POST /evidence/events`.
pub async fn append_event(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AppendEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = Event::new(req.event_type, req.mission_id, req.data);
    let stored = state.evidence.append(event)?;
    Ok(Json(stored))
}

/// `GET /evidence/mission/:id`.
pub async fn mission_provenance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<ProvenanceGraph> {
    let events = state.evidence.events_for_mission(id);
    Json(ProvenanceGraph::derive(id, events))
}

/// `POST /evidence/export`.
///
/// Bundles a mission's raw events and derived provenance into a ZIP audit
/// pack and streams the archive bytes back. Only the two items guaranteed
/// by `spec.md`'s minimum archive contents (provenance, events) plus the
/// submitted change spec are attached in v1; `withDiffs`/`withTestResults`/
/// etc. are left for a caller that has gathered that evidence to attach
/// before finalize, which this endpoint does not do on their behalf.
pub async fn export(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ExportRequest>,
) -> Result<Response, ApiError> {
    let events = state.evidence.events_for_mission(req.mission_id);
    let provenance = ProvenanceGraph::derive(req.mission_id, events.clone());

    let mut versions = BTreeMap::new();
    versions.insert("contractVersion".to_string(), ccp_core::CONTRACT_VERSION.to_string());

    let pack = AuditPack::new(req.mission_id, req.change_spec, provenance, events, versions);

    let tempdir = tempfile::tempdir().map_err(|e| {
        ApiError::from(CcpError::new(ErrorCode::IoError, format!("failed to stage archive: {e}")))
    })?;
    let zip_path = tempdir.path().join("audit_pack.zip");
    pack.assemble_zip(&zip_path)?;
    let bytes = std::fs::read(&zip_path).map_err(|e| {
        ApiError::from(CcpError::new(ErrorCode::IoError, format!("failed to read assembled archive: {e}")))
    })?;

    state.evidence.append(Event::new(
        EventType::AuditPackGenerated,
        Some(req.mission_id),
        json!({ "packId": pack.id }),
    ))?;

    let filename = format!("audit-pack-{}.zip", req.mission_id);
    let mut response = (StatusCode::OK, bytes).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, "application/zip".parse().unwrap());
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\"").parse().unwrap(),
    );
    Ok(response)
}
