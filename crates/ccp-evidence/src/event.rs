// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed set of event types the evidence log accepts, and the
//! append-only [`Event`] envelope itself.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of event types the Evidence Log will record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    /// A mission was created.
    MissionCreated,
    /// A checkpoint was approved.
    CheckpointApproved,
    /// A checkpoint was rejected.
    CheckpointRejected,
    /// A batch was executed.
    BatchExecuted,
    /// A rollback was applied to a batch.
    RollbackApplied,
    /// A budget was breached by a usage event.
    BudgetBreached,
    /// An audit pack was generated for a mission.
    AuditPackGenerated,
}

/// A single append-only evidence record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// The event's type.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The mission this event belongs to, if any (some event types, like a
    /// future cross-mission budget alert, may be mission-agnostic).
    #[serde(rename = "missionId", skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<Uuid>,
    /// Event-type-specific payload.
    pub data: serde_json::Value,
}

impl Event {
    /// Construct a new event stamped with `id`/`timestamp` generated here
    /// (not by the caller), so append order is always assigned by the log.
    #[must_use]
    pub fn new(event_type: EventType, mission_id: Option<Uuid>, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            mission_id,
            data,
        }
    }
}
