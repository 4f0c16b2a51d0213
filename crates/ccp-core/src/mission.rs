// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Mission Coordinator's state model: [`Mission`], [`Checkpoint`],
//! [`Batch`], and [`Snapshot`].

use crate::change_spec::RiskLevel;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// The four named stages of a mission, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointName {
    /// The spec is reviewed and artifacts are staged.
    Plan,
    /// Patches are applied in reversible batches.
    Execute,
    /// Invariants and mutation tests are run.
    Verify,
    /// An audit pack is assembled.
    Finalize,
}

impl CheckpointName {
    /// The fixed ordering of checkpoints within a mission.
    pub const ORDER: [CheckpointName; 4] = [
        CheckpointName::Plan,
        CheckpointName::Execute,
        CheckpointName::Verify,
        CheckpointName::Finalize,
    ];
}

/// Who is responsible for a checkpoint's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// A human reviewer.
    Human,
    /// An autonomous agent.
    Agent,
    /// Joint human+agent responsibility.
    Both,
}

/// A checkpoint's position in its own `pending → approved → completed`
/// lifecycle, or the terminal `rejected` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// Awaiting approval.
    Pending,
    /// Approved; work may proceed.
    Approved,
    /// Terminated without completing.
    Rejected,
    /// Work finished successfully.
    Completed,
}

impl CheckpointStatus {
    /// States reachable directly from this one.
    #[must_use]
    pub fn valid_transitions(&self) -> &'static [CheckpointStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Completed, Self::Rejected],
            Self::Rejected | Self::Completed => &[],
        }
    }

    /// Whether `self -> target` is a legal transition.
    #[must_use]
    pub fn can_transition_to(&self, target: CheckpointStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether this status ends the checkpoint's lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }
}

/// Name-specific payload carried by a [`Checkpoint`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckpointSlot {
    /// `plan`: artifacts produced during planning (e.g. the submitted spec id).
    Plan {
        /// Artifact references (file paths, spec ids) produced while planning.
        artifacts: Vec<String>,
    },
    /// `execute`: the reversible batches created under this checkpoint.
    Execute {
        /// Batch identifiers, in creation order.
        batches: Vec<Uuid>,
    },
    /// `verify`: metrics gathered while checking invariants and mutation score.
    Verify {
        /// Arbitrary verification metrics (mutation score, invariant counts).
        metrics: BTreeMap<String, serde_json::Value>,
    },
    /// `finalize`: a reference to the assembled audit pack.
    Finalize {
        /// Identifier of the generated audit pack, once assembled.
        audit_pack: Option<String>,
    },
}

impl CheckpointSlot {
    /// The empty slot appropriate for a freshly created checkpoint of `name`.
    #[must_use]
    pub fn empty_for(name: CheckpointName) -> Self {
        match name {
            CheckpointName::Plan => Self::Plan {
                artifacts: Vec::new(),
            },
            CheckpointName::Execute => Self::Execute {
                batches: Vec::new(),
            },
            CheckpointName::Verify => Self::Verify {
                metrics: BTreeMap::new(),
            },
            CheckpointName::Finalize => Self::Finalize { audit_pack: None },
        }
    }
}

/// One of a mission's four gates: a status, a responsible actor, and a
/// name-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Checkpoint {
    /// Which of the four stages this is.
    pub name: CheckpointName,
    /// Current lifecycle status.
    pub status: CheckpointStatus,
    /// Who is responsible for this checkpoint's outcome.
    pub actor: Actor,
    /// Name-specific payload.
    pub slot: CheckpointSlot,
}

impl Checkpoint {
    fn new(name: CheckpointName) -> Self {
        Self {
            slot: CheckpointSlot::empty_for(name),
            name,
            status: CheckpointStatus::Pending,
            actor: Actor::Agent,
        }
    }
}

/// An end-to-end change workflow instance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Mission {
    /// Unique mission identifier.
    #[serde(rename = "missionId")]
    pub mission_id: Uuid,
    /// Human-readable title.
    pub title: String,
    /// Declared risk level.
    pub risk: RiskLevel,
    /// The four checkpoints, always in `plan, execute, verify, finalize` order.
    pub checkpoints: [Checkpoint; 4],
    /// Creation timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent checkpoint transition.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Mission {
    /// Create a new mission with all four checkpoints `pending`.
    #[must_use]
    pub fn new(title: impl Into<String>, risk: RiskLevel) -> Self {
        let now = Utc::now();
        Self {
            mission_id: Uuid::new_v4(),
            title: title.into(),
            risk,
            checkpoints: CheckpointName::ORDER.map(Checkpoint::new),
            created_at: now,
            updated_at: now,
        }
    }

    /// Borrow the checkpoint with the given name.
    #[must_use]
    pub fn checkpoint(&self, name: CheckpointName) -> &Checkpoint {
        self.checkpoints
            .iter()
            .find(|c| c.name == name)
            .expect("all four checkpoint names are always present")
    }

    /// Mutably borrow the checkpoint with the given name.
    pub fn checkpoint_mut(&mut self, name: CheckpointName) -> &mut Checkpoint {
        self.checkpoints
            .iter_mut()
            .find(|c| c.name == name)
            .expect("all four checkpoint names are always present")
    }
}

/// Status of a single [`Batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Created, snapshot captured, not yet applied.
    Created,
    /// Patches applied successfully.
    Applied,
    /// Patch application failed; snapshot restored.
    Failed,
    /// Explicitly rolled back after having been applied.
    RolledBack,
}

/// The outcome of applying one patch within a [`Batch`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PatchApplicationRecord {
    /// The resolved file path the patch touched.
    pub path: String,
    /// Whether the patch applied cleanly.
    pub success: bool,
    /// Human-readable detail, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A reversible unit of applied work within the `execute` checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: Uuid,
    /// Always `true` at creation in v1; every batch is reversible.
    pub reversible: bool,
    /// Per-patch outcomes, in application order.
    pub prs: Vec<PatchApplicationRecord>,
    /// Identifier of the pre-image [`Snapshot`] backing this batch.
    #[serde(rename = "snapshotRef")]
    pub snapshot_ref: Uuid,
    /// Current status.
    pub status: BatchStatus,
}

impl Batch {
    /// Create a new, empty, reversible batch bound to `snapshot_ref`.
    #[must_use]
    pub fn new(snapshot_ref: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            reversible: true,
            prs: Vec::new(),
            snapshot_ref,
            status: BatchStatus::Created,
        }
    }
}

/// A pre-image of a batch's affected files, keyed by workspace-relative path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    /// The checkpoint or batch this snapshot backs.
    #[serde(rename = "checkpointOrBatchId")]
    pub checkpoint_or_batch_id: Uuid,
    /// Full pre-image content, keyed by path — not just hashes, so rollback
    /// can restore files byte-for-byte.
    pub files: BTreeMap<PathBuf, String>,
    /// Capture timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// Capture a snapshot of `files` for `checkpoint_or_batch_id`.
    #[must_use]
    pub fn capture(checkpoint_or_batch_id: Uuid, files: BTreeMap<PathBuf, String>) -> Self {
        Self {
            checkpoint_or_batch_id,
            files,
            timestamp: Utc::now(),
        }
    }
}

/// Internal execution state of a single `applyCheckpoint` call, orthogonal
/// to the four-checkpoint mission workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    /// Not yet started.
    Pending,
    /// Transform engine applied patches successfully.
    Applied,
    /// Invariants checked after application.
    Verified,
    /// Application or verification failed; snapshot restored.
    Failed,
    /// Explicitly rolled back.
    RolledBack,
}

impl ApplyState {
    /// States reachable directly from this one.
    #[must_use]
    pub fn valid_transitions(&self) -> &'static [ApplyState] {
        match self {
            Self::Pending => &[Self::Applied, Self::Failed],
            Self::Applied => &[Self::Verified, Self::Failed, Self::RolledBack],
            Self::Verified => &[Self::RolledBack],
            Self::Failed | Self::RolledBack => &[],
        }
    }

    /// Whether `self -> target` is a legal transition.
    #[must_use]
    pub fn can_transition_to(&self, target: ApplyState) -> bool {
        self.valid_transitions().contains(&target)
    }
}
