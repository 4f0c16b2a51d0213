// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-coordinator
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The Mission Coordinator (C5): the plan/execute/verify/finalize state
//! machine, batch reversibility, and the `applyCheckpoint` pipeline that
//! ties the Redactor, the Evidence Log, and the Transform Engine together.
//!
//! [`MissionCoordinator`] is the single entry point. It holds no business
//! logic of its own beyond orchestration — scanning is [`ccp_redactor`]'s
//! job, rewriting is [`ccp_transform`]'s, and every state transition is
//! recorded through [`ccp_evidence`].

/// In-memory stores for missions, batches, snapshots, and checkpoint
/// applications ([`stores::MissionStore`] and friends).
pub mod stores;

/// [`MissionCoordinator`] and its five operations.
pub mod coordinator;

pub use coordinator::{
    ApplyCheckpointOutcome, CheckpointApplication, MissionCoordinator, RollbackOutcome,
};
pub use stores::{BatchStore, MissionStore, SnapshotStore};
