// SPDX-License-Identifier: MIT OR Apache-2.0
//! `RwLock`-guarded, id-keyed in-memory stores for the entities the Mission
//! Coordinator owns. Each store is a thin, typed wrapper over a `HashMap`
//! behind a single lock — the same shape as a typed registry, just guarding
//! mutable records instead of read-mostly handles.

use ccp_core::{Batch, Mission, Snapshot};
use ccp_error::{CcpError, ErrorCode};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// An id-keyed, `RwLock`-guarded map of [`Mission`]s.
#[derive(Debug, Default)]
pub struct MissionStore {
    inner: RwLock<HashMap<Uuid, Mission>>,
}

impl MissionStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `mission`.
    pub fn put(&self, mission: Mission) {
        self.inner
            .write()
            .expect("mission store lock poisoned")
            .insert(mission.mission_id, mission);
    }

    /// Fetch a clone of the mission with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::MissionNotFound`] if no mission has that id.
    pub fn get(&self, id: Uuid) -> Result<Mission, CcpError> {
        self.inner
            .read()
            .expect("mission store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| CcpError::mission_not_found(id))
    }

    /// Replace the stored mission with `id` using `f`, returning the updated
    /// clone.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::MissionNotFound`] if no mission has that id.
    pub fn update<F>(&self, id: Uuid, f: F) -> Result<Mission, CcpError>
    where
        F: FnOnce(&mut Mission),
    {
        let mut guard = self.inner.write().expect("mission store lock poisoned");
        let mission = guard.get_mut(&id).ok_or_else(|| CcpError::mission_not_found(id))?;
        f(mission);
        Ok(mission.clone())
    }
}

/// An id-keyed, `RwLock`-guarded map of [`Batch`]es.
#[derive(Debug, Default)]
pub struct BatchStore {
    inner: RwLock<HashMap<Uuid, Batch>>,
}

impl BatchStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `batch`.
    pub fn put(&self, batch: Batch) {
        self.inner
            .write()
            .expect("batch store lock poisoned")
            .insert(batch.id, batch);
    }

    /// Fetch a clone of the batch with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::BatchNotFound`] if no batch has that id.
    pub fn get(&self, id: Uuid) -> Result<Batch, CcpError> {
        self.inner
            .read()
            .expect("batch store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                CcpError::new(ErrorCode::BatchNotFound, format!("batch {id} not found"))
                    .with_context("batch_id", id.to_string())
            })
    }

    /// Replace the stored batch with `id` using `f`, returning the updated
    /// clone.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::BatchNotFound`] if no batch has that id.
    pub fn update<F>(&self, id: Uuid, f: F) -> Result<Batch, CcpError>
    where
        F: FnOnce(&mut Batch),
    {
        let mut guard = self.inner.write().expect("batch store lock poisoned");
        let batch = guard.get_mut(&id).ok_or_else(|| {
            CcpError::new(ErrorCode::BatchNotFound, format!("batch {id} not found"))
                .with_context("batch_id", id.to_string())
        })?;
        f(batch);
        Ok(batch.clone())
    }
}

/// An id-keyed, `RwLock`-guarded map of [`Snapshot`]s, keyed by the same
/// `checkpointOrBatchId` the snapshot itself carries.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<HashMap<Uuid, Snapshot>>,
}

impl SnapshotStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a snapshot, keyed by its own
    /// `checkpoint_or_batch_id`.
    pub fn put(&self, snapshot: Snapshot) {
        self.inner
            .write()
            .expect("snapshot store lock poisoned")
            .insert(snapshot.checkpoint_or_batch_id, snapshot);
    }

    /// Fetch a clone of the snapshot keyed by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::BatchNotFound`] — v1 only ever looks snapshots
    /// up by batch id, so a missing snapshot is reported the same way a
    /// missing batch would be.
    pub fn get(&self, id: Uuid) -> Result<Snapshot, CcpError> {
        self.inner
            .read()
            .expect("snapshot store lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                CcpError::new(ErrorCode::BatchNotFound, format!("snapshot {id} not found"))
                    .with_context("snapshot_id", id.to_string())
            })
    }
}
