// SPDX-License-Identifier: MIT OR Apache-2.0
//! Append-only event storage: an in-memory map mirrored to one JSON file per
//! event under a configurable store path, guarded by a single mutex per
//! `spec.md` §5's "coarse mutex per component" concurrency model.

use crate::event::Event;
use ccp_error::{CcpError, ErrorCode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// An append-only, id-keyed store of [`Event`]s.
///
/// Every [`append`](Self::append) call both inserts into the in-memory map
/// and writes `<root>/{eventId}.json`; there is no update or delete path.
pub struct EvidenceStore {
    root: PathBuf,
    events: Mutex<BTreeMap<Uuid, Event>>,
}

impl EvidenceStore {
    /// Open (or create) a store rooted at `root`. Does not read any
    /// previously persisted events back into memory; v1 treats the store
    /// directory as write-mostly scratch space for a single daemon
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::IoError`] if `root` cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CcpError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            CcpError::new(ErrorCode::IoError, format!("failed to create evidence store root: {e}"))
                .with_context("path", root.display().to_string())
        })?;
        Ok(Self {
            root,
            events: Mutex::new(BTreeMap::new()),
        })
    }

    /// The directory events are persisted under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append `event`, persisting it to `<root>/{id}.json` and returning a
    /// clone of the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::IoError`] if the event cannot be serialized or
    /// written.
    pub fn append(&self, event: Event) -> Result<Event, CcpError> {
        let path = self.root.join(format!("{}.json", event.id));
        let json = serde_json::to_string_pretty(&event).map_err(|e| {
            CcpError::new(ErrorCode::IoError, format!("failed to serialize event: {e}"))
        })?;
        std::fs::write(&path, json).map_err(|e| {
            CcpError::new(ErrorCode::IoError, format!("failed to write event file: {e}"))
                .with_context("path", path.display().to_string())
        })?;

        let mut events = self.events.lock().expect("evidence store lock poisoned");
        events.insert(event.id, event.clone());
        Ok(event)
    }

    /// Look up a single event by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Event> {
        self.events
            .lock()
            .expect("evidence store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// All events belonging to `mission_id`, in insertion order (the order
    /// the backing `BTreeMap` yields by ascending `Uuid`, filtered; callers
    /// needing timestamp order should feed the result to
    /// [`crate::ProvenanceGraph::derive`], which sorts it).
    #[must_use]
    pub fn events_for_mission(&self, mission_id: Uuid) -> Vec<Event> {
        self.events
            .lock()
            .expect("evidence store lock poisoned")
            .values()
            .filter(|e| e.mission_id == Some(mission_id))
            .cloned()
            .collect()
    }

    /// Every event currently held in memory.
    #[must_use]
    pub fn all(&self) -> Vec<Event> {
        self.events
            .lock()
            .expect("evidence store lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn append_persists_one_file_per_event_and_is_readable_back() {
        let dir = tempdir().unwrap();
        let store = EvidenceStore::open(dir.path()).unwrap();
        let mission_id = Uuid::new_v4();
        let event = Event::new(EventType::MissionCreated, Some(mission_id), json!({"title": "x"}));
        let id = event.id;

        let stored = store.append(event).unwrap();
        assert_eq!(stored.id, id);
        assert!(dir.path().join(format!("{id}.json")).is_file());
        assert_eq!(store.get(id).unwrap().id, id);
    }

    #[test]
    fn events_for_mission_filters_correctly() {
        let dir = tempdir().unwrap();
        let store = EvidenceStore::open(dir.path()).unwrap();
        let mission_a = Uuid::new_v4();
        let mission_b = Uuid::new_v4();
        store
            .append(Event::new(EventType::MissionCreated, Some(mission_a), json!({})))
            .unwrap();
        store
            .append(Event::new(EventType::MissionCreated, Some(mission_b), json!({})))
            .unwrap();

        let for_a = store.events_for_mission(mission_a);
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].mission_id, Some(mission_a));
    }

    #[test]
    fn unknown_id_returns_none() {
        let dir = tempdir().unwrap();
        let store = EvidenceStore::open(dir.path()).unwrap();
        assert!(store.get(Uuid::new_v4()).is_none());
    }
}
