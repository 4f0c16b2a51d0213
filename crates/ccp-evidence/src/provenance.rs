// SPDX-License-Identifier: MIT OR Apache-2.0
//! Derived provenance view over a mission's events: a timestamp-ordered
//! chain, each node's successor forming its sole out-edge. The model
//! permits multiple parents per node (a DAG) for future branching, but v1
//! always derives a simple linear path.

use crate::event::Event;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One node in a [`ProvenanceGraph`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvenanceNode {
    /// The event this node represents.
    pub event: Event,
    /// Ids of this node's successors (at most one in v1's linear chain).
    pub edges: Vec<Uuid>,
}

/// A mission's events, ordered by timestamp and linked into a chain.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvenanceGraph {
    /// The mission these events belong to.
    #[serde(rename = "missionId")]
    pub mission_id: Uuid,
    /// Nodes in timestamp order (ties broken by insertion order).
    pub nodes: Vec<ProvenanceNode>,
}

impl ProvenanceGraph {
    /// Derive a provenance graph from `events`, which must already be
    /// filtered to a single mission. `events` is assumed to be in the
    /// evidence log's append order; stable-sorting by timestamp preserves
    /// insertion order among equal timestamps, satisfying the "ties broken
    /// by insertion order" ordering guarantee.
    #[must_use]
    pub fn derive(mission_id: Uuid, mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.timestamp);

        let mut nodes: Vec<ProvenanceNode> = events
            .into_iter()
            .map(|event| ProvenanceNode {
                event,
                edges: Vec::new(),
            })
            .collect();

        for i in 0..nodes.len().saturating_sub(1) {
            let successor_id = nodes[i + 1].event.id;
            nodes[i].edges.push(successor_id);
        }

        Self { mission_id, nodes }
    }

    /// `true` if every node but the last has exactly one out-edge and the
    /// last has none — i.e. the graph is a simple path, as v1 requires.
    #[must_use]
    pub fn is_simple_path(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        self.nodes[..self.nodes.len() - 1]
            .iter()
            .all(|n| n.edges.len() == 1)
            && self.nodes.last().is_some_and(|n| n.edges.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn event_at(offset_secs: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_type: EventType::MissionCreated,
            timestamp: Utc::now() + Duration::seconds(offset_secs),
            mission_id: None,
            data: json!({}),
        }
    }

    #[test]
    fn empty_events_yield_empty_simple_path() {
        let graph = ProvenanceGraph::derive(Uuid::new_v4(), Vec::new());
        assert!(graph.nodes.is_empty());
        assert!(graph.is_simple_path());
    }

    #[test]
    fn single_event_has_no_outgoing_edge() {
        let graph = ProvenanceGraph::derive(Uuid::new_v4(), vec![event_at(0)]);
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.nodes[0].edges.is_empty());
        assert!(graph.is_simple_path());
    }

    #[test]
    fn multiple_events_form_a_linear_chain_in_timestamp_order() {
        let e1 = event_at(2);
        let e2 = event_at(0);
        let e3 = event_at(1);
        let (id1, id2, id3) = (e1.id, e2.id, e3.id);

        let graph = ProvenanceGraph::derive(Uuid::new_v4(), vec![e1, e2, e3]);
        let ids: Vec<Uuid> = graph.nodes.iter().map(|n| n.event.id).collect();
        assert_eq!(ids, vec![id2, id3, id1]);
        assert_eq!(graph.nodes[0].edges, vec![id3]);
        assert_eq!(graph.nodes[1].edges, vec![id1]);
        assert!(graph.nodes[2].edges.is_empty());
        assert!(graph.is_simple_path());
    }
}
