// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-evidence
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Append-only event log, provenance graph derivation, and audit pack
//! assembly for the change control plane.

/// Audit pack assembly — the portable ZIP archive a mission's `finalize`
/// checkpoint produces.
pub mod auditpack;
/// The closed event-type set and the append-only `Event` envelope.
pub mod event;
/// Provenance graph derivation over a mission's events.
pub mod provenance;
/// File-backed append-only event storage.
pub mod store;

pub use auditpack::{AuditPack, EvidenceItem};
pub use event::{Event, EventType};
pub use provenance::{ProvenanceGraph, ProvenanceNode};
pub use store::EvidenceStore;
