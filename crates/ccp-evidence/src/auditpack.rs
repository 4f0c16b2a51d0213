// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audit pack assembly: a single portable ZIP archive bundling a mission's
//! change spec, provenance graph, raw event list, and whatever aggregated
//! evidence (diffs, test results, mutation report, approvals, FinOps
//! summary) is available at finalize time.

use crate::event::Event;
use crate::provenance::ProvenanceGraph;
use ccp_error::{CcpError, ErrorCode};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One piece of aggregated evidence bundled into an [`AuditPack`].
///
/// `verified` records whether this item's integrity has been checked;
/// cryptographic verification is reserved for a later version, so v1 simply
/// threads through whatever the producing component asserted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceItem {
    /// The item's payload.
    pub data: serde_json::Value,
    /// Whether this item has been verified.
    pub verified: bool,
}

impl EvidenceItem {
    /// Wrap `data` as an already-verified evidence item.
    #[must_use]
    pub fn verified(data: serde_json::Value) -> Self {
        Self { data, verified: true }
    }
}

/// A complete audit pack for one mission.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditPack {
    /// Unique pack identifier.
    pub id: Uuid,
    /// The mission this pack documents.
    #[serde(rename = "missionId")]
    pub mission_id: Uuid,
    /// The submitted `ChangeSpec`, verbatim.
    #[serde(rename = "changeSpec")]
    pub change_spec: serde_json::Value,
    /// This mission's derived provenance graph.
    pub provenance: ProvenanceGraph,
    /// The raw, unfiltered event list for this mission.
    pub events: Vec<Event>,
    /// Aggregated file diffs, if the coordinator captured any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffs: Option<EvidenceItem>,
    /// Test results, if any ran.
    #[serde(rename = "testResults", skip_serializing_if = "Option::is_none")]
    pub test_results: Option<EvidenceItem>,
    /// The mutation-test report, if one was produced.
    #[serde(rename = "mutationReport", skip_serializing_if = "Option::is_none")]
    pub mutation_report: Option<EvidenceItem>,
    /// Checkpoint approval records.
    #[serde(rename = "approvalRecords", skip_serializing_if = "Option::is_none")]
    pub approval_records: Option<EvidenceItem>,
    /// A FinOps summary (budget spend, forecasts) for this mission.
    #[serde(rename = "finopsSummary", skip_serializing_if = "Option::is_none")]
    pub finops_summary: Option<EvidenceItem>,
    /// Component name → version string.
    pub versions: BTreeMap<String, String>,
    /// Reserved for a future cryptographic signature over the pack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// When this pack was assembled.
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

impl AuditPack {
    /// Construct a pack with no optional evidence attached yet; callers add
    /// what they have with the `with_*` builders before assembling the
    /// archive.
    #[must_use]
    pub fn new(
        mission_id: Uuid,
        change_spec: serde_json::Value,
        provenance: ProvenanceGraph,
        events: Vec<Event>,
        versions: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mission_id,
            change_spec,
            provenance,
            events,
            diffs: None,
            test_results: None,
            mutation_report: None,
            approval_records: None,
            finops_summary: None,
            versions,
            signature: None,
            generated_at: Utc::now(),
        }
    }

    /// Attach an aggregated diffs item.
    #[must_use]
    pub fn with_diffs(mut self, item: EvidenceItem) -> Self {
        self.diffs = Some(item);
        self
    }

    /// Attach a test results item.
    #[must_use]
    pub fn with_test_results(mut self, item: EvidenceItem) -> Self {
        self.test_results = Some(item);
        self
    }

    /// Attach a mutation report item.
    #[must_use]
    pub fn with_mutation_report(mut self, item: EvidenceItem) -> Self {
        self.mutation_report = Some(item);
        self
    }

    /// Attach an approval records item.
    #[must_use]
    pub fn with_approval_records(mut self, item: EvidenceItem) -> Self {
        self.approval_records = Some(item);
        self
    }

    /// Attach a FinOps summary item.
    #[must_use]
    pub fn with_finops_summary(mut self, item: EvidenceItem) -> Self {
        self.finops_summary = Some(item);
        self
    }

    /// `true` iff every attached [`EvidenceItem`] has `verified == true`.
    /// Cryptographic verification of `signature` is reserved and not
    /// performed here.
    #[must_use]
    pub fn verify(&self) -> bool {
        [
            &self.diffs,
            &self.test_results,
            &self.mutation_report,
            &self.approval_records,
            &self.finops_summary,
        ]
        .into_iter()
        .flatten()
        .all(|item| item.verified)
    }

    /// Persist this pack's metadata to `<store>/pack_{id}.json`, per
    /// `spec.md` §6's persistence layout.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::IoError`] on serialization or write failure.
    pub fn persist(&self, store_root: &Path) -> Result<PathBuf, CcpError> {
        let path = store_root.join(format!("pack_{}.json", self.id));
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to serialize pack: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to write pack file: {e}")))?;
        Ok(path)
    }

    /// Assemble this pack as a ZIP archive (deflate, level 9) at `out_path`.
    ///
    /// Staging happens in a unique temp directory that is always cleaned up
    /// (its `Drop` impl removes it even if this function returns early on
    /// error), per `spec.md` §5's cleanup-on-failure requirement.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::IoError`] if any entry cannot be serialized or
    /// the archive cannot be written.
    pub fn assemble_zip(&self, out_path: &Path) -> Result<(), CcpError> {
        let staging = tempfile::tempdir()
            .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to create staging dir: {e}")))?;
        let staged_path = staging.path().join("audit_pack.zip");

        let file = std::fs::File::create(&staged_path)
            .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to create staged archive: {e}")))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9));

        let write_entry = |zip: &mut ZipWriter<std::fs::File>, name: &str, value: &serde_json::Value| {
            zip.start_file(name, options)
                .and_then(|()| {
                    let json = serde_json::to_vec_pretty(value)?;
                    zip.write_all(&json)
                })
                .map_err(|e| {
                    CcpError::new(ErrorCode::IoError, format!("failed to write {name} to archive: {e}"))
                })
        };

        write_entry(&mut zip, "changespec.json", &self.change_spec)?;
        write_entry(
            &mut zip,
            "provenance.json",
            &serde_json::to_value(&self.provenance).map_err(|e| {
                CcpError::new(ErrorCode::IoError, format!("failed to serialize provenance: {e}"))
            })?,
        )?;
        write_entry(
            &mut zip,
            "events.json",
            &serde_json::to_value(&self.events)
                .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to serialize events: {e}")))?,
        )?;

        for (name, item) in [
            ("diffs.json", &self.diffs),
            ("test_results.json", &self.test_results),
            ("mutation_report.json", &self.mutation_report),
            ("approval_records.json", &self.approval_records),
            ("finops_summary.json", &self.finops_summary),
        ] {
            if let Some(item) = item {
                write_entry(&mut zip, name, &item.data)?;
            }
        }

        write_entry(
            &mut zip,
            "manifest.json",
            &serde_json::json!({
                "versions": self.versions,
                "generatedAt": self.generated_at,
                "signature": self.signature,
            }),
        )?;

        zip.finish()
            .map_err(|e| CcpError::new(ErrorCode::IoError, format!("failed to finalize archive: {e}")))?;

        std::fs::rename(&staged_path, out_path).or_else(|_| {
            std::fs::copy(&staged_path, out_path).map(|_| ())
        }).map_err(|e| {
            CcpError::new(ErrorCode::IoError, format!("failed to deliver archive: {e}"))
                .with_context("outPath", out_path.display().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pack() -> AuditPack {
        let mission_id = Uuid::new_v4();
        let mut versions = BTreeMap::new();
        versions.insert("ccp-coordinator".to_string(), "0.1.0".to_string());
        AuditPack::new(
            mission_id,
            serde_json::json!({"id": "CS-1"}),
            ProvenanceGraph::derive(mission_id, Vec::new()),
            Vec::new(),
            versions,
        )
    }

    #[test]
    fn verify_passes_with_no_optional_items() {
        assert!(sample_pack().verify());
    }

    #[test]
    fn verify_fails_if_any_item_is_unverified() {
        let pack = sample_pack().with_diffs(EvidenceItem {
            data: serde_json::json!({}),
            verified: false,
        });
        assert!(!pack.verify());
    }

    #[test]
    fn verify_passes_when_all_attached_items_are_verified() {
        let pack = sample_pack()
            .with_diffs(EvidenceItem::verified(serde_json::json!({"a": 1})))
            .with_test_results(EvidenceItem::verified(serde_json::json!({"passed": true})));
        assert!(pack.verify());
    }

    #[test]
    fn persist_writes_pack_file_with_expected_name() {
        let dir = tempfile::tempdir().unwrap();
        let pack = sample_pack();
        let path = pack.persist(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), format!("pack_{}.json", pack.id).as_str());
        assert!(path.is_file());
    }

    #[test]
    fn assemble_zip_produces_archive_with_expected_root_entries() {
        let dir = tempfile::tempdir().unwrap();
        let pack = sample_pack();
        let out = dir.path().join("pack.zip");
        pack.assemble_zip(&out).unwrap();

        let file = std::fs::File::open(&out).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"changespec.json".to_string()));
        assert!(names.contains(&"provenance.json".to_string()));
        assert!(names.contains(&"events.json".to_string()));
    }
}
