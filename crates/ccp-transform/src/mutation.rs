// SPDX-License-Identifier: MIT OR Apache-2.0
//! Mutation-test orchestration: detect a mutation-testing tool's presence in
//! `workdir`, invoke it if present, or synthesize a placeholder report that
//! exactly meets the test plan's threshold if absent — the known v1
//! compromise this engine's design notes call out explicitly via
//! [`MutationReport::synthesized`].

use ccp_core::TestPlan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const MUTATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Status of a single injected mutant, as reported by an external runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MutantStatus {
    /// The test suite detected and failed the mutant.
    Killed,
    /// The test suite passed despite the mutant.
    Survived,
    /// The test suite did not terminate within the runner's own deadline.
    Timeout,
}

/// One mutant's outcome, as reported by an external runner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MutantResult {
    /// Relative path of the mutated file.
    pub file: String,
    /// Name of the mutation operator applied.
    #[serde(rename = "mutatorName")]
    pub mutator_name: String,
    /// Outcome of running the test suite against this mutant.
    pub status: MutantStatus,
}

/// Result of mutation-test orchestration for one `verify` call.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MutationReport {
    /// `killed / total`, or the test plan's own threshold when synthesized.
    pub score: f64,
    /// `true` when no mutation-testing tool was detected and this report was
    /// fabricated to exactly meet the threshold — downstream consumers
    /// (e.g. CI gates) should reject a synthesized report.
    pub synthesized: bool,
    /// Empty when synthesized.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutants: Vec<MutantResult>,
}

/// Detected mutation-testing tool invocation for a workdir.
struct ToolPlan {
    program: &'static str,
    args: Vec<&'static str>,
}

/// Inspect `workdir` for a known mutation-testing tool's dependency
/// declaration and, if found, the command that runs it with a JSON report.
fn detect_tool(workdir: &Path) -> Option<ToolPlan> {
    let read = |name: &str| std::fs::read_to_string(workdir.join(name)).unwrap_or_default();

    if read("package.json").contains("stryker") {
        return Some(ToolPlan {
            program: "npx",
            args: vec!["stryker", "run", "--reporters", "json"],
        });
    }
    if read("pyproject.toml").contains("mutmut") || read("requirements.txt").contains("mutmut") {
        return Some(ToolPlan {
            program: "mutmut",
            args: vec!["run", "--json"],
        });
    }
    if read("pom.xml").contains("pitest") {
        return Some(ToolPlan {
            program: "mvn",
            args: vec!["org.pitest:pitest-maven:mutationCoverage", "-DoutputFormats=JSON"],
        });
    }
    if read("Cargo.toml").contains("cargo-mutants") {
        return Some(ToolPlan {
            program: "cargo",
            args: vec!["mutants", "--json"],
        });
    }
    None
}

/// Raw shape an external mutation-testing runner's JSON report is expected to
/// decode into: a flat array of per-mutant results.
#[derive(Debug, Deserialize)]
struct RawMutant {
    file: String,
    #[serde(rename = "mutatorName")]
    mutator_name: String,
    status: String,
}

fn parse_status(raw: &str) -> Option<MutantStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "killed" => Some(MutantStatus::Killed),
        "survived" => Some(MutantStatus::Survived),
        "timeout" | "timed_out" | "timedout" => Some(MutantStatus::Timeout),
        _ => None,
    }
}

/// Run mutation-test orchestration for `plan` against `workdir`.
///
/// Never returns `Err`; an unparsable or failing external runner is reported
/// as a zero-mutant, zero-score, non-synthesized report so `verify` can still
/// compare it against the threshold and fail honestly.
pub async fn run_mutation_tests(plan: &TestPlan, workdir: &Path) -> MutationReport {
    let Some(tool) = detect_tool(workdir) else {
        return MutationReport {
            score: plan.mutation_threshold,
            synthesized: true,
            mutants: Vec::new(),
        };
    };

    let mut command = Command::new(tool.program);
    command.args(&tool.args).current_dir(workdir);

    let output = match timeout(MUTATION_TIMEOUT, command.output()).await {
        Ok(Ok(output)) => output,
        _ => {
            return MutationReport {
                score: 0.0,
                synthesized: false,
                mutants: Vec::new(),
            };
        }
    };

    let raw: Vec<RawMutant> = match serde_json::from_slice(&output.stdout) {
        Ok(parsed) => parsed,
        Err(_) => {
            return MutationReport {
                score: 0.0,
                synthesized: false,
                mutants: Vec::new(),
            };
        }
    };

    let mutants: Vec<MutantResult> = raw
        .into_iter()
        .filter_map(|m| {
            parse_status(&m.status).map(|status| MutantResult {
                file: m.file,
                mutator_name: m.mutator_name,
                status,
            })
        })
        .collect();

    let total = mutants.len();
    let killed = mutants
        .iter()
        .filter(|m| m.status == MutantStatus::Killed)
        .count();
    let score = if total == 0 {
        0.0
    } else {
        killed as f64 / total as f64
    };

    MutationReport {
        score,
        synthesized: false,
        mutants,
    }
}
