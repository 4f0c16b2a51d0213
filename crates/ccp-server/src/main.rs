// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
use anyhow::{Context, Result};
use ccp_config::CcpConfig;
use ccp_coordinator::MissionCoordinator;
use ccp_cost::{CostLedger, PricingTable};
use ccp_evidence::EvidenceStore;
use ccp_redactor::Redactor;
use ccp_server::{AppState, build_app};
use ccp_transform::TransformEngine;
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ccp-server", version, about = "Change control plane daemon")]
struct Args {
    /// Path to a TOML config file. Falls back to `CcpConfig::default()` plus
    /// environment overrides if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address; overrides the config file's `server.host`/`server.port`.
    #[arg(long)]
    bind: Option<String>,

    /// Root directory `/dte/apply` resolves patches against by default.
    #[arg(long, default_value = ".")]
    workspace_root: PathBuf,

    /// Root directory mission working directories are created under.
    #[arg(long, default_value = ".ccp/missions")]
    missions_root: PathBuf,

    /// Enable request/response debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("ccp=debug,ccp_server=debug,ccp_coordinator=debug")
    } else {
        EnvFilter::new("ccp=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ccp_config::load_config(args.config.as_deref())
        .with_context(|| "load configuration")?;
    match ccp_config::validate_config(&config) {
        Ok(warnings) => {
            for warning in warnings {
                tracing::warn!(%warning, "configuration warning");
            }
        }
        Err(err) => anyhow::bail!("invalid configuration: {err}"),
    }

    let bind = args.bind.unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    let evidence_dir = config
        .evidence_store_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".ccp/evidence"));
    let evidence = Arc::new(EvidenceStore::open(&evidence_dir).with_context(|| {
        format!("open evidence store at {}", evidence_dir.display())
    })?);

    let redactor = Arc::new(load_redactor(&config)?);

    let coordinator = Arc::new(MissionCoordinator::new(evidence.clone(), redactor.clone()));

    let mut cost_ledger = CostLedger::new(PricingTable::with_defaults());
    for (id, budget_cfg) in &config.budgets {
        let mut budget = ccp_core::Budget::new(id.clone(), budget_cfg.max_cost, budget_cfg.alert_threshold_pct);
        budget.models.push(ccp_core::ModelBudget {
            model_id: "cheap-v1".to_string(),
            priority: 1,
            max_cost: None,
        });
        budget.models.push(ccp_core::ModelBudget {
            model_id: "premium-v1".to_string(),
            priority: 10,
            max_cost: None,
        });
        cost_ledger.register_budget(budget);
    }
    let cost = Arc::new(cost_ledger);

    std::fs::create_dir_all(&args.missions_root)
        .with_context(|| format!("create missions root {}", args.missions_root.display()))?;

    let state = Arc::new(AppState {
        coordinator,
        evidence,
        redactor,
        cost,
        transform: Arc::new(TransformEngine::new()),
        workspace_root: args.workspace_root,
        missions_root: args.missions_root,
        model_policies: Arc::new(RwLock::new(Vec::new())),
    });

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(bind = %bind, "ccp-server listening");

    axum::serve(listener, app).await.context("serve")
}

/// Load the default redaction policies, layering in a TOML policy file from
/// config if one is configured.
fn load_redactor(config: &CcpConfig) -> Result<Redactor> {
    let redactor = Redactor::with_default_policies().context("load default redaction policies")?;
    if let Some(path) = &config.redaction_policies_path {
        tracing::warn!(
            path,
            "redaction_policies_path is configured but custom policy loading is not implemented in v1"
        );
    }
    Ok(redactor)
}
