// SPDX-License-Identifier: MIT OR Apache-2.0
//! ccp-cost
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Per-model pricing, budget tracking, priority-based routing, and cost
//! forecasting. Budget spend is tracked as integer micro-dollars behind an
//! atomic counter so concurrent `trackUsage` calls never race or drift the
//! way repeated floating-point addition would.

use ccp_core::{Budget, ModelBudget};
use ccp_error::{CcpError, ErrorCode};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};

const MICROS_PER_DOLLAR: f64 = 1_000_000.0;

fn usd_to_micro(usd: f64) -> u64 {
    (usd * MICROS_PER_DOLLAR).round() as u64
}

fn micro_to_usd(micro: u64) -> f64 {
    micro as f64 / MICROS_PER_DOLLAR
}

/// Input/output per-1,000-token pricing for a single model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct Price {
    /// USD per 1,000 input (prompt) tokens.
    pub input_token_cost: f64,
    /// USD per 1,000 output (completion) tokens.
    pub output_token_cost: f64,
}

impl Price {
    /// Compute the cost of `input_tokens`/`output_tokens` at this price.
    #[must_use]
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_token_cost
            + (output_tokens as f64 / 1000.0) * self.output_token_cost
    }
}

/// Registry of per-model [`Price`]s, keyed by model id.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    prices: HashMap<String, Price>,
}

impl PricingTable {
    /// An empty pricing table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default two-tier pricing table: a cheap tier and a premium tier,
    /// enough to exercise priority-based routing out of the box.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(
            "cheap-v1",
            Price {
                input_token_cost: 0.25,
                output_token_cost: 1.25,
            },
        );
        table.register(
            "premium-v1",
            Price {
                input_token_cost: 3.00,
                output_token_cost: 15.00,
            },
        );
        table
    }

    /// Register or overwrite the price for `model_id`.
    pub fn register(&mut self, model_id: impl Into<String>, price: Price) {
        self.prices.insert(model_id.into(), price);
    }

    /// Look up a model's price.
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<Price> {
        self.prices.get(model_id).copied()
    }
}

/// A single `trackUsage` call's arguments.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UsageEvent {
    /// The model the tokens were consumed against.
    #[serde(rename = "modelId")]
    pub model_id: String,
    /// Prompt tokens consumed.
    #[serde(rename = "inputTokens")]
    pub input_tokens: u64,
    /// Completion tokens consumed.
    #[serde(rename = "outputTokens")]
    pub output_tokens: u64,
    /// When the usage occurred.
    pub t: DateTime<Utc>,
}

/// One line of a [`CostForecast`]'s breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForecastLine {
    /// The model this line prices.
    #[serde(rename = "modelId")]
    pub model_id: String,
    /// Total tokens (input + output) priced.
    pub tokens: u64,
    /// Cost in USD for those tokens.
    pub cost: f64,
}

/// Result of [`CostLedger::forecast_cost`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CostForecast {
    /// Total estimated cost in USD.
    #[serde(rename = "estimatedCost")]
    pub estimated_cost: f64,
    /// Static confidence value; the pricing table is exact, not statistical.
    pub confidence: f64,
    /// Per-model cost breakdown (single entry in v1: one model per forecast).
    pub breakdown: Vec<ForecastLine>,
}

/// Atomic, thread-safe backing state for a registered [`Budget`].
struct BudgetState {
    max_cost_micro: u64,
    alert_threshold_pct: f64,
    models: Vec<ModelBudget>,
    current_cost_micro: AtomicU64,
    alert_fired: AtomicBool,
}

impl BudgetState {
    fn from_budget(budget: &Budget) -> Self {
        Self {
            max_cost_micro: usd_to_micro(budget.max_cost),
            alert_threshold_pct: budget.alert_threshold_pct,
            models: budget.models.clone(),
            current_cost_micro: AtomicU64::new(usd_to_micro(budget.current_cost)),
            alert_fired: AtomicBool::new(false),
        }
    }

    fn governs(&self, model_id: &str) -> bool {
        self.models.iter().any(|m| m.model_id == model_id)
    }

    fn to_budget(&self, id: &str) -> Budget {
        Budget {
            id: id.to_string(),
            max_cost: micro_to_usd(self.max_cost_micro),
            current_cost: micro_to_usd(self.current_cost_micro.load(Relaxed)),
            alert_threshold_pct: self.alert_threshold_pct,
            models: self.models.clone(),
        }
    }

    /// Add `cost_usd` to the running total and report whether this crossing
    /// is the first time the alert threshold was reached, and whether the
    /// budget is now breached.
    fn record(&self, cost_usd: f64) -> (bool, bool) {
        let delta = usd_to_micro(cost_usd);
        self.current_cost_micro.fetch_add(delta, Relaxed);
        let current = self.current_cost_micro.load(Relaxed);

        let alert_line = ((self.alert_threshold_pct / 100.0) * self.max_cost_micro as f64) as u64;
        let crossed_alert = current >= alert_line
            && self
                .alert_fired
                .compare_exchange(false, true, Relaxed, Relaxed)
                .is_ok();
        let breached = current >= self.max_cost_micro;
        (crossed_alert, breached)
    }
}

/// Outcome of [`CostLedger::track_usage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackUsageReport {
    /// Budget ids for which this usage crossed the alert threshold for the
    /// first time.
    pub alerts_fired: Vec<String>,
    /// Budget ids that are now breached (`currentCost >= maxCost`). Usage is
    /// still recorded against these budgets even though they're breached.
    pub breached: Vec<String>,
}

/// Holds the pricing table, every registered [`Budget`], and usage history.
pub struct CostLedger {
    pricing: PricingTable,
    budgets: RwLock<HashMap<String, BudgetState>>,
}

impl CostLedger {
    /// A ledger with the given pricing table and no budgets registered.
    #[must_use]
    pub fn new(pricing: PricingTable) -> Self {
        Self {
            pricing,
            budgets: RwLock::new(HashMap::new()),
        }
    }

    /// Register a budget, replacing any existing budget with the same id.
    pub fn register_budget(&self, budget: Budget) {
        self.budgets
            .write()
            .expect("budgets lock poisoned")
            .insert(budget.id.clone(), BudgetState::from_budget(&budget));
    }

    /// Snapshot a registered budget as a [`Budget`] DTO.
    #[must_use]
    pub fn get_budget(&self, budget_id: &str) -> Option<Budget> {
        self.budgets
            .read()
            .expect("budgets lock poisoned")
            .get(budget_id)
            .map(|state| state.to_budget(budget_id))
    }

    /// Record a usage event against every registered budget whose `models`
    /// list contains `event.model_id`, firing alerts once per threshold
    /// crossing and reporting any budgets that are now breached.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::BudgetExceeded`] if any governing budget is
    /// breached by this call. Usage is recorded against every governing
    /// budget regardless.
    pub fn track_usage(&self, event: &UsageEvent) -> Result<TrackUsageReport, CcpError> {
        let price = self.pricing.get(&event.model_id).ok_or_else(|| {
            CcpError::new(
                ErrorCode::NoViableModel,
                format!("no pricing registered for model {}", event.model_id),
            )
            .with_context("modelId", event.model_id.clone())
        })?;
        let cost = price.cost(event.input_tokens, event.output_tokens);

        let budgets = self.budgets.read().expect("budgets lock poisoned");
        let mut report = TrackUsageReport {
            alerts_fired: Vec::new(),
            breached: Vec::new(),
        };
        for (id, state) in budgets.iter() {
            if !state.governs(&event.model_id) {
                continue;
            }
            let (crossed_alert, breached) = state.record(cost);
            if crossed_alert {
                report.alerts_fired.push(id.clone());
            }
            if breached {
                report.breached.push(id.clone());
            }
        }

        if !report.breached.is_empty() {
            return Err(CcpError::new(
                ErrorCode::BudgetExceeded,
                format!("budget(s) breached by usage: {}", report.breached.join(", ")),
            )
            .with_context("breached", report.breached.clone())
            .with_context("modelId", event.model_id.clone()));
        }

        Ok(report)
    }

    /// Choose the highest-priority model in `budget_id` whose estimated cost
    /// for `estimated_input_tokens` fits within the budget's remaining
    /// headroom (and, if set, the model's own sub-cap).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::BudgetNotFound`] if `budget_id` is unregistered,
    /// or [`ErrorCode::NoViableModel`] if no model qualifies.
    pub fn route_request(
        &self,
        budget_id: &str,
        estimated_input_tokens: u64,
    ) -> Result<String, CcpError> {
        let budgets = self.budgets.read().expect("budgets lock poisoned");
        let state = budgets
            .get(budget_id)
            .ok_or_else(|| CcpError::new(ErrorCode::BudgetNotFound, "budget not found")
                .with_context("budgetId", budget_id))?;

        let remaining = micro_to_usd(state.max_cost_micro.saturating_sub(
            state.current_cost_micro.load(Relaxed),
        ));

        let mut candidates = state.models.clone();
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        for model in candidates {
            let Some(price) = self.pricing.get(&model.model_id) else {
                continue;
            };
            let projected = (estimated_input_tokens as f64 / 1000.0) * price.input_token_cost;
            let sub_cap_ok = model.max_cost.is_none_or(|cap| projected <= cap);
            if projected <= remaining && sub_cap_ok {
                return Ok(model.model_id);
            }
        }

        Err(CcpError::new(
            ErrorCode::NoViableModel,
            "no registered model fits the remaining budget",
        )
        .with_context("budgetId", budget_id))
    }

    /// Pure function: the estimated cost of `input_tokens`/`output_tokens`
    /// against `model_id`'s registered price.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NoViableModel`] if `model_id` has no registered
    /// price.
    pub fn forecast_cost(
        &self,
        model_id: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Result<CostForecast, CcpError> {
        let price = self.pricing.get(model_id).ok_or_else(|| {
            CcpError::new(
                ErrorCode::NoViableModel,
                format!("no pricing registered for model {model_id}"),
            )
            .with_context("modelId", model_id)
        })?;
        let cost = price.cost(input_tokens, output_tokens);
        Ok(CostForecast {
            estimated_cost: cost,
            confidence: 0.95,
            breakdown: vec![ForecastLine {
                model_id: model_id.to_string(),
                tokens: input_tokens + output_tokens,
                cost,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_budget(max_cost: f64, alert_pct: f64) -> CostLedger {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        let mut budget = Budget::new("b1", max_cost, alert_pct);
        budget.models.push(ModelBudget {
            model_id: "cheap-v1".into(),
            priority: 1,
            max_cost: None,
        });
        budget.models.push(ModelBudget {
            model_id: "premium-v1".into(),
            priority: 10,
            max_cost: None,
        });
        ledger.register_budget(budget);
        ledger
    }

    fn usage(model_id: &str, input: u64, output: u64) -> UsageEvent {
        UsageEvent {
            model_id: model_id.into(),
            input_tokens: input,
            output_tokens: output,
            t: Utc::now(),
        }
    }

    #[test]
    fn price_cost_matches_hand_computation() {
        let price = Price {
            input_token_cost: 1.0,
            output_token_cost: 2.0,
        };
        assert_eq!(price.cost(1000, 500), 1.0 + 1.0);
    }

    #[test]
    fn track_usage_accumulates_against_governing_budgets() {
        let ledger = ledger_with_budget(100.0, 80.0);
        ledger.track_usage(&usage("cheap-v1", 1000, 0)).unwrap();
        let budget = ledger.get_budget("b1").unwrap();
        assert!((budget.current_cost - 0.25).abs() < 1e-9);
    }

    #[test]
    fn track_usage_ignores_non_governing_model() {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        ledger.register_budget(Budget::new("b1", 10.0, 80.0));
        let report = ledger.track_usage(&usage("cheap-v1", 1000, 0)).unwrap();
        assert!(report.alerts_fired.is_empty());
        assert!(report.breached.is_empty());
    }

    #[test]
    fn alert_fires_once_per_threshold_crossing() {
        let ledger = ledger_with_budget(10.0, 50.0);
        // 1000 input tokens @ $3/1000 = $3, well under 50% of $10.
        let r1 = ledger.track_usage(&usage("premium-v1", 1000, 0)).unwrap();
        assert!(r1.alerts_fired.is_empty());
        // Another $3 pushes total to $6, over the $5 alert line.
        let r2 = ledger.track_usage(&usage("premium-v1", 1000, 0)).unwrap();
        assert_eq!(r2.alerts_fired, vec!["b1".to_string()]);
        // A third call stays over the line but must not re-fire.
        let r3 = ledger.track_usage(&usage("premium-v1", 1000, 0)).unwrap();
        assert!(r3.alerts_fired.is_empty());
    }

    #[test]
    fn breach_raises_budget_exceeded_but_still_records_usage() {
        let ledger = ledger_with_budget(1.0, 80.0);
        let err = ledger
            .track_usage(&usage("premium-v1", 1000, 0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BudgetExceeded);
        let budget = ledger.get_budget("b1").unwrap();
        assert!(budget.current_cost >= budget.max_cost);
    }

    #[test]
    fn route_request_prefers_highest_priority_that_fits() {
        let ledger = ledger_with_budget(100.0, 80.0);
        let chosen = ledger.route_request("b1", 1000).unwrap();
        assert_eq!(chosen, "premium-v1");
    }

    #[test]
    fn route_request_falls_back_when_premium_does_not_fit() {
        let ledger = ledger_with_budget(2.0, 80.0);
        // Premium @ $3/1000 input tokens for 1000 tokens = $3 > $2 remaining.
        let chosen = ledger.route_request("b1", 1000).unwrap();
        assert_eq!(chosen, "cheap-v1");
    }

    #[test]
    fn route_request_respects_model_sub_cap() {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        let mut budget = Budget::new("b1", 100.0, 80.0);
        budget.models.push(ModelBudget {
            model_id: "premium-v1".into(),
            priority: 10,
            max_cost: Some(0.01),
        });
        budget.models.push(ModelBudget {
            model_id: "cheap-v1".into(),
            priority: 1,
            max_cost: None,
        });
        ledger.register_budget(budget);
        let chosen = ledger.route_request("b1", 1000).unwrap();
        assert_eq!(chosen, "cheap-v1");
    }

    #[test]
    fn route_request_no_viable_model_errors() {
        let ledger = ledger_with_budget(0.01, 80.0);
        let err = ledger.route_request("b1", 1_000_000).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoViableModel);
    }

    #[test]
    fn route_request_unknown_budget_errors() {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        let err = ledger.route_request("missing", 100).unwrap_err();
        assert_eq!(err.code, ErrorCode::BudgetNotFound);
    }

    #[test]
    fn forecast_cost_is_pure_and_has_fixed_confidence() {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        let forecast = ledger.forecast_cost("cheap-v1", 2000, 1000).unwrap();
        assert_eq!(forecast.confidence, 0.95);
        assert_eq!(forecast.breakdown.len(), 1);
        assert!((forecast.estimated_cost - (0.5 + 1.25)).abs() < 1e-9);
    }

    #[test]
    fn forecast_cost_unknown_model_errors() {
        let ledger = CostLedger::new(PricingTable::with_defaults());
        let err = ledger.forecast_cost("unknown", 1, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoViableModel);
    }
}
