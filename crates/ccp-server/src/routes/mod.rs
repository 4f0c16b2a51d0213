// SPDX-License-Identifier: MIT OR Apache-2.0
//! Route handlers, one module per surface-table group.

/// `/dte/apply`, `/dte/verify`.
pub mod dte;
/// `/evidence/events`, `/evidence/mission/:id`, `/evidence/export`.
pub mod evidence;
/// `/finops/forecast`, `/finops/budget`.
pub mod finops;
/// `/gateway/preflight`, `/gateway/route`.
pub mod gateway;
/// `/health`.
pub mod health;
/// `/missions`, `/missions/:id`, checkpoint approval, batches, rollback.
pub mod missions;
/// `/policies/models`.
pub mod policies;
