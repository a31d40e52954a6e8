//! Reconciliation plans.
//!
//! A plan is the resolver's only output besides the new instance map: an
//! ordered list of identity decisions for an external commit layer.
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical actions and digests.
//! - **Single destroy**: every removed instance is destroyed exactly once.
//! - **No churn**: no instance is both created and destroyed in one plan.

pub mod digest;
pub mod model;
pub mod summary;

pub use digest::compute_plan_digest;
pub use model::{ActionKind, Diagnostic, PlanAction, PlanStats, ReconciliationPlan};
pub use summary::render_plan_summary;
