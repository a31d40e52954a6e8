//! Digest computation for reconciliation plans.
//!
//! The digest covers actions and diagnostics but not the pass id, so two
//! passes over identical inputs produce identical digests.

use crate::errors::Result;
use crate::plan::model::ReconciliationPlan;
use sha2::{Digest, Sha256};

/// Compute the SHA256 digest of a plan's decisions.
///
/// ## Errors
///
/// Returns `ResolveError::Serialization` if JSON serialization fails.
///
/// ## Example
///
/// ```
/// use treeid_core::plan::{digest::compute_plan_digest, ReconciliationPlan};
/// use treeid_core_types::PassId;
///
/// let a = ReconciliationPlan::new(PassId::new());
/// let b = ReconciliationPlan::new(PassId::new());
/// assert_eq!(compute_plan_digest(&a).unwrap(), compute_plan_digest(&b).unwrap());
/// ```
pub fn compute_plan_digest(plan: &ReconciliationPlan) -> Result<String> {
    let canonical = serde_json::to_string(&(&plan.actions, &plan.diagnostics))?;
    Ok(hash_string(&canonical))
}

fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

impl ReconciliationPlan {
    /// See [`compute_plan_digest`]
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Serialization` if JSON serialization fails.
    pub fn digest(&self) -> Result<String> {
        compute_plan_digest(self)
    }
}
