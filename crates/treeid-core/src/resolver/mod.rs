//! Tree identity resolver
//!
//! [`reconcile`] compares a previous and a next declarative tree, decides
//! which existing instance each next node continues, and returns the updated
//! instance map together with a [`ReconciliationPlan`] describing every
//! decision. A pass either completes or fails with no effect: the caller's
//! map is never mutated.
//!
//! [`Resolver`] bundles a validated configuration with a retention policy,
//! and [`Session`] threads the previous tree and map from one pass to the
//! next for hosts that render repeatedly.

mod pass;
pub mod session;
pub mod tokens;
pub mod validation;

pub use session::{Rendered, Session};
pub use validation::validate_tree;

use crate::config::ResolverConfig;
use crate::errors::{ExError, Result};
use crate::instance_map::InstanceMap;
use crate::model::{Instance, Node};
use crate::plan::ReconciliationPlan;
use crate::policy::{NoRetention, RetainComponents, RetentionPolicy};
use crate::{log_op_end, log_op_error, log_op_start};
use pass::Pass;
use std::time::Instant;
use treeid_core_types::PassId;

/// Everything a successful pass produces.
#[derive(Debug)]
pub struct PassOutput {
    /// The map after the pass; replaces the one handed in
    pub instances: InstanceMap,
    pub plan: ReconciliationPlan,
    /// Instances destroyed by this pass, stage `Destroyed`, with their state
    /// still attached so the host can dispose of it
    pub released: Vec<Instance>,
}

impl PassOutput {
    pub fn into_parts(self) -> (InstanceMap, ReconciliationPlan) {
        (self.instances, self.plan)
    }
}

/// Reconcile `next` against `previous`
///
/// `previous` is `None` for the first render, in which case `instances` must
/// be empty of bound instances. Otherwise `instances` must be the map
/// returned by the pass that rendered `previous`.
///
/// # Errors
///
/// - `InvalidConfig` - `config` fails validation
/// - `UndeclaredSlot`, `SlotsOnNonComponent`, `DepthExceeded` - either tree
///   breaks a structural rule
/// - `InstanceMapMismatch` - `instances` does not describe `previous`
///
/// On error `instances` is untouched and no plan is produced.
pub fn reconcile(
    previous: Option<&Node>,
    next: &Node,
    instances: &InstanceMap,
    policy: &dyn RetentionPolicy,
    config: &ResolverConfig,
) -> Result<PassOutput> {
    let pass_id = PassId::new();
    let start = Instant::now();
    log_op_start!(
        "reconcile",
        pass_id = pass_id.as_str(),
        nodes = next.subtree_len()
    );

    let result = run_pass(previous, next, instances, policy, config, pass_id.clone());
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(output) => {
            let stats = output.plan.stats();
            log_op_end!(
                "reconcile",
                duration_ms = duration_ms,
                pass_id = pass_id.as_str(),
                created = stats.created,
                updated = stats.updated,
                destroyed = stats.destroyed,
                activated = stats.activated,
                deactivated = stats.deactivated,
                diagnostics = output.plan.diagnostics.len()
            );
        }
        Err(err) => {
            let ex_err = ExError::from(err.clone()).with_pass_id(pass_id);
            log_op_error!("reconcile", ex_err, duration_ms = duration_ms);
        }
    }

    result
}

fn run_pass(
    previous: Option<&Node>,
    next: &Node,
    instances: &InstanceMap,
    policy: &dyn RetentionPolicy,
    config: &ResolverConfig,
    pass_id: PassId,
) -> Result<PassOutput> {
    config.validate()?;
    if let Some(prev) = previous {
        validate_tree(prev, config.max_depth)?;
    }
    validate_tree(next, config.max_depth)?;

    let result = Pass::new(instances.clone(), policy, pass_id).run(previous, next)?;
    Ok(PassOutput {
        instances: result.instances,
        plan: result.plan,
        released: result.released,
    })
}

/// A validated configuration paired with a retention policy.
///
/// # Example
///
/// ```
/// use treeid_core::config::ResolverConfig;
/// use treeid_core::model::Node;
/// use treeid_core::{InstanceMap, Resolver};
///
/// let resolver = Resolver::new(ResolverConfig::default()).unwrap();
/// let tree = Node::intrinsic("div").with_children(vec![Node::text("hi")]);
/// let output = resolver.reconcile(None, &tree, &InstanceMap::new()).unwrap();
/// assert_eq!(output.plan.stats().created, 2);
/// ```
pub struct Resolver {
    config: ResolverConfig,
    policy: Box<dyn RetentionPolicy + Send + Sync>,
}

impl Resolver {
    /// Build a resolver whose policy comes from `config.keep_alive`
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let policy = RetainComponents::from_config(&config.keep_alive);
        Ok(Self {
            config,
            policy: Box::new(policy),
        })
    }

    /// Build a resolver with a caller-supplied policy
    pub fn with_policy<P>(config: ResolverConfig, policy: P) -> Result<Self>
    where
        P: RetentionPolicy + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            policy: Box::new(policy),
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn policy(&self) -> &dyn RetentionPolicy {
        self.policy.as_ref()
    }

    pub fn reconcile(
        &self,
        previous: Option<&Node>,
        next: &Node,
        instances: &InstanceMap,
    ) -> Result<PassOutput> {
        reconcile(previous, next, instances, self.policy(), &self.config)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            config: ResolverConfig::default(),
            policy: Box::new(NoRetention),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
