//! Stateful driver for hosts that render repeatedly.

use crate::errors::Result;
use crate::instance_map::InstanceMap;
use crate::model::{Instance, InstanceId, LifecycleStage, Node, OpaqueState};
use crate::plan::ReconciliationPlan;
use crate::resolver::Resolver;

/// What one [`Session::render`] call hands back
#[derive(Debug)]
pub struct Rendered {
    pub plan: ReconciliationPlan,
    pub released: Vec<Instance>,
}

/// Holds the last committed tree and instance map between passes.
///
/// `render` takes `&mut self`, so passes over one session are serialized.
/// A failed pass leaves the session exactly as it was.
///
/// ```
/// use treeid_core::model::Node;
/// use treeid_core::{Resolver, Session};
///
/// let mut session = Session::new(Resolver::default());
/// session.render(Node::intrinsic("div")).unwrap();
/// let rendered = session.render(Node::intrinsic("div")).unwrap();
/// assert_eq!(rendered.plan.stats().created, 0);
/// ```
#[derive(Debug)]
pub struct Session {
    resolver: Resolver,
    previous: Option<Node>,
    instances: InstanceMap,
}

impl Session {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            previous: None,
            instances: InstanceMap::new(),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn instances(&self) -> &InstanceMap {
        &self.instances
    }

    /// The tree the current map describes
    pub fn current(&self) -> Option<&Node> {
        self.previous.as_ref()
    }

    /// Attach host state to a live or parked instance
    pub fn attach_state(&mut self, id: InstanceId, state: OpaqueState) -> bool {
        self.instances.attach_state(id, state)
    }

    /// Reconcile `next` against the current tree and commit the result
    pub fn render(&mut self, next: Node) -> Result<Rendered> {
        let output = self
            .resolver
            .reconcile(self.previous.as_ref(), &next, &self.instances)?;
        self.instances = output.instances;
        self.previous = Some(next);
        Ok(Rendered {
            plan: output.plan,
            released: output.released,
        })
    }

    /// Drop the current tree and every instance, live and parked
    ///
    /// Returns the instances in id order with stage `Destroyed`.
    pub fn unmount(&mut self) -> Vec<Instance> {
        self.previous = None;
        let instances = std::mem::take(&mut self.instances);
        let mut released: Vec<Instance> = instances.iter().cloned().collect();
        for instance in &mut released {
            instance.set_stage(LifecycleStage::Destroyed);
        }
        released
    }
}
