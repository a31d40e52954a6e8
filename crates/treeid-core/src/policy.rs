//! Retention policy trait and implementations
//!
//! A `RetentionPolicy` decides which lineages keep deactivated branches
//! alive instead of destroying them. It is consulted once per child list per
//! pass with the owning node and the slot being reconciled.

use crate::config::KeepAliveConfig;
use crate::model::{Node, NodeKind, SlotName};
use std::collections::BTreeSet;

/// Retention settings for one lineage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retention {
    /// Cache bound; `None` is unbounded
    pub max_entries: Option<usize>,
    /// When non-empty, only these kind names are cached
    pub include: BTreeSet<String>,
    /// These kind names are never cached
    pub exclude: BTreeSet<String>,
}

impl Retention {
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether a branch of `kind` may be parked in this lineage
    pub fn caches(&self, kind: &NodeKind) -> bool {
        let name = kind.name();
        if self.exclude.contains(name) {
            return false;
        }
        self.include.is_empty() || self.include.contains(name)
    }
}

/// Policy trait for deciding which lineages retain
pub trait RetentionPolicy {
    /// Retention for the child list `slot` of `owner`, or `None` when
    /// branches leaving that list are destroyed outright.
    fn retention(&self, owner: &Node, slot: &SlotName) -> Option<Retention>;
}

/// Policy that never retains
///
/// # Example
/// ```
/// use treeid_core::model::{Node, SlotName};
/// use treeid_core::policy::{NoRetention, RetentionPolicy};
///
/// let owner = Node::intrinsic("div");
/// assert!(NoRetention.retention(&owner, &SlotName::default()).is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetention;

impl RetentionPolicy for NoRetention {
    fn retention(&self, _owner: &Node, _slot: &SlotName) -> Option<Retention> {
        None
    }
}

/// Policy that retains every slot of selected component blueprints
///
/// # Example
/// ```
/// use treeid_core::model::{Blueprint, Node, SlotName};
/// use treeid_core::policy::{RetainComponents, RetentionPolicy};
///
/// let policy = RetainComponents::new(["KeepAlive"]).with_max_entries(2);
/// let owner = Node::component(Blueprint::new("KeepAlive"));
/// let retention = policy.retention(&owner, &SlotName::default()).unwrap();
/// assert_eq!(retention.max_entries, Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetainComponents {
    components: BTreeSet<String>,
    template: Retention,
}

impl RetainComponents {
    pub fn new<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            template: Retention::default(),
        }
    }

    pub fn from_config(config: &KeepAliveConfig) -> Self {
        Self {
            components: config.components.iter().cloned().collect(),
            template: Retention {
                max_entries: config.max_entries,
                include: config.include.iter().cloned().collect(),
                exclude: config.exclude.iter().cloned().collect(),
            },
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.template.max_entries = Some(max_entries);
        self
    }

    pub fn with_exclude(mut self, name: impl Into<String>) -> Self {
        self.template.exclude.insert(name.into());
        self
    }

    pub fn with_include(mut self, name: impl Into<String>) -> Self {
        self.template.include.insert(name.into());
        self
    }
}

impl RetentionPolicy for RetainComponents {
    fn retention(&self, owner: &Node, _slot: &SlotName) -> Option<Retention> {
        match &owner.kind {
            NodeKind::Component(blueprint) if self.components.contains(blueprint.name()) => {
                Some(self.template.clone())
            }
            _ => None,
        }
    }
}
