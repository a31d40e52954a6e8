//! Reconciliation plan types.
//!
//! Actions are recorded in pass order: depth-first, parent before children,
//! and within one child list next-tree order followed by removals.

use crate::model::{IdentityToken, InstanceId, Key, NodeKind, SlotName};
use serde::{Deserialize, Serialize};
use treeid_core_types::PassId;

/// One decision for the commit layer to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// No previous instance corresponded; a fresh one was bound
    Create {
        instance: InstanceId,
        kind: NodeKind,
        parent: Option<InstanceId>,
        slot: SlotName,
        token: IdentityToken,
        index: usize,
    },
    /// Kept instance whose props changed, that moved, or that was restored
    Update {
        instance: InstanceId,
        kind: NodeKind,
        parent: Option<InstanceId>,
        slot: SlotName,
        token: IdentityToken,
        index: usize,
        /// Index in the previous list; `None` when restored from keep-alive
        previous_index: Option<usize>,
        props_changed: bool,
    },
    /// Instance has no counterpart in the next tree
    Destroy {
        instance: InstanceId,
        kind: NodeKind,
    },
    /// Parked instance returned to the live tree
    Activate {
        instance: InstanceId,
        kind: NodeKind,
    },
    /// Instance parked in a keep-alive cache with its state intact
    Deactivate {
        instance: InstanceId,
        kind: NodeKind,
    },
}

/// Discriminant of [`PlanAction`], for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Update,
    Destroy,
    Activate,
    Deactivate,
}

impl PlanAction {
    pub fn instance(&self) -> InstanceId {
        match self {
            PlanAction::Create { instance, .. }
            | PlanAction::Update { instance, .. }
            | PlanAction::Destroy { instance, .. }
            | PlanAction::Activate { instance, .. }
            | PlanAction::Deactivate { instance, .. } => *instance,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        match self {
            PlanAction::Create { kind, .. }
            | PlanAction::Update { kind, .. }
            | PlanAction::Destroy { kind, .. }
            | PlanAction::Activate { kind, .. }
            | PlanAction::Deactivate { kind, .. } => kind,
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self {
            PlanAction::Create { .. } => ActionKind::Create,
            PlanAction::Update { .. } => ActionKind::Update,
            PlanAction::Destroy { .. } => ActionKind::Destroy,
            PlanAction::Activate { .. } => ActionKind::Activate,
            PlanAction::Deactivate { .. } => ActionKind::Deactivate,
        }
    }

    /// An update whose index differs from its previous index
    pub fn is_move(&self) -> bool {
        matches!(
            self,
            PlanAction::Update { index, previous_index: Some(previous), .. } if index != previous
        )
    }
}

/// Recovered anomalies found during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Two siblings shared an explicit key; the later one was matched by index
    AmbiguousKey {
        parent: InstanceId,
        slot: SlotName,
        key: Key,
        first_index: usize,
        duplicate_index: usize,
    },
    /// A keep-alive cache overflowed and destroyed its oldest entry
    Evicted {
        owner: InstanceId,
        slot: SlotName,
        instance: InstanceId,
    },
}

/// Action counts for a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub destroyed: usize,
    pub activated: usize,
    pub deactivated: usize,
}

impl PlanStats {
    pub fn is_noop_structure(&self) -> bool {
        self.created == 0
            && self.destroyed == 0
            && self.activated == 0
            && self.deactivated == 0
            && self.moved == 0
    }
}

/// Ordered record of every identity decision made by one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    pub pass_id: PassId,
    pub actions: Vec<PlanAction>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReconciliationPlan {
    pub fn new(pass_id: PassId) -> Self {
        Self {
            pass_id,
            actions: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn stats(&self) -> PlanStats {
        let mut stats = PlanStats::default();
        for action in &self.actions {
            match action.action_kind() {
                ActionKind::Create => stats.created += 1,
                ActionKind::Update => {
                    stats.updated += 1;
                    if action.is_move() {
                        stats.moved += 1;
                    }
                }
                ActionKind::Destroy => stats.destroyed += 1,
                ActionKind::Activate => stats.activated += 1,
                ActionKind::Deactivate => stats.deactivated += 1,
            }
        }
        stats
    }

    /// Actions of one kind, in plan order
    pub fn actions_of(&self, kind: ActionKind) -> impl Iterator<Item = &PlanAction> {
        self.actions
            .iter()
            .filter(move |action| action.action_kind() == kind)
    }

    /// Ids touched by actions of one kind, in plan order
    pub fn ids_of(&self, kind: ActionKind) -> Vec<InstanceId> {
        self.actions_of(kind).map(PlanAction::instance).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
