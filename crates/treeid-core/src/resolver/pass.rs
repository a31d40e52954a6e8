//! One reconciliation pass over a working copy of the instance map.
//!
//! The walk is depth-first in next-tree order. Each child list is matched by
//! identity token against the instances recorded for the previous list;
//! leftovers are parked (retaining lineages) or destroyed.

use crate::errors::{ExErrorKind, ResolveError, Result};
use crate::instance_map::InstanceMap;
use crate::keep_alive::{Discriminator, ParkedEntry};
use crate::model::{
    IdentityToken, Instance, InstanceId, LifecycleStage, Lineage, Node, Position, SlotName,
};
use crate::plan::{Diagnostic, PlanAction, ReconciliationPlan};
use crate::policy::{Retention, RetentionPolicy};
use crate::resolver::tokens::assign_tokens;
use std::collections::{BTreeMap, BTreeSet};
use treeid_core_types::schema::{EVENT_AMBIGUOUS_KEY, EVENT_EVICTED};
use treeid_core_types::PassId;

/// Where a next node lands
#[derive(Debug, Clone)]
struct Placement {
    position: Position,
    index: usize,
    previous_index: Option<usize>,
}

/// Result of a completed pass
pub(crate) struct PassResult {
    pub instances: InstanceMap,
    pub plan: ReconciliationPlan,
    pub released: Vec<Instance>,
}

pub(crate) struct Pass<'a> {
    map: InstanceMap,
    policy: &'a dyn RetentionPolicy,
    plan: ReconciliationPlan,
    released: Vec<Instance>,
}

fn mismatch(instance: Option<InstanceId>, reason: impl Into<String>) -> ResolveError {
    ResolveError::InstanceMapMismatch {
        instance_id: instance.map(|id| id.get()),
        reason: reason.into(),
    }
}

impl<'a> Pass<'a> {
    /// `map` is consumed; callers hand in a clone so failures leave theirs intact.
    pub(crate) fn new(map: InstanceMap, policy: &'a dyn RetentionPolicy, pass_id: PassId) -> Self {
        Self {
            map,
            policy,
            plan: ReconciliationPlan::new(pass_id),
            released: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, previous: Option<&Node>, next: &Node) -> Result<PassResult> {
        let root = Placement {
            position: Position::root(),
            index: 0,
            previous_index: None,
        };

        match previous {
            Some(prev) => {
                let id = self.map.bound_at(&Position::root()).ok_or_else(|| {
                    mismatch(None, "previous tree given but no root instance is bound")
                })?;
                self.check_binding(id, prev)?;
                self.map.unbind(&Position::root(), id);
                let placement = Placement {
                    previous_index: Some(0),
                    ..root
                };
                if prev.kind == next.kind {
                    self.update(id, prev, next, placement)?;
                } else {
                    self.create(next, placement);
                    self.destroy(id);
                }
            }
            None => {
                if let Some(id) = self.map.bound_at(&Position::root()) {
                    return Err(mismatch(
                        Some(id),
                        "no previous tree given but a root instance is bound",
                    ));
                }
                self.create(next, root);
            }
        }

        self.map.drop_empty_caches();
        Ok(PassResult {
            instances: self.map,
            plan: self.plan,
            released: self.released,
        })
    }

    /// The instance recorded for a previous node must have that node's kind
    fn check_binding(&self, id: InstanceId, node: &Node) -> Result<()> {
        let instance = self
            .map
            .get(id)
            .ok_or_else(|| mismatch(Some(id), "bound instance is missing from the map"))?;
        if instance.kind() != &node.kind {
            return Err(mismatch(
                Some(id),
                format!(
                    "instance is {} but the previous tree has {}",
                    instance.kind(),
                    node.kind
                ),
            ));
        }
        Ok(())
    }

    /// Keep `id`, replace its props and reconcile its children
    ///
    /// A restored instance has no previous index and always records an update.
    /// A deactivated instance is activated here, so a restored branch only
    /// wakes the descendants the next tree still matches.
    fn update(
        &mut self,
        id: InstanceId,
        prev: &Node,
        next: &Node,
        placement: Placement,
    ) -> Result<InstanceId> {
        let props_changed = prev.props != next.props;
        let kind = {
            let instance = self
                .map
                .get_mut(id)
                .ok_or_else(|| mismatch(Some(id), "instance vanished during the pass"))?;
            instance.set_props(next.props.clone());
            instance.set_token(placement.position.token.clone());
            let activated = instance.stage() == LifecycleStage::Deactivated;
            if instance.stage() != LifecycleStage::Live {
                instance.set_stage(LifecycleStage::Live);
            }
            if activated {
                self.plan.actions.push(PlanAction::Activate {
                    instance: id,
                    kind: instance.kind().clone(),
                });
            }
            instance.kind().clone()
        };

        self.map.bind(placement.position.clone(), id);
        // Unchanged, unmoved matches produce no action
        let moved = placement.previous_index != Some(placement.index);
        if props_changed || moved {
            self.plan.actions.push(PlanAction::Update {
                instance: id,
                kind,
                parent: placement.position.parent,
                slot: placement.position.slot,
                token: placement.position.token,
                index: placement.index,
                previous_index: placement.previous_index,
                props_changed,
            });
        }

        self.reconcile_children(id, prev, next)?;
        Ok(id)
    }

    /// Bind a fresh instance for `node` and its whole subtree
    fn create(&mut self, node: &Node, placement: Placement) -> InstanceId {
        let id = self.map.allocate_id();
        self.map.insert(Instance::new(
            id,
            node.kind.clone(),
            node.props.clone(),
            placement.position.clone(),
        ));
        self.map.bind(placement.position.clone(), id);
        self.plan.actions.push(PlanAction::Create {
            instance: id,
            kind: node.kind.clone(),
            parent: placement.position.parent,
            slot: placement.position.slot,
            token: placement.position.token,
            index: placement.index,
        });

        for (slot, list) in node.children.by_slot() {
            let tokens = self.tokens_for(id, &slot, list);
            let mut ids = Vec::with_capacity(list.len());
            for (index, (child, token)) in list.iter().zip(tokens).enumerate() {
                let child_placement = Placement {
                    position: Position::child(id, slot.clone(), token),
                    index,
                    previous_index: None,
                };
                ids.push(self.create(child, child_placement));
            }
            if let Some(instance) = self.map.get_mut(id) {
                instance.set_children(slot, ids);
            }
        }

        id
    }

    fn reconcile_children(&mut self, owner: InstanceId, prev: &Node, next: &Node) -> Result<()> {
        let prev_lists = prev.children.by_slot();
        let next_lists = next.children.by_slot();

        let mut slots: BTreeSet<SlotName> = prev_lists
            .keys()
            .chain(next_lists.keys())
            .cloned()
            .collect();
        if let Some(instance) = self.map.get(owner) {
            slots.extend(instance.child_slots().cloned());
        }

        for slot in slots {
            let prev_list = prev_lists.get(&slot).copied().unwrap_or(&[]);
            let next_list = next_lists.get(&slot).copied().unwrap_or(&[]);
            let retention = self.policy.retention(next, &slot);
            let ids =
                self.reconcile_list(owner, &slot, prev_list, next_list, retention.as_ref())?;
            if let Some(instance) = self.map.get_mut(owner) {
                instance.set_children(slot, ids);
            }
        }

        Ok(())
    }

    fn reconcile_list(
        &mut self,
        owner: InstanceId,
        slot: &SlotName,
        prev_list: &[Node],
        next_list: &[Node],
        retention: Option<&Retention>,
    ) -> Result<Vec<InstanceId>> {
        let prev_ids: Vec<InstanceId> = self
            .map
            .get(owner)
            .map(|instance| instance.children(slot).to_vec())
            .unwrap_or_default();
        if prev_ids.len() != prev_list.len() {
            return Err(mismatch(
                Some(owner),
                format!(
                    "slot '{}' holds {} instances but the previous tree lists {} nodes",
                    slot,
                    prev_ids.len(),
                    prev_list.len()
                ),
            ));
        }

        let prev_tokens = assign_tokens(prev_list).tokens;
        let mut prev_by_token: BTreeMap<&IdentityToken, usize> = BTreeMap::new();
        for (j, (id, node)) in prev_ids.iter().zip(prev_list).enumerate() {
            self.check_binding(*id, node)?;
            let token = &prev_tokens[j];
            if self.map.get(*id).map(Instance::token) != Some(token) {
                return Err(mismatch(
                    Some(*id),
                    format!("instance token differs from previous token {}", token),
                ));
            }
            self.map
                .unbind(&Position::child(owner, slot.clone(), token.clone()), *id);
            prev_by_token.insert(token, j);
        }

        let next_tokens = self.tokens_for(owner, slot, next_list);
        let mut matched = vec![false; prev_list.len()];
        let mut ids = Vec::with_capacity(next_list.len());

        for (index, (child, token)) in next_list.iter().zip(next_tokens).enumerate() {
            let placement = Placement {
                position: Position::child(owner, slot.clone(), token.clone()),
                index,
                previous_index: None,
            };

            let id = match prev_by_token.get(&token).copied() {
                Some(j) => {
                    let (prev_node, prev_id) = (&prev_list[j], prev_ids[j]);
                    if prev_node.kind == child.kind {
                        matched[j] = true;
                        let placement = Placement {
                            previous_index: Some(j),
                            ..placement
                        };
                        self.update(prev_id, prev_node, child, placement)?
                    } else if let Some(retention) = retention {
                        // The previous child is parked with the leftovers below
                        self.restore_or_create(owner, slot, child, placement, retention)?
                    } else {
                        matched[j] = true;
                        let id = self.create(child, placement);
                        self.destroy(prev_id);
                        id
                    }
                }
                None => match retention {
                    Some(retention) => {
                        self.restore_or_create(owner, slot, child, placement, retention)?
                    }
                    None => self.create(child, placement),
                },
            };
            ids.push(id);
        }

        for (j, was_matched) in matched.into_iter().enumerate() {
            if was_matched {
                continue;
            }
            match retention {
                Some(retention) => self.park(owner, slot, prev_ids[j], &prev_list[j], retention),
                None => self.destroy(prev_ids[j]),
            }
        }

        Ok(ids)
    }

    /// Reactivate a parked branch matching `node`, or create a fresh one
    fn restore_or_create(
        &mut self,
        owner: InstanceId,
        slot: &SlotName,
        node: &Node,
        placement: Placement,
        retention: &Retention,
    ) -> Result<InstanceId> {
        if retention.caches(&node.kind) {
            let lineage = Lineage::new(owner, slot.clone());
            let discriminator = Discriminator::of(node);
            let parked = self
                .map
                .cache_mut(&lineage)
                .and_then(|cache| cache.take(&discriminator));

            if let Some(entry) = parked {
                if entry.node.kind == node.kind {
                    let placement = Placement {
                        previous_index: None,
                        ..placement
                    };
                    return self.update(entry.instance, &entry.node, node, placement);
                }
                // Same key, different kind: the parked branch is stale
                self.destroy(entry.instance);
            }
        }

        Ok(self.create(node, placement))
    }

    /// Move a branch leaving a retaining list into its lineage's cache
    fn park(
        &mut self,
        owner: InstanceId,
        slot: &SlotName,
        id: InstanceId,
        node: &Node,
        retention: &Retention,
    ) {
        if !retention.caches(&node.kind) {
            self.destroy(id);
            return;
        }

        self.deactivate_subtree(id);
        let seq = self.map.next_seq();
        let lineage = Lineage::new(owner, slot.clone());

        let cache = self.map.cache_entry(lineage, retention.max_entries);
        let mut evicted = cache.set_capacity(retention.max_entries);
        let displaced = cache.park(
            Discriminator::of(node),
            ParkedEntry {
                instance: id,
                node: node.clone(),
                seq,
            },
        );
        evicted.extend(displaced.evicted);

        if let Some(replaced) = displaced.replaced {
            self.destroy(replaced.instance);
        }

        for entry in evicted {
            tracing::info!(
                component = module_path!(),
                op = "reconcile",
                event = EVENT_EVICTED,
                pass_id = %self.plan.pass_id,
                instance_id = entry.instance.get(),
                parent_id = owner.get(),
                slot = %slot,
                err.code = ExErrorKind::EvictionUnderPressure.code(),
                "keep-alive cache full; evicting oldest entry"
            );
            self.plan.diagnostics.push(Diagnostic::Evicted {
                owner,
                slot: slot.clone(),
                instance: entry.instance,
            });
            self.destroy(entry.instance);
        }
    }

    /// Deactivate a subtree in pre-order, one action per instance.
    ///
    /// Parked instances hold no position; `update` rebinds them on restore.
    /// Instances already deactivated, such as unmatched children of a restored
    /// branch, are parked as they are.
    fn deactivate_subtree(&mut self, id: InstanceId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(instance) = self.map.get_mut(current) else {
                continue;
            };
            if instance.stage() == LifecycleStage::Deactivated {
                continue;
            }
            instance.set_stage(LifecycleStage::Deactivated);
            let kind = instance.kind().clone();
            let position = instance.position();
            let children: Vec<InstanceId> = instance.all_children().collect();

            self.map.unbind(&position, current);
            self.plan.actions.push(PlanAction::Deactivate {
                instance: current,
                kind,
            });
            stack.extend(children.into_iter().rev());
        }
    }

    /// Destroy `id`, its live subtree and every branch parked beneath it
    fn destroy(&mut self, id: InstanceId) {
        let Some(mut instance) = self.map.remove(id) else {
            return;
        };
        let children: Vec<InstanceId> = instance.all_children().collect();
        self.plan.actions.push(PlanAction::Destroy {
            instance: id,
            kind: instance.kind().clone(),
        });
        instance.set_stage(LifecycleStage::Destroyed);
        self.released.push(instance);

        for child in children {
            self.destroy(child);
        }
        for mut cache in self.map.take_caches_of(id) {
            for entry in cache.drain() {
                self.destroy(entry.instance);
            }
        }
    }

    /// Tokens for a next-tree list; duplicate keys become diagnostics
    fn tokens_for(
        &mut self,
        owner: InstanceId,
        slot: &SlotName,
        list: &[Node],
    ) -> Vec<IdentityToken> {
        let assigned = assign_tokens(list);
        for duplicate in assigned.duplicates {
            tracing::warn!(
                component = module_path!(),
                op = "reconcile",
                event = EVENT_AMBIGUOUS_KEY,
                pass_id = %self.plan.pass_id,
                parent_id = owner.get(),
                slot = %slot,
                key = %duplicate.key,
                first_index = duplicate.first_index,
                duplicate_index = duplicate.duplicate_index,
                err.code = ExErrorKind::AmbiguousKey.code(),
                "duplicate sibling key; later occurrence matched by index"
            );
            self.plan.diagnostics.push(Diagnostic::AmbiguousKey {
                parent: owner,
                slot: slot.clone(),
                key: duplicate.key,
                first_index: duplicate.first_index,
                duplicate_index: duplicate.duplicate_index,
            });
        }
        assigned.tokens
    }
}
