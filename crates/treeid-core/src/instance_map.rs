use std::collections::BTreeMap;

use crate::keep_alive::KeepAliveCache;
use crate::model::{Instance, InstanceId, LifecycleStage, Lineage, OpaqueState, Position, SlotName};

/// Every instance known to the resolver, indexed by id and by position
///
/// Live instances are bound to exactly one [`Position`]. Deactivated
/// instances are unbound and reachable only through the keep-alive cache of
/// their lineage. The map is owned by one pass at a time: `reconcile` takes it
/// by reference and returns a new one.
#[derive(Debug, Clone, Default)]
pub struct InstanceMap {
    instances: BTreeMap<InstanceId, Instance>,
    positions: BTreeMap<Position, InstanceId>,
    caches: BTreeMap<Lineage, KeepAliveCache>,
    next_id: u64,
    next_seq: u64,
}

impl InstanceMap {
    /// Create a new empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances, live and parked
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// The instance bound at `position`, if any
    pub fn at(&self, position: &Position) -> Option<&Instance> {
        self.positions
            .get(position)
            .and_then(|id| self.instances.get(id))
    }

    pub fn root(&self) -> Option<&Instance> {
        self.at(&Position::root())
    }

    /// Mutable access to an instance's host state. Identity fields stay
    /// resolver-owned.
    pub fn state_mut(&mut self, id: InstanceId) -> Option<&mut OpaqueState> {
        self.instances.get_mut(&id).map(Instance::state_mut)
    }

    /// Attach host state to an instance, replacing any previous handle
    pub fn attach_state(&mut self, id: InstanceId, state: OpaqueState) -> bool {
        match self.state_mut(id) {
            Some(slot) => {
                *slot = state;
                true
            }
            None => false,
        }
    }

    /// Ordered child instances of `id` in `slot`
    pub fn children_of(&self, id: InstanceId, slot: &SlotName) -> Vec<&Instance> {
        self.instances
            .get(&id)
            .map(|parent| {
                parent
                    .children(slot)
                    .iter()
                    .filter_map(|child| self.instances.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterate instances in id order
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    /// Instances currently in `stage`
    pub fn in_stage(&self, stage: LifecycleStage) -> impl Iterator<Item = &Instance> {
        self.instances
            .values()
            .filter(move |instance| instance.stage() == stage)
    }

    /// Keep-alive cache of a lineage, if anything was ever parked there
    pub fn cache(&self, lineage: &Lineage) -> Option<&KeepAliveCache> {
        self.caches.get(lineage)
    }

    /// Total number of parked branches across all lineages
    pub fn parked_len(&self) -> usize {
        self.caches.values().map(KeepAliveCache::len).sum()
    }

    /// Number of bound positions (equals the live instance count)
    pub fn bound_len(&self) -> usize {
        self.positions.len()
    }

    // ===== Resolver-internal mutation =====

    pub(crate) fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId::new(self.next_id)
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub(crate) fn insert(&mut self, instance: Instance) {
        self.instances.insert(instance.id(), instance);
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        let instance = self.instances.remove(&id)?;
        self.unbind(&instance.position(), id);
        Some(instance)
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(&id)
    }

    pub(crate) fn bind(&mut self, position: Position, id: InstanceId) {
        self.positions.insert(position, id);
    }

    /// Unbind `position` only if it still points at `id`
    pub(crate) fn unbind(&mut self, position: &Position, id: InstanceId) {
        if self.positions.get(position) == Some(&id) {
            self.positions.remove(position);
        }
    }

    pub(crate) fn bound_at(&self, position: &Position) -> Option<InstanceId> {
        self.positions.get(position).copied()
    }

    pub(crate) fn cache_mut(&mut self, lineage: &Lineage) -> Option<&mut KeepAliveCache> {
        self.caches.get_mut(lineage)
    }

    pub(crate) fn cache_entry(
        &mut self,
        lineage: Lineage,
        capacity: Option<usize>,
    ) -> &mut KeepAliveCache {
        self.caches
            .entry(lineage)
            .or_insert_with(|| KeepAliveCache::new(capacity))
    }

    /// Detach every cache owned by `owner`, in slot order
    pub(crate) fn take_caches_of(&mut self, owner: InstanceId) -> Vec<KeepAliveCache> {
        let lineages: Vec<Lineage> = self
            .caches
            .keys()
            .filter(|lineage| lineage.owner == owner)
            .cloned()
            .collect();
        lineages
            .iter()
            .filter_map(|lineage| self.caches.remove(lineage))
            .collect()
    }

    pub(crate) fn drop_empty_caches(&mut self) {
        self.caches.retain(|_, cache| !cache.is_empty());
    }
}
