//! Persistent instances bound to nodes across renders.

use crate::model::node::NodeKind;
use crate::model::position::{IdentityToken, InstanceId, Position, SlotName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Lifecycle stage of an instance.
///
/// `Created → Live → (Deactivated → Live ...) → Destroyed`. Instances created
/// by a pass stay `Created` until the next pass reuses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Created,
    Live,
    Deactivated,
    Destroyed,
}

/// Host-owned state carried by an instance.
///
/// The resolver moves this handle around with its instance and never looks
/// inside it. Hosts attach widget state, device handles or subscriptions and
/// read them back with [`OpaqueState::downcast_ref`].
#[derive(Clone, Default)]
pub struct OpaqueState(Option<Arc<dyn Any + Send + Sync>>);

impl OpaqueState {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// True when both handles point at the same allocation
    pub fn same_as(&self, other: &OpaqueState) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for OpaqueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("OpaqueState(..)"),
            None => f.write_str("OpaqueState(empty)"),
        }
    }
}

/// The runtime object bound to a node's identity.
///
/// Identity fields (`kind`, `token`, `parent`, `slot`) are only changed by the
/// resolver. Hosts get read access plus mutable access to [`OpaqueState`]
/// through [`InstanceMap::state_mut`](crate::InstanceMap::state_mut).
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    kind: NodeKind,
    token: IdentityToken,
    parent: Option<InstanceId>,
    slot: SlotName,
    props: Value,
    stage: LifecycleStage,
    state: OpaqueState,
    children: BTreeMap<SlotName, Vec<InstanceId>>,
}

impl Instance {
    pub(crate) fn new(id: InstanceId, kind: NodeKind, props: Value, position: Position) -> Self {
        Self {
            id,
            kind,
            token: position.token,
            parent: position.parent,
            slot: position.slot,
            props,
            stage: LifecycleStage::Created,
            state: OpaqueState::empty(),
            children: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn token(&self) -> &IdentityToken {
        &self.token
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    pub fn props(&self) -> &Value {
        &self.props
    }

    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    pub fn state(&self) -> &OpaqueState {
        &self.state
    }

    pub fn position(&self) -> Position {
        Position {
            parent: self.parent,
            slot: self.slot.clone(),
            token: self.token.clone(),
        }
    }

    /// Ordered child instance ids of one slot
    pub fn children(&self, slot: &SlotName) -> &[InstanceId] {
        self.children.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Slots that currently hold children
    pub fn child_slots(&self) -> impl Iterator<Item = &SlotName> {
        self.children.keys()
    }

    /// Every child instance id, slot by slot in slot-name order
    pub fn all_children(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.children.values().flatten().copied()
    }

    pub(crate) fn state_mut(&mut self) -> &mut OpaqueState {
        &mut self.state
    }

    pub(crate) fn set_props(&mut self, props: Value) {
        self.props = props;
    }

    pub(crate) fn set_token(&mut self, token: IdentityToken) {
        self.token = token;
    }

    pub(crate) fn set_stage(&mut self, stage: LifecycleStage) {
        self.stage = stage;
    }

    pub(crate) fn set_children(&mut self, slot: SlotName, ids: Vec<InstanceId>) {
        if ids.is_empty() {
            self.children.remove(&slot);
        } else {
            self.children.insert(slot, ids);
        }
    }
}
