//! Identity tokens, slot names and tree positions.
//!
//! A position is the triple `(parent instance, slot, identity token)`. Two
//! nodes across renders correspond only when they land on the same position
//! and share a kind.

use crate::model::node::Key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an instance inside an [`InstanceMap`](crate::InstanceMap).
///
/// Ids are allocated monotonically by the map, never reused, so identical
/// inputs always allocate identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Name of a child list on a node.
///
/// Plain children lists live in the default slot. Named slots are siblings of
/// each other: keys never need to be unique across slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotName(String);

impl SlotName {
    /// Name of the slot holding a node's plain children list
    pub const DEFAULT: &'static str = "default";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }
}

impl Default for SlotName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl From<&str> for SlotName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The token a child is matched by among its siblings: its explicit key if
/// it has one, otherwise its index in the list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum IdentityToken {
    Key(Key),
    Index(usize),
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityToken::Key(key) => write!(f, "key:{}", key),
            IdentityToken::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// Where an instance sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub parent: Option<InstanceId>,
    pub slot: SlotName,
    pub token: IdentityToken,
}

impl Position {
    /// The single root position. The root is never keyed.
    pub fn root() -> Self {
        Self {
            parent: None,
            slot: SlotName::default(),
            token: IdentityToken::Index(0),
        }
    }

    pub fn child(parent: InstanceId, slot: SlotName, token: IdentityToken) -> Self {
        Self {
            parent: Some(parent),
            slot,
            token,
        }
    }
}

/// A child list or slot owned by one instance. Keep-alive caches are scoped
/// to a lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lineage {
    pub owner: InstanceId,
    pub slot: SlotName,
}

impl Lineage {
    pub fn new(owner: InstanceId, slot: SlotName) -> Self {
        Self { owner, slot }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.slot)
    }
}
