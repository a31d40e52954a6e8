//! Declarative node model.
//!
//! A [`Node`] is what a render step produces: an immutable description of
//! one tree position. Nodes are plain data and can be loaded from JSON.

use crate::model::position::SlotName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Explicit identity token supplied by the render step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{}", value),
            Key::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

/// The defining blueprint of a component.
///
/// Two component nodes are the same kind iff their blueprints are equal.
/// The declared slot set is part of the blueprint: named slots not listed
/// here are rejected. The default slot is always available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Blueprint {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    slots: BTreeSet<SlotName>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: BTreeSet::new(),
        }
    }

    /// Declare a named slot
    pub fn with_slot(mut self, slot: impl Into<SlotName>) -> Self {
        self.slots.insert(slot.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &BTreeSet<SlotName> {
        &self.slots
    }

    pub fn declares_slot(&self, slot: &SlotName) -> bool {
        slot.is_default() || self.slots.contains(slot)
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NodeKind {
    /// Built-in primitive identified by its tag
    Intrinsic(String),
    /// Reference to a component blueprint
    Component(Blueprint),
    /// Grouping node; always matches another fragment
    Fragment,
    /// Text leaf; always matches another text leaf, content lives in props
    Text,
}

impl NodeKind {
    /// Name used for retention filters: the tag or the blueprint name.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Intrinsic(tag) => tag,
            NodeKind::Component(blueprint) => blueprint.name(),
            NodeKind::Fragment => "#fragment",
            NodeKind::Text => "#text",
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self, NodeKind::Component(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Component(blueprint) => write!(f, "<{}>", blueprint.name()),
            other => f.write_str(other.name()),
        }
    }
}

/// Children of a node: a plain ordered list, or named slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Children {
    List(Vec<Node>),
    Slots(BTreeMap<SlotName, Vec<Node>>),
}

impl Default for Children {
    fn default() -> Self {
        Children::List(Vec::new())
    }
}

impl Children {
    /// Every child list keyed by slot. A plain list is the default slot.
    pub fn by_slot(&self) -> BTreeMap<SlotName, &[Node]> {
        match self {
            Children::List(nodes) => {
                let mut lists = BTreeMap::new();
                if !nodes.is_empty() {
                    lists.insert(SlotName::default(), nodes.as_slice());
                }
                lists
            }
            Children::Slots(slots) => slots
                .iter()
                .map(|(slot, nodes)| (slot.clone(), nodes.as_slice()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Children::List(nodes) => nodes.is_empty(),
            Children::Slots(slots) => slots.values().all(Vec::is_empty),
        }
    }

    /// Iterate every child node across all slots
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match self {
            Children::List(nodes) => Box::new(nodes.iter()),
            Children::Slots(slots) => Box::new(slots.values().flatten()),
        }
    }
}

/// An immutable declaration of one tree position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default)]
    pub props: Value,
    #[serde(default)]
    pub children: Children,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            key: None,
            props: Value::Null,
            children: Children::default(),
        }
    }

    pub fn intrinsic(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Intrinsic(tag.into()))
    }

    pub fn component(blueprint: Blueprint) -> Self {
        Self::new(NodeKind::Component(blueprint))
    }

    pub fn fragment(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Fragment).with_children(children)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).with_props(Value::String(content.into()))
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = Children::List(children);
        self
    }

    /// Add children under a named slot, switching the node to slotted
    /// children. An existing plain list moves into the default slot.
    pub fn with_slot(mut self, slot: impl Into<SlotName>, children: Vec<Node>) -> Self {
        let mut slots = match std::mem::take(&mut self.children) {
            Children::List(nodes) if nodes.is_empty() => BTreeMap::new(),
            Children::List(nodes) => BTreeMap::from([(SlotName::default(), nodes)]),
            Children::Slots(slots) => slots,
        };
        slots.insert(slot.into(), children);
        self.children = Children::Slots(slots);
        self
    }

    /// Count of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        let mut len = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            len += 1;
            stack.extend(node.children.iter());
        }
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_kinds_always_equal() {
        assert_eq!(Node::text("a").kind, Node::text("b").kind);
    }

    #[test]
    fn test_blueprint_identity_includes_name() {
        assert_ne!(
            NodeKind::Component(Blueprint::new("Tab")),
            NodeKind::Component(Blueprint::new("Panel"))
        );
    }

    #[test]
    fn test_default_slot_always_declared() {
        let blueprint = Blueprint::new("Card").with_slot("header");
        assert!(blueprint.declares_slot(&SlotName::default()));
        assert!(blueprint.declares_slot(&SlotName::from("header")));
        assert!(!blueprint.declares_slot(&SlotName::from("footer")));
    }

    #[test]
    fn test_with_slot_moves_plain_children_to_default() {
        let node = Node::component(Blueprint::new("Card").with_slot("header"))
            .with_children(vec![Node::intrinsic("p")])
            .with_slot("header", vec![Node::intrinsic("h1")]);

        let lists = node.children.by_slot();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[&SlotName::default()].len(), 1);
        assert_eq!(lists[&SlotName::from("header")].len(), 1);
    }

    #[test]
    fn test_subtree_len() {
        let tree = Node::intrinsic("div").with_children(vec![
            Node::intrinsic("ul").with_children(vec![Node::intrinsic("li"), Node::intrinsic("li")]),
            Node::text("hi"),
        ]);
        assert_eq!(tree.subtree_len(), 5);
    }

    #[test]
    fn test_node_from_json() {
        let node: Node = serde_json::from_value(json!({
            "kind": {"type": "intrinsic", "value": "div"},
            "children": {"list": [
                {"kind": {"type": "text"}, "props": "hello"},
                {"kind": {"type": "intrinsic", "value": "input"}, "key": 7}
            ]}
        }))
        .unwrap();

        assert_eq!(node.kind, NodeKind::Intrinsic("div".to_string()));
        let lists = node.children.by_slot();
        let children = lists[&SlotName::default()];
        assert_eq!(children[0].props, json!("hello"));
        assert_eq!(children[1].key, Some(Key::Int(7)));
    }
}
