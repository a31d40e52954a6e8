//! Structural checks run before a pass touches the instance map.

use crate::errors::{ResolveError, Result};
use crate::model::{Children, Node, NodeKind};

/// Validate a tree against caller contract rules
///
/// Checks that named slots only appear on components, that every named slot
/// is declared by the component's blueprint, and that nesting stays within
/// `max_depth`. Walks iteratively, so input of any depth is refused before
/// the recursive pass sees it.
///
/// # Errors
///
/// - `SlotsOnNonComponent` - named slots on an intrinsic, fragment or text node
/// - `UndeclaredSlot` - a component fills a slot its blueprint lacks
/// - `DepthExceeded` - the tree nests deeper than `max_depth`
pub fn validate_tree(root: &Node, max_depth: usize) -> Result<()> {
    let mut stack: Vec<(&Node, usize)> = vec![(root, 1)];

    while let Some((node, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(ResolveError::DepthExceeded { max_depth });
        }

        if let Children::Slots(slots) = &node.children {
            match &node.kind {
                NodeKind::Component(blueprint) => {
                    if let Some(slot) = slots.keys().find(|slot| !blueprint.declares_slot(slot)) {
                        return Err(ResolveError::UndeclaredSlot {
                            blueprint: blueprint.name().to_string(),
                            slot: slot.to_string(),
                        });
                    }
                }
                other => {
                    // A slots map holding only the default slot is a plain list
                    if slots.keys().any(|slot| !slot.is_default()) {
                        return Err(ResolveError::SlotsOnNonComponent {
                            kind: other.to_string(),
                        });
                    }
                }
            }
        }

        stack.extend(node.children.iter().map(|child| (child, depth + 1)));
    }

    Ok(())
}
