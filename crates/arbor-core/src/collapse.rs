//! Collapse State Manager.

use crate::hierarchy::{Hierarchy, NodeId, NodeState, Visibility};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Result of a [`toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Toggle {
    Expanded,
    Collapsed,
    /// Leaves have nothing to toggle.
    Ignored,
}

/// Collapses every node at `depth >= max_depth`, including nodes inside subtrees that are
/// already hidden, so expanding a boundary node reveals exactly one more level.
pub fn apply_max_depth(hierarchy: &mut Hierarchy, max_depth: usize) {
    let mut collapsed = 0usize;
    for id in hierarchy.all_descendants(hierarchy.root()) {
        let node = hierarchy.get_mut(id);
        if node.depth < max_depth {
            continue;
        }
        if let Visibility::Expanded(children) = &mut node.visibility {
            let children = std::mem::take(children);
            node.visibility = Visibility::Collapsed(children);
            collapsed += 1;
        }
    }
    tracing::debug!(max_depth, collapsed, "applied initial collapse depth");
}

/// Flips a node between expanded and collapsed. Leaves are left untouched.
pub fn toggle(hierarchy: &mut Hierarchy, id: NodeId) -> Result<Toggle> {
    let node = hierarchy.node_mut(id)?;
    let outcome = match node.visibility.flip() {
        NodeState::Leaf => Toggle::Ignored,
        NodeState::Expanded => Toggle::Expanded,
        NodeState::Collapsed => Toggle::Collapsed,
    };
    tracing::debug!(node = id.index(), ?outcome, "toggled node");
    Ok(outcome)
}

/// Expands every node in the hierarchy. Returns how many nodes changed state.
pub fn expand_all(hierarchy: &mut Hierarchy) -> usize {
    set_all(hierarchy, NodeState::Expanded, None)
}

/// Collapses every node except the root. Returns how many nodes changed state.
pub fn collapse_all(hierarchy: &mut Hierarchy) -> usize {
    let root = hierarchy.root();
    let mut changed = set_all(hierarchy, NodeState::Collapsed, Some(root));
    if hierarchy.get(root).is_collapsed() {
        hierarchy.get_mut(root).visibility.flip();
        changed += 1;
    }
    changed
}

fn set_all(hierarchy: &mut Hierarchy, target: NodeState, skip: Option<NodeId>) -> usize {
    let mut changed = 0usize;
    for id in hierarchy.all_descendants(hierarchy.root()) {
        if Some(id) == skip {
            continue;
        }
        let state = hierarchy.get(id).state();
        if state != NodeState::Leaf && state != target {
            hierarchy.get_mut(id).visibility.flip();
            changed += 1;
        }
    }
    changed
}
