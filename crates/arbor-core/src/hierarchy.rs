//! Hierarchy Builder.
//!
//! The hierarchy is an arena: nodes own their children through [`NodeId`] lists stored in
//! [`Visibility`], and `parent` is a plain back-reference used only for navigation.

use crate::datum::TreeDatum;
use crate::ids::RenderId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a node inside its [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Expand/collapse slot of a node. A node's children live in exactly one variant, which
/// makes the "only one of `children`/`_children`" rule structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Leaf,
    Expanded(Vec<NodeId>),
    Collapsed(Vec<NodeId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeState {
    Leaf,
    Expanded,
    Collapsed,
}

impl Visibility {
    pub fn state(&self) -> NodeState {
        match self {
            Self::Leaf => NodeState::Leaf,
            Self::Expanded(_) => NodeState::Expanded,
            Self::Collapsed(_) => NodeState::Collapsed,
        }
    }

    /// Swaps expanded and collapsed in place and returns the new state. Leaves stay leaves.
    pub(crate) fn flip(&mut self) -> NodeState {
        *self = match std::mem::replace(self, Self::Leaf) {
            Self::Leaf => Self::Leaf,
            Self::Expanded(c) => Self::Collapsed(c),
            Self::Collapsed(c) => Self::Expanded(c),
        };
        self.state()
    }

    /// Visible children (`children` in d3 terms).
    pub fn children(&self) -> Option<&[NodeId]> {
        match self {
            Self::Expanded(c) => Some(c),
            _ => None,
        }
    }

    /// Hidden children (`_children` in d3 terms).
    pub fn collapsed_children(&self) -> Option<&[NodeId]> {
        match self {
            Self::Collapsed(c) => Some(c),
            _ => None,
        }
    }

    pub fn all_children(&self) -> &[NodeId] {
        match self {
            Self::Leaf => &[],
            Self::Expanded(c) | Self::Collapsed(c) => c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub data: Arc<TreeDatum>,
    pub depth: usize,
    pub height: usize,
    pub parent: Option<NodeId>,
    pub visibility: Visibility,
    /// Join key, assigned the first time the node is laid out.
    pub render_id: Option<RenderId>,
    pub x: f64,
    pub y: f64,
}

impl HierarchyNode {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn state(&self) -> NodeState {
        self.visibility.state()
    }

    pub fn is_collapsed(&self) -> bool {
        matches!(self.visibility, Visibility::Collapsed(_))
    }
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
    root: NodeId,
}

impl Hierarchy {
    /// Builds the arena from `root`: depth in pre-order, height in post-order.
    ///
    /// Every node starts [`Visibility::Expanded`] (or [`Visibility::Leaf`]).
    pub fn build(root: Arc<TreeDatum>) -> Self {
        let mut nodes: Vec<HierarchyNode> = Vec::new();
        let mut stack: Vec<(Arc<TreeDatum>, Option<NodeId>, usize)> = vec![(root, None, 0)];

        while let Some((data, parent, depth)) = stack.pop() {
            let id = NodeId(nodes.len());
            let children = data.child_slice().to_vec();
            nodes.push(HierarchyNode {
                data,
                depth,
                height: 0,
                parent,
                visibility: Visibility::Leaf,
                render_id: None,
                x: 0.0,
                y: 0.0,
            });
            if let Some(p) = parent {
                match &mut nodes[p.0].visibility {
                    Visibility::Expanded(c) => c.push(id),
                    slot => *slot = Visibility::Expanded(vec![id]),
                }
            }
            for child in children.into_iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }

        // Pre-order ids: every child index is larger than its parent's, so a reverse sweep
        // visits children before parents.
        for i in (0..nodes.len()).rev() {
            let h = nodes[i].height;
            if let Some(p) = nodes[i].parent {
                let ph = &mut nodes[p.0].height;
                *ph = (*ph).max(h + 1);
            }
        }

        Self {
            nodes,
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&HierarchyNode> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut HierarchyNode> {
        self.nodes.get_mut(id.0).ok_or(Error::UnknownNode(id))
    }

    /// Unchecked access for ids produced by this hierarchy.
    pub fn get(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut HierarchyNode {
        &mut self.nodes[id.0]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .and_then(|n| n.visibility.children())
            .unwrap_or(&[])
    }

    pub fn collapsed_children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .and_then(|n| n.visibility.collapsed_children())
            .unwrap_or(&[])
    }

    pub fn all_children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.visibility.all_children())
            .unwrap_or(&[])
    }

    /// `id` followed by its parent chain up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Visible pre-order traversal starting at `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.preorder(id, |n| n.visibility.children().unwrap_or(&[]))
    }

    /// Pre-order traversal that also walks collapsed subtrees.
    pub fn all_descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.preorder(id, |n| n.visibility.all_children())
    }

    /// Visible nodes without visible children, in pre-order. Collapsed nodes count as leaves.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.children(n).is_empty())
            .collect()
    }

    pub fn visible_leaf_count(&self) -> usize {
        self.leaves(self.root).len()
    }

    /// Deepest visible depth below the root.
    pub fn visible_depth(&self) -> usize {
        self.descendants(self.root)
            .into_iter()
            .map(|n| self.nodes[n.0].depth)
            .max()
            .unwrap_or(0)
    }

    /// A node is visible iff every ancestor is expanded.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .skip(1)
            .all(|a| matches!(self.nodes[a.0].visibility, Visibility::Expanded(_)))
    }

    /// First node (pre-order over the whole hierarchy) whose datum has this name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.data.name == name)
            .map(NodeId)
    }

    fn preorder<'a>(
        &'a self,
        id: NodeId,
        children_of: impl Fn(&'a HierarchyNode) -> &'a [NodeId],
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(children_of(&self.nodes[n.0]).iter().rev().copied());
        }
        out
    }
}

pub struct Ancestors<'a> {
    hierarchy: &'a Hierarchy,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.next?;
        self.next = self.hierarchy.nodes[cur.0].parent;
        Some(cur)
    }
}
