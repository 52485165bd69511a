//! Layout Engine.
//!
//! Runs the coordinate oracle over the visible part of a [`Hierarchy`] and produces
//! positioned nodes (pre-order) plus one edge per visible non-root node.

use crate::tidy::{self, OracleSize, OracleTree};
use arbor_core::{Hierarchy, NodeId, NodeState, Orientation, RenderId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Drawing area handed to the oracle, in local tree coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    #[default]
    Tree,
    Cluster,
}

impl LayoutMode {
    pub fn from_cluster_flag(is_cluster_layout: bool) -> Self {
        if is_cluster_layout {
            Self::Cluster
        } else {
            Self::Tree
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub node: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_id: Option<RenderId>,
    pub name: String,
    pub depth: usize,
    pub state: NodeState,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub source: NodeId,
    pub target: NodeId,
    /// Content-derived join key: source name, target name, source x, target y. A key that
    /// repeats within one pass gets a `#n` occurrence suffix.
    pub key: String,
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    pub extent: Extent,
    pub orientation: Orientation,
    pub mode: LayoutMode,
}

impl TreeLayout {
    pub fn position_of(&self, id: NodeId) -> Option<(f64, f64)> {
        self.nodes.iter().find(|n| n.node == id).map(|n| (n.x, n.y))
    }
}

pub fn edge_key(source_name: &str, target_name: &str, sx: f64, ty: f64) -> String {
    format!("{source_name}{target_name}{sx}{ty}")
}

/// Suffixes the second and later occurrences of a key with `#1`, `#2`, ... in pre-order, so
/// same-named siblings at one depth still bind one link each.
fn disambiguate_keys(edges: &mut [LayoutEdge]) {
    let mut taken: FxHashSet<String> = FxHashSet::default();
    for edge in edges.iter_mut() {
        if taken.insert(edge.key.clone()) {
            continue;
        }
        let mut n = 1usize;
        let mut key = format!("{}#{n}", edge.key);
        while taken.contains(&key) {
            n += 1;
            key = format!("{}#{n}", edge.key);
        }
        taken.insert(key.clone());
        edge.key = key;
    }
}

/// Lays out the visible tree into `extent` and writes the coordinates back into `hierarchy`.
///
/// The oracle always works with breadth on `x` and depth on `y`; horizontal orientation
/// feeds it the transposed extent and swaps the axes of the result.
pub fn layout(
    hierarchy: &mut Hierarchy,
    extent: Extent,
    mode: LayoutMode,
    orientation: Orientation,
) -> TreeLayout {
    let visible = hierarchy.descendants(hierarchy.root());

    let mut oracle = OracleTree::new();
    let mut slot = vec![usize::MAX; hierarchy.len()];
    for &id in &visible {
        let parent = hierarchy.parent(id).map(|p| slot[p.index()]);
        slot[id.index()] = oracle.push(parent);
    }

    let size = match orientation {
        Orientation::Horizontal => OracleSize::Size {
            dx: extent.height,
            dy: extent.width,
        },
        Orientation::Vertical => OracleSize::Size {
            dx: extent.width,
            dy: extent.height,
        },
    };
    let raw = match mode {
        LayoutMode::Tree => tidy::tree(&oracle, size, tidy::default_separation),
        LayoutMode::Cluster => tidy::cluster(&oracle, size, tidy::default_separation),
    };

    let mut nodes = Vec::with_capacity(visible.len());
    for (&id, &(bx, dy)) in visible.iter().zip(&raw) {
        let (x, y) = match orientation {
            Orientation::Horizontal => (dy, bx),
            Orientation::Vertical => (bx, dy),
        };
        let node = hierarchy.get_mut(id);
        node.x = x;
        node.y = y;
        nodes.push(PositionedNode {
            node: id,
            render_id: node.render_id,
            name: node.name().to_string(),
            depth: node.depth,
            state: node.state(),
            x,
            y,
        });
    }

    let mut edges = visible
        .iter()
        .skip(1)
        .filter_map(|&id| {
            let target = hierarchy.get(id);
            let source = hierarchy.get(target.parent?);
            Some(LayoutEdge {
                source: target.parent?,
                target: id,
                key: edge_key(source.name(), target.name(), source.x, target.y),
                sx: source.x,
                sy: source.y,
                tx: target.x,
                ty: target.y,
            })
        })
        .collect::<Vec<_>>();
    disambiguate_keys(&mut edges);

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        width = extent.width,
        height = extent.height,
        ?mode,
        ?orientation,
        "laid out visible tree"
    );

    TreeLayout {
        nodes,
        edges,
        extent,
        orientation,
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{TreeDatum, collapse};
    use std::sync::Arc;

    fn three_level() -> Hierarchy {
        let data = TreeDatum::with_children(
            "r",
            vec![
                TreeDatum::with_children("a", vec![TreeDatum::leaf("a1"), TreeDatum::leaf("a2")]),
                TreeDatum::with_children("b", vec![TreeDatum::leaf("b1")]),
                TreeDatum::leaf("c"),
            ],
        );
        Hierarchy::build(Arc::new(data))
    }

    fn names(layout: &TreeLayout) -> Vec<&str> {
        layout.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn nodes_come_out_in_visible_preorder() {
        let mut h = three_level();
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Vertical,
        );
        assert_eq!(names(&out), ["r", "a", "a1", "a2", "b", "b1", "c"]);

        let b = h.find_by_name("b").unwrap();
        collapse::toggle(&mut h, b).unwrap();
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Vertical,
        );
        assert_eq!(names(&out), ["r", "a", "a1", "a2", "b", "c"]);
        assert_eq!(out.edges.len(), out.nodes.len() - 1);
    }

    #[test]
    fn one_edge_per_visible_non_root_node() {
        let mut h = three_level();
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Horizontal,
        );
        assert_eq!(out.edges.len(), 6);
        for edge in &out.edges {
            assert_eq!(h.parent(edge.target), Some(edge.source));
            let s = h.get(edge.source);
            let t = h.get(edge.target);
            assert_eq!((edge.sx, edge.sy, edge.tx, edge.ty), (s.x, s.y, t.x, t.y));
            assert_eq!(edge.key, format!("{}{}{}{}", s.name(), t.name(), s.x, t.y));
        }
    }

    #[test]
    fn horizontal_is_the_axis_swap_of_vertical() {
        let mut h = three_level();
        let vertical = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Vertical,
        );
        let horizontal = layout(
            &mut h,
            Extent::new(200.0, 300.0),
            LayoutMode::Tree,
            Orientation::Horizontal,
        );
        for (v, hz) in vertical.nodes.iter().zip(&horizontal.nodes) {
            assert!((v.x - hz.y).abs() < 1e-9);
            assert!((v.y - hz.x).abs() < 1e-9);
        }

        let vertical = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Cluster,
            Orientation::Vertical,
        );
        let horizontal = layout(
            &mut h,
            Extent::new(200.0, 300.0),
            LayoutMode::Cluster,
            Orientation::Horizontal,
        );
        for (v, hz) in vertical.nodes.iter().zip(&horizontal.nodes) {
            assert!((v.x - hz.y).abs() < 1e-9);
            assert!((v.y - hz.x).abs() < 1e-9);
        }
    }

    #[test]
    fn coordinates_are_written_back_into_the_hierarchy() {
        let mut h = three_level();
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Horizontal,
        );
        for n in &out.nodes {
            let node = h.get(n.node);
            assert_eq!((node.x, node.y), (n.x, n.y));
        }
        // Horizontal: depth runs along x.
        let root = h.get(h.root());
        assert_eq!(root.x, 0.0);
        let a1 = h.get(h.find_by_name("a1").unwrap());
        assert_eq!(a1.x, 300.0);
    }

    #[test]
    fn single_node_tree_is_centered_on_the_breadth_axis() {
        let mut h = Hierarchy::build(Arc::new(TreeDatum::leaf("only")));
        let out = layout(
            &mut h,
            Extent::new(400.0, 100.0),
            LayoutMode::Tree,
            Orientation::Vertical,
        );
        assert_eq!(out.nodes.len(), 1);
        assert!(out.edges.is_empty());
        assert_eq!((out.nodes[0].x, out.nodes[0].y), (200.0, 0.0));
    }

    #[test]
    fn cluster_mode_aligns_leaves_at_full_depth() {
        let mut h = three_level();
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Cluster,
            Orientation::Vertical,
        );
        for n in &out.nodes {
            if h.children(n.node).is_empty() {
                assert_eq!(n.y, 200.0, "{}", n.name);
            }
        }
        assert_eq!(out.nodes[0].y, 0.0);
    }

    #[test]
    fn collapsed_state_is_reported_per_node() {
        let mut h = three_level();
        collapse::apply_max_depth(&mut h, 1);
        let out = layout(
            &mut h,
            Extent::new(300.0, 200.0),
            LayoutMode::Tree,
            Orientation::Horizontal,
        );
        let states: Vec<NodeState> = out.nodes.iter().map(|n| n.state).collect();
        assert_eq!(
            states,
            [
                NodeState::Expanded,
                NodeState::Collapsed,
                NodeState::Collapsed,
                NodeState::Leaf
            ]
        );
    }

    #[test]
    fn repeated_edge_keys_get_occurrence_suffixes() {
        let data = TreeDatum::with_children(
            "root",
            vec![
                TreeDatum::leaf("Other"),
                TreeDatum::leaf("Other"),
                TreeDatum::leaf("Other"),
            ],
        );
        let mut h = Hierarchy::build(Arc::new(data));
        let out = layout(
            &mut h,
            Extent::new(330.0, 660.0),
            LayoutMode::Tree,
            Orientation::Vertical,
        );
        let base = &out.edges[0].key;
        assert_eq!(*base, edge_key("root", "Other", 165.0, 660.0));
        assert_eq!(out.edges[1].key, format!("{base}#1"));
        assert_eq!(out.edges[2].key, format!("{base}#2"));
    }
}
