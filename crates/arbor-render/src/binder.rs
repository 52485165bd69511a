//! Render Binder: keyed enter/update/exit joins and the persistent scene they drive.

use crate::image::NodeImage;
use crate::label::NodeLabel;
use crate::layout::TreeLayout;
use crate::shape::NodeShape;
use crate::viewport::ZoomTransform;
use arbor_core::{Hierarchy, IdAllocator, NodeId, NodeState, RenderId};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::hash::Hash;

/// The three disjoint subsets of a keyed join. `enter` and `update` follow the order of the
/// incoming keys, `exit` the order of the live set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join<K> {
    pub enter: Vec<K>,
    pub update: Vec<K>,
    pub exit: Vec<K>,
}

impl<K> Default for Join<K> {
    fn default() -> Self {
        Self {
            enter: Vec::new(),
            update: Vec::new(),
            exit: Vec::new(),
        }
    }
}

/// Matches `incoming` keys against the `live` set. Repeated incoming keys bind once; the
/// duplicates are dropped.
pub fn join<K>(live: impl IntoIterator<Item = K>, incoming: impl IntoIterator<Item = K>) -> Join<K>
where
    K: Clone + Eq + Hash + std::fmt::Debug,
{
    let live: Vec<K> = live.into_iter().collect();
    let live_set: FxHashSet<&K> = live.iter().collect();

    let mut out = Join::default();
    let mut seen: FxHashSet<K> = FxHashSet::default();
    for key in incoming {
        if !seen.insert(key.clone()) {
            tracing::trace!(?key, "duplicate join key dropped");
            continue;
        }
        if live_set.contains(&key) {
            out.update.push(key);
        } else {
            out.enter.push(key);
        }
    }
    out.exit = live.iter().filter(|k| !seen.contains(*k)).cloned().collect();
    out
}

/// Gives every laid-out node a render id the first time it is seen and copies the ids into
/// the layout. Returns how many ids were issued.
pub fn ensure_ids(hierarchy: &mut Hierarchy, layout: &mut TreeLayout, ids: &mut IdAllocator) -> usize {
    let mut issued = 0usize;
    for positioned in &mut layout.nodes {
        let node = hierarchy.get_mut(positioned.node);
        let id = match node.render_id {
            Some(id) => id,
            None => {
                issued += 1;
                *node.render_id.insert(ids.next_id())
            }
        };
        positioned.render_id = Some(id);
    }
    issued
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElement {
    pub render_id: RenderId,
    pub node: NodeId,
    pub name: String,
    pub state: NodeState,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub exiting: bool,
    pub shape: NodeShape,
    pub label: NodeLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<NodeImage>,
}

/// Dash state for the draw-in effect: `dasharray = length`, `dashoffset = offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDash {
    pub length: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkElement {
    pub key: String,
    pub source: NodeId,
    pub target: NodeId,
    pub d: String,
    /// Total path length, the dash period of the draw-in effect.
    pub length: f64,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<LinkDash>,
    pub exiting: bool,
}

/// Persistent visual elements of one diagram.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub transform: ZoomTransform,
    pub nodes: IndexMap<RenderId, NodeElement>,
    pub links: IndexMap<String, LinkElement>,
}

impl Scene {
    pub fn new(width: f64, height: f64, transform: ZoomTransform) -> Self {
        Self {
            width,
            height,
            transform,
            nodes: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    /// Elements that are not fading out.
    pub fn live_nodes(&self) -> impl Iterator<Item = &NodeElement> {
        self.nodes.values().filter(|n| !n.exiting)
    }

    pub fn live_links(&self) -> impl Iterator<Item = &LinkElement> {
        self.links.values().filter(|l| !l.exiting)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&NodeElement> {
        self.live_nodes().find(|n| n.name == name)
    }

    /// Topmost live node whose shape contains the canvas point.
    pub fn hit_test(&self, canvas: (f64, f64)) -> Option<&NodeElement> {
        let (x, y) = self.transform.invert(canvas);
        self.nodes
            .values()
            .rev()
            .filter(|n| !n.exiting)
            .find(|n| n.shape.geometry.contains(x - n.x, y - n.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Extent, LayoutMode, layout};
    use arbor_core::{Orientation, TreeDatum, collapse};
    use std::sync::Arc;

    #[test]
    fn join_splits_keys_into_three_sets() {
        let j = join([1, 2, 3, 4], [3, 5, 1, 6]);
        assert_eq!(j.enter, [5, 6]);
        assert_eq!(j.update, [3, 1]);
        assert_eq!(j.exit, [2, 4]);
    }

    #[test]
    fn join_against_empty_sets() {
        let j = join(Vec::<u32>::new(), [1, 2]);
        assert_eq!(j.enter, [1, 2]);
        assert!(j.update.is_empty() && j.exit.is_empty());

        let j = join([1, 2], Vec::<u32>::new());
        assert_eq!(j.exit, [1, 2]);
    }

    #[test]
    fn duplicate_incoming_keys_bind_once() {
        let j = join(["ab".to_string()], ["ab".to_string(), "ab".to_string(), "cd".to_string()]);
        assert_eq!(j.update, ["ab".to_string()]);
        assert_eq!(j.enter, ["cd".to_string()]);
        assert!(j.exit.is_empty());
    }

    #[test]
    fn ids_are_issued_once_and_survive_relayout() {
        let data = TreeDatum::with_children(
            "Top",
            vec![
                TreeDatum::with_children("A", vec![TreeDatum::leaf("Son of A")]),
                TreeDatum::leaf("B"),
            ],
        );
        let mut h = Hierarchy::build(Arc::new(data));
        collapse::apply_max_depth(&mut h, 1);
        let mut ids = IdAllocator::new();
        let extent = Extent::new(200.0, 100.0);

        let mut first = layout(&mut h, extent, LayoutMode::Tree, Orientation::Horizontal);
        assert_eq!(ensure_ids(&mut h, &mut first, &mut ids), 3);
        let before: Vec<_> = first.nodes.iter().map(|n| (n.node, n.render_id)).collect();

        let a = h.find_by_name("A").unwrap();
        collapse::toggle(&mut h, a).unwrap();
        let mut second = layout(&mut h, extent, LayoutMode::Tree, Orientation::Horizontal);
        assert_eq!(ensure_ids(&mut h, &mut second, &mut ids), 1);
        for (node, id) in before {
            let again = second.nodes.iter().find(|n| n.node == node).unwrap();
            assert_eq!(again.render_id, id);
        }
        assert_eq!(ids.issued(), 4);

        // Collapsing again hides "Son of A" but keeps its id and the counter untouched.
        collapse::toggle(&mut h, a).unwrap();
        let mut third = layout(&mut h, extent, LayoutMode::Tree, Orientation::Horizontal);
        assert_eq!(ensure_ids(&mut h, &mut third, &mut ids), 0);
        let son = h.find_by_name("Son of A").unwrap();
        assert!(h.get(son).render_id.is_some());
        assert_eq!(ids.issued(), 4);
    }
}
