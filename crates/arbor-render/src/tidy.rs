//! Tree and cluster coordinate oracle.
//!
//! `tree` is the Reingold-Tilford "tidy" layout with Walker's m-ary extension and the
//! Buchheim-Jünger-Leipert linear-time bookkeeping (threads, ancestors, deferred shifts).
//! `cluster` is a dendrogram: leaves share one depth, parents sit at the mean of their
//! children. Both follow d3-hierarchy output conventions so fixtures can be compared
//! directly: `x` is the breadth axis, `y` the depth axis, and with [`OracleSize::Size`] the
//! result is normalized into `[0, dx] x [0, dy]`.

/// Input tree in pre-order: index 0 is the root and every parent precedes its children.
#[derive(Debug, Clone, Default)]
pub struct OracleTree {
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depth: Vec<usize>,
}

impl OracleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node. `parent` must already be present.
    pub fn push(&mut self, parent: Option<usize>) -> usize {
        let id = self.parent.len();
        let depth = match parent {
            Some(p) => {
                self.children[p].push(id);
                self.depth[p] + 1
            }
            None => 0,
        };
        self.parent.push(parent);
        self.children.push(Vec::new());
        self.depth.push(depth);
        id
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn parent(&self, v: usize) -> Option<usize> {
        self.parent[v]
    }

    pub fn children(&self, v: usize) -> &[usize] {
        &self.children[v]
    }

    pub fn depth(&self, v: usize) -> usize {
        self.depth[v]
    }

    fn postorder(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len());
        if self.is_empty() {
            return out;
        }
        let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
        while let Some((v, next_child)) = stack.pop() {
            if let Some(&c) = self.children[v].get(next_child) {
                stack.push((v, next_child + 1));
                stack.push((c, 0));
            } else {
                out.push(v);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OracleSize {
    /// Fit the layout into `dx` (breadth) by `dy` (depth).
    Size { dx: f64, dy: f64 },
    /// Fixed spacing per separation unit (`dx`) and per depth level (`dy`); root at x = 0.
    NodeSize { dx: f64, dy: f64 },
}

/// Separation between two neighbouring nodes, in units of `dx`.
pub type Separation = fn(&OracleTree, usize, usize) -> f64;

/// Siblings are one unit apart, everything else two.
pub fn default_separation(t: &OracleTree, a: usize, b: usize) -> f64 {
    if t.parent(a) == t.parent(b) { 1.0 } else { 2.0 }
}

struct Walk<'a> {
    t: &'a OracleTree,
    sep: Separation,
    /// Preliminary x.
    z: Vec<f64>,
    /// Modifier.
    m: Vec<f64>,
    /// Change and shift, for spacing out intermediate subtrees.
    c: Vec<f64>,
    s: Vec<f64>,
    /// Contour thread.
    thread: Vec<Option<usize>>,
    /// Ancestor pointer.
    a: Vec<usize>,
    /// Default ancestor, per parent.
    default_ancestor: Vec<Option<usize>>,
    /// Index among siblings.
    i: Vec<usize>,
}

impl<'a> Walk<'a> {
    fn new(t: &'a OracleTree, sep: Separation) -> Self {
        let n = t.len();
        let mut i = vec![0usize; n];
        for v in 0..n {
            for (k, &c) in t.children(v).iter().enumerate() {
                i[c] = k;
            }
        }
        Self {
            t,
            sep,
            z: vec![0.0; n],
            m: vec![0.0; n],
            c: vec![0.0; n],
            s: vec![0.0; n],
            thread: vec![None; n],
            a: (0..n).collect(),
            default_ancestor: vec![None; n],
            i,
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.t.children(v).first().copied().or(self.thread[v])
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.t.children(v).last().copied().or(self.thread[v])
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let p = self.t.parent(v)?;
        let i = self.i[v];
        (i > 0).then(|| self.t.children(p)[i - 1])
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let change = shift / (self.i[wp] as f64 - self.i[wm] as f64);
        self.c[wp] -= change;
        self.s[wp] += shift;
        self.c[wm] += change;
        self.z[wp] += shift;
        self.m[wp] += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let t = self.t;
        let mut shift = 0.0;
        let mut change = 0.0;
        for &w in t.children(v).iter().rev() {
            self.z[w] += shift;
            self.m[w] += shift;
            change += self.c[w];
            shift += self.s[w] + change;
        }
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        if self.t.parent(self.a[vim]) == self.t.parent(v) {
            self.a[vim]
        } else {
            ancestor
        }
    }

    fn first_walk(&mut self, v: usize) {
        let t = self.t;
        let w = self.left_sibling(v);
        let children = t.children(v);
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            self.execute_shifts(v);
            let midpoint = (self.z[first] + self.z[last]) / 2.0;
            match w {
                Some(w) => {
                    self.z[v] = self.z[w] + (self.sep)(t, v, w);
                    self.m[v] = self.z[v] - midpoint;
                }
                None => self.z[v] = midpoint,
            }
        } else if let Some(w) = w {
            self.z[v] = self.z[w] + (self.sep)(t, v, w);
        }

        if let Some(p) = t.parent(v) {
            let fallback = t.children(p)[0];
            let ancestor = self.default_ancestor[p].unwrap_or(fallback);
            self.default_ancestor[p] = Some(self.apportion(v, w, ancestor));
        }
    }

    fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = w else {
            return ancestor;
        };
        let Some(p) = self.t.parent(v) else {
            return ancestor;
        };

        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.t.children(p)[0];
        let mut sip = self.m[vip];
        let mut sop = self.m[vop];
        let mut sim = self.m[vim];
        let mut som = self.m[vom];

        let (mut next_im, mut next_ip);
        loop {
            next_im = self.next_right(vim);
            next_ip = self.next_left(vip);
            let (Some(im), Some(ip)) = (next_im, next_ip) else {
                break;
            };
            let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
                break;
            };
            vim = im;
            vip = ip;
            vom = om;
            vop = op;
            self.a[vop] = v;
            let shift = self.z[vim] + sim - self.z[vip] - sip + (self.sep)(self.t, vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.m[vim];
            sip += self.m[vip];
            som += self.m[vom];
            sop += self.m[vop];
        }

        if let Some(im) = next_im {
            if self.next_right(vop).is_none() {
                self.thread[vop] = Some(im);
                self.m[vop] += sim - sop;
            }
        }
        if let Some(ip) = next_ip {
            if self.next_left(vom).is_none() {
                self.thread[vom] = Some(ip);
                self.m[vom] += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }
}

/// Tidy tree layout. Returns `(x, y)` per node, indexed like `t`.
pub fn tree(t: &OracleTree, size: OracleSize, sep: Separation) -> Vec<(f64, f64)> {
    if t.is_empty() {
        return Vec::new();
    }

    let mut walk = Walk::new(t, sep);
    for v in t.postorder() {
        walk.first_walk(v);
    }

    // Second walk, pre-order: indices are already pre-order. The root's virtual parent
    // carries `-z(root)` so the root lands on x = 0.
    let mut x = vec![0.0; t.len()];
    let root_shift = -walk.z[0];
    for v in 0..t.len() {
        let parent_m = match t.parent(v) {
            Some(p) => walk.m[p],
            None => root_shift,
        };
        x[v] = walk.z[v] + parent_m;
        walk.m[v] += parent_m;
    }

    match size {
        OracleSize::NodeSize { dx, dy } => (0..t.len())
            .map(|v| (x[v] * dx, t.depth(v) as f64 * dy))
            .collect(),
        OracleSize::Size { dx, dy } => {
            let (mut left, mut right, mut bottom) = (0usize, 0usize, 0usize);
            for v in 0..t.len() {
                if x[v] < x[left] {
                    left = v;
                }
                if x[v] > x[right] {
                    right = v;
                }
                if t.depth(v) > t.depth(bottom) {
                    bottom = v;
                }
            }
            let s = if left == right {
                1.0
            } else {
                sep(t, left, right) / 2.0
            };
            let tx = s - x[left];
            let kx = dx / (x[right] + s + tx);
            let ky = dy / (t.depth(bottom).max(1) as f64);
            (0..t.len())
                .map(|v| ((x[v] + tx) * kx, t.depth(v) as f64 * ky))
                .collect()
        }
    }
}

/// Dendrogram layout. Returns `(x, y)` per node, indexed like `t`.
pub fn cluster(t: &OracleTree, size: OracleSize, sep: Separation) -> Vec<(f64, f64)> {
    if t.is_empty() {
        return Vec::new();
    }

    let n = t.len();
    let mut x = vec![0.0; n];
    let mut y = vec![0.0; n];
    let mut previous: Option<usize> = None;
    let mut cursor = 0.0;
    for v in t.postorder() {
        let children = t.children(v);
        if children.is_empty() {
            x[v] = match previous {
                Some(prev) => {
                    cursor += sep(t, v, prev);
                    cursor
                }
                None => 0.0,
            };
            y[v] = 0.0;
            previous = Some(v);
        } else {
            x[v] = children.iter().map(|&c| x[c]).sum::<f64>() / children.len() as f64;
            y[v] = 1.0 + children.iter().map(|&c| y[c]).fold(0.0, f64::max);
        }
    }

    let leaf_left = {
        let mut v = 0;
        while let Some(&c) = t.children(v).first() {
            v = c;
        }
        v
    };
    let leaf_right = {
        let mut v = 0;
        while let Some(&c) = t.children(v).last() {
            v = c;
        }
        v
    };

    match size {
        OracleSize::NodeSize { dx, dy } => (0..n)
            .map(|v| ((x[v] - x[0]) * dx, (y[0] - y[v]) * dy))
            .collect(),
        OracleSize::Size { dx, dy } => {
            let x0 = x[leaf_left] - sep(t, leaf_left, leaf_right) / 2.0;
            let x1 = x[leaf_right] + sep(t, leaf_right, leaf_left) / 2.0;
            (0..n)
                .map(|v| {
                    let depth_frac = if y[0] != 0.0 { y[v] / y[0] } else { 1.0 };
                    ((x[v] - x0) / (x1 - x0) * dx, (1.0 - depth_frac) * dy)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r -> [a -> [a1, a2], b -> [b1], c]
    fn three_level() -> OracleTree {
        let mut t = OracleTree::new();
        let r = t.push(None);
        let a = t.push(Some(r));
        t.push(Some(a));
        t.push(Some(a));
        let b = t.push(Some(r));
        t.push(Some(b));
        t.push(Some(r));
        t
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn tidy_tree_node_size_matches_reference_positions() {
        let t = three_level();
        let pos = tree(&t, OracleSize::NodeSize { dx: 1.0, dy: 1.0 }, default_separation);
        let xs: Vec<f64> = pos.iter().map(|p| p.0).collect();
        let expected = [0.0, -1.75, -2.25, -1.25, 0.75, 0.75, 1.75];
        for (got, want) in xs.iter().zip(expected) {
            assert!(approx(*got, want), "{xs:?}");
        }
        let ys: Vec<f64> = pos.iter().map(|p| p.1).collect();
        assert_eq!(ys, [0.0, 1.0, 2.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn sibling_separation_is_uniform_and_cousins_double() {
        let t = three_level();
        let pos = tree(&t, OracleSize::NodeSize { dx: 10.0, dy: 1.0 }, default_separation);
        let (a1, a2, b1) = (pos[2].0, pos[3].0, pos[5].0);
        let sibling = a2 - a1;
        assert!(approx(sibling, 10.0));
        assert!(approx(b1 - a2, 2.0 * sibling));
        // Siblings at depth 1.
        assert!(approx(pos[6].0 - pos[4].0, sibling));
    }

    #[test]
    fn size_mode_fits_extent() {
        let t = three_level();
        let pos = tree(&t, OracleSize::Size { dx: 100.0, dy: 50.0 }, default_separation);
        let min_x = pos.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = pos.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        assert!(min_x > 0.0 && max_x < 100.0);
        // Leftmost leaf (a1) and rightmost node (c) get half a separation of margin.
        assert!(approx(min_x, 100.0 - max_x));
        assert_eq!(pos[2].1, 50.0);
        assert_eq!(pos[1].1, 25.0);
    }

    #[test]
    fn parent_is_centered_over_children() {
        let t = three_level();
        let pos = tree(&t, OracleSize::NodeSize { dx: 1.0, dy: 1.0 }, default_separation);
        assert!(approx(pos[1].0, (pos[2].0 + pos[3].0) / 2.0));
        assert!(approx(pos[0].0, (pos[1].0 + pos[6].0) / 2.0));
    }

    #[test]
    fn deep_unbalanced_subtrees_do_not_overlap() {
        // r -> [a -> [a1 -> [a11, a12, a13]], b, c -> [c1 -> [c11, c12]]]
        let mut t = OracleTree::new();
        let r = t.push(None);
        let a = t.push(Some(r));
        let a1 = t.push(Some(a));
        for _ in 0..3 {
            t.push(Some(a1));
        }
        t.push(Some(r));
        let c = t.push(Some(r));
        let c1 = t.push(Some(c));
        t.push(Some(c1));
        t.push(Some(c1));

        let pos = tree(&t, OracleSize::NodeSize { dx: 1.0, dy: 1.0 }, default_separation);
        for depth in 0..4 {
            let mut row: Vec<(usize, f64)> = (0..t.len())
                .filter(|&v| t.depth(v) == depth)
                .map(|v| (v, pos[v].0))
                .collect();
            row.sort_by(|l, r| l.1.total_cmp(&r.1));
            for pair in row.windows(2) {
                let want = default_separation(&t, pair[0].0, pair[1].0);
                assert!(
                    pair[1].1 - pair[0].1 >= want - 1e-9,
                    "depth {depth}: {row:?}"
                );
            }
            // Pre-order (left-to-right) order is preserved within a level.
            let ids: Vec<usize> = row.iter().map(|p| p.0).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            assert_eq!(ids, sorted);
        }
    }

    #[test]
    fn single_node_is_centered() {
        let mut t = OracleTree::new();
        t.push(None);
        assert_eq!(tree(&t, OracleSize::Size { dx: 80.0, dy: 40.0 }, default_separation), [(40.0, 0.0)]);
        assert_eq!(cluster(&t, OracleSize::Size { dx: 80.0, dy: 40.0 }, default_separation), [(40.0, 0.0)]);
    }

    #[test]
    fn cluster_puts_leaves_on_one_level() {
        let t = three_level();
        let pos = cluster(&t, OracleSize::Size { dx: 100.0, dy: 60.0 }, default_separation);
        for v in [2, 3, 5, 6] {
            assert_eq!(pos[v].1, 60.0, "leaf {v}");
        }
        assert_eq!(pos[0].1, 0.0);
        assert_eq!(pos[1].1, 30.0);
        // Interior nodes sit at the mean of their children.
        assert!(approx(pos[1].0, (pos[2].0 + pos[3].0) / 2.0));
        assert!(approx(pos[4].0, pos[5].0));
    }

    #[test]
    fn cluster_node_size_roots_at_origin() {
        let t = three_level();
        let pos = cluster(&t, OracleSize::NodeSize { dx: 1.0, dy: 1.0 }, default_separation);
        assert_eq!(pos[0], (0.0, 0.0));
        // Leaves: a1=0, a2=1, b1=3, c=5 (c is a cousin of b1), root = mean(a, b, c).
        let root_x = (0.5 + 3.0 + 5.0) / 3.0;
        assert!(approx(pos[2].0, -root_x));
        assert!(approx(pos[6].0, 5.0 - root_x));
        assert_eq!(pos[2].1, 2.0);
    }
}
