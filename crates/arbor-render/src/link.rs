//! Link renderer: path data per style and orientation, path length for the draw-in effect,
//! and stroke width.

use crate::svg::util::fmt_path;
use arbor_core::{LinkProperties, LinkType, Orientation, TreeDatum};

/// Share of the source-to-target depth distance added past the shape edge before a corner
/// link turns.
pub const CORNER_ELBOW_FACTOR: f64 = 0.25;

const CURVE_SAMPLES: usize = 64;

type Point = (f64, f64);

/// Position along the depth axis where a corner link turns.
fn elbow(orientation: Orientation, s: Point, t: Point, shape_half_along: f64) -> f64 {
    let (from, to) = match orientation {
        Orientation::Horizontal => (s.0, t.0),
        Orientation::Vertical => (s.1, t.1),
    };
    let direction = if to < from { -1.0 } else { 1.0 };
    from + direction * (shape_half_along + CORNER_ELBOW_FACTOR * (to - from).abs())
}

fn curve_controls(orientation: Orientation, s: Point, t: Point) -> (Point, Point) {
    match orientation {
        Orientation::Horizontal => {
            let mx = (s.0 + t.0) / 2.0;
            ((mx, s.1), (mx, t.1))
        }
        Orientation::Vertical => {
            let my = (s.1 + t.1) / 2.0;
            ((s.0, my), (t.0, my))
        }
    }
}

fn pt(out: &mut String, p: Point) {
    out.push_str(&fmt_path(p.0));
    out.push(',');
    out.push_str(&fmt_path(p.1));
}

/// Path data from `s` to `t`. `shape_half_along` is half of the node shape's extent along
/// the depth axis and only matters for corner links.
pub fn path_d(
    style: LinkType,
    orientation: Orientation,
    s: Point,
    t: Point,
    shape_half_along: f64,
) -> String {
    let mut d = String::from("M");
    pt(&mut d, s);
    match style {
        LinkType::Straight => {
            d.push('L');
            pt(&mut d, t);
        }
        LinkType::Curved => {
            let (c1, c2) = curve_controls(orientation, s, t);
            d.push('C');
            pt(&mut d, c1);
            d.push(' ');
            pt(&mut d, c2);
            d.push(' ');
            pt(&mut d, t);
        }
        LinkType::Corner => {
            let e = elbow(orientation, s, t, shape_half_along);
            match orientation {
                Orientation::Horizontal => {
                    d.push('H');
                    d.push_str(&fmt_path(e));
                    d.push('V');
                    d.push_str(&fmt_path(t.1));
                    d.push('H');
                    d.push_str(&fmt_path(t.0));
                }
                Orientation::Vertical => {
                    d.push('V');
                    d.push_str(&fmt_path(e));
                    d.push('H');
                    d.push_str(&fmt_path(t.0));
                    d.push('V');
                    d.push_str(&fmt_path(t.1));
                }
            }
        }
    }
    d
}

/// Total length of the path [`path_d`] draws. Curves are approximated by chords.
pub fn path_length(
    style: LinkType,
    orientation: Orientation,
    s: Point,
    t: Point,
    shape_half_along: f64,
) -> f64 {
    match style {
        LinkType::Straight => (t.0 - s.0).hypot(t.1 - s.1),
        LinkType::Corner => {
            let e = elbow(orientation, s, t, shape_half_along);
            match orientation {
                Orientation::Horizontal => (e - s.0).abs() + (t.1 - s.1).abs() + (t.0 - e).abs(),
                Orientation::Vertical => (e - s.1).abs() + (t.0 - s.0).abs() + (t.1 - e).abs(),
            }
        }
        LinkType::Curved => {
            let (c1, c2) = curve_controls(orientation, s, t);
            let at = |u: f64| {
                let v = 1.0 - u;
                let (a, b, c, d) = (v * v * v, 3.0 * v * v * u, 3.0 * v * u * u, u * u * u);
                (
                    a * s.0 + b * c1.0 + c * c2.0 + d * t.0,
                    a * s.1 + b * c1.1 + c * c2.1 + d * t.1,
                )
            };
            let mut len = 0.0;
            let mut prev = s;
            for i in 1..=CURVE_SAMPLES {
                let p = at(i as f64 / CURVE_SAMPLES as f64);
                len += (p.0 - prev.0).hypot(p.1 - prev.1);
                prev = p;
            }
            len
        }
    }
}

/// Stroke width of the link entering `target`: scaled by the datum's weight when present.
pub fn stroke_width(props: &LinkProperties, target: &TreeDatum) -> f64 {
    match target.weight {
        Some(w) => (props.stroke_width * w).max(0.5),
        None => props.stroke_width,
    }
}
