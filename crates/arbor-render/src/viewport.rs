//! Sizing & Viewport Controller.
//!
//! Two sizing modes are fixed at construction:
//! - [`SizingMode::Fixed`]: the container minus padding is the drawing extent, the tree group
//!   is translated by the padding, and no zoom behavior exists.
//! - [`SizingMode::Auto`]: the extent follows the visible content and a [`ZoomBehavior`]
//!   maps pointer gestures onto the group transform.

use crate::label::measure_label;
use crate::layout::Extent;
use crate::shape::ShapeGeometry;
use crate::svg::util::fmt;
use crate::text::TextMeasurer;
use arbor_core::{GeneralProperties, Hierarchy, Orientation, TreeProperties};
use serde::{Deserialize, Serialize};

/// Per-level spacing in auto-extent mode when `depthWiseHeight` is not configured.
pub const DEFAULT_LEVEL_SPACING: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self { x, y, k: 1.0 }
    }

    /// Local tree coordinates to canvas coordinates.
    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (p.0 * self.k + self.x, p.1 * self.k + self.y)
    }

    /// Canvas coordinates to local tree coordinates.
    pub fn invert(&self, p: (f64, f64)) -> (f64, f64) {
        ((p.0 - self.x) / self.k, (p.1 - self.y) / self.k)
    }

    pub fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k + (to.k - self.k) * t,
        }
    }

    /// `transform` attribute value for the tree group.
    pub fn to_svg(&self) -> String {
        format!(
            "translate({},{}) scale({})",
            fmt(self.x),
            fmt(self.y),
            fmt(self.k)
        )
    }
}

/// Translate that puts local point `(x, y)` at the container center at scale `k`.
pub fn center_transform(x: f64, y: f64, k: f64, container: Extent) -> ZoomTransform {
    ZoomTransform {
        x: -x * k + container.width / 2.0,
        y: -y * k + container.height / 2.0,
        k,
    }
}

/// Wheel `deltaMode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoomGesture {
    Wheel {
        delta_y: f64,
        #[serde(default)]
        delta_mode: DeltaMode,
        #[serde(default)]
        ctrl: bool,
        point: (f64, f64),
    },
    Drag {
        dx: f64,
        dy: f64,
        #[serde(default)]
        button: u8,
        #[serde(default)]
        ctrl: bool,
    },
    Pinch {
        scale: f64,
        center: (f64, f64),
    },
    DoubleClick {
        point: (f64, f64),
        #[serde(default)]
        shift: bool,
    },
}

/// Gesture-to-transform binding with a clamped scale range.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomBehavior {
    min_scale: f64,
    max_scale: f64,
    transform: ZoomTransform,
}

impl ZoomBehavior {
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            transform: ZoomTransform::IDENTITY,
        }
    }

    pub fn from_properties(general: &GeneralProperties) -> Self {
        Self::new(general.min_zoom_scale, general.max_zoom_scale)
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Replaces the current transform, clamping its scale.
    pub fn set_transform(&mut self, t: ZoomTransform) {
        self.transform = ZoomTransform {
            k: self.clamp(t.k),
            ..t
        };
    }

    fn clamp(&self, k: f64) -> f64 {
        k.clamp(self.min_scale, self.max_scale)
    }

    /// Secondary mouse buttons and ctrl-drags are left to the host; wheel always passes.
    pub fn accepts(gesture: &ZoomGesture) -> bool {
        match *gesture {
            ZoomGesture::Wheel { .. } | ZoomGesture::Pinch { .. } => true,
            ZoomGesture::Drag { button, ctrl, .. } => button == 0 && !ctrl,
            ZoomGesture::DoubleClick { .. } => true,
        }
    }

    /// Applies a gesture. Returns the new transform, or `None` when filtered out.
    pub fn handle(&mut self, gesture: &ZoomGesture) -> Option<ZoomTransform> {
        if !Self::accepts(gesture) {
            tracing::trace!(?gesture, "zoom gesture filtered");
            return None;
        }
        let t = self.transform;
        let next = match *gesture {
            ZoomGesture::Wheel {
                delta_y,
                delta_mode,
                ctrl,
                point,
            } => {
                let unit = match delta_mode {
                    DeltaMode::Pixel => 0.002,
                    DeltaMode::Line => 0.05,
                    DeltaMode::Page => 1.0,
                };
                let boost = if ctrl { 10.0 } else { 1.0 };
                self.scale_about(t.k * 2f64.powf(-delta_y * unit * boost), point)
            }
            ZoomGesture::Drag { dx, dy, .. } => ZoomTransform {
                x: t.x + dx,
                y: t.y + dy,
                k: t.k,
            },
            ZoomGesture::Pinch { scale, center } => self.scale_about(t.k * scale, center),
            ZoomGesture::DoubleClick { point, shift } => {
                self.scale_about(t.k * if shift { 0.5 } else { 2.0 }, point)
            }
        };
        self.transform = next;
        Some(next)
    }

    /// Scales to `k` (clamped) keeping the canvas point `p` fixed.
    fn scale_about(&self, k: f64, p: (f64, f64)) -> ZoomTransform {
        let local = self.transform.invert(p);
        let k = self.clamp(k);
        ZoomTransform {
            x: p.0 - local.0 * k,
            y: p.1 - local.1 * k,
            k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizingMode {
    Fixed,
    Auto,
}

impl SizingMode {
    pub fn from_properties(general: &GeneralProperties) -> Self {
        if general.enable_zoom {
            Self::Auto
        } else {
            Self::Fixed
        }
    }
}

pub fn container(general: &GeneralProperties) -> Extent {
    Extent::new(general.container_width, general.container_height)
}

/// Fixed-mode drawing extent: explicit tree size, or the container minus padding.
pub fn fixed_extent(general: &GeneralProperties) -> Extent {
    let w = general
        .tree_width
        .unwrap_or(general.container_width - 2.0 * general.horizontal_padding);
    let h = general
        .tree_height
        .unwrap_or(general.container_height - 2.0 * general.vertical_padding);
    Extent::new(w.max(0.0), h.max(0.0))
}

/// Group transform a fresh diagram starts with. Auto mode is re-centered right after.
pub fn initial_transform(mode: SizingMode, general: &GeneralProperties) -> ZoomTransform {
    match mode {
        SizingMode::Fixed => {
            ZoomTransform::translate(general.horizontal_padding, general.vertical_padding)
        }
        SizingMode::Auto => ZoomTransform::IDENTITY,
    }
}

/// Spacing inputs derived from configuration and the visible labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentMetrics {
    /// Distance between depth levels.
    pub level_spacing: f64,
    /// Breadth reserved per visible leaf.
    pub footprint: f64,
}

pub fn content_metrics(
    hierarchy: &Hierarchy,
    props: &TreeProperties,
    measurer: &dyn TextMeasurer,
) -> ContentMetrics {
    let general = &props.general;
    let text = &props.node_properties.text_properties;
    let orientation = general.orientation;
    let (shape_w, shape_h) =
        ShapeGeometry::from_properties(&props.node_properties.shape_properties).size();

    let (mut text_along, mut text_across) = (0.0f64, 0.0f64);
    for id in hierarchy.descendants(hierarchy.root()) {
        let (_, m) = measure_label(measurer, hierarchy.get(id).name(), text);
        let (along, across) = match orientation {
            Orientation::Horizontal => (m.width, m.height),
            Orientation::Vertical => (m.height, m.width),
        };
        text_along = text_along.max(along);
        text_across = text_across.max(across);
    }
    if text.show_text_inside_shape {
        text_along = 0.0;
    } else {
        text_along += text.text_padding;
    }

    let (shape_along, shape_across) = match orientation {
        Orientation::Horizontal => (shape_w, shape_h),
        Orientation::Vertical => (shape_h, shape_w),
    };
    let level_spacing = general
        .depth_wise_height
        .unwrap_or(DEFAULT_LEVEL_SPACING)
        .max(shape_along + text_along);
    let footprint = general
        .node_size
        .unwrap_or(0.0)
        .max(shape_across)
        .max(text_across)
        + general.node_spacing;

    ContentMetrics {
        level_spacing,
        footprint,
    }
}

/// Auto-mode drawing extent: visible depth times level spacing along the depth axis,
/// visible leaves times the leaf footprint across it.
pub fn content_extent(
    hierarchy: &Hierarchy,
    props: &TreeProperties,
    measurer: &dyn TextMeasurer,
) -> Extent {
    let metrics = content_metrics(hierarchy, props, measurer);
    let depth = hierarchy.visible_depth() as f64 * metrics.level_spacing;
    let breadth = hierarchy.visible_leaf_count().max(1) as f64 * metrics.footprint;
    match props.general.orientation {
        Orientation::Horizontal => Extent::new(depth, breadth),
        Orientation::Vertical => Extent::new(breadth, depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DeterministicTextMeasurer;
    use arbor_core::{TreeDatum, collapse};
    use std::sync::Arc;

    #[test]
    fn centering_root_at_origin_in_default_container() {
        let container = Extent::new(700.0, 700.0);
        let t = center_transform(0.0, 0.0, 1.0, container);
        assert_eq!((t.x, t.y, t.k), (350.0, 350.0, 1.0));

        let t = center_transform(100.0, 40.0, 2.0, container);
        assert_eq!((t.x, t.y), (150.0, 270.0));
        assert_eq!(t.apply((100.0, 40.0)), (350.0, 350.0));
    }

    #[test]
    fn invert_undoes_apply() {
        let t = ZoomTransform::new(12.0, -30.0, 1.5);
        let p = t.apply((8.0, 4.0));
        assert_eq!(t.invert(p), (8.0, 4.0));
        assert_eq!(t.to_svg(), "translate(12,-30) scale(1.5)");
    }

    #[test]
    fn wheel_zoom_is_anchored_and_clamped() {
        let mut zoom = ZoomBehavior::new(0.2, 3.0);
        // 500 pixels down halves the scale.
        let t = zoom
            .handle(&ZoomGesture::Wheel {
                delta_y: 500.0,
                delta_mode: DeltaMode::Pixel,
                ctrl: false,
                point: (100.0, 100.0),
            })
            .unwrap();
        assert!((t.k - 0.5).abs() < 1e-12);
        let anchored = t.apply((100.0, 100.0));
        assert!((anchored.0 - 100.0).abs() < 1e-9 && (anchored.1 - 100.0).abs() < 1e-9);

        for _ in 0..20 {
            zoom.handle(&ZoomGesture::Wheel {
                delta_y: -500.0,
                delta_mode: DeltaMode::Pixel,
                ctrl: true,
                point: (0.0, 0.0),
            });
        }
        assert_eq!(zoom.transform().k, 3.0);

        zoom.handle(&ZoomGesture::Pinch {
            scale: 0.001,
            center: (0.0, 0.0),
        });
        assert_eq!(zoom.transform().k, 0.2);
    }

    #[test]
    fn drag_pans_unless_filtered() {
        let mut zoom = ZoomBehavior::new(0.2, 3.0);
        let t = zoom.handle(&ZoomGesture::Drag {
            dx: 10.0,
            dy: -5.0,
            button: 0,
            ctrl: false,
        });
        assert_eq!(t, Some(ZoomTransform::new(10.0, -5.0, 1.0)));

        let right_button = ZoomGesture::Drag {
            dx: 10.0,
            dy: 0.0,
            button: 2,
            ctrl: false,
        };
        assert_eq!(zoom.handle(&right_button), None);
        let ctrl_drag = ZoomGesture::Drag {
            dx: 10.0,
            dy: 0.0,
            button: 0,
            ctrl: true,
        };
        assert_eq!(zoom.handle(&ctrl_drag), None);
        assert_eq!(zoom.transform(), ZoomTransform::new(10.0, -5.0, 1.0));
    }

    #[test]
    fn double_click_doubles_or_halves() {
        let mut zoom = ZoomBehavior::new(0.2, 3.0);
        zoom.handle(&ZoomGesture::DoubleClick {
            point: (50.0, 50.0),
            shift: false,
        });
        assert_eq!(zoom.transform(), ZoomTransform::new(-50.0, -50.0, 2.0));
        zoom.handle(&ZoomGesture::DoubleClick {
            point: (50.0, 50.0),
            shift: true,
        });
        assert_eq!(zoom.transform(), ZoomTransform::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn fixed_extent_subtracts_padding() {
        let general = GeneralProperties::default();
        assert_eq!(fixed_extent(&general), Extent::new(660.0, 660.0));
        assert_eq!(
            initial_transform(SizingMode::Fixed, &general),
            ZoomTransform::translate(20.0, 20.0)
        );

        let explicit = GeneralProperties {
            tree_width: Some(300.0),
            ..GeneralProperties::default()
        };
        assert_eq!(fixed_extent(&explicit).width, 300.0);
        assert_eq!(SizingMode::from_properties(&explicit), SizingMode::Fixed);
    }

    #[test]
    fn content_extent_grows_with_depth_and_leaves() {
        let data = TreeDatum::with_children(
            "Top",
            vec![
                TreeDatum::with_children("A", vec![TreeDatum::leaf("Son of A")]),
                TreeDatum::leaf("B"),
            ],
        );
        let mut h = Hierarchy::build(Arc::new(data));
        let props = TreeProperties::default();
        let m = DeterministicTextMeasurer::default();

        let metrics = content_metrics(&h, &props, &m);
        assert_eq!(metrics.level_spacing, DEFAULT_LEVEL_SPACING);
        // Circle of radius 10 beats a 14.4px label line; plus the default 10px spacing.
        assert_eq!(metrics.footprint, 30.0);

        let full = content_extent(&h, &props, &m);
        assert_eq!(full, Extent::new(240.0, 60.0));

        collapse::apply_max_depth(&mut h, 1);
        let collapsed = content_extent(&h, &props, &m);
        assert_eq!(collapsed, Extent::new(120.0, 60.0));

        let vertical = TreeProperties {
            general: GeneralProperties {
                orientation: Orientation::Vertical,
                ..GeneralProperties::default()
            },
            ..TreeProperties::default()
        };
        // Vertical: labels sit above/below, so their width ("Top", 21.6px) sets the footprint.
        let v = content_extent(&h, &vertical, &m);
        assert_eq!(v.height, 120.0);
        assert!((v.width - 2.0 * (21.6 + 10.0)).abs() < 1e-9, "{v:?}");
    }

    #[test]
    fn long_labels_widen_the_level_spacing() {
        let data = TreeDatum::with_children(
            "root",
            vec![TreeDatum::leaf("a label that is long enough to matter")],
        );
        let h = Hierarchy::build(Arc::new(data));
        let mut props = TreeProperties::default();
        props.general.depth_wise_height = Some(50.0);
        let m = DeterministicTextMeasurer::default();
        let metrics = content_metrics(&h, &props, &m);
        // 20 (shape) + 120 (truncated label) + 5 (padding) is more than 50.
        assert!(metrics.level_spacing > 50.0);
        assert!(metrics.level_spacing <= 20.0 + 120.0 + 5.0);
    }
}
