//! Node shape renderer.

use arbor_core::{NodeState, Orientation, ShapeProperties, ShapeType, TreeDatum};
use serde::{Deserialize, Serialize};

/// Shape geometry centered on the node origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ShapeGeometry {
    Circle { r: f64 },
    Rect { width: f64, height: f64 },
}

impl ShapeGeometry {
    pub fn from_properties(props: &ShapeProperties) -> Self {
        match props.shape_type {
            ShapeType::Circle => Self::Circle {
                r: props.circle_radius,
            },
            ShapeType::Rect => Self::Rect {
                width: props.rect_width,
                height: props.rect_height,
            },
        }
    }

    pub fn size(&self) -> (f64, f64) {
        match *self {
            Self::Circle { r } => (2.0 * r, 2.0 * r),
            Self::Rect { width, height } => (width, height),
        }
    }

    /// Half of the shape's extent along the depth axis.
    pub fn half_along(&self, orientation: Orientation) -> f64 {
        let (w, h) = self.size();
        match orientation {
            Orientation::Horizontal => w / 2.0,
            Orientation::Vertical => h / 2.0,
        }
    }

    /// Whether a point relative to the node origin falls inside the shape.
    pub fn contains(&self, dx: f64, dy: f64) -> bool {
        match *self {
            Self::Circle { r } => dx * dx + dy * dy <= r * r,
            Self::Rect { width, height } => dx.abs() <= width / 2.0 && dy.abs() <= height / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeShape {
    pub geometry: ShapeGeometry,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

/// Fill follows the collapse state unless the datum carries its own color and
/// `takeColorFromData` is set; the state color then moves to the stroke.
pub fn node_shape(props: &ShapeProperties, datum: &TreeDatum, state: NodeState) -> NodeShape {
    let state_color = match state {
        NodeState::Collapsed => &props.collapsed_color,
        NodeState::Expanded | NodeState::Leaf => &props.expanded_color,
    };
    let data_color = props
        .take_color_from_data
        .then_some(datum.node_color.as_deref())
        .flatten();

    let (fill, stroke) = match data_color {
        Some(color) => (color.to_string(), state_color.clone()),
        None => (state_color.clone(), props.stroke_color.clone()),
    };

    NodeShape {
        geometry: ShapeGeometry::from_properties(props),
        fill,
        stroke,
        stroke_width: props.stroke_width,
    }
}
