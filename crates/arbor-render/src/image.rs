//! Optional per-node image overlay.

use crate::shape::ShapeGeometry;
use arbor_core::{ImagePosition, ImageProperties, ImageShape, TreeDatum};
use serde::{Deserialize, Serialize};

/// Image placement relative to the node origin; `(x, y)` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeImage {
    pub href: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub clip: ImageShape,
}

impl NodeImage {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// `None` when images are off or neither the datum nor the defaults name one.
pub fn node_image(
    props: &ImageProperties,
    shape: &ShapeGeometry,
    datum: &TreeDatum,
) -> Option<NodeImage> {
    if !props.show_image {
        return None;
    }
    let href = datum
        .image_url
        .as_deref()
        .or(props.default_image_url.as_deref())
        .filter(|u| !u.trim().is_empty())?;

    let (iw, ih) = (props.image_width, props.image_height);
    let (sw, sh) = shape.size();
    let (x, y) = match props.position {
        ImagePosition::Center => (-iw / 2.0, -ih / 2.0),
        ImagePosition::Left => (-sw / 2.0 - iw, -ih / 2.0),
        ImagePosition::Right => (sw / 2.0, -ih / 2.0),
        ImagePosition::Top => (-iw / 2.0, -sh / 2.0 - ih),
        ImagePosition::Bottom => (-iw / 2.0, sh / 2.0),
    };

    Some(NodeImage {
        href: href.to_string(),
        x: x + props.x_offset,
        y: y + props.y_offset,
        width: iw,
        height: ih,
        clip: props.shape,
    })
}
