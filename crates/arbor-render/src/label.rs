//! Node label renderer: truncation, placement, optional background and hyperlink.

use crate::shape::ShapeGeometry;
use crate::text::{TextMeasurer, TextMetrics, TextStyle, truncate_to_width};
use arbor_core::{NodeState, Orientation, TextProperties, TreeDatum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Label geometry relative to the node origin. `y` is the vertical center of the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub anchor: TextAnchor,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub style: TextStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<LabelBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Display text and its metrics. Labels drawn outside the shape are cut to
/// `maxAllowedWidth`; labels inside the shape are kept whole.
pub fn measure_label(
    measurer: &dyn TextMeasurer,
    name: &str,
    props: &TextProperties,
) -> (String, TextMetrics) {
    let style = TextStyle::from_properties(props);
    let text = if props.show_text_inside_shape {
        name.to_string()
    } else {
        truncate_to_width(measurer, name, &style, props.max_allowed_width)
    };
    let metrics = measurer.measure(&text, &style);
    (text, metrics)
}

/// Lays the label on the outward side of the node: before the shape for expanded nodes,
/// after it for leaves and collapsed nodes (above/below in vertical orientation).
pub fn node_label(
    measurer: &dyn TextMeasurer,
    datum: &TreeDatum,
    state: NodeState,
    shape: &ShapeGeometry,
    props: &TextProperties,
    orientation: Orientation,
) -> NodeLabel {
    let (text, metrics) = measure_label(measurer, &datum.name, props);
    let (w, h) = (metrics.width, metrics.height);
    let (shape_w, shape_h) = shape.size();
    let pad = props.text_padding;
    let before = state == NodeState::Expanded;

    let (x, y, anchor) = if props.show_text_inside_shape {
        (0.0, 0.0, TextAnchor::Middle)
    } else {
        match orientation {
            Orientation::Horizontal if before => (-(shape_w / 2.0 + pad), 0.0, TextAnchor::End),
            Orientation::Horizontal => (shape_w / 2.0 + pad, 0.0, TextAnchor::Start),
            Orientation::Vertical if before => {
                (0.0, -(shape_h / 2.0 + pad + h / 2.0), TextAnchor::Middle)
            }
            Orientation::Vertical => (0.0, shape_h / 2.0 + pad + h / 2.0, TextAnchor::Middle),
        }
    };

    let left = match anchor {
        TextAnchor::Start => x,
        TextAnchor::Middle => x - w / 2.0,
        TextAnchor::End => x - w,
    };
    let background = props.show_background.then(|| {
        let inset = pad / 2.0;
        LabelBox {
            x: left - inset,
            y: y - h / 2.0 - inset,
            width: w + pad,
            height: h + pad,
        }
    });

    let href = if props.show_url_on_text {
        datum.external_url.clone()
    } else {
        None
    };

    NodeLabel {
        text,
        x,
        y,
        anchor,
        width: w,
        height: h,
        fill: datum
            .node_text_color
            .clone()
            .unwrap_or_else(|| props.foreground_color.clone()),
        style: TextStyle::from_properties(props),
        background_color: background.map(|_| props.background_color.clone()),
        background,
        href,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{DeterministicTextMeasurer, ELLIPSIS};

    fn props() -> TextProperties {
        TextProperties {
            font_size: 10.0,
            max_allowed_width: 60.0,
            ..TextProperties::default()
        }
    }

    fn circle() -> ShapeGeometry {
        ShapeGeometry::Circle { r: 10.0 }
    }

    #[test]
    fn horizontal_placement_depends_on_expansion() {
        let m = DeterministicTextMeasurer::default();
        let datum = TreeDatum::leaf("abc");
        let expanded = node_label(
            &m,
            &datum,
            NodeState::Expanded,
            &circle(),
            &props(),
            Orientation::Horizontal,
        );
        assert_eq!((expanded.x, expanded.y), (-15.0, 0.0));
        assert_eq!(expanded.anchor, TextAnchor::End);

        for state in [NodeState::Collapsed, NodeState::Leaf] {
            let label = node_label(
                &m,
                &datum,
                state,
                &circle(),
                &props(),
                Orientation::Horizontal,
            );
            assert_eq!((label.x, label.y), (15.0, 0.0));
            assert_eq!(label.anchor, TextAnchor::Start);
        }
    }

    #[test]
    fn vertical_placement_is_above_or_below() {
        let m = DeterministicTextMeasurer::default();
        let datum = TreeDatum::leaf("abc");
        let above = node_label(
            &m,
            &datum,
            NodeState::Expanded,
            &circle(),
            &props(),
            Orientation::Vertical,
        );
        // 10 (radius) + 5 (padding) + 6 (half of a 12px line).
        assert_eq!(above.y, -21.0);
        assert_eq!(above.anchor, TextAnchor::Middle);
        let below = node_label(
            &m,
            &datum,
            NodeState::Leaf,
            &circle(),
            &props(),
            Orientation::Vertical,
        );
        assert_eq!(below.y, 21.0);
    }

    #[test]
    fn outside_labels_are_truncated_inside_labels_are_not() {
        let m = DeterministicTextMeasurer::default();
        let datum = TreeDatum::leaf("abcdefghijkl");
        let outside = node_label(
            &m,
            &datum,
            NodeState::Leaf,
            &circle(),
            &props(),
            Orientation::Horizontal,
        );
        assert_eq!(outside.text, "abcdefg...");
        assert!(outside.text.ends_with(ELLIPSIS));
        assert!(outside.width <= 60.0);

        let inside_props = TextProperties {
            show_text_inside_shape: true,
            ..props()
        };
        let inside = node_label(
            &m,
            &datum,
            NodeState::Leaf,
            &circle(),
            &inside_props,
            Orientation::Horizontal,
        );
        assert_eq!(inside.text, "abcdefghijkl");
        assert_eq!((inside.x, inside.y, inside.anchor), (0.0, 0.0, TextAnchor::Middle));
    }

    #[test]
    fn background_pads_the_measured_box() {
        let m = DeterministicTextMeasurer::default();
        let with_bg = TextProperties {
            show_background: true,
            background_color: "#eeeeee".to_string(),
            ..props()
        };
        let label = node_label(
            &m,
            &TreeDatum::leaf("abcd"),
            NodeState::Leaf,
            &circle(),
            &with_bg,
            Orientation::Horizontal,
        );
        let bg = label.background.unwrap();
        assert_eq!(bg.x, 15.0 - 2.5);
        assert_eq!(bg.width, 24.0 + 5.0);
        assert_eq!(bg.height, 12.0 + 5.0);
        assert_eq!(bg.y, -6.0 - 2.5);
        assert_eq!(label.background_color.as_deref(), Some("#eeeeee"));
    }

    #[test]
    fn text_color_and_link_come_from_the_datum() {
        let m = DeterministicTextMeasurer::default();
        let mut datum = TreeDatum::leaf("docs");
        datum.node_text_color = Some("#123456".to_string());
        datum.external_url = Some("https://example.com/docs".to_string());

        let plain = node_label(
            &m,
            &datum,
            NodeState::Leaf,
            &circle(),
            &props(),
            Orientation::Horizontal,
        );
        assert_eq!(plain.fill, "#123456");
        assert_eq!(plain.href, None);

        let linked_props = TextProperties {
            show_url_on_text: true,
            ..props()
        };
        let linked = node_label(
            &m,
            &datum,
            NodeState::Leaf,
            &circle(),
            &linked_props,
            Orientation::Horizontal,
        );
        assert_eq!(linked.href.as_deref(), Some("https://example.com/docs"));

        let default_color = node_label(
            &m,
            &TreeDatum::leaf("x"),
            NodeState::Leaf,
            &circle(),
            &props(),
            Orientation::Horizontal,
        );
        assert_eq!(default_color.fill, "#000000");
    }
}
