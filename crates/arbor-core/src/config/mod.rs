//! Diagram properties.
//!
//! Every group is `#[serde(default)]`: deserializing a partial JSON object is the one-time
//! defaulting pass, and [`TreeProperties::validate`] rejects values no layout can use.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    /// Depth grows left to right.
    #[default]
    Horizontal,
    /// Depth grows top to bottom.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeType {
    #[default]
    Circle,
    #[serde(alias = "rectangle")]
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkType {
    Straight,
    #[default]
    Curved,
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageShape {
    #[default]
    Circle,
    #[serde(alias = "rectangle")]
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImagePosition {
    #[default]
    Left,
    Right,
    Top,
    Bottom,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralProperties {
    pub orientation: Orientation,
    /// Nodes at this depth or deeper start collapsed.
    pub default_max_depth: usize,
    pub container_width: f64,
    pub container_height: f64,
    /// Explicit drawing extent for fixed-extent mode; defaults to container minus padding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_height: Option<f64>,
    pub enable_zoom: bool,
    pub min_zoom_scale: f64,
    pub max_zoom_scale: f64,
    pub is_cluster_layout: bool,
    /// Spacing between depth levels in auto-extent mode. Derived from shape and label sizes
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_wise_height: Option<f64>,
    /// Minimum breadth footprint of a leaf in auto-extent mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_size: Option<f64>,
    /// Gap added to every leaf footprint in auto-extent mode.
    pub node_spacing: f64,
    pub horizontal_padding: f64,
    pub vertical_padding: f64,
    pub enable_animation: bool,
    pub animation_duration: f64,
    pub center_duration: f64,
}

impl Default for GeneralProperties {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            default_max_depth: 1,
            container_width: 700.0,
            container_height: 700.0,
            tree_width: None,
            tree_height: None,
            enable_zoom: false,
            min_zoom_scale: 0.2,
            max_zoom_scale: 3.0,
            is_cluster_layout: false,
            depth_wise_height: None,
            node_size: None,
            node_spacing: 10.0,
            horizontal_padding: 20.0,
            vertical_padding: 20.0,
            enable_animation: true,
            animation_duration: 750.0,
            center_duration: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeProperties {
    pub shape_type: ShapeType,
    pub circle_radius: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    pub expanded_color: String,
    pub collapsed_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub take_color_from_data: bool,
}

impl Default for ShapeProperties {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Circle,
            circle_radius: 10.0,
            rect_width: 20.0,
            rect_height: 20.0,
            expanded_color: "#ffffff".to_string(),
            collapsed_color: "lightsteelblue".to_string(),
            stroke_color: "steelblue".to_string(),
            stroke_width: 2.0,
            take_color_from_data: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProperties {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: String,
    pub font_style: String,
    pub foreground_color: String,
    pub show_background: bool,
    pub background_color: String,
    pub max_allowed_width: f64,
    pub show_text_inside_shape: bool,
    pub show_url_on_text: bool,
    pub text_padding: f64,
}

impl Default for TextProperties {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 12.0,
            font_weight: "normal".to_string(),
            font_style: "normal".to_string(),
            foreground_color: "#000000".to_string(),
            show_background: false,
            background_color: "#ffffff".to_string(),
            max_allowed_width: 120.0,
            show_text_inside_shape: false,
            show_url_on_text: false,
            text_padding: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProperties {
    pub show_image: bool,
    pub image_width: f64,
    pub image_height: f64,
    pub shape: ImageShape,
    pub position: ImagePosition,
    pub x_offset: f64,
    pub y_offset: f64,
    #[serde(rename = "defaultImageURL", skip_serializing_if = "Option::is_none")]
    pub default_image_url: Option<String>,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            show_image: false,
            image_width: 20.0,
            image_height: 20.0,
            shape: ImageShape::Circle,
            position: ImagePosition::Left,
            x_offset: 0.0,
            y_offset: 0.0,
            default_image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeProperties {
    pub shape_properties: ShapeProperties,
    pub text_properties: TextProperties,
    pub image_properties: ImageProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkProperties {
    pub tree_node_link_type: LinkType,
    pub stroke_color: String,
    pub stroke_width: f64,
    /// Draw-in effect on entering links (and the reverse on exit).
    pub enable_animation: bool,
    pub animation_duration: f64,
}

impl Default for LinkProperties {
    fn default() -> Self {
        Self {
            tree_node_link_type: LinkType::Curved,
            stroke_color: "#cccccc".to_string(),
            stroke_width: 1.5,
            enable_animation: false,
            animation_duration: 750.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeProperties {
    pub general: GeneralProperties,
    pub node_properties: NodeProperties,
    pub link_properties: LinkProperties,
}

impl TreeProperties {
    /// Deserializes a (possibly partial) properties object and validates the result.
    pub fn from_json(value: &Value) -> Result<Self> {
        let props = Self::deserialize(value)?;
        props.validate()?;
        Ok(props)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Returns a copy with `overrides` deep-merged on top of `self`.
    pub fn merged_with(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge_value(&mut base, overrides);
        Self::from_json(&base)
    }

    pub fn validate(&self) -> Result<()> {
        let g = &self.general;
        if !(g.min_zoom_scale.is_finite() && g.min_zoom_scale > 0.0) {
            return Err(Error::invalid_properties(
                "general.minZoomScale",
                format!("must be a positive number, got {}", g.min_zoom_scale),
            ));
        }
        if !(g.max_zoom_scale.is_finite() && g.max_zoom_scale >= g.min_zoom_scale) {
            return Err(Error::invalid_properties(
                "general.maxZoomScale",
                format!(
                    "must be a number >= minZoomScale ({}), got {}",
                    g.min_zoom_scale, g.max_zoom_scale
                ),
            ));
        }

        let shape = &self.node_properties.shape_properties;
        let text = &self.node_properties.text_properties;
        let image = &self.node_properties.image_properties;
        let link = &self.link_properties;

        let non_negative = [
            ("general.containerWidth", g.container_width),
            ("general.containerHeight", g.container_height),
            ("general.nodeSpacing", g.node_spacing),
            ("general.horizontalPadding", g.horizontal_padding),
            ("general.verticalPadding", g.vertical_padding),
            ("general.animationDuration", g.animation_duration),
            ("general.centerDuration", g.center_duration),
            ("nodeProperties.shapeProperties.circleRadius", shape.circle_radius),
            ("nodeProperties.shapeProperties.rectWidth", shape.rect_width),
            ("nodeProperties.shapeProperties.rectHeight", shape.rect_height),
            ("nodeProperties.shapeProperties.strokeWidth", shape.stroke_width),
            ("nodeProperties.textProperties.textPadding", text.text_padding),
            ("nodeProperties.imageProperties.imageWidth", image.image_width),
            ("nodeProperties.imageProperties.imageHeight", image.image_height),
            ("linkProperties.strokeWidth", link.stroke_width),
            ("linkProperties.animationDuration", link.animation_duration),
        ];
        for (field, v) in non_negative {
            check_non_negative(field, v)?;
        }
        for (field, v) in [
            ("general.treeWidth", g.tree_width),
            ("general.treeHeight", g.tree_height),
            ("general.depthWiseHeight", g.depth_wise_height),
            ("general.nodeSize", g.node_size),
        ] {
            if let Some(v) = v {
                check_non_negative(field, v)?;
            }
        }

        if !(text.font_size.is_finite() && text.font_size > 0.0) {
            return Err(Error::invalid_properties(
                "nodeProperties.textProperties.fontSize",
                format!("must be a positive number, got {}", text.font_size),
            ));
        }
        if !(text.max_allowed_width.is_finite() && text.max_allowed_width > 0.0) {
            return Err(Error::invalid_properties(
                "nodeProperties.textProperties.maxAllowedWidth",
                format!("must be a positive number, got {}", text.max_allowed_width),
            ));
        }
        for (field, v) in [
            ("nodeProperties.imageProperties.xOffset", image.x_offset),
            ("nodeProperties.imageProperties.yOffset", image.y_offset),
        ] {
            if !v.is_finite() {
                return Err(Error::invalid_properties(field, "must be finite"));
            }
        }
        Ok(())
    }
}

fn check_non_negative(field: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_properties(
            field,
            format!("must be a non-negative number, got {v}"),
        ))
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, Value::Null) if base_slot.is_object() => {
            *base_slot = Value::Object(Map::new());
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
