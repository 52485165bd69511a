//! SVG serializer for a [`Scene`].

pub(crate) mod util;

use crate::binder::{LinkElement, NodeElement, Scene};
use crate::shape::ShapeGeometry;
use arbor_core::{ImageShape, NodeState};
use std::fmt::Write as _;
use util::{escape_xml, fmt};

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Prefix for generated element ids (image clip paths); keeps several diagrams on one
    /// page apart.
    pub diagram_id: String,
    /// Emit elements that are still fading out.
    pub include_exiting: bool,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: "arbor".to_string(),
            include_exiting: true,
        }
    }
}

fn state_class(state: NodeState) -> &'static str {
    match state {
        NodeState::Leaf => "leaf",
        NodeState::Expanded => "expanded",
        NodeState::Collapsed => "collapsed",
    }
}

pub fn render_svg(scene: &Scene, options: &SvgRenderOptions) -> String {
    let id = escape_xml(&options.diagram_id);
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" id="{id}" class="arbor" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = fmt(scene.width),
        h = fmt(scene.height),
    );

    let nodes: Vec<&NodeElement> = scene
        .nodes
        .values()
        .filter(|n| options.include_exiting || !n.exiting)
        .collect();
    let links: Vec<&LinkElement> = scene
        .links
        .values()
        .filter(|l| options.include_exiting || !l.exiting)
        .collect();

    let clipped: Vec<&NodeElement> = nodes.iter().copied().filter(|n| n.image.is_some()).collect();
    if !clipped.is_empty() {
        out.push_str("<defs>");
        for node in clipped {
            render_clip_path(&mut out, &id, node);
        }
        out.push_str("</defs>");
    }

    let _ = write!(
        out,
        r#"<g class="tree" transform="{}">"#,
        scene.transform.to_svg()
    );
    out.push_str(r#"<g class="links">"#);
    for link in links {
        render_link(&mut out, link);
    }
    out.push_str("</g>");
    out.push_str(r#"<g class="nodes">"#);
    for node in nodes {
        render_node(&mut out, &id, node);
    }
    out.push_str("</g></g></svg>");
    out
}

fn render_clip_path(out: &mut String, id: &str, node: &NodeElement) {
    let Some(image) = &node.image else {
        return;
    };
    let _ = write!(out, r#"<clipPath id="{id}-clip-{}">"#, node.render_id);
    match image.clip {
        ImageShape::Circle => {
            let (cx, cy) = image.center();
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}"/>"#,
                fmt(cx),
                fmt(cy),
                fmt(image.width.min(image.height) / 2.0)
            );
        }
        ImageShape::Rect => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
                fmt(image.x),
                fmt(image.y),
                fmt(image.width),
                fmt(image.height)
            );
        }
    }
    out.push_str("</clipPath>");
}

fn render_link(out: &mut String, link: &LinkElement) {
    let class = if link.exiting { "link exiting" } else { "link" };
    let _ = write!(
        out,
        r#"<path class="{class}" d="{}" fill="none" stroke="{}" stroke-width="{}""#,
        link.d,
        escape_xml(&link.stroke),
        fmt(link.stroke_width)
    );
    if let Some(dash) = link.dash {
        let _ = write!(
            out,
            r#" stroke-dasharray="{len} {len}" stroke-dashoffset="{}""#,
            fmt(dash.offset),
            len = fmt(dash.length),
        );
    }
    out.push_str("/>");
}

fn render_node(out: &mut String, id: &str, node: &NodeElement) {
    let _ = write!(
        out,
        r#"<g class="node {}{}" data-id="{}" data-name="{}" transform="translate({},{})""#,
        state_class(node.state),
        if node.exiting { " exiting" } else { "" },
        node.render_id,
        escape_xml(&node.name),
        fmt(node.x),
        fmt(node.y)
    );
    if node.opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, fmt(node.opacity));
    }
    out.push('>');

    let shape = &node.shape;
    let paint = format!(
        r#"fill="{}" stroke="{}" stroke-width="{}""#,
        escape_xml(&shape.fill),
        escape_xml(&shape.stroke),
        fmt(shape.stroke_width)
    );
    match shape.geometry {
        ShapeGeometry::Circle { r } => {
            let _ = write!(out, r#"<circle class="shape" r="{}" {paint}/>"#, fmt(r));
        }
        ShapeGeometry::Rect { width, height } => {
            let _ = write!(
                out,
                r#"<rect class="shape" x="{}" y="{}" width="{}" height="{}" {paint}/>"#,
                fmt(-width / 2.0),
                fmt(-height / 2.0),
                fmt(width),
                fmt(height)
            );
        }
    }

    if let Some(image) = &node.image {
        let _ = write!(
            out,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" clip-path="url(#{id}-clip-{})" preserveAspectRatio="xMidYMid slice"/>"#,
            escape_xml(&image.href),
            fmt(image.x),
            fmt(image.y),
            fmt(image.width),
            fmt(image.height),
            node.render_id
        );
    }

    let label = &node.label;
    if let (Some(bg), Some(color)) = (&label.background, &label.background_color) {
        let _ = write!(
            out,
            r#"<rect class="label-bg" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            fmt(bg.x),
            fmt(bg.y),
            fmt(bg.width),
            fmt(bg.height),
            escape_xml(color)
        );
    }
    if let Some(href) = &label.href {
        let _ = write!(
            out,
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
            escape_xml(href)
        );
    }
    let _ = write!(
        out,
        r#"<text class="label" x="{}" y="{}" text-anchor="{}" dominant-baseline="central" fill="{}" font-size="{}""#,
        fmt(label.x),
        fmt(label.y),
        label.anchor.as_svg(),
        escape_xml(&label.fill),
        fmt(label.style.font_size)
    );
    for (attr, value) in [
        ("font-family", &label.style.font_family),
        ("font-weight", &label.style.font_weight),
        ("font-style", &label.style.font_style),
    ] {
        if let Some(value) = value {
            let _ = write!(out, r#" {attr}="{}""#, escape_xml(value));
        }
    }
    out.push('>');
    out.push_str(&escape_xml(&label.text));
    out.push_str("</text>");
    if label.href.is_some() {
        out.push_str("</a>");
    }
    out.push_str("</g>");
}
