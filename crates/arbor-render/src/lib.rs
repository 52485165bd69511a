#![forbid(unsafe_code)]

//! Headless layout, interaction and SVG rendering for collapsible node-link tree diagrams.
//!
//! [`TreeDiagram::create`] turns a [`arbor_core::TreeDatum`] plus [`arbor_core::TreeProperties`]
//! into a laid-out, renderable scene; clicks, gestures and clock ticks then drive it.

pub mod binder;
pub mod diagram;
pub mod image;
pub mod label;
pub mod layout;
pub mod link;
pub mod shape;
pub mod svg;
pub mod text;
pub mod tidy;
pub mod transition;
pub mod viewport;

use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use std::sync::Arc;

pub use binder::{Join, LinkElement, NodeElement, Scene};
pub use diagram::{BulkOutcome, ClickOutcome, InteractionState, TreeDiagram};
pub use layout::{Extent, LayoutEdge, LayoutMode, PositionedNode, TreeLayout};
pub use svg::{SvgRenderOptions, render_svg};
pub use viewport::{SizingMode, ZoomBehavior, ZoomGesture, ZoomTransform};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] arbor_core::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no node named {name:?}")]
    NodeNotFound { name: String },
    #[error("node {name:?} is inside a collapsed subtree")]
    NodeNotVisible { name: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct DiagramOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
    /// Animation clock value at construction, in milliseconds.
    pub start_ms: f64,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
            start_ms: 0.0,
        }
    }
}
