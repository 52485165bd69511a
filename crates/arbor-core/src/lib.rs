#![forbid(unsafe_code)]

//! Tree data model for interactive node-link diagrams (headless).
//!
//! - [`TreeDatum`]: caller-owned `{ name, children }` input
//! - [`TreeProperties`]: nested, fully-defaulted diagram configuration
//! - [`Hierarchy`]: arena of nodes with depth/height and reversible expand/collapse state
//! - [`collapse`]: initial max-depth collapse and per-node toggling

pub mod collapse;
pub mod config;
pub mod datum;
pub mod error;
pub mod hierarchy;
pub mod ids;

pub use collapse::Toggle;
pub use config::{
    GeneralProperties, ImagePosition, ImageProperties, ImageShape, LinkProperties, LinkType,
    NodeProperties, Orientation, ShapeProperties, ShapeType, TextProperties, TreeProperties,
};
pub use datum::TreeDatum;
pub use error::{Error, Result};
pub use hierarchy::{Ancestors, Hierarchy, HierarchyNode, NodeId, NodeState, Visibility};
pub use ids::{IdAllocator, RenderId};

#[cfg(test)]
mod tests;
