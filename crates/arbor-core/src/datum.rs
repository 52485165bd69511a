//! Input tree data.
//!
//! A [`TreeDatum`] is the caller-owned `{ name, children }` shape. Children are held behind
//! [`Arc`] so the hierarchy can point back at the originating datum without copying it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDatum {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Arc<TreeDatum>>>,
    #[serde(default, rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, rename = "externalURL", skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_text_color: Option<String>,
}

impl TreeDatum {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: None,
            image_url: None,
            external_url: None,
            weight: None,
            node_color: None,
            node_text_color: None,
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<TreeDatum>) -> Self {
        let mut datum = Self::leaf(name);
        datum.children = Some(children.into_iter().map(Arc::new).collect());
        datum
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let datum: Self = serde_json::from_str(text)?;
        datum.check()?;
        Ok(datum)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let datum = Self::deserialize(value)?;
        datum.check()?;
        Ok(datum)
    }

    /// Children slice; an explicit empty `children: []` reads the same as a leaf.
    pub fn child_slice(&self) -> &[Arc<TreeDatum>] {
        self.children.as_deref().unwrap_or(&[])
    }

    fn check(&self) -> Result<()> {
        let mut stack: Vec<&TreeDatum> = vec![self];
        while let Some(d) = stack.pop() {
            if let Some(w) = d.weight {
                if !(w.is_finite() && w >= 0.0) {
                    return Err(Error::InvalidData {
                        message: format!("node {:?} has an invalid weight {w}", d.name),
                    });
                }
            }
            stack.extend(d.child_slice().iter().map(Arc::as_ref));
        }
        Ok(())
    }
}
