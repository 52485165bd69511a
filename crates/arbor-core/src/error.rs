use crate::hierarchy::NodeId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid tree properties ({field}): {message}")]
    InvalidProperties { field: String, message: String },

    #[error("Unknown node id: {0:?}")]
    UnknownNode(NodeId),

    #[error("Invalid tree data: {message}")]
    InvalidData { message: String },

    #[error("tree JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_properties(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidProperties {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
