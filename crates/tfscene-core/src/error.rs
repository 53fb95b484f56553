//! Error types for tfscene-rs.

use thiserror::Error;

/// The main error type for tfscene-rs operations.
#[derive(Error, Debug)]
pub enum TfSceneError {
    /// A frame-bound node was created without a frame id.
    #[error("frame id must not be empty")]
    EmptyFrameId,

    /// Teardown was requested on a node that has no active subscription.
    #[error("node bound to frame '{frame_id}' has no active transform subscription")]
    NotSubscribed { frame_id: String },

    /// A serialized record is missing a field required to rebuild a node.
    #[error("scene record is missing field '{0}'")]
    MissingField(&'static str),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for tfscene-rs operations.
pub type Result<T> = std::result::Result<T, TfSceneError>;
