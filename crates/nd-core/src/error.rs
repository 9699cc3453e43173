pub type Result<T> = std::result::Result<T, DocumentError>;

/// Failures at the document boundary. Everything inside the scene graph
/// (cycle rejection, dangling ids) is tolerated silently instead.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("scene snapshot error: {0}")]
    Snapshot(String),
}
