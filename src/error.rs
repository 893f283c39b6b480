use thiserror::Error;

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

/// Everything that can stop the renderer.
///
/// The first four variants are startup failures; none of them is retried.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("display connection failed: {0}")]
    Connection(String),
    #[error("monitor enumeration failed: {0}")]
    Enumeration(String),
    #[error("rendering capability missing: {0}")]
    Capability(String),
    #[error("resource creation refused: {0}")]
    ResourceCreation(String),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),
    #[error("surface failure: {0}")]
    Surface(String),
}
