use quill_core::errors::{ApiError, ExtensionError};
use quill_store::StoreError;

/// Failure inside a single dispatcher reaction. Logged, never propagated
/// past the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("extension error: {0}")]
    Extension(#[from] ExtensionError),
}

/// Failure that stops the boot sequence before it reaches `Ready`.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("configuration fetch failed: {0}")]
    Config(ApiError),

    #[error("language fetch failed: {0}")]
    Languages(ApiError),

    #[error("local storage restore failed: {0}")]
    Restore(StoreError),

    #[error("boot task panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}
