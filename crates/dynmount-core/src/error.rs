//! Error types for dynmount.
//!
//! Registry policy violations, lazy loading, rendering and the data-init
//! handshake all surface through [`MountError`]. Failures produced by
//! external collaborators (loaders, renderers, handshakes) are carried as
//! `anyhow::Error` sources.

use thiserror::Error;

/// Main error type for the dynmount library.
#[derive(Debug, Error)]
pub enum MountError {
    // Registry errors
    #[error("{name} is already a registered mount point, please unregister it first")]
    DuplicateMountName { name: String },

    #[error("Mount point {name} was discarded while a load was waiting for it")]
    MountPointClosed { name: String },

    // Pipeline errors
    #[error("Lazy load failed for manifest {manifest}: {source}")]
    LazyLoad {
        manifest: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to create {component} at mount point {mount}: {source}")]
    Render {
        component: String,
        mount: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Data initialization failed for {component}: {source}")]
    DataInit {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for dynmount operations.
pub type Result<T> = std::result::Result<T, MountError>;

impl From<serde_json::Error> for MountError {
    fn from(err: serde_json::Error) -> Self {
        MountError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl MountError {
    /// Check if this error comes from a registration policy violation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MountError::DuplicateMountName { .. })
    }

    /// Check if the caller may reasonably retry the failed operation.
    ///
    /// The pipeline itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MountError::LazyLoad { .. } | MountError::MountPointClosed { .. }
        )
    }
}
