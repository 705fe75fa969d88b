//! Navigation Errors
//!
//! Synchronous failures of the binder, split by cause so callers can branch.

/// Broad cause of a [`NavError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller misused the binder (missing init, blank id)
    Configuration,
    /// A page id was not found in the registry
    Lookup,
    /// The page's render callback failed
    Render,
    /// The host history bridge could not be updated
    Host,
}

/// Binder error
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Binder is not initialized, call init() with a home page first")]
    NotInitialized,

    #[error("Page id is missing or blank")]
    BlankPageId,

    #[error("Page '{0}' not found in binder")]
    PageNotFound(String),

    #[error("Page '{page}' failed to render: {source}")]
    Render {
        page: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Host history state error: {0}")]
    HostState(#[from] serde_json::Error),
}

impl NavError {
    /// Get the broad cause of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavError::NotInitialized | NavError::BlankPageId => ErrorKind::Configuration,
            NavError::PageNotFound(_) => ErrorKind::Lookup,
            NavError::Render { .. } => ErrorKind::Render,
            NavError::HostState(_) => ErrorKind::Host,
        }
    }
}
