//! Error taxonomy for the synchronizer.
//!
//! Only [`SyncError::Config`] is fail-fast; everything else is caught at the
//! item level by the callers and accumulated into the run's result sets.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing/unreadable source file, missing token, malformed defaults.
    /// Aborts the run before any remote call.
    #[error("config error: {0}")]
    Config(String),
    /// Transport-level failure of a single remote call.
    #[error("remote error: {0}")]
    Remote(String),
    /// Malformed remote payload or cache row.
    #[error("parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The service acknowledged a mutation but returned an empty result,
    /// typically because the revision token went stale.
    #[error("mutation rejected: {0}")]
    MutationRejected(String),
}

impl From<ureq::Error> for SyncError {
    fn from(e: ureq::Error) -> Self {
        SyncError::Remote(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Parse(e.to_string())
    }
}
