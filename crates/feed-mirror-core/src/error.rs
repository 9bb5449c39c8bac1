//! Error types for the sync and search pipelines.
//!
//! Only snapshot-level failures are errors here. Per-item and per-batch
//! failures during a sync are recorded in the
//! [`SyncReport`](crate::reconcile::SyncReport) instead.

use thiserror::Error;

/// Failure reading the remote feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Transport failure, non-success status, or a feed that never ends.
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    /// The payload could not be understood as a feed page.
    #[error("malformed feed payload: {0}")]
    Parse(String),
}

impl FeedError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

/// Failure retrieving one article body. Never fatal to a sync run.
#[derive(Error, Debug)]
pub enum ContentFetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("fetching {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// A synchronization run that was aborted before any write.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("sync aborted: {0}")]
    Feed(#[from] FeedError),

    #[error("sync aborted: could not read store snapshot: {0}")]
    StoreRead(String),
}

/// The search backend could not answer.
#[derive(Error, Debug)]
#[error("search backend error: {0}")]
pub struct SearchError(pub String);
