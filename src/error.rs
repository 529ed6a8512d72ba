//! Error types for the ingestion pipeline.
//!
//! A failed feed request is never collapsed into an empty result: these types
//! keep "no matches" and "source unreachable" distinguishable for callers.

use thiserror::Error;

/// Failures reaching or reading the open-data feed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("open-data feed returned status {status}")]
    Status { status: reqwest::StatusCode },

    #[error("open-data request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failures from a sync run against the feed and the local store.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("restaurant feed unavailable: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IngestError {
    /// True when the failure came from the remote feed rather than the store.
    pub fn is_source(&self) -> bool {
        matches!(self, IngestError::Source(_))
    }
}
