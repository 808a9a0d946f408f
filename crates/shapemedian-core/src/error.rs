//! Error taxonomy for distance fetching and refresh cycles.

use std::time::Duration;

use crate::shape::ShapeKind;

/// A single distance sample could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The source failed in a way that may succeed on retry.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// The source returned a value that is not a usable distance.
    #[error("malformed distance: {0}")]
    Malformed(f64),

    /// A scripted source ran out of queued distances.
    #[error("distance source exhausted")]
    Exhausted,
}

impl FetchError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// A refresh cycle did not produce results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefreshError {
    /// One sample failed; the whole cycle was aborted.
    #[error("sample for {shape} failed: {source}")]
    Fetch {
        shape: ShapeKind,
        #[source]
        source: FetchError,
    },

    /// The grand join did not complete within the configured timeout.
    #[error("refresh cycle timed out after {0:?}")]
    Timeout(Duration),

    /// Another cycle is already in flight on the same pipeline.
    #[error("a refresh cycle is already in progress")]
    InProgress,

    /// The cycle was superseded before completing.
    #[error("refresh cycle cancelled")]
    Cancelled,
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("distance range {min}..={max} is empty")]
    DistanceRange { min: u32, max: u32 },

    #[error("delay range {min:?}..{max:?} is empty")]
    DelayRange { min: Duration, max: Duration },

    #[error("no shapes selected")]
    NoShapes,

    #[error("unknown shape: {0}")]
    UnknownShape(String),
}
