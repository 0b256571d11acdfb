//! Graph-subsystem error types.

use std::time::Duration;

use thiserror::Error;

use sr_core::GeoPoint;

/// Failure reported by a map-data provider.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Failure reading from or writing to a graph store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors produced by `sr-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("neither a place name nor a bounding box could be resolved")]
    Unresolvable,

    #[error("map-data source failed: {0}")]
    Source(#[from] SourceError),

    #[error("map-data source timed out after {0:?}")]
    Timeout(Duration),

    #[error("graph acquisition cancelled")]
    Cancelled,

    #[error("malformed network data: {0}")]
    Malformed(String),

    #[error("edge {edge} references unknown node {node}")]
    DanglingEdge { edge: usize, node: i64 },

    #[error("graph cache error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot snap {pos} to the network: {reason}")]
    Snap { pos: GeoPoint, reason: String },
}

impl GraphError {
    /// `true` for snapping failures, `false` for every acquisition failure.
    pub fn is_snap(&self) -> bool {
        matches!(self, GraphError::Snap { .. })
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
