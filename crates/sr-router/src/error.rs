//! Router error type and its mapping onto boundary failure categories.

use std::fmt;

use thiserror::Error;

use sr_core::{CoreError, NodeId};
use sr_graph::GraphError;

/// Which request endpoint a snap failure concerns.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endpoint {
    Origin,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Origin      => "origin",
            Endpoint::Destination => "destination",
        })
    }
}

/// Failure category seen by whoever serves route requests.
///
/// | Kind          | Typical transport mapping |
/// |---------------|---------------------------|
/// | `CallerInput` | 4xx (bad request, unsnappable point) |
/// | `NotFound`    | 404 (no path)             |
/// | `Unavailable` | 5xx (network source down, timeout, cancelled) |
/// | `Internal`    | 500 (search invariant violated) |
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FailureKind {
    CallerInput,
    NotFound,
    Unavailable,
    Internal,
}

/// Errors produced by `sr-router`.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("area network unavailable: {0}")]
    GraphAcquisition(#[source] GraphError),

    #[error("could not locate {endpoint} on network: {source}")]
    Snap {
        endpoint: Endpoint,
        #[source]
        source:   GraphError,
    },

    #[error("no path from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("internal routing failure: {0}")]
    Search(String),

    #[error("route request cancelled")]
    Cancelled,
}

impl RouteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RouteError::InvalidRequest(_) | RouteError::Snap { .. } => FailureKind::CallerInput,
            RouteError::NoRoute { .. } => FailureKind::NotFound,
            RouteError::GraphAcquisition(_) | RouteError::Cancelled => FailureKind::Unavailable,
            RouteError::Search(_) => FailureKind::Internal,
        }
    }

    /// Short, stable message safe to show to an end user.
    pub fn boundary_message(&self) -> &'static str {
        match self {
            RouteError::InvalidRequest(_)   => "invalid route request",
            RouteError::GraphAcquisition(_) => "area network unavailable",
            RouteError::Snap { .. }         => "could not locate point on network",
            RouteError::NoRoute { .. }      => "no path exists between points",
            RouteError::Search(_)           => "internal routing failure",
            RouteError::Cancelled           => "request cancelled",
        }
    }

    /// Attach a graph-layer failure to the endpoint being snapped.
    pub(crate) fn snap(endpoint: Endpoint, source: GraphError) -> Self {
        match source {
            GraphError::Cancelled => RouteError::Cancelled,
            source => RouteError::Snap { endpoint, source },
        }
    }
}

impl From<GraphError> for RouteError {
    /// Graph acquisition failures.  Snap failures go through
    /// [`RouteError::snap`] so the endpoint is recorded.
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::Cancelled => RouteError::Cancelled,
            e => RouteError::GraphAcquisition(e),
        }
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
