//! Map-data source contract.
//!
//! The engine never talks to a map provider directly: it asks a
//! [`NetworkSource`] for the network of an [`AreaSpec`] and wraps the call in
//! [`fetch_with_timeout`] so a stalled provider surfaces as
//! [`GraphError::Timeout`] instead of a hung request.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use sr_core::{BBox, CancelToken, GeoPoint, TravelMode};

use crate::data::GraphData;
use crate::{GraphError, GraphResult, SourceError};

/// How often a waiting fetch re-checks its cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(25);

// ── Area ──────────────────────────────────────────────────────────────────────

/// The extent a network is requested for.
#[derive(Clone, Debug, PartialEq)]
pub enum AreaSpec {
    /// A named place the provider can geocode, e.g. `"Zurich, Switzerland"`.
    Place(String),
    /// A bounding box.
    BBox(BBox),
}

impl AreaSpec {
    /// The named place if one is given, otherwise the box spanning `origin`
    /// and `dest` padded by `margin_deg`.
    ///
    /// # Errors
    ///
    /// [`GraphError::Unresolvable`] if no place is given and the endpoints do
    /// not form a valid box.
    pub fn resolve(
        place: Option<&str>,
        origin: GeoPoint,
        dest: GeoPoint,
        margin_deg: f64,
    ) -> GraphResult<Self> {
        if let Some(p) = place.map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(AreaSpec::Place(p.to_owned()));
        }
        if !origin.is_valid() || !dest.is_valid() {
            return Err(GraphError::Unresolvable);
        }
        let bbox = BBox::around(origin, dest, margin_deg);
        if !bbox.is_valid() {
            return Err(GraphError::Unresolvable);
        }
        Ok(AreaSpec::BBox(bbox))
    }

    pub fn place(&self) -> Option<&str> {
        match self {
            AreaSpec::Place(p) => Some(p),
            AreaSpec::BBox(_) => None,
        }
    }

    pub fn bbox(&self) -> Option<&BBox> {
        match self {
            AreaSpec::Place(_) => None,
            AreaSpec::BBox(b) => Some(b),
        }
    }
}

impl fmt::Display for AreaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaSpec::Place(p) => write!(f, "place {p:?}"),
            AreaSpec::BBox(b) => write!(f, "bbox {b}"),
        }
    }
}

// ── NetworkSource ─────────────────────────────────────────────────────────────

/// A provider of street networks.
///
/// Implementations may block; callers bound them with [`fetch_with_timeout`].
/// Any closure `Fn(&AreaSpec, TravelMode) -> Result<GraphData, SourceError>`
/// is a `NetworkSource`.
pub trait NetworkSource: Send + Sync {
    fn fetch(&self, area: &AreaSpec, mode: TravelMode) -> Result<GraphData, SourceError>;
}

impl<F> NetworkSource for F
where
    F: Fn(&AreaSpec, TravelMode) -> Result<GraphData, SourceError> + Send + Sync,
{
    fn fetch(&self, area: &AreaSpec, mode: TravelMode) -> Result<GraphData, SourceError> {
        self(area, mode)
    }
}

/// Run `source.fetch` on a worker thread and wait at most `timeout`.
///
/// The wait also ends early when `cancel` fires.  A provider that overruns
/// is abandoned, not interrupted: its thread finishes in the background and
/// the late result is dropped.
///
/// # Errors
///
/// - [`GraphError::Timeout`] when the deadline passes first.
/// - [`GraphError::Cancelled`] when `cancel` fires first.
/// - [`GraphError::Source`] for provider failures, including a provider
///   thread that panicked.
pub fn fetch_with_timeout(
    source: &Arc<dyn NetworkSource>,
    area: &AreaSpec,
    mode: TravelMode,
    timeout: Duration,
    cancel: &CancelToken,
) -> GraphResult<GraphData> {
    if cancel.is_cancelled() {
        return Err(GraphError::Cancelled);
    }

    let (tx, rx) = mpsc::channel();
    let worker_source = Arc::clone(source);
    let worker_area = area.clone();
    thread::Builder::new()
        .name("sr-network-fetch".into())
        .spawn(move || {
            // The receiver may be gone after a timeout; nothing to do then.
            let _ = tx.send(worker_source.fetch(&worker_area, mode));
        })?;

    let started = Instant::now();
    loop {
        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            warn!("network fetch for {area} ({mode}) timed out after {timeout:?}");
            return Err(GraphError::Timeout(timeout));
        }
        match rx.recv_timeout(remaining.min(CANCEL_POLL)) {
            Ok(result) => {
                debug!("network fetch for {area} ({mode}) took {:?}", started.elapsed());
                return result.map_err(GraphError::from);
            }
            Err(RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    return Err(GraphError::Cancelled);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SourceError::Provider("provider thread exited without a result".into()).into());
            }
        }
    }
}
