//! Version-keyed snapshots of point indices.
//!
//! A [`VersionedIndex`] is a read-through cache in front of an
//! [`IndexSource`].  Every [`get`](VersionedIndex::get) asks the source for
//! its current [`Version`]; when it matches the cached snapshot the shared
//! `Arc<PointIndex>` is returned, otherwise the feed is reloaded and the new
//! snapshot swapped in.  Readers holding an older `Arc` keep a consistent
//! view; snapshots are never mutated in place.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::UNIX_EPOCH;

use log::info;

use crate::feed::{FeedSchema, load_points};
use crate::index::PointIndex;
use crate::point::InfluencePoint;
use crate::IndexResult;

// ── Sources ───────────────────────────────────────────────────────────────────

/// Opaque token identifying one state of a backing source.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Version {
    pub stamp: u128,
    pub len:   u64,
}

/// Backing store of a point feed.
pub trait IndexSource: Send + Sync {
    /// Current version, or `None` if the source does not exist (an absent
    /// feed is an empty feed, not an error).
    fn version(&self) -> IndexResult<Option<Version>>;

    /// Read every point.  Only called when `version` returned `Some`.
    fn load(&self) -> IndexResult<Vec<InfluencePoint>>;

    /// Short label for log lines.
    fn describe(&self) -> String;
}

impl<S: IndexSource + ?Sized> IndexSource for Box<S> {
    fn version(&self) -> IndexResult<Option<Version>> {
        (**self).version()
    }

    fn load(&self) -> IndexResult<Vec<InfluencePoint>> {
        (**self).load()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: IndexSource + ?Sized> IndexSource for Arc<S> {
    fn version(&self) -> IndexResult<Option<Version>> {
        (**self).version()
    }

    fn load(&self) -> IndexResult<Vec<InfluencePoint>> {
        (**self).load()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// A GeoJSON or CSV file, versioned by modification time and size.
#[derive(Clone, Debug)]
pub struct FeedFile {
    path:   PathBuf,
    schema: FeedSchema,
}

impl FeedFile {
    /// A [`PointKind`](crate::PointKind) selects that kind's default schema.
    pub fn new(path: impl Into<PathBuf>, schema: impl Into<FeedSchema>) -> Self {
        Self { path: path.into(), schema: schema.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> FeedSchema {
        self.schema
    }
}

impl IndexSource for FeedFile {
    fn version(&self) -> IndexResult<Option<Version>> {
        let meta = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stamp = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Ok(Some(Version { stamp, len: meta.len() }))
    }

    fn load(&self) -> IndexResult<Vec<InfluencePoint>> {
        load_points(&self.path, self.schema)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process feed whose version bumps on every [`replace`](Self::replace).
pub struct MemoryFeed {
    label:   String,
    points:  RwLock<Arc<Vec<InfluencePoint>>>,
    version: AtomicU64,
}

impl MemoryFeed {
    pub fn new(label: impl Into<String>, points: Vec<InfluencePoint>) -> Self {
        Self {
            label:   label.into(),
            points:  RwLock::new(Arc::new(points)),
            version: AtomicU64::new(1),
        }
    }

    pub fn replace(&self, points: Vec<InfluencePoint>) {
        let mut guard = self.points.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(points);
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

impl IndexSource for MemoryFeed {
    fn version(&self) -> IndexResult<Option<Version>> {
        Ok(Some(Version { stamp: self.version.load(Ordering::Acquire) as u128, len: 0 }))
    }

    fn load(&self) -> IndexResult<Vec<InfluencePoint>> {
        let guard = self.points.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.as_ref().clone())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

// ── VersionedIndex ────────────────────────────────────────────────────────────

struct Snapshot {
    version: Option<Version>,
    index:   Arc<PointIndex>,
}

/// Read-through, version-keyed cache of one feed's [`PointIndex`].
pub struct VersionedIndex<S: IndexSource> {
    source:  S,
    current: RwLock<Option<Snapshot>>,
    /// Serialises rebuilds so concurrent misses load the feed once.
    rebuild: Mutex<()>,
}

impl<S: IndexSource> VersionedIndex<S> {
    pub fn new(source: S) -> Self {
        Self { source, current: RwLock::new(None), rebuild: Mutex::new(()) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current snapshot, rebuilding it first if the source changed.
    pub fn get(&self) -> IndexResult<Arc<PointIndex>> {
        let version = self.source.version()?;
        if let Some(index) = self.cached(version) {
            return Ok(index);
        }

        let _guard = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have finished the same rebuild while we waited.
        if let Some(index) = self.cached(version) {
            return Ok(index);
        }

        let index = match version {
            None => Arc::new(PointIndex::empty()),
            Some(_) => Arc::new(PointIndex::new(self.source.load()?)),
        };
        info!(
            "point index {} rebuilt: {} points (version {:?})",
            self.source.describe(),
            index.len(),
            version,
        );

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Snapshot { version, index: Arc::clone(&index) });
        Ok(index)
    }

    /// Drop the cached snapshot; the next `get` reloads unconditionally.
    pub fn invalidate(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = None;
    }

    fn cached(&self, version: Option<Version>) -> Option<Arc<PointIndex>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current
            .as_ref()
            .filter(|s| s.version == version)
            .map(|s| Arc::clone(&s.index))
    }
}
