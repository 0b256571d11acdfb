//! Read-through cache of materialised street graphs.
//!
//! Lookup order for `(area, mode)`:
//!
//! 1. decoded graphs already held by this process,
//! 2. the backing [`GraphStore`] (deserialise, then memoise),
//! 3. the [`NetworkSource`]: build, publish to the store, memoise.
//!
//! `force_refresh` skips 1 and 2.  A refresh replaces the memoised `Arc`;
//! requests still holding the previous graph keep using it untouched.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use log::{info, warn};
use rustc_hash::FxHashMap;

use sr_core::{CancelToken, TravelMode};

use crate::data::GraphData;
use crate::graph::StreetGraph;
use crate::source::{AreaSpec, NetworkSource, fetch_with_timeout};
use crate::store::{CacheKey, GraphStore};
use crate::GraphResult;

/// Per-call acquisition settings.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Ignore cached entries and refetch from the source.
    pub force_refresh: bool,
    /// Upper bound on one source fetch.
    pub timeout: Duration,
    pub cancel: CancelToken,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { force_refresh: false, timeout: Duration::from_secs(90), cancel: CancelToken::new() }
    }
}

pub struct GraphCache<S: GraphStore> {
    store:   S,
    decoded: RwLock<FxHashMap<CacheKey, Arc<StreetGraph>>>,
}

impl<S: GraphStore> GraphCache<S> {
    pub fn new(store: S) -> Self {
        Self { store, decoded: RwLock::new(FxHashMap::default()) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the graph for `(area, mode)`.
    ///
    /// # Errors
    ///
    /// Source failures, timeouts, cancellation, malformed provider data and
    /// store read failures all propagate.  A store *write* failure is logged
    /// and the freshly built graph is still returned.
    pub fn load_graph(
        &self,
        area: &AreaSpec,
        mode: TravelMode,
        source: &Arc<dyn NetworkSource>,
        opts: &LoadOptions,
    ) -> GraphResult<Arc<StreetGraph>> {
        let key = CacheKey::derive(area, mode);

        if !opts.force_refresh {
            if let Some(graph) = self.memoised(&key) {
                info!("graph cache hit (memory) for {area} ({mode})");
                return Ok(graph);
            }
            if let Some(blob) = self.store.get(&key)? {
                match decode(&blob) {
                    Ok(graph) => {
                        info!("graph cache hit (store) for {area} ({mode}): {graph:?}");
                        return Ok(self.memoise(key, graph));
                    }
                    Err(e) => warn!("discarding unreadable cache entry {key}: {e}"),
                }
            }
        }

        info!("fetching network for {area} ({mode}); force_refresh = {}", opts.force_refresh);
        let data = fetch_with_timeout(source, area, mode, opts.timeout, &opts.cancel)?;
        let graph = StreetGraph::from_data(data)?;

        // Persist the normalised form so a reload rebuilds the identical graph.
        match serde_json::to_vec(&graph.to_data()) {
            Ok(blob) => match self.store.put(&key, &blob) {
                Ok(()) => info!("published graph {key} for {area} ({mode}): {graph:?}"),
                Err(e) => warn!("could not persist graph {key}: {e}"),
            },
            Err(e) => warn!("could not serialise graph {key}: {e}"),
        }

        Ok(self.memoise(key, graph))
    }

    /// Drop every decoded graph held in memory.  Store entries are kept.
    pub fn clear_memory(&self) {
        self.decoded.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn memoised(&self, key: &CacheKey) -> Option<Arc<StreetGraph>> {
        let decoded = self.decoded.read().unwrap_or_else(PoisonError::into_inner);
        decoded.get(key).cloned()
    }

    fn memoise(&self, key: CacheKey, graph: StreetGraph) -> Arc<StreetGraph> {
        let graph = Arc::new(graph);
        let mut decoded = self.decoded.write().unwrap_or_else(PoisonError::into_inner);
        decoded.insert(key, Arc::clone(&graph));
        graph
    }
}

fn decode(blob: &[u8]) -> Result<StreetGraph, String> {
    let data: GraphData = serde_json::from_slice(blob).map_err(|e| e.to_string())?;
    StreetGraph::from_data(data).map_err(|e| e.to_string())
}
