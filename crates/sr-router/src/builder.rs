//! Fluent builder for constructing a [`RoutingEngine`].

use std::sync::Arc;

use sr_graph::{FileGraphStore, GraphCache, GraphStore, MemoryGraphStore, NetworkSource};
use sr_index::{FeedFile, FeedSchema, IndexSource, PointKind, VersionedIndex};

use crate::config::RouterConfig;
use crate::engine::RoutingEngine;
use crate::search::{AStar, PathFinder};

/// Fluent builder for [`RoutingEngine`].
///
/// # Required inputs
///
/// - [`RouterConfig`]: margins, timeouts, safety constants, feed paths
/// - `Arc<dyn NetworkSource>`: where street networks come from
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                                             |
/// |----------------------|-----------------------------------------------------|
/// | `.store(s)`          | `FileGraphStore` in `cache_dir`, else in memory     |
/// | `.lighting(src)`     | `FeedFile` at `lighting_feed`, else no lighting     |
/// | `.hazard_feed(src)`  | `FeedFile` per `*_feeds` path (added first)         |
/// | `.path_finder(f)`    | [`AStar`]                                           |
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new(RouterConfig::default(), source)
///     .lighting(FeedFile::new("lighting.geojson", PointKind::Lighting))
///     .build();
/// let route = engine.route(&request, &CancelToken::new())?;
/// ```
pub struct EngineBuilder {
    config:   RouterConfig,
    source:   Arc<dyn NetworkSource>,
    store:    Option<Box<dyn GraphStore>>,
    lighting: Option<Box<dyn IndexSource>>,
    hazards:  Vec<Box<dyn IndexSource>>,
    finder:   Option<Box<dyn PathFinder>>,
}

impl EngineBuilder {
    pub fn new(config: RouterConfig, source: Arc<dyn NetworkSource>) -> Self {
        Self { config, source, store: None, lighting: None, hazards: Vec::new(), finder: None }
    }

    /// Graph store backing the cache.
    pub fn store(mut self, store: impl GraphStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Lighting feed, replacing `config.lighting_feed`.
    pub fn lighting(mut self, source: impl IndexSource + 'static) -> Self {
        self.lighting = Some(Box::new(source));
        self
    }

    /// Additional hazard feed.
    pub fn hazard_feed(mut self, source: impl IndexSource + 'static) -> Self {
        self.hazards.push(Box::new(source));
        self
    }

    pub fn path_finder(mut self, finder: impl PathFinder + 'static) -> Self {
        self.finder = Some(Box::new(finder));
        self
    }

    pub fn build(self) -> RoutingEngine {
        let store: Box<dyn GraphStore> = match (self.store, &self.config.cache_dir) {
            (Some(s), _) => s,
            (None, Some(dir)) => Box::new(FileGraphStore::new(dir.clone())),
            (None, None) => Box::new(MemoryGraphStore::new()),
        };

        let lighting = self
            .lighting
            .or_else(|| {
                self.config
                    .lighting_feed
                    .as_ref()
                    .map(|p| Box::new(FeedFile::new(p.clone(), PointKind::Lighting)) as Box<dyn IndexSource>)
            })
            .map(VersionedIndex::new);

        let pedestrian = self.config.pedestrian_feeds.iter().map(|p| (p, FeedSchema::pedestrian_flow()));
        let reported = self.config.hazard_feeds.iter().map(|p| (p, FeedSchema::reported_hazards()));
        let hazards = pedestrian
            .chain(reported)
            .map(|(p, schema)| Box::new(FeedFile::new(p.clone(), schema)) as Box<dyn IndexSource>)
            .chain(self.hazards)
            .map(VersionedIndex::new)
            .collect();

        RoutingEngine {
            source: self.source,
            graphs: GraphCache::new(store),
            lighting,
            hazards,
            finder: self.finder.unwrap_or_else(|| Box::new(AStar)),
            config: self.config,
        }
    }
}
