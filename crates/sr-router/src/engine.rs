//! Request-level orchestration: area → graph → snap → cost → search → route.

use std::sync::Arc;

use log::{error, info, warn};

use sr_core::CancelToken;
use sr_graph::{AreaSpec, GraphCache, GraphStore, LoadOptions, NetworkSource, StreetGraph};
use sr_index::{IndexSource, InfluencePoint, PointIndex, VersionedIndex};

use crate::assemble::{Route, assemble};
use crate::config::RouterConfig;
use crate::cost::CostModel;
use crate::error::{Endpoint, RouteError, RouteResult};
use crate::policy::RoutePolicy;
use crate::request::RouteRequest;
use crate::search::{PathFinder, PathSearch};

/// Serves route requests against cached graphs and versioned point indices.
///
/// Requests share nothing mutable: the engine only hands out `Arc`s of
/// immutable graphs and index snapshots, so `route` may be called from many
/// threads at once.  Build one with [`EngineBuilder`](crate::EngineBuilder).
pub struct RoutingEngine {
    pub(crate) config:   RouterConfig,
    pub(crate) source:   Arc<dyn NetworkSource>,
    pub(crate) graphs:   GraphCache<Box<dyn GraphStore>>,
    pub(crate) lighting: Option<VersionedIndex<Box<dyn IndexSource>>>,
    pub(crate) hazards:  Vec<VersionedIndex<Box<dyn IndexSource>>>,
    pub(crate) finder:   Box<dyn PathFinder>,
}

impl RoutingEngine {
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn graph_cache(&self) -> &GraphCache<Box<dyn GraphStore>> {
        &self.graphs
    }

    /// Compute one route.
    ///
    /// # Errors
    ///
    /// See [`RouteError`]; [`RouteError::kind`] gives the boundary category.
    pub fn route(&self, req: &RouteRequest, cancel: &CancelToken) -> RouteResult<Route> {
        req.validate()?;
        let (origin, dest) = (req.origin(), req.dest());

        let area = AreaSpec::resolve(req.place.as_deref(), origin, dest, self.config.bbox_margin_deg)?;
        let opts = LoadOptions {
            force_refresh: req.force_refresh,
            timeout:       self.config.fetch_timeout(),
            cancel:        cancel.clone(),
        };
        let graph = self.graphs.load_graph(&area, req.mode, &self.source, &opts)?;

        let from = graph.snap_to_node(origin).map_err(|e| RouteError::snap(Endpoint::Origin, e))?;
        let to = graph.snap_to_node(dest).map_err(|e| RouteError::snap(Endpoint::Destination, e))?;

        let policy = RoutePolicy::from_preference(req.route_preference, &self.config.safety);
        let (lights, hazards) = match policy {
            RoutePolicy::Shortest => (Arc::new(PointIndex::empty()), Arc::new(PointIndex::empty())),
            RoutePolicy::Safest(_) => {
                let extra: Vec<InfluencePoint> =
                    req.extra_hazard_points.iter().map(|h| h.to_point()).collect();
                (self.lighting_index(), self.hazard_index(&extra))
            }
        };
        let model = CostModel::new(&policy, &lights, &hazards);
        if matches!(policy, RoutePolicy::Safest(_)) && model.is_length_only() {
            warn!("no lighting data available; safe route for {area} falls back to length");
        }

        let path = self.search(&graph, &model, from, to, cancel)?;
        let route = assemble(&graph, &path).inspect_err(|e| error!("route assembly aborted: {e}"))?;
        info!(
            "{} route over {area} ({}): {} steps, {:.1} m, cost {:.3}",
            req.route_preference,
            req.mode,
            route.steps.len(),
            route.distance_m,
            route.cost,
        );
        Ok(route)
    }

    /// Route independent requests.  With the `parallel` feature they run on
    /// Rayon's thread pool; results keep the order of `reqs`.
    pub fn route_batch(&self, reqs: &[RouteRequest], cancel: &CancelToken) -> Vec<RouteResult<Route>> {
        #[cfg(not(feature = "parallel"))]
        {
            reqs.iter().map(|r| self.route(r, cancel)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            reqs.par_iter().map(|r| self.route(r, cancel)).collect()
        }
    }

    fn search(
        &self,
        graph:  &StreetGraph,
        model:  &CostModel<'_>,
        from:   sr_core::NodeId,
        to:     sr_core::NodeId,
        cancel: &CancelToken,
    ) -> RouteResult<PathSearch> {
        self.finder.find_path(graph, model, from, to, cancel).inspect_err(|e| {
            if let RouteError::Search(_) = e {
                error!("route search aborted: {e}");
            }
        })
    }

    /// Current lighting snapshot.  Missing or unreadable feeds give an empty
    /// index, which makes the safest policy fall back to length.
    fn lighting_index(&self) -> Arc<PointIndex> {
        let Some(feed) = &self.lighting else {
            return Arc::new(PointIndex::empty());
        };
        feed.get().unwrap_or_else(|e| {
            warn!("lighting feed {} unavailable: {e}", feed.source().describe());
            Arc::new(PointIndex::empty())
        })
    }

    /// Union of every readable hazard feed and the request's ad hoc points.
    fn hazard_index(&self, extra: &[InfluencePoint]) -> Arc<PointIndex> {
        let parts: Vec<Arc<PointIndex>> = self
            .hazards
            .iter()
            .filter_map(|feed| {
                feed.get()
                    .inspect_err(|e| warn!("hazard feed {} skipped: {e}", feed.source().describe()))
                    .ok()
            })
            .collect();

        match (parts.as_slice(), extra) {
            ([], []) => Arc::new(PointIndex::empty()),
            ([only], []) => Arc::clone(only),
            _ => Arc::new(PointIndex::merged(parts.iter().map(Arc::as_ref), extra)),
        }
    }
}
