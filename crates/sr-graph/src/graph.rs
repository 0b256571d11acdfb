//! Street graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node (stably, so parallel edges keep
//! the order they were added in) and indexed by `EdgeId`.  Parallel edges
//! between the same node pair are kept as separate entries; choosing between
//! them is left to the cost model and the route assembler.
//!
//! # Spatial index
//!
//! Node coordinates are projected into a [`LocalProjection`] centred on the
//! node centroid and bulk-loaded into an R-tree (via `rstar`).  Snapping an
//! arbitrary coordinate is a nearest-neighbour query in that planar frame.
//! A graph whose centroid lies too close to a pole still builds; only
//! snapping against it fails.

use std::borrow::Cow;

use log::warn;
use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use sr_core::{EdgeId, GeoPoint, LocalProjection, NodeId, polyline_length_m};

use crate::data::{EdgeRecord, GraphData, NodeRecord};
use crate::{GraphError, GraphResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Planar `[x, y]` metres plus the associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Snapping state fixed at build time.
enum SnapIndex {
    Empty,
    /// Nodes exist but no local projection could be centred on them.
    Unprojectable(String),
    Ready { proj: LocalProjection, tree: RTree<NodeEntry> },
}

// ── StreetGraph ───────────────────────────────────────────────────────────────

/// Directed street graph in CSR format plus a planar index for snapping.
///
/// Immutable once built.  Node/edge columns are `pub` for direct indexed
/// access on hot paths; construct through [`StreetGraphBuilder`] or
/// [`StreetGraph::from_data`].
pub struct StreetGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Provider identifier of each node (e.g. OSM id).  Indexed by `NodeId`.
    pub node_ext_id: Vec<i64>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Outgoing edges of node `n` are `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,

    /// Length in metres.  Always present: derived from geometry at build
    /// time when the source omitted it.
    pub edge_length_m: Vec<f64>,

    /// Street label, if the source named the segment.
    pub edge_name: Vec<Option<String>>,

    /// Explicit polyline from `edge_from` to `edge_to`, if any.
    edge_geometry: Vec<Option<Vec<GeoPoint>>>,

    ext_lookup:  FxHashMap<i64, NodeId>,
    snap_index:  SnapIndex,
}

impl StreetGraph {
    /// A graph with no nodes or edges.  Snapping against it always fails.
    pub fn empty() -> Self {
        Self {
            node_pos:       Vec::new(),
            node_ext_id:    Vec::new(),
            node_out_start: vec![0],
            edge_from:      Vec::new(),
            edge_to:        Vec::new(),
            edge_length_m:  Vec::new(),
            edge_name:      Vec::new(),
            edge_geometry:  Vec::new(),
            ext_lookup:     FxHashMap::default(),
            snap_index:     SnapIndex::Empty,
        }
    }

    /// Build from provider data, validating that every edge references a
    /// known node.
    pub fn from_data(data: GraphData) -> GraphResult<Self> {
        let mut b = StreetGraphBuilder::with_capacity(data.nodes.len(), data.edges.len() * 2);
        // Duplicate ids are left for `build` to reject.
        let mut by_ext: FxHashMap<i64, NodeId> = FxHashMap::default();
        for n in data.nodes {
            by_ext.insert(n.id, b.add_node(n.id, GeoPoint::new(n.lat, n.lon)));
        }

        for (i, e) in data.edges.into_iter().enumerate() {
            let from = *by_ext.get(&e.from).ok_or(GraphError::DanglingEdge { edge: i, node: e.from })?;
            let to = *by_ext.get(&e.to).ok_or(GraphError::DanglingEdge { edge: i, node: e.to })?;
            let attrs = EdgeAttrs {
                length_m: e.length_m,
                name:     e.name,
                geometry: e
                    .geometry
                    .map(|g| g.into_iter().map(|[lon, lat]| GeoPoint::new(lat, lon)).collect()),
            };
            if e.oneway {
                b.add_directed_edge(from, to, attrs);
            } else {
                b.add_street(from, to, attrs);
            }
        }

        b.build()
    }

    /// Serialisable form.  Every edge is emitted as a one-way record in
    /// `EdgeId` order, so `from_data(g.to_data())` rebuilds an identical graph.
    pub fn to_data(&self) -> GraphData {
        let nodes = self
            .node_pos
            .iter()
            .zip(&self.node_ext_id)
            .map(|(p, &id)| NodeRecord { id, lat: p.lat, lon: p.lon })
            .collect();

        let edges = (0..self.edge_count())
            .map(|i| EdgeRecord {
                from:     self.node_ext_id[self.edge_from[i].index()],
                to:       self.node_ext_id[self.edge_to[i].index()],
                length_m: Some(self.edge_length_m[i]),
                name:     self.edge_name[i].clone(),
                geometry: self.edge_geometry[i]
                    .as_ref()
                    .map(|g| g.iter().map(|p| p.lon_lat()).collect()),
                oneway:   true,
            })
            .collect();

        GraphData { nodes, edges }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// `EdgeId`s of all outgoing edges from `node`, as a contiguous range.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// All directed edges `from → to` (parallel edges included).
    pub fn edges_between(&self, from: NodeId, to: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_edges(from).filter(move |e| self.edge_to[e.index()] == to)
    }

    /// Shortest of the parallel edges `from → to`; the first added wins ties.
    pub fn shortest_edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.edges_between(from, to).fold(None, |best, e| match best {
            Some(b) if self.edge_length_m[b.index()] <= self.edge_length_m[e.index()] => Some(b),
            _ => Some(e),
        })
    }

    /// Polyline of `edge`: its explicit geometry, or the straight line between
    /// its endpoints.
    pub fn edge_polyline(&self, edge: EdgeId) -> Cow<'_, [GeoPoint]> {
        match &self.edge_geometry[edge.index()] {
            Some(g) if g.len() >= 2 => Cow::Borrowed(g.as_slice()),
            _ => Cow::Owned(vec![
                self.node_pos[self.edge_from[edge.index()].index()],
                self.node_pos[self.edge_to[edge.index()].index()],
            ]),
        }
    }

    /// Street label, `None` for unnamed segments.
    pub fn edge_name(&self, edge: EdgeId) -> Option<&str> {
        self.edge_name[edge.index()].as_deref()
    }

    /// `NodeId` of the node the provider called `ext_id`.
    pub fn node_by_ext_id(&self, ext_id: i64) -> Option<NodeId> {
        self.ext_lookup.get(&ext_id).copied()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos` by planar distance in the graph's projection.
    ///
    /// # Errors
    ///
    /// [`GraphError::Snap`] if the graph has no nodes, the graph or `pos`
    /// cannot be projected.
    pub fn snap_to_node(&self, pos: GeoPoint) -> GraphResult<NodeId> {
        let snap_err = |reason: &str| GraphError::Snap { pos, reason: reason.to_owned() };

        let (proj, tree) = match &self.snap_index {
            SnapIndex::Empty => return Err(snap_err("graph has no nodes")),
            SnapIndex::Unprojectable(why) => {
                return Err(snap_err(&format!("graph cannot be projected: {why}")));
            }
            SnapIndex::Ready { proj, tree } => (proj, tree),
        };
        if !pos.is_valid() {
            return Err(snap_err("coordinate is not a valid WGS-84 position"));
        }
        tree.nearest_neighbor(&proj.project(pos))
            .map(|e| e.id)
            .ok_or_else(|| snap_err("graph has no nodes"))
    }
}

impl std::fmt::Debug for StreetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreetGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

// ── StreetGraphBuilder ────────────────────────────────────────────────────────

/// Attributes of one street segment as supplied to the builder.
#[derive(Clone, Debug, Default)]
pub struct EdgeAttrs {
    /// Metres; derived from the geometry when `None` (or not a finite,
    /// non-negative number).
    pub length_m: Option<f64>,
    pub name:     Option<String>,
    /// Polyline from the edge's source to its target.
    pub geometry: Option<Vec<GeoPoint>>,
}

impl EdgeAttrs {
    pub fn length(length_m: f64) -> Self {
        Self { length_m: Some(length_m), ..Self::default() }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    fn reversed(&self) -> Self {
        Self {
            length_m: self.length_m,
            name:     self.name.clone(),
            geometry: self.geometry.as_ref().map(|g| g.iter().rev().copied().collect()),
        }
    }
}

/// Construct a [`StreetGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use sr_core::GeoPoint;
/// use sr_graph::{EdgeAttrs, StreetGraphBuilder};
///
/// let mut b = StreetGraphBuilder::new();
/// let a = b.add_node(1, GeoPoint::new(47.3769, 8.5417));
/// let c = b.add_node(2, GeoPoint::new(47.3900, 8.5167));
/// b.add_street(a, c, EdgeAttrs::length(1_800.0).named("Limmatquai"));
/// let g = b.build().unwrap();
/// assert_eq!(g.node_count(), 2);
/// assert_eq!(g.edge_count(), 2); // both directions
/// ```
pub struct StreetGraphBuilder {
    nodes:     Vec<GeoPoint>,
    ext_ids:   Vec<i64>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:  NodeId,
    to:    NodeId,
    attrs: EdgeAttrs,
}

impl StreetGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), ext_ids: Vec::new(), raw_edges: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            ext_ids:   Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, ext_id: i64, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.ext_ids.push(ext_id);
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, attrs: EdgeAttrs) {
        self.raw_edges.push(RawEdge { from, to, attrs });
    }

    /// Add edges in **both directions**; the reverse edge gets the reversed
    /// geometry.
    pub fn add_street(&mut self, a: NodeId, b: NodeId, attrs: EdgeAttrs) {
        let back = attrs.reversed();
        self.add_directed_edge(a, b, attrs);
        self.add_directed_edge(b, a, back);
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Validate and produce a [`StreetGraph`].
    ///
    /// # Errors
    ///
    /// - [`GraphError::Malformed`] for an invalid node coordinate, a
    ///   duplicate provider id, or a non-finite derived length.
    /// - [`GraphError::DanglingEdge`] for an edge whose endpoint was never
    ///   added.
    pub fn build(self) -> GraphResult<StreetGraph> {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        if let Some(bad) = self.nodes.iter().position(|p| !p.is_valid()) {
            return Err(GraphError::Malformed(format!(
                "node {} has invalid coordinate {}",
                self.ext_ids[bad], self.nodes[bad]
            )));
        }

        let mut ext_lookup: FxHashMap<i64, NodeId> =
            FxHashMap::with_capacity_and_hasher(node_count, Default::default());
        for (i, &ext) in self.ext_ids.iter().enumerate() {
            if ext_lookup.insert(ext, NodeId(i as u32)).is_some() {
                return Err(GraphError::Malformed(format!("duplicate node id {ext}")));
            }
        }

        for (i, e) in self.raw_edges.iter().enumerate() {
            for end in [e.from, e.to] {
                if end.index() >= node_count {
                    return Err(GraphError::DanglingEdge { edge: i, node: end.0 as i64 });
                }
            }
        }

        // Stable sort keeps parallel edges in insertion order.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let mut edge_from     = Vec::with_capacity(edge_count);
        let mut edge_to       = Vec::with_capacity(edge_count);
        let mut edge_length_m = Vec::with_capacity(edge_count);
        let mut edge_name     = Vec::with_capacity(edge_count);
        let mut edge_geometry = Vec::with_capacity(edge_count);

        for e in raw {
            let length = match e.attrs.length_m {
                Some(l) if l.is_finite() && l >= 0.0 => l,
                _ => match &e.attrs.geometry {
                    Some(g) if g.len() >= 2 => polyline_length_m(g),
                    _ => self.nodes[e.from.index()].distance_m(self.nodes[e.to.index()]),
                },
            };
            if !length.is_finite() {
                return Err(GraphError::Malformed(format!(
                    "edge {} -> {} has no finite length",
                    self.ext_ids[e.from.index()],
                    self.ext_ids[e.to.index()]
                )));
            }
            edge_from.push(e.from);
            edge_to.push(e.to);
            edge_length_m.push(length);
            edge_name.push(e.attrs.name);
            edge_geometry.push(e.attrs.geometry);
        }

        // CSR row pointer.
        let mut node_out_start = vec![0u32; node_count + 1];
        for from in &edge_from {
            node_out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let snap_index = match LocalProjection::centred_on(self.nodes.iter().copied()) {
            Ok(None) => SnapIndex::Empty,
            Ok(Some(proj)) => SnapIndex::Ready {
                proj,
                tree: RTree::bulk_load(
                    self.nodes
                        .iter()
                        .enumerate()
                        .map(|(i, &pos)| NodeEntry { point: proj.project(pos), id: NodeId(i as u32) })
                        .collect(),
                ),
            },
            Err(e) => {
                warn!("graph of {node_count} nodes has no snapping index: {e}");
                SnapIndex::Unprojectable(e.to_string())
            }
        };

        Ok(StreetGraph {
            node_pos: self.nodes,
            node_ext_id: self.ext_ids,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_name,
            edge_geometry,
            ext_lookup,
            snap_index,
        })
    }
}

impl Default for StreetGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
