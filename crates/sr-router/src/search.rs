//! Path search trait and default A* implementation.
//!
//! # Pluggability
//!
//! The engine calls search through the [`PathFinder`] trait, so a different
//! algorithm (bidirectional search, a contraction hierarchy) can be swapped
//! in without touching cost evaluation or route assembly.  The default
//! [`AStar`] uses the haversine distance to the goal as heuristic for every
//! policy.
//!
//! # Heuristic and the safest policy
//!
//! Haversine distance is admissible for length costs.  Under the safest
//! policy costs are not metres, so the heuristic only orders the frontier:
//! the result is the lowest-cost path found under that ordering, with costs
//! accumulated exactly.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use sr_core::{CancelToken, EdgeId, NodeId};
use sr_graph::StreetGraph;

use crate::cost::EdgeCost;
use crate::{RouteError, RouteResult};

// ── PathSearch ────────────────────────────────────────────────────────────────

/// The result of a search: visited nodes and traversed edges in order, and
/// the accumulated policy cost.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSearch {
    /// `edges.len() + 1` nodes from origin to goal.
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub cost:  f64,
    /// Nodes settled before the goal was reached.
    pub expanded: usize,
}

impl PathSearch {
    /// `true` if origin and goal are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable search algorithm.
///
/// Implementations must be `Send + Sync` so one instance can serve
/// concurrent requests; all per-search state is local to the call.
pub trait PathFinder: Send + Sync {
    /// Lowest-cost path from `from` to `to` under `cost`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NoRoute`] if `to` is unreachable from `from`.
    /// - [`RouteError::Search`] for a corrupt graph or a non-finite cost.
    /// - [`RouteError::Cancelled`] once `cancel` fires.
    fn find_path(
        &self,
        graph:  &StreetGraph,
        cost:   &dyn EdgeCost,
        from:   NodeId,
        to:     NodeId,
        cancel: &CancelToken,
    ) -> RouteResult<PathSearch>;
}

// ── AStar ─────────────────────────────────────────────────────────────────────

/// A* over the CSR street graph.  Frontier ties are broken by insertion
/// order, so results are deterministic for a given graph and cost model.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStar;

impl PathFinder for AStar {
    fn find_path(
        &self,
        graph:  &StreetGraph,
        cost:   &dyn EdgeCost,
        from:   NodeId,
        to:     NodeId,
        cancel: &CancelToken,
    ) -> RouteResult<PathSearch> {
        astar(graph, cost, from, to, cancel)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Frontier entry.  Ordered so `BinaryHeap` pops the smallest `f`, and among
/// equal `f` the earliest pushed.
#[derive(Copy, Clone, Debug)]
struct Frontier {
    f:    f64,
    seq:  u64,
    node: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

fn astar(
    graph:  &StreetGraph,
    cost:   &dyn EdgeCost,
    from:   NodeId,
    to:     NodeId,
    cancel: &CancelToken,
) -> RouteResult<PathSearch> {
    let n = graph.node_count();
    for node in [from, to] {
        if node.index() >= n {
            return Err(RouteError::Search(format!("{node} is not in a graph of {n} nodes")));
        }
    }
    let goal_pos = graph.node_pos[to.index()];
    if !goal_pos.is_valid() {
        return Err(RouteError::Search(format!("goal {to} has invalid coordinate {goal_pos}")));
    }

    if from == to {
        return Ok(PathSearch { nodes: vec![from], edges: vec![], cost: 0.0, expanded: 0 });
    }

    // g[v] = best known cost from the origin to v.
    let mut g         = vec![f64::INFINITY; n];
    // prev_edge[v] = EdgeId that reached v; EdgeId::INVALID for unreached nodes.
    let mut prev_edge = vec![EdgeId::INVALID; n];
    let mut closed    = vec![false; n];

    let heuristic = |node: NodeId| -> RouteResult<f64> {
        let pos = graph.node_pos[node.index()];
        let h = pos.distance_m(goal_pos);
        if h.is_finite() {
            Ok(h)
        } else {
            Err(RouteError::Search(format!("node {node} has invalid coordinate {pos}")))
        }
    };

    let mut seq = 0u64;
    let mut heap = BinaryHeap::new();
    g[from.index()] = 0.0;
    heap.push(Frontier { f: heuristic(from)?, seq, node: from });

    let mut expanded = 0usize;
    while let Some(Frontier { node, .. }) = heap.pop() {
        if cancel.is_cancelled() {
            return Err(RouteError::Cancelled);
        }
        // Stale entry for a node already settled through a cheaper path.
        if closed[node.index()] {
            continue;
        }
        closed[node.index()] = true;

        if node == to {
            debug!("A* settled {expanded} nodes; cost {:.3}", g[to.index()]);
            return reconstruct(graph, &prev_edge, from, to, g[to.index()], expanded);
        }
        expanded += 1;

        let g_node = g[node.index()];
        for edge in graph.out_edges(node) {
            let next = graph.edge_to[edge.index()];
            if next.index() >= n {
                return Err(RouteError::Search(format!("{edge} points at missing {next}")));
            }
            if closed[next.index()] {
                continue;
            }

            let c = cost.edge_cost(graph, edge);
            if !c.is_finite() || c < 0.0 {
                return Err(RouteError::Search(format!("{edge} has invalid cost {c}")));
            }

            let tentative = g_node + c;
            if tentative < g[next.index()] {
                g[next.index()] = tentative;
                prev_edge[next.index()] = edge;
                seq += 1;
                heap.push(Frontier { f: tentative + heuristic(next)?, seq, node: next });
            }
        }
    }

    debug!("A* exhausted {expanded} nodes without reaching {to}");
    Err(RouteError::NoRoute { from, to })
}

fn reconstruct(
    graph:     &StreetGraph,
    prev_edge: &[EdgeId],
    from:      NodeId,
    to:        NodeId,
    cost:      f64,
    expanded:  usize,
) -> RouteResult<PathSearch> {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == EdgeId::INVALID || edges.len() > prev_edge.len() {
            return Err(RouteError::Search(format!("broken predecessor chain at {cur}")));
        }
        edges.push(e);
        cur = graph.edge_from[e.index()];
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(from);
    nodes.extend(edges.iter().map(|e| graph.edge_to[e.index()]));

    Ok(PathSearch { nodes, edges, cost, expanded })
}
