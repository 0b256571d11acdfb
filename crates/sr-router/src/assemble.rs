//! Turn a searched node sequence into a route: geometry, distance, steps.

use serde::Serialize;
use serde_json::{Value, json};

use sr_core::{EdgeId, GeoPoint, NodeId};
use sr_graph::StreetGraph;

use crate::search::PathSearch;
use crate::{RouteError, RouteResult};

/// Label used for steps along edges without a street name.
pub const UNNAMED_STREET: &str = "unnamed";

/// Route geometry in GeoJSON form; positions are `[lon, lat]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum RouteGeometry {
    /// The edge polylines joined end to end.
    LineString(Vec<[f64; 2]>),
    /// Parts that could not be joined continuously.
    MultiLineString(Vec<Vec<[f64; 2]>>),
}

impl RouteGeometry {
    /// Number of separate parts.
    pub fn part_count(&self) -> usize {
        match self {
            RouteGeometry::LineString(_) => 1,
            RouteGeometry::MultiLineString(parts) => parts.len(),
        }
    }
}

/// One node-to-node leg of a route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteStep {
    /// Provider id of the leg's start node.
    pub from:     i64,
    /// Provider id of the leg's end node.
    pub to:       i64,
    pub street:   String,
    /// Rounded to 0.1 m.
    pub length_m: f64,
}

/// An assembled route.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Route {
    pub geometry:   RouteGeometry,
    /// Sum of leg lengths, rounded to 0.1 m.
    pub distance_m: f64,
    pub steps:      Vec<RouteStep>,
    /// Accumulated policy cost reported by the search.
    #[serde(skip)]
    pub cost:       f64,
    #[serde(skip)]
    pub nodes:      Vec<NodeId>,
}

impl Route {
    /// `FeatureCollection` with one `Feature` carrying the geometry and the
    /// `distance_m` / `steps` properties.
    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "distance_m": self.distance_m,
                    "steps": self.steps,
                },
                "geometry": self.geometry,
            }],
        })
    }
}

/// Assemble `path` over `graph`.
///
/// The legs are the edges the search relaxed, so the reported geometry and
/// distance are those of the edges the cost was accumulated over. A path
/// carrying only nodes falls back to the shortest parallel edge per pair.
///
/// # Errors
///
/// [`RouteError::Search`] if a node pair of the path has no connecting edge,
/// or a recorded edge does not join the node pair it stands for.
pub fn assemble(graph: &StreetGraph, path: &PathSearch) -> RouteResult<Route> {
    let legs = if path.edges.is_empty() {
        path.nodes
            .windows(2)
            .map(|w| {
                graph.shortest_edge_between(w[0], w[1]).ok_or_else(|| {
                    RouteError::Search(format!("no edge between consecutive nodes {} and {}", w[0], w[1]))
                })
            })
            .collect::<RouteResult<Vec<EdgeId>>>()?
    } else {
        searched_legs(graph, path)?
    };

    let geometry = match path.nodes.as_slice() {
        [] => return Err(RouteError::Search("empty node sequence".into())),
        [only] => {
            let p = graph.node_pos[only.index()].lon_lat();
            RouteGeometry::LineString(vec![p, p])
        }
        _ => merge_parts(legs.iter().map(|&e| graph.edge_polyline(e).into_owned())),
    };

    let mut total = 0.0;
    let steps = legs
        .iter()
        .map(|&e| {
            let length = graph.edge_length_m[e.index()];
            total += length;
            RouteStep {
                from:     graph.node_ext_id[graph.edge_from[e.index()].index()],
                to:       graph.node_ext_id[graph.edge_to[e.index()].index()],
                street:   graph.edge_name(e).unwrap_or(UNNAMED_STREET).to_owned(),
                length_m: round_tenth(length),
            }
        })
        .collect();

    Ok(Route {
        geometry,
        distance_m: round_tenth(total),
        steps,
        cost: path.cost,
        nodes: path.nodes.clone(),
    })
}

/// Check the recorded edges against the node sequence they were found along.
fn searched_legs(graph: &StreetGraph, path: &PathSearch) -> RouteResult<Vec<EdgeId>> {
    if path.edges.len() + 1 != path.nodes.len() {
        return Err(RouteError::Search(format!(
            "{} edges recorded for {} nodes",
            path.edges.len(),
            path.nodes.len()
        )));
    }
    for (&e, w) in path.edges.iter().zip(path.nodes.windows(2)) {
        let joins = e.index() < graph.edge_from.len()
            && graph.edge_from[e.index()] == w[0]
            && graph.edge_to[e.index()] == w[1];
        if !joins {
            return Err(RouteError::Search(format!(
                "edge {e} does not join consecutive nodes {} and {}",
                w[0], w[1]
            )));
        }
    }
    Ok(path.edges.clone())
}

/// Join polylines whose end and start coincide; start a new part otherwise.
fn merge_parts(lines: impl Iterator<Item = Vec<GeoPoint>>) -> RouteGeometry {
    let mut parts: Vec<Vec<[f64; 2]>> = Vec::new();
    for line in lines {
        let coords = line.iter().map(|p| p.lon_lat());
        match parts.last_mut() {
            Some(part) if part.last() == line.first().map(|p| p.lon_lat()).as_ref() => {
                part.extend(coords.skip(1));
            }
            _ => parts.push(coords.collect()),
        }
    }

    if parts.len() == 1 {
        RouteGeometry::LineString(parts.remove(0))
    } else {
        RouteGeometry::MultiLineString(parts)
    }
}

#[inline]
fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
