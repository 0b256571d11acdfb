//! Plain, serialisable network description.
//!
//! This is both what a [`NetworkSource`](crate::NetworkSource) returns and
//! what the graph cache persists.  Node identifiers are the provider's own
//! (e.g. OSM node ids); coordinates in geometries use GeoJSON `[lon, lat]`
//! order.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id:  i64,
    pub lat: f64,
    pub lon: f64,
}

/// One street segment.  Two-way segments (`oneway == false`) become a pair of
/// directed edges when the graph is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: i64,
    pub to:   i64,
    /// Metres.  Derived from the geometry when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Explicit polyline `[[lon, lat], ...]` from `from` to `to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub oneway: bool,
}

impl EdgeRecord {
    /// Two-way segment with only endpoints.
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to, length_m: None, name: None, geometry: None, oneway: false }
    }

    pub fn length(mut self, length_m: f64) -> Self {
        self.length_m = Some(length_m);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn geometry(mut self, coords: Vec<[f64; 2]>) -> Self {
        self.geometry = Some(coords);
        self
    }

    pub fn oneway(mut self) -> Self {
        self.oneway = true;
        self
    }
}
