//! Synthetic street network north of Zurich HB.
//!
//! Two ways of almost equal length from the station to Niederdorf:
//!
//! ```text
//!              niederdorf (4)
//!             /              \
//!   walche (2)                central (3)
//!             \              /
//!                 hb (1)
//! ```
//!
//! The western way is slightly shorter but unlit; the eastern way is lit.

use sr_core::GeoPoint;
use sr_graph::{EdgeRecord, GraphData, NodeRecord};

pub const HB:         GeoPoint = GeoPoint { lat: 47.3769, lon: 8.5417 };
pub const NIEDERDORF: GeoPoint = GeoPoint { lat: 47.3860, lon: 8.5417 };
/// Reported hazard on the unlit way.
pub const WALCHE:     GeoPoint = GeoPoint { lat: 47.3815, lon: 8.5380 };
const CENTRAL:        GeoPoint = GeoPoint { lat: 47.3815, lon: 8.5456 };

const NODES: [(i64, GeoPoint); 4] = [(1, HB), (2, WALCHE), (3, CENTRAL), (4, NIEDERDORF)];

/// `(from, to, name, lit)`; every street is two-way, lengths are derived.
const STREETS: [(i64, i64, &str, bool); 4] = [
    (1, 2, "Bahnhofquai",   false),
    (2, 4, "Walchestrasse", false),
    (1, 3, "Bahnhofbrücke", true),
    (3, 4, "Limmatquai",    true),
];

pub fn zurich_network() -> GraphData {
    GraphData {
        nodes: NODES
            .iter()
            .map(|&(id, p)| NodeRecord { id, lat: p.lat, lon: p.lon })
            .collect(),
        edges: STREETS
            .iter()
            .map(|&(from, to, name, _)| EdgeRecord::new(from, to).named(name))
            .collect(),
    }
}

/// Straight-line polylines of the lit streets.
pub fn lit_streets() -> Vec<[GeoPoint; 2]> {
    let pos = |id: i64| NODES.iter().find(|(n, _)| *n == id).map(|&(_, p)| p);
    STREETS
        .iter()
        .filter(|s| s.3)
        .filter_map(|&(from, to, _, _)| Some([pos(from)?, pos(to)?]))
        .collect()
}
