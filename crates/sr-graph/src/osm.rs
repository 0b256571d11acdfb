//! OSM PBF network source, enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use sr_graph::{NetworkSource, osm::PbfSource};
//!
//! let source: Arc<dyn NetworkSource> = Arc::new(PbfSource::new("zurich.osm.pbf"));
//! ```
//!
//! # What is loaded
//!
//! `highway=*` ways usable by the requested [`TravelMode`] (see
//! [`allows_mode`]), clipped to the requested bounding box: a way segment is
//! kept only when both of its nodes lie inside the box.  Drive networks honour
//! one-way tags; walk and bike networks are two-way throughout.  Lengths are
//! left for the graph builder to derive from node coordinates.
//!
//! Only bounding-box areas are supported; a PBF extract cannot geocode a
//! place name.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader};

use sr_core::{BBox, GeoPoint, TravelMode};

use crate::data::{EdgeRecord, GraphData, NodeRecord};
use crate::source::{AreaSpec, NetworkSource};
use crate::SourceError;

/// A local `.osm.pbf` extract.
#[derive(Clone, Debug)]
pub struct PbfSource {
    path: PathBuf,
}

impl PbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NetworkSource for PbfSource {
    fn fetch(&self, area: &AreaSpec, mode: TravelMode) -> Result<GraphData, SourceError> {
        let bbox = match area {
            AreaSpec::BBox(b) => *b,
            AreaSpec::Place(p) => {
                return Err(SourceError::Provider(format!(
                    "PBF source cannot resolve place {p:?}; supply a bounding box"
                )));
            }
        };
        load_bbox(&self.path, &bbox, mode)
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

struct OsmWay {
    refs:   Vec<i64>,
    name:   Option<String>,
    oneway: bool,
}

fn load_bbox(path: &Path, bbox: &BBox, mode: TravelMode) -> Result<GraphData, SourceError> {
    // ── Phase 1: in-box nodes + usable ways in one sequential pass ────────
    let reader = ElementReader::from_path(path)
        .map_err(|e| SourceError::Unreachable(format!("{}: {e}", path.display())))?;

    let mut in_box: HashMap<i64, GeoPoint> = HashMap::new();
    let mut ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                let p = GeoPoint::new(n.lat(), n.lon());
                if bbox.contains(p) {
                    in_box.insert(n.id(), p);
                }
            }
            Element::DenseNode(n) => {
                let p = GeoPoint::new(n.lat(), n.lon());
                if bbox.contains(p) {
                    in_box.insert(n.id(), p);
                }
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let Some(highway) = tag(&tags, "highway") else { return };
                if !allows_mode(highway, &tags, mode) {
                    return;
                }
                ways.push(OsmWay {
                    refs:   w.refs().collect(),
                    name:   tag(&tags, "name").map(str::to_owned),
                    oneway: mode == TravelMode::Drive && is_oneway(highway, &tags),
                });
            }
            _ => {}
        })
        .map_err(|e| SourceError::Malformed(e.to_string()))?;

    // ── Phase 2: keep segments whose endpoints are both in the box ───────
    let mut used: HashSet<i64> = HashSet::new();
    let mut edges = Vec::new();
    for way in &ways {
        for pair in way.refs.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b || !in_box.contains_key(&a) || !in_box.contains_key(&b) {
                continue;
            }
            used.insert(a);
            used.insert(b);
            let mut edge = EdgeRecord::new(a, b);
            edge.name = way.name.clone();
            edge.oneway = way.oneway;
            edges.push(edge);
        }
    }

    // Deterministic node order regardless of hash iteration.
    let mut ids: Vec<i64> = used.into_iter().collect();
    ids.sort_unstable();
    let nodes = ids
        .into_iter()
        .map(|id| {
            let p = in_box[&id];
            NodeRecord { id, lat: p.lat, lon: p.lon }
        })
        .collect();

    Ok(GraphData { nodes, edges })
}

// ── Tag helpers ───────────────────────────────────────────────────────────────

fn tag<'a>(tags: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Whether a `highway` class (plus access tags) belongs to `mode`'s network.
pub fn allows_mode(highway: &str, tags: &[(&str, &str)], mode: TravelMode) -> bool {
    let denied = |key: &str| matches!(tag(tags, key), Some("no" | "private"));
    match mode {
        TravelMode::Drive => {
            !denied("motor_vehicle")
                && !matches!(
                    highway,
                    "footway" | "path" | "cycleway" | "pedestrian" | "steps" | "track"
                        | "bridleway" | "corridor" | "proposed" | "construction"
                )
        }
        TravelMode::Walk => {
            !denied("foot")
                && !matches!(
                    highway,
                    "motorway" | "motorway_link" | "trunk" | "trunk_link" | "proposed" | "construction"
                )
        }
        TravelMode::Bike => {
            let explicit = matches!(tag(tags, "bicycle"), Some("yes" | "designated"));
            !denied("bicycle")
                && (explicit
                    || !matches!(
                        highway,
                        "motorway" | "motorway_link" | "trunk" | "trunk_link" | "footway"
                            | "steps" | "pedestrian" | "corridor" | "proposed" | "construction"
                    ))
        }
    }
}

/// One-way for motor traffic.  Motorways and roundabouts are implicitly
/// one-way in OSM convention.
pub(crate) fn is_oneway(highway: &str, tags: &[(&str, &str)]) -> bool {
    let explicit = matches!(tag(tags, "oneway"), Some("yes" | "1" | "true"));
    let implicit = matches!(highway, "motorway" | "motorway_link")
        || tag(tags, "junction") == Some("roundabout");
    explicit || implicit
}
