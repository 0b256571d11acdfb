//! Radius-queryable store of influence points.
//!
//! # Spatial index
//!
//! Points live in a `Vec` in insertion order and an R-tree (via `rstar`) keyed
//! on `[lat, lon]` degrees.  A radius query first collects the tree entries
//! inside a degree envelope that is guaranteed to cover the metric circle,
//! then filters them by exact haversine distance.  Results come back in
//! insertion order so kernel sums over them are reproducible.

use rstar::{AABB, RTree, RTreeObject};

use sr_core::geo::EARTH_RADIUS_M;
use sr_core::{BBox, GeoPoint};

use crate::point::InfluencePoint;

/// Metres per degree of latitude on the haversine sphere.
const M_PER_DEG_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// `[lat, lon]` point plus the slot of the full record in `points`.
#[derive(Clone, Copy)]
struct PointEntry {
    point: [f64; 2],
    slot:  u32,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

/// One radius-query hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor<'a> {
    pub point:      &'a InfluencePoint,
    pub distance_m: f64,
}

// ── PointIndex ────────────────────────────────────────────────────────────────

/// Immutable set of influence points with radius and bounding-box queries.
///
/// Built once per feed version and shared behind an `Arc`.
pub struct PointIndex {
    points: Vec<InfluencePoint>,
    tree:   RTree<PointEntry>,
}

impl PointIndex {
    /// Bulk-load an index.  Points with invalid coordinates are dropped.
    pub fn new(points: Vec<InfluencePoint>) -> Self {
        let points: Vec<InfluencePoint> = points.into_iter().filter(|p| p.pos.is_valid()).collect();
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| PointEntry { point: [p.pos.lat, p.pos.lon], slot: i as u32 })
            .collect();
        Self { points, tree: RTree::bulk_load(entries) }
    }

    pub fn empty() -> Self {
        Self { points: Vec::new(), tree: RTree::new() }
    }

    /// Union of several indices plus extra points, in that order.
    pub fn merged<'a, I>(parts: I, extra: &[InfluencePoint]) -> Self
    where
        I: IntoIterator<Item = &'a PointIndex>,
    {
        let mut points = Vec::new();
        for part in parts {
            points.extend_from_slice(&part.points);
        }
        points.extend_from_slice(extra);
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in insertion order.
    pub fn points(&self) -> &[InfluencePoint] {
        &self.points
    }

    /// Every point within `radius_m` metres of `pos` (inclusive), paired with
    /// its distance, in insertion order.
    pub fn within(&self, pos: GeoPoint, radius_m: f64) -> Vec<Neighbor<'_>> {
        if self.points.is_empty() || radius_m.is_nan() || radius_m < 0.0 {
            return Vec::new();
        }

        // Pad by 1 % so envelope rounding never drops a boundary point.
        let dlat = radius_m / M_PER_DEG_LAT * 1.01;
        let cos_lat = pos.lat.to_radians().cos();
        let (south, north) = (pos.lat - dlat, pos.lat + dlat);

        let mut lon_ranges: Vec<(f64, f64)> = Vec::with_capacity(2);
        if north >= 90.0 || south <= -90.0 || cos_lat <= 1e-6 || dlat / cos_lat >= 180.0 {
            lon_ranges.push((-180.0, 180.0));
        } else {
            let dlon = dlat / cos_lat;
            let (west, east) = (pos.lon - dlon, pos.lon + dlon);
            lon_ranges.push((west.max(-180.0), east.min(180.0)));
            // Wrap across the antimeridian.
            if west < -180.0 {
                lon_ranges.push((west + 360.0, 180.0));
            }
            if east > 180.0 {
                lon_ranges.push((-180.0, east - 360.0));
            }
        }

        let mut slots: Vec<u32> = lon_ranges
            .into_iter()
            .flat_map(|(west, east)| {
                let envelope = AABB::from_corners([south, west], [north, east]);
                self.tree.locate_in_envelope(&envelope).map(|e| e.slot).collect::<Vec<_>>()
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();

        slots
            .into_iter()
            .filter_map(|slot| {
                let point = &self.points[slot as usize];
                let distance_m = pos.distance_m(point.pos);
                (distance_m <= radius_m).then_some(Neighbor { point, distance_m })
            })
            .collect()
    }

    /// Points inside `bbox`, in insertion order, truncated to `limit`.
    pub fn in_bbox(&self, bbox: &BBox, limit: Option<usize>) -> Vec<&InfluencePoint> {
        let envelope = AABB::from_corners([bbox.south, bbox.west], [bbox.north, bbox.east]);
        let mut slots: Vec<u32> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|e| e.slot)
            .collect();
        slots.sort_unstable();
        slots
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|slot| &self.points[slot as usize])
            .collect()
    }
}

impl Default for PointIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex").field("len", &self.points.len()).finish()
    }
}
