//! Unit tests for sr-index.
//!
//! Feeds are written to temp directories or held in memory; no network.

#[cfg(test)]
mod helpers {
    use sr_core::GeoPoint;

    /// Zurich main station; the anchor for all synthetic points.
    pub const HB: GeoPoint = GeoPoint { lat: 47.3779, lon: 8.5403 };

    /// Offset `p` by `north_m` / `east_m` metres.
    pub fn offset(p: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
        let dlat = north_m / 111_194.93;
        let dlon = east_m / (111_194.93 * p.lat.to_radians().cos());
        GeoPoint::new(p.lat + dlat, p.lon + dlon)
    }
}

// ── Points & clamping ─────────────────────────────────────────────────────────

#[cfg(test)]
mod point {
    use crate::{InfluencePoint, clamp_score};

    #[test]
    fn hazard_scores_are_clamped() {
        let p = super::helpers::HB;
        assert_eq!(InfluencePoint::hazard(p, 1.7).score(), 1.0);
        assert_eq!(InfluencePoint::hazard(p, -0.3).score(), 0.0);
        assert_eq!(InfluencePoint::hazard(p, 0.42).score(), 0.42);
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn lights_weigh_one() {
        assert_eq!(InfluencePoint::light(super::helpers::HB).score(), 1.0);
    }
}

// ── Index queries ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod index {
    use sr_core::{BBox, GeoPoint};

    use super::helpers::{HB, offset};
    use crate::{InfluencePoint, PointIndex};

    fn ring() -> PointIndex {
        PointIndex::new(vec![
            InfluencePoint::light(offset(HB, 10.0, 0.0)),   // 0: 10 m N
            InfluencePoint::light(offset(HB, 0.0, 50.0)),   // 1: 50 m E
            InfluencePoint::light(offset(HB, -99.0, 0.0)),  // 2: 99 m S
            InfluencePoint::light(offset(HB, 0.0, -300.0)), // 3: 300 m W
        ])
    }

    #[test]
    fn radius_query_filters_by_distance() {
        let idx = ring();
        let hits = idx.within(HB, 100.0);
        assert_eq!(hits.len(), 3);
        for h in &hits {
            assert!(h.distance_m <= 100.0);
            assert!((h.point.pos.distance_m(HB) - h.distance_m).abs() < 1e-9);
        }
    }

    #[test]
    fn radius_query_preserves_insertion_order() {
        let idx = ring();
        let hits = idx.within(HB, 1_000.0);
        let positions: Vec<GeoPoint> = hits.iter().map(|h| h.point.pos).collect();
        let expected: Vec<GeoPoint> = idx.points().iter().map(|p| p.pos).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn zero_radius_hits_exact_point_only() {
        let idx = PointIndex::new(vec![InfluencePoint::light(HB), InfluencePoint::light(offset(HB, 1.0, 0.0))]);
        assert_eq!(idx.within(HB, 0.0).len(), 1);
    }

    #[test]
    fn empty_and_negative_radius() {
        assert!(PointIndex::empty().within(HB, 100.0).is_empty());
        assert!(ring().within(HB, -1.0).is_empty());
    }

    #[test]
    fn radius_query_wraps_the_antimeridian() {
        let east = GeoPoint::new(0.0, 179.9995);
        let west = GeoPoint::new(0.0, -179.9995);
        let idx = PointIndex::new(vec![
            InfluencePoint::light(west),
            InfluencePoint::light(GeoPoint::new(0.0, 179.0)),
        ]);
        let hits = idx.within(east, 200.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].point.pos, west);
        assert!((hits[0].distance_m - 111.2).abs() < 0.5, "{}", hits[0].distance_m);

        assert_eq!(PointIndex::new(vec![InfluencePoint::light(east)]).within(west, 200.0).len(), 1);
    }

    #[test]
    fn radius_query_over_a_pole_spans_all_longitudes() {
        let here = GeoPoint::new(89.999, 0.0);
        let across = GeoPoint::new(89.999, 180.0);
        let idx = PointIndex::new(vec![InfluencePoint::light(across)]);
        assert_eq!(idx.within(here, 300.0).len(), 1);
    }

    #[test]
    fn invalid_points_are_dropped() {
        let idx = PointIndex::new(vec![
            InfluencePoint::light(HB),
            InfluencePoint::light(GeoPoint::new(f64::NAN, 8.0)),
        ]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn bbox_query_with_limit() {
        let idx = ring();
        let bbox = BBox::around(offset(HB, -150.0, -150.0), offset(HB, 150.0, 150.0), 0.0);
        let inside = idx.in_bbox(&bbox, None);
        assert_eq!(inside.len(), 3);
        let limited = idx.in_bbox(&bbox, Some(2));
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].pos, idx.points()[0].pos);
    }

    #[test]
    fn merged_keeps_parts_then_extras() {
        let a = PointIndex::new(vec![InfluencePoint::hazard(HB, 0.5)]);
        let b = PointIndex::new(vec![InfluencePoint::hazard(offset(HB, 5.0, 0.0), 0.7)]);
        let extra = [InfluencePoint::hazard(offset(HB, 10.0, 0.0), 2.0)];
        let m = PointIndex::merged([&a, &b], &extra);
        let scores: Vec<f64> = m.points().iter().map(|p| p.score()).collect();
        assert_eq!(scores, vec![0.5, 0.7, 1.0]);
    }
}

// ── Feed parsing ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod feed {
    use std::io::Cursor;
    use std::path::Path;

    use crate::{FeedFormat, FeedSchema, IndexError, PointKind, parse_csv, parse_geojson};

    const HAZARDS: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.54, 47.37]}, "properties": {"score": 1.7}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.55, 47.38]}, "properties": {"safety_score": -0.3, "score": 0.9}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.56, 47.39]}, "properties": {}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.57, 47.40]}, "properties": {"score": "high"}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.58, 47.41]}, "properties": {"score": "0.25"}},
        {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[8.5, 47.3], [8.6, 47.4]]}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [8.59]}},
        {"type": "Feature", "geometry": null}
      ]
    }"#;

    #[test]
    fn geojson_hazard_scores() {
        let pts = parse_geojson(Cursor::new(HAZARDS), PointKind::Hazard).unwrap();
        let scores: Vec<f64> = pts.iter().map(|p| p.score()).collect();
        // 1.7 clamps, safety_score wins over score, absent → 1, junk → 0.
        assert_eq!(scores, vec![1.0, 0.0, 1.0, 0.0, 0.25]);
        assert_eq!(pts[0].pos.lat, 47.37);
        assert_eq!(pts[0].pos.lon, 8.54);
    }

    #[test]
    fn geojson_pedestrian_flow_defaults_to_no_danger() {
        let pts = parse_geojson(Cursor::new(HAZARDS), FeedSchema::pedestrian_flow()).unwrap();
        let scores: Vec<f64> = pts.iter().map(|p| p.score()).collect();
        assert_eq!(scores, vec![1.0, 0.0, 0.0, 0.0, 0.25]);
    }

    #[test]
    fn schema_defaults_per_kind() {
        assert_eq!(FeedSchema::from(PointKind::Hazard), FeedSchema::reported_hazards());
        assert_eq!(FeedSchema::from(PointKind::Lighting), FeedSchema::lighting());
        assert_eq!(FeedSchema::reported_hazards().missing_score, 1.0);
        assert_eq!(FeedSchema::pedestrian_flow().missing_score, 0.0);
    }

    #[test]
    fn geojson_lighting_ignores_scores() {
        let pts = parse_geojson(Cursor::new(HAZARDS), PointKind::Lighting).unwrap();
        assert_eq!(pts.len(), 5);
        assert!(pts.iter().all(|p| p.score() == 1.0));
    }

    #[test]
    fn geojson_requires_feature_collection() {
        let err = parse_geojson(Cursor::new(r#"{"type": "Feature"}"#), PointKind::Lighting);
        assert!(matches!(err, Err(IndexError::Malformed(_))));
        let err = parse_geojson(Cursor::new("not json"), PointKind::Lighting);
        assert!(matches!(err, Err(IndexError::Json(_))));
    }

    #[test]
    fn csv_with_optional_scores() {
        let data = "lat,lon,score\n47.37,8.54,0.9\n47.38,8.55,\n47.39,8.56,bad\n47.40,8.57,-2\n";
        let pts = parse_csv(Cursor::new(data), PointKind::Hazard).unwrap();
        let scores: Vec<f64> = pts.iter().map(|p| p.score()).collect();
        assert_eq!(scores, vec![0.9, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn csv_pedestrian_flow_scores() {
        let data = "lat,lon,score\n47.37,8.54,0.9\n47.38,8.55,\n47.39,8.56,bad\n";
        let pts = parse_csv(Cursor::new(data), FeedSchema::pedestrian_flow()).unwrap();
        let scores: Vec<f64> = pts.iter().map(|p| p.score()).collect();
        assert_eq!(scores, vec![0.9, 0.0, 0.0]);
    }

    #[test]
    fn csv_without_score_column() {
        let data = "lat,lon\n47.37,8.54\n47.38,8.55\n";
        let pts = parse_csv(Cursor::new(data), PointKind::Lighting).unwrap();
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn csv_bad_coordinate_is_an_error() {
        let data = "lat,lon\nnorth,8.54\n";
        assert!(matches!(parse_csv(Cursor::new(data), PointKind::Lighting), Err(IndexError::Csv(_))));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(FeedFormat::from_path(Path::new("lights.CSV")), FeedFormat::Csv);
        assert_eq!(FeedFormat::from_path(Path::new("hazards.geojson")), FeedFormat::GeoJson);
    }
}

// ── Versioned snapshots ───────────────────────────────────────────────────────

#[cfg(test)]
mod snapshot {
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::helpers::{HB, offset};
    use crate::{FeedFile, FeedSchema, InfluencePoint, MemoryFeed, PointKind, VersionedIndex};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn missing_file_is_an_empty_index() {
        let dir = tmp();
        let idx = VersionedIndex::new(FeedFile::new(dir.path().join("lights.geojson"), PointKind::Lighting));
        assert!(idx.get().unwrap().is_empty());
    }

    #[test_log::test]
    fn unchanged_file_reuses_snapshot() {
        let dir = tmp();
        let path = dir.path().join("lights.csv");
        std::fs::write(&path, "lat,lon\n47.37,8.54\n").unwrap();

        let idx = VersionedIndex::new(FeedFile::new(&path, PointKind::Lighting));
        let a = idx.get().unwrap();
        let b = idx.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }

    #[test_log::test]
    fn changed_file_rebuilds() {
        let dir = tmp();
        let path = dir.path().join("lights.csv");
        std::fs::write(&path, "lat,lon\n47.37,8.54\n").unwrap();

        let idx = VersionedIndex::new(FeedFile::new(&path, PointKind::Lighting));
        let before = idx.get().unwrap();

        // Different size guarantees a new version even on coarse mtime clocks.
        std::fs::write(&path, "lat,lon\n47.37,8.54\n47.38,8.55\n").unwrap();
        let after = idx.get().unwrap();

        assert_eq!(before.len(), 1, "old readers keep their snapshot");
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn feed_files_apply_their_missing_score() {
        let dir = tmp();
        let path = dir.path().join("points.csv");
        std::fs::write(&path, "lat,lon\n47.37,8.54\n47.38,8.55\n").unwrap();

        let reported = VersionedIndex::new(FeedFile::new(&path, PointKind::Hazard)).get().unwrap();
        assert!(reported.points().iter().all(|p| p.score() == 1.0));

        let flow = FeedFile::new(&path, FeedSchema::pedestrian_flow());
        assert_eq!(flow.schema().missing_score, 0.0);
        let flow = VersionedIndex::new(flow).get().unwrap();
        assert_eq!(flow.len(), 2);
        assert!(flow.points().iter().all(|p| p.score() == 0.0));
    }

    #[test]
    fn invalidate_forces_reload() {
        let feed = MemoryFeed::new("mem", vec![InfluencePoint::light(HB)]);
        let idx = VersionedIndex::new(feed);
        let a = idx.get().unwrap();
        idx.invalidate();
        let b = idx.get().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn unreadable_feed_propagates_error() {
        let dir = tmp();
        let path = dir.path().join("lights.geojson");
        std::fs::write(&path, "{ truncated").unwrap();
        let idx = VersionedIndex::new(FeedFile::new(&path, PointKind::Lighting));
        assert!(idx.get().is_err());
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let small: Vec<_> = (0..10).map(|i| InfluencePoint::light(offset(HB, i as f64, 0.0))).collect();
        let large: Vec<_> = (0..500).map(|i| InfluencePoint::light(offset(HB, i as f64, 0.0))).collect();

        let idx = Arc::new(VersionedIndex::new(MemoryFeed::new("mem", small.clone())));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let idx = Arc::clone(&idx);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = idx.get().unwrap();
                        assert!(snap.len() == 10 || snap.len() == 500, "torn snapshot: {}", snap.len());
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let next = if i % 2 == 0 { large.clone() } else { small.clone() };
            idx.source().replace(next);
        }
        for r in readers {
            r.join().unwrap();
        }
    }
}
