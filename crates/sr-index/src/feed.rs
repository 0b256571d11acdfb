//! Point-feed parsers.
//!
//! # GeoJSON format
//!
//! A `FeatureCollection` of `Point` features with `[lon, lat]` coordinates.
//! Severity is read from `properties.safety_score`, falling back to
//! `properties.score`:
//!
//! ```json
//! {"type": "FeatureCollection", "features": [
//!   {"type": "Feature",
//!    "geometry": {"type": "Point", "coordinates": [8.5417, 47.3769]},
//!    "properties": {"score": 0.9}}
//! ]}
//! ```
//!
//! Features that are not points, or whose coordinates are missing or
//! non-numeric, are skipped.
//!
//! # CSV format
//!
//! ```csv
//! lat,lon,score
//! 47.3769,8.5417,0.9
//! 47.3771,8.5420,
//! ```
//!
//! The `score` column is optional.
//!
//! # Scores
//!
//! A [`FeedSchema`] fixes how scores are read.  The absent-score value of a
//! hazard feed depends on where its points come from:
//!
//! | Schema              | Absent | Non-numeric | Numeric          |
//! |---------------------|--------|-------------|------------------|
//! | `lighting`          | 1.0    | 1.0         | 1.0 (ignored)    |
//! | `reported_hazards`  | 1.0    | 0.0         | clamped to [0,1] |
//! | `pedestrian_flow`   | 0.0    | 0.0         | clamped to [0,1] |

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use sr_core::GeoPoint;

use crate::point::{InfluencePoint, PointKind};
use crate::{IndexError, IndexResult};

/// On-disk encoding of a point feed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FeedFormat {
    GeoJson,
    Csv,
}

impl FeedFormat {
    /// Guess from the file extension: `.csv` is CSV, anything else GeoJSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => FeedFormat::Csv,
            _ => FeedFormat::GeoJson,
        }
    }
}

/// What a feed's points are and the score an unscored hazard gets.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FeedSchema {
    pub kind:          PointKind,
    pub missing_score: f64,
}

impl FeedSchema {
    pub fn lighting() -> Self {
        Self { kind: PointKind::Lighting, missing_score: 1.0 }
    }

    /// Individually reported hazards; an unscored report is fully severe.
    pub fn reported_hazards() -> Self {
        Self { kind: PointKind::Hazard, missing_score: 1.0 }
    }

    /// Pedestrian-flow danger points; an unscored point carries no danger.
    pub fn pedestrian_flow() -> Self {
        Self { kind: PointKind::Hazard, missing_score: 0.0 }
    }
}

impl From<PointKind> for FeedSchema {
    fn from(kind: PointKind) -> Self {
        match kind {
            PointKind::Lighting => FeedSchema::lighting(),
            PointKind::Hazard => FeedSchema::reported_hazards(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a feed from `path`, choosing the parser by extension.
pub fn load_points(path: &Path, schema: impl Into<FeedSchema>) -> IndexResult<Vec<InfluencePoint>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    match FeedFormat::from_path(path) {
        FeedFormat::GeoJson => parse_geojson(reader, schema),
        FeedFormat::Csv => parse_csv(reader, schema),
    }
}

/// Parse a GeoJSON `FeatureCollection`.
pub fn parse_geojson<R: Read>(reader: R, schema: impl Into<FeedSchema>) -> IndexResult<Vec<InfluencePoint>> {
    let schema = schema.into();
    let root: Value = serde_json::from_reader(reader)?;

    if root.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(IndexError::Malformed("expected a GeoJSON FeatureCollection".into()));
    }
    let Some(features) = root.get("features").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(features.len());
    for feature in features {
        let Some(geometry) = feature.get("geometry") else { continue };
        if geometry.get("type").and_then(Value::as_str) != Some("Point") {
            continue;
        }
        let Some(coords) = geometry.get("coordinates").and_then(Value::as_array) else { continue };
        let (Some(lon), Some(lat)) = (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) else {
            continue;
        };

        let props = feature.get("properties");
        let raw = props
            .and_then(|p| p.get("safety_score"))
            .or_else(|| props.and_then(|p| p.get("score")))
            .filter(|v| !v.is_null());

        let score = match raw {
            None => None,
            Some(Value::Number(n)) => Some(n.as_f64()),
            Some(Value::String(s)) => Some(s.trim().parse::<f64>().ok()),
            Some(_) => Some(None),
        };
        out.push(make_point(schema, GeoPoint::new(lat, lon), score));
    }
    Ok(out)
}

#[derive(Deserialize)]
struct CsvRecord {
    lat:   f64,
    lon:   f64,
    #[serde(default)]
    score: Option<String>,
}

/// Parse a `lat,lon[,score]` CSV feed with a header row.
pub fn parse_csv<R: Read>(reader: R, schema: impl Into<FeedSchema>) -> IndexResult<Vec<InfluencePoint>> {
    let schema = schema.into();
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    for result in csv_reader.deserialize::<CsvRecord>() {
        let row = result?;
        let score = row
            .score
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>().ok());
        out.push(make_point(schema, GeoPoint::new(row.lat, row.lon), score));
    }
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `score`: `None` when absent, `Some(None)` when present but unparseable.
fn make_point(schema: FeedSchema, pos: GeoPoint, score: Option<Option<f64>>) -> InfluencePoint {
    match schema.kind {
        PointKind::Lighting => InfluencePoint::light(pos),
        PointKind::Hazard => {
            let raw = match score {
                None => schema.missing_score,
                Some(parsed) => parsed.unwrap_or(0.0),
            };
            InfluencePoint::hazard(pos, raw)
        }
    }
}
