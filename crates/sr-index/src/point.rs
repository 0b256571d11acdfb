//! Influence points: street lights and reported hazards.

use sr_core::GeoPoint;

/// Which of the two disjoint point sets a feed belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PointKind {
    /// Light sources.  Presence only; every point weighs 1.
    Lighting,
    /// Danger points.  The score encodes severity: 0 = ignore, 1 = maximum.
    Hazard,
}

/// A located point with a severity score in `[0, 1]`.
///
/// The score is clamped on construction, so every `InfluencePoint` in the
/// system satisfies `0.0 <= score <= 1.0`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InfluencePoint {
    pub pos: GeoPoint,
    score:   f64,
}

impl InfluencePoint {
    /// A light source (score fixed at 1).
    pub fn light(pos: GeoPoint) -> Self {
        Self { pos, score: 1.0 }
    }

    /// A hazard with the given raw severity, clamped to `[0, 1]`.
    pub fn hazard(pos: GeoPoint, score: f64) -> Self {
        Self { pos, score: clamp_score(score) }
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }
}

/// Clamp a raw score into `[0, 1]`.  NaN maps to 0.
#[inline]
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
}
