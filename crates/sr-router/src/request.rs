//! Route request as received from the serving layer.

use serde::{Deserialize, Serialize};

use sr_core::{CoreError, GeoPoint, TravelMode};
use sr_index::InfluencePoint;

use crate::policy::RoutePreference;

/// An ad hoc hazard attached to one request.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardInput {
    pub lat:   f64,
    pub lon:   f64,
    /// Raw severity; clamped to `[0, 1]` when used.  Defaults to 1.
    #[serde(default = "full_score")]
    pub score: f64,
}

fn full_score() -> f64 {
    1.0
}

impl HazardInput {
    pub fn to_point(self) -> InfluencePoint {
        InfluencePoint::hazard(GeoPoint::new(self.lat, self.lon), self.score)
    }
}

/// One routing query.
///
/// Field names follow the JSON the serving layer accepts
/// (`originLat`, `routePreference`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat:   f64,
    pub dest_lon:   f64,
    /// Named area to fetch instead of a box around the endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default)]
    pub route_preference: RoutePreference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_hazard_points: Vec<HazardInput>,
}

impl RouteRequest {
    /// Walk request between two points with the default (short) preference.
    pub fn new(origin: GeoPoint, dest: GeoPoint) -> Self {
        Self {
            origin_lat:          origin.lat,
            origin_lon:          origin.lon,
            dest_lat:            dest.lat,
            dest_lon:            dest.lon,
            place:               None,
            mode:                TravelMode::default(),
            force_refresh:       false,
            route_preference:    RoutePreference::default(),
            extra_hazard_points: Vec::new(),
        }
    }

    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    pub fn mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn preference(mut self, pref: RoutePreference) -> Self {
        self.route_preference = pref;
        self
    }

    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn hazard(mut self, hazard: HazardInput) -> Self {
        self.extra_hazard_points.push(hazard);
        self
    }

    pub fn origin(&self) -> GeoPoint {
        GeoPoint::new(self.origin_lat, self.origin_lon)
    }

    pub fn dest(&self) -> GeoPoint {
        GeoPoint::new(self.dest_lat, self.dest_lon)
    }

    /// Reject endpoints that are not valid WGS-84 positions.
    pub fn validate(&self) -> Result<(), CoreError> {
        for p in [self.origin(), self.dest()] {
            if !p.is_valid() {
                return Err(CoreError::InvalidCoordinate(p));
            }
        }
        Ok(())
    }
}
