//! Routing policies and the safety model's tunable constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sr_core::CoreError;

/// Constants of the safest-policy cost model.
///
/// Lengths are metres.  The defaults reproduce the production weighting;
/// every field may be overridden from JSON, missing fields keep their default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyParams {
    /// Bandwidth of one light's Gaussian kernel.
    pub light_sigma_m: f64,
    /// Lights further than `light_cutoff_sigmas * light_sigma_m` from a
    /// sample are ignored.
    pub light_cutoff_sigmas: f64,
    /// Distance between samples along an edge.
    pub sample_step_m: f64,
    /// Lighting strength `α` in `1 / (ε + α·density)`.
    pub light_alpha: f64,
    /// `ε` in `1 / (ε + α·density)`.
    pub epsilon: f64,
    /// Below this mean density an edge counts as unlit.
    pub min_density: f64,
    /// Multiplier applied to the darkness term of unlit edges.
    pub darkness_penalty: f64,

    /// Bandwidth of one hazard's Gaussian kernel.
    pub hazard_sigma_m: f64,
    /// Exponent `γ` applied to hazard scores.
    pub hazard_gamma: f64,
    /// Hazards further than this from a sample are ignored.
    pub hazard_radius_m: f64,
    /// Multiplier on the mean hazard density.
    pub hazard_weight: f64,
    /// Scores at or above this mark a high-risk hazard.
    pub high_risk_threshold: f64,
    /// Flat penalty for an edge passing within `hazard_radius_m` of a
    /// high-risk hazard.
    pub high_risk_penalty: f64,
}

impl Default for SafetyParams {
    fn default() -> Self {
        Self {
            light_sigma_m:       40.0,
            light_cutoff_sigmas: 4.0,
            sample_step_m:       15.0,
            light_alpha:         3.0,
            epsilon:             1e-6,
            min_density:         0.05,
            darkness_penalty:    2.0,
            hazard_sigma_m:      30.0,
            hazard_gamma:        2.0,
            hazard_radius_m:     100.0,
            hazard_weight:       6.0,
            high_risk_threshold: 0.85,
            high_risk_penalty:   20.0,
        }
    }
}

impl SafetyParams {
    #[inline]
    pub fn light_cutoff_m(&self) -> f64 {
        self.light_sigma_m * self.light_cutoff_sigmas
    }
}

/// The cost function a search runs under.
#[derive(Clone, Debug, PartialEq)]
pub enum RoutePolicy {
    /// Edge length.
    Shortest,
    /// Darkness plus hazard exposure.
    Safest(SafetyParams),
}

impl RoutePolicy {
    pub fn from_preference(pref: RoutePreference, params: &SafetyParams) -> Self {
        match pref {
            RoutePreference::Short => RoutePolicy::Shortest,
            RoutePreference::Safe  => RoutePolicy::Safest(params.clone()),
        }
    }
}

/// Policy as named in requests: `"short"` (alias `"fast"`) or `"safe"`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePreference {
    #[default]
    #[serde(alias = "fast")]
    Short,
    Safe,
}

impl RoutePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutePreference::Short => "short",
            RoutePreference::Safe  => "safe",
        }
    }
}

impl FromStr for RoutePreference {
    type Err = CoreError;

    /// Case-insensitive; `fast` is accepted as a synonym for `short`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" | "fast" => Ok(RoutePreference::Short),
            "safe"           => Ok(RoutePreference::Safe),
            _                => Err(CoreError::UnknownPreference(s.to_owned())),
        }
    }
}

impl fmt::Display for RoutePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
