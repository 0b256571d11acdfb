//! Edge cost model.
//!
//! # Safest policy
//!
//! Each edge is sampled every `sample_step_m` along its polyline (at least
//! both endpoints; a zero-length edge is sampled once at its start).  At each
//! sample:
//!
//! ```text
//! light(s)  = Σ exp(-d² / 2σ²)              over lights with d ≤ cutoff
//! hazard(s) = Σ score^γ · exp(-d² / 2σ_h²)  over hazards with d ≤ radius, score > 0
//! ```
//!
//! With `ρ` the mean of `light(s)` and `η` the mean of `hazard(s)`:
//!
//! ```text
//! darkness = 1 / (ε + α·ρ) × (penalty if ρ < min_density else 1)
//! hazard   = weight · η + (high_risk_penalty if any score ≥ threshold within radius)
//! cost     = max(MIN_EDGE_COST, darkness + hazard)
//! ```
//!
//! When the lighting index is empty the safest policy falls back to edge
//! length and hazards are not consulted.

use sr_core::{EdgeId, GeoPoint, sample_polyline};
use sr_graph::StreetGraph;
use sr_index::PointIndex;

use crate::policy::{RoutePolicy, SafetyParams};

/// Lower bound on every edge cost, for every policy.
pub const MIN_EDGE_COST: f64 = 0.1;

/// Cost of traversing one directed edge.
///
/// Implementations must be deterministic and return values `>= MIN_EDGE_COST`
/// (or non-finite values, which the search rejects as a fault).
pub trait EdgeCost: Send + Sync {
    fn edge_cost(&self, graph: &StreetGraph, edge: EdgeId) -> f64;
}

/// [`EdgeCost`] for a [`RoutePolicy`] over fixed lighting and hazard indices.
pub struct CostModel<'a> {
    policy:  &'a RoutePolicy,
    lights:  &'a PointIndex,
    hazards: &'a PointIndex,
}

impl<'a> CostModel<'a> {
    pub fn new(policy: &'a RoutePolicy, lights: &'a PointIndex, hazards: &'a PointIndex) -> Self {
        Self { policy, lights, hazards }
    }

    /// Whether edges are costed by length alone, either because the policy
    /// asks for it or because no lighting data is available.
    pub fn is_length_only(&self) -> bool {
        match self.policy {
            RoutePolicy::Shortest  => true,
            RoutePolicy::Safest(_) => self.lights.is_empty(),
        }
    }

    /// Darkness term for an edge sampled at `samples`.
    pub fn darkness_term(&self, params: &SafetyParams, samples: &[GeoPoint]) -> f64 {
        let density = mean_light_density(params, self.lights, samples);
        let penalty = if density < params.min_density { params.darkness_penalty } else { 1.0 };
        penalty / (params.epsilon + params.light_alpha * density)
    }

    /// Hazard term for an edge sampled at `samples`.
    pub fn hazard_term(&self, params: &SafetyParams, samples: &[GeoPoint]) -> f64 {
        if samples.is_empty() || self.hazards.is_empty() {
            return 0.0;
        }

        let inv_two_sigma2 = 1.0 / (2.0 * params.hazard_sigma_m * params.hazard_sigma_m);
        let mut total = 0.0;
        let mut high_risk = false;
        for &s in samples {
            for n in self.hazards.within(s, params.hazard_radius_m) {
                let score = n.point.score();
                if score <= 0.0 {
                    continue;
                }
                total += score.powf(params.hazard_gamma)
                    * (-(n.distance_m * n.distance_m) * inv_two_sigma2).exp();
                high_risk |= score >= params.high_risk_threshold;
            }
        }

        let mean = total / samples.len() as f64;
        let jump = if high_risk { params.high_risk_penalty } else { 0.0 };
        params.hazard_weight * mean + jump
    }

    fn safety_cost(&self, params: &SafetyParams, graph: &StreetGraph, edge: EdgeId) -> f64 {
        let samples = sample_polyline(&graph.edge_polyline(edge), params.sample_step_m);
        self.darkness_term(params, &samples) + self.hazard_term(params, &samples)
    }
}

impl EdgeCost for CostModel<'_> {
    fn edge_cost(&self, graph: &StreetGraph, edge: EdgeId) -> f64 {
        let raw = match self.policy {
            RoutePolicy::Safest(params) if !self.lights.is_empty() => {
                self.safety_cost(params, graph, edge)
            }
            _ => graph.edge_length_m[edge.index()],
        };
        // `f64::max` would swallow NaN; keep it visible to the search.
        if raw.is_nan() { raw } else { raw.max(MIN_EDGE_COST) }
    }
}

/// Mean over `samples` of the summed light kernel.
fn mean_light_density(params: &SafetyParams, lights: &PointIndex, samples: &[GeoPoint]) -> f64 {
    if samples.is_empty() || lights.is_empty() {
        return 0.0;
    }
    let inv_two_sigma2 = 1.0 / (2.0 * params.light_sigma_m * params.light_sigma_m);
    let cutoff = params.light_cutoff_m();

    let total: f64 = samples
        .iter()
        .map(|&s| {
            lights
                .within(s, cutoff)
                .iter()
                .map(|n| (-(n.distance_m * n.distance_m) * inv_two_sigma2).exp())
                .sum::<f64>()
        })
        .sum();
    total / samples.len() as f64
}
