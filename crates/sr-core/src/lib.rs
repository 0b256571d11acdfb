//! `sr-core`: foundational types for the `saferoute` routing engine.
//!
//! This crate is a dependency of every other `sr-*` crate.  It has no `sr-*`
//! dependencies and minimal external ones (only `thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `EdgeId`                                        |
//! | [`geo`]    | `GeoPoint`, haversine, `BBox`, `LocalProjection`, sampling |
//! | [`mode`]   | `TravelMode` enum                                         |
//! | [`cancel`] | `CancelToken`                                             |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod cancel;
pub mod error;
pub mod geo;
pub mod ids;
pub mod mode;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use error::{CoreError, CoreResult};
pub use geo::{BBox, GeoPoint, LocalProjection, planar_distance_m, polyline_length_m, sample_polyline};
pub use ids::{EdgeId, NodeId};
pub use mode::TravelMode;
