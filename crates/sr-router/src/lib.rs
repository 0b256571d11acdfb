//! `sr-router`: safety-weighted routing over `sr-graph` street graphs.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`policy`]   | `RoutePolicy`, `RoutePreference`, `SafetyParams`              |
//! | [`cost`]     | `EdgeCost` trait, `CostModel` (darkness + hazard terms)       |
//! | [`search`]   | `PathFinder` trait, `AStar`, `PathSearch`                     |
//! | [`assemble`] | `Route`, `RouteGeometry`, `RouteStep`, GeoJSON output         |
//! | [`request`]  | `RouteRequest`, `HazardInput`                                 |
//! | [`config`]   | `RouterConfig`                                                |
//! | [`engine`]   | `RoutingEngine`: one request end to end, batches              |
//! | [`builder`]  | `EngineBuilder`                                               |
//! | [`error`]    | `RouteError`, `FailureKind`, `RouteResult<T>`                 |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | `route_batch` runs requests on Rayon's thread pool.         |
//! | `sqlite`   | Forwards to `sr-graph/sqlite`.                              |
//! | `osm`      | Forwards to `sr-graph/osm`.                                 |

pub mod assemble;
pub mod builder;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod policy;
pub mod request;
pub mod search;


pub use assemble::{Route, RouteGeometry, RouteStep, UNNAMED_STREET, assemble};
pub use builder::EngineBuilder;
pub use config::RouterConfig;
pub use cost::{CostModel, EdgeCost, MIN_EDGE_COST};
pub use engine::RoutingEngine;
pub use error::{Endpoint, FailureKind, RouteError, RouteResult};
pub use policy::{RoutePolicy, RoutePreference, SafetyParams};
pub use request::{HazardInput, RouteRequest};
pub use search::{AStar, PathFinder, PathSearch};
