//! `sr-index`: lighting and hazard point indices.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`point`]    | `InfluencePoint`, `PointKind`, score clamping            |
//! | [`index`]    | `PointIndex` (R-tree radius and bbox queries)            |
//! | [`feed`]     | GeoJSON / CSV feed parsers                               |
//! | [`snapshot`] | `IndexSource`, `FeedFile`, `MemoryFeed`, `VersionedIndex` |
//! | [`error`]    | `IndexError`, `IndexResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `sr-core` types.        |

pub mod error;
pub mod feed;
pub mod index;
pub mod point;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use error::{IndexError, IndexResult};
pub use feed::{FeedFormat, FeedSchema, load_points, parse_csv, parse_geojson};
pub use index::{Neighbor, PointIndex};
pub use point::{InfluencePoint, PointKind, clamp_score};
pub use snapshot::{FeedFile, IndexSource, MemoryFeed, Version, VersionedIndex};
