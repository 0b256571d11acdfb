//! `sr-graph`: street graph, snapping, and graph acquisition.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`graph`]  | `StreetGraph` (CSR + planar R-tree), `StreetGraphBuilder`     |
//! | [`data`]   | `GraphData`, the serialisable provider/cache format           |
//! | [`source`] | `NetworkSource` trait, `AreaSpec`, `fetch_with_timeout`      |
//! | [`store`]  | `GraphStore` trait, `CacheKey`, memory / file / SQLite stores |
//! | [`cache`]  | `GraphCache`, read-through `(area, mode)` → graph           |
//! | [`osm`]    | `PbfSource` (feature = `"osm"` only)                         |
//! | [`error`]  | `GraphError`, `SourceError`, `StoreError`, `GraphResult<T>`  |
//!
//! # Feature flags
//!
//! | Flag     | Effect                                                      |
//! |----------|-------------------------------------------------------------|
//! | `osm`    | Enables the OSM PBF network source via `osmpbf`.            |
//! | `sqlite` | Enables `SqliteGraphStore` via `rusqlite`.                  |
//! | `serde`  | Derives `Serialize`/`Deserialize` on `sr-core` types.       |

pub mod cache;
pub mod data;
pub mod error;
pub mod graph;
pub mod source;
pub mod store;

#[cfg(feature = "osm")]
pub mod osm;


pub use cache::{GraphCache, LoadOptions};
pub use data::{EdgeRecord, GraphData, NodeRecord};
pub use error::{GraphError, GraphResult, SourceError, StoreError};
pub use graph::{EdgeAttrs, StreetGraph, StreetGraphBuilder};
pub use source::{AreaSpec, NetworkSource, fetch_with_timeout};
pub use store::{CacheKey, FileGraphStore, GraphStore, MemoryGraphStore};

#[cfg(feature = "sqlite")]
pub use store::SqliteGraphStore;
