//! Core error type.
//!
//! Sub-crates define their own error enums; this one only covers failures in
//! the primitives themselves (parsing and coordinate validation).

use thiserror::Error;

use crate::GeoPoint;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown travel mode {0:?}: expected walk, bike, or drive")]
    UnknownMode(String),

    #[error("unknown route preference {0:?}: expected short, fast, or safe")]
    UnknownPreference(String),

    #[error("invalid coordinate {0}")]
    InvalidCoordinate(GeoPoint),
}

pub type CoreResult<T> = Result<T, CoreError>;
