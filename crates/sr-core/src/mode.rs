//! Travel mode shared by the graph cache, map-data sources, and requests.

use std::str::FromStr;

use crate::CoreError;

/// The network a route is computed over.  Each mode has its own graph: a
/// footpath is part of the walk network but not of the drive network.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TravelMode {
    /// On foot (default).
    #[default]
    Walk,
    /// Bicycle.
    Bike,
    /// Private vehicle.
    Drive,
}

impl TravelMode {
    /// Lower-case label used in cache keys and provider queries.
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk  => "walk",
            TravelMode::Bike  => "bike",
            TravelMode::Drive => "drive",
        }
    }
}

impl FromStr for TravelMode {
    type Err = CoreError;

    /// Case-insensitive parse of `walk`, `bike`, or `drive`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk"  => Ok(TravelMode::Walk),
            "bike"  => Ok(TravelMode::Bike),
            "drive" => Ok(TravelMode::Drive),
            _       => Err(CoreError::UnknownMode(s.to_owned())),
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
