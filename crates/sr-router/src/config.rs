//! Engine configuration.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::SafetyParams;

/// Engine-wide settings.  Every field has a default, so `{}` is a valid
/// configuration document.
///
/// ```json
/// {
///   "bbox_margin_deg": 0.05,
///   "fetch_timeout_secs": 90,
///   "cache_dir": "/var/cache/saferoute",
///   "lighting_feed": "data/lighting.geojson",
///   "pedestrian_feeds": ["data/pedestrians.geojson"],
///   "hazard_feeds": ["data/hazards.geojson"],
///   "safety": { "light_sigma_m": 40.0 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Padding around the endpoints when no place is named.
    pub bbox_margin_deg: f64,
    /// Upper bound on one map-data fetch.
    pub fetch_timeout_secs: u64,
    /// Directory of the file graph cache; `None` keeps graphs in memory.
    pub cache_dir: Option<PathBuf>,
    /// GeoJSON or CSV feed of street lights.
    pub lighting_feed: Option<PathBuf>,
    /// Feeds of pedestrian-flow danger points; an unscored point scores 0.
    pub pedestrian_feeds: Vec<PathBuf>,
    /// Feeds of reported hazards; an unscored report scores 1.  The union of
    /// both hazard lists is used.
    pub hazard_feeds: Vec<PathBuf>,
    pub safety: SafetyParams,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bbox_margin_deg:    0.05,
            fetch_timeout_secs: 90,
            cache_dir:          None,
            lighting_feed:      None,
            pedestrian_feeds:   Vec::new(),
            hazard_feeds:       Vec::new(),
            safety:             SafetyParams::default(),
        }
    }
}

impl RouterConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_json_reader(BufReader::new(file))?)
    }
}
