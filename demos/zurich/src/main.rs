//! zurich: end-to-end demo of the saferoute engine.
//!
//! Serves a synthetic four-node network around Zurich HB from memory, writes a
//! lighting feed and a hazard feed to `output/zurich/`, and routes the same
//! trip with the short and the safe policy.  Each route is written as GeoJSON
//! next to the feeds.  Set `RUST_LOG=debug` to see cache and search logs.

mod network;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde_json::json;

use sr_core::{CancelToken, TravelMode, sample_polyline};
use sr_graph::{AreaSpec, GraphData, NetworkSource, SourceError};
use sr_router::{EngineBuilder, RoutePreference, RouteRequest, RouterConfig};

use network::{HB, NIEDERDORF, WALCHE, lit_streets, zurich_network};

// ── Constants ─────────────────────────────────────────────────────────────────

const OUTPUT_DIR:      &str = "output/zurich";
const LIGHT_SPACING_M: f64  = 20.0;
const HAZARD_SCORE:    f64  = 0.95;

// ── Feeds ─────────────────────────────────────────────────────────────────────

/// Street lights every `LIGHT_SPACING_M` along the lit streets, as a GeoJSON
/// `FeatureCollection` of points.
fn write_lighting(path: &Path) -> Result<usize> {
    let features: Vec<_> = lit_streets()
        .iter()
        .flat_map(|line| sample_polyline(line, LIGHT_SPACING_M))
        .map(|p| {
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [p.lon, p.lat] },
            })
        })
        .collect();
    let count = features.len();
    fs::write(path, serde_json::to_vec_pretty(&json!({ "type": "FeatureCollection", "features": features }))?)?;
    Ok(count)
}

fn write_hazards(path: &Path) -> Result<()> {
    fs::write(path, format!("lat,lon,score\n{},{},{HAZARD_SCORE}\n", WALCHE.lat, WALCHE.lon))?;
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== zurich: saferoute demo ===");
    println!("From {HB} to {NIEDERDORF}, walking");
    println!();

    // 1. Feeds.
    let out = Path::new(OUTPUT_DIR);
    fs::create_dir_all(out)?;
    let lighting_path = out.join("lighting.geojson");
    let hazards_path = out.join("hazards.csv");
    let lights = write_lighting(&lighting_path)?;
    write_hazards(&hazards_path)?;
    println!("Lighting feed: {lights} lights  ->  {}", lighting_path.display());
    println!("Hazard feed:   1 hazard (score {HAZARD_SCORE}) at {WALCHE}");

    // 2. In-memory map-data source.
    let data = zurich_network();
    println!("Network: {} nodes, {} two-way streets", data.nodes.len(), data.edges.len());
    let source: Arc<dyn NetworkSource> =
        Arc::new(move |_: &AreaSpec, _: TravelMode| -> Result<GraphData, SourceError> { Ok(data.clone()) });

    // 3. Engine.
    let config = RouterConfig {
        cache_dir:     Some(out.join("cache")),
        lighting_feed: Some(lighting_path),
        hazard_feeds:  vec![hazards_path],
        ..RouterConfig::default()
    };
    let engine = EngineBuilder::new(config, source).build();
    println!();

    // 4. Route with both policies in one batch.
    let prefs = [RoutePreference::Short, RoutePreference::Safe];
    let reqs: Vec<RouteRequest> = prefs
        .iter()
        .map(|&p| RouteRequest::new(HB, NIEDERDORF).mode(TravelMode::Walk).preference(p))
        .collect();

    let t0 = Instant::now();
    let results = engine.route_batch(&reqs, &CancelToken::new());
    println!("Routed {} requests in {:.3} s", reqs.len(), t0.elapsed().as_secs_f64());
    println!();

    // 5. Summary.
    for (pref, result) in prefs.iter().zip(results) {
        let route = match result {
            Ok(r) => r,
            Err(e) => {
                println!("{pref}: {} ({e})", e.boundary_message());
                continue;
            }
        };
        println!("{pref}: {:.1} m, cost {:.3}", route.distance_m, route.cost);
        println!("  {:<6} {:<6} {:<22} {:>9}", "From", "To", "Street", "Length m");
        println!("  {}", "-".repeat(46));
        for s in &route.steps {
            println!("  {:<6} {:<6} {:<22} {:>9.1}", s.from, s.to, s.street, s.length_m);
        }

        let path = out.join(format!("route_{pref}.geojson"));
        fs::write(&path, serde_json::to_vec_pretty(&route.to_geojson())?)?;
        println!("  -> {}", path.display());
        println!();
    }

    Ok(())
}
