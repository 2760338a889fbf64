use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration. Every field has a default, can be set from a
/// JSON config file, and can be overridden by a `PHRS_*` environment
/// variable. CLI flags (see `cli.rs`) take precedence over both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address for the HTTP server.
    pub host: String,
    pub port: u16,

    /// Image dimension bounds, applied after scale.
    pub min_size: u32,
    pub max_size: u32,
    /// Cap for the `@Nx` density suffix.
    pub max_scale: f32,

    /// Artifact cache time-to-live in seconds.
    pub cache_ttl_secs: u64,
    pub cache_max_items: usize,
    pub cache_max_bytes: usize,

    /// Maximum simultaneous raster encodes.
    pub concurrency: usize,

    pub default_background: String,
    pub default_text_color: String,
    pub default_font: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            min_size: 10,
            max_size: 4000,
            max_scale: 4.0,
            cache_ttl_secs: 60 * 60,
            cache_max_items: 1000,
            cache_max_bytes: 100 * 1024 * 1024,
            concurrency: 4,
            default_background: "#eeeeee".to_string(),
            default_text_color: "#555555".to_string(),
            default_font: "lato".to_string(),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        }
        None => Config::default(),
    };
    apply_env(&mut config);
    Ok(config)
}

/// Environment overrides, applied after the config file.
fn apply_env(config: &mut Config) {
    if let Ok(val) = std::env::var("PHRS_HOST") {
        config.host = val;
    }
    set_parsed(&mut config.port, "PHRS_PORT");
    set_parsed(&mut config.min_size, "PHRS_MIN_SIZE");
    set_parsed(&mut config.max_size, "PHRS_MAX_SIZE");
    set_parsed(&mut config.max_scale, "PHRS_MAX_SCALE");
    set_parsed(&mut config.cache_ttl_secs, "PHRS_CACHE_TTL_SECS");
    set_parsed(&mut config.cache_max_items, "PHRS_CACHE_MAX_ITEMS");
    set_parsed(&mut config.cache_max_bytes, "PHRS_CACHE_MAX_BYTES");
    set_parsed(&mut config.concurrency, "PHRS_CONCURRENCY");
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, var: &str) {
    if let Ok(val) = std::env::var(var) {
        if let Ok(parsed) = val.parse() {
            *slot = parsed;
        }
    }
}
