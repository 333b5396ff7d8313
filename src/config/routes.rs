// Loading route files from disk

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::yml_settings::RoutesConfig;

pub const DEFAULT_ROUTES_FILE: &str = "routes.yml";

pub fn from_yaml_str(yml: &str) -> Result<RoutesConfig> {
    serde_yaml::from_str(yml).context("Invalid route file")
}

/// Read and parse a route file, `routes.yml` when no path is given.
pub fn load_routes(path: Option<&Path>) -> Result<RoutesConfig> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_ROUTES_FILE));
    let yml = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read route file {}", path.display()))?;
    let config = from_yaml_str(&yml).with_context(|| format!("Failed to load {}", path.display()))?;
    debug!(path = %path.display(), routes = config.routes.len(), "loaded route file");
    Ok(config)
}
