//! Projection configuration from file and flags.

use anyhow::{Context, Result};
use iporisk_model::{MembershipMode, ProjectionConfig};
use std::fs;
use std::path::Path;

/// Flag overrides on top of the configuration file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) top_k: Option<usize>,
    pub(crate) discretized: bool,
    pub(crate) parallel: bool,
}

/// Load `path` (JSON, missing fields defaulted) or the defaults, then apply
/// the overrides.
pub(crate) fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<ProjectionConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ProjectionConfig::default(),
    };

    if let Some(k) = overrides.top_k {
        config.top_k = k;
    }
    if overrides.discretized {
        config.membership = MembershipMode::discretized();
    }
    if overrides.parallel {
        config.parallel = true;
    }

    config.validate()?;
    Ok(config)
}
