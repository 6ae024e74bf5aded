/// `load_config` module: loads the static YAML config and injects API keys
/// from the environment, producing the [`MigrationConfig`] handed to the
/// platform clients.
///
/// Environment variables take precedence over any `api_key` present in the
/// file. A run without a key for either platform is rejected here rather
/// than at the first API call.
use anyhow::{bail, Result};
use community_migrate_core::config::MigrationConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const CIRCLE_API_KEY_ENV: &str = "CIRCLE_API_KEY";
pub const INTERCOM_API_KEY_ENV: &str = "INTERCOM_API_KEY";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MigrationConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let mut config: MigrationConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.circle.api_key = resolve_secret(CIRCLE_API_KEY_ENV, &config.circle.api_key)?;
    config.intercom.api_key = resolve_secret(INTERCOM_API_KEY_ENV, &config.intercom.api_key)?;

    if config.circle.per_page == 0 {
        bail!("circle.per_page must be greater than zero");
    }

    config.trace_loaded();
    Ok(config)
}

fn resolve_secret(var: &str, from_file: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var, "API key found in env");
            Ok(value)
        }
        _ if !from_file.trim().is_empty() => {
            info!(var, "API key taken from config file");
            Ok(from_file.to_string())
        }
        _ => {
            error!(var, "API key missing from env and config file");
            Err(anyhow::anyhow!(
                "missing API credentials: {var} environment variable not set"
            ))
        }
    }
}
