mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

/// Loads configuration from `CONFIG_PATH` (default `config.yaml`), then
/// applies `GEMINI_API_KEY` and `PORT` from the environment.
///
/// A missing config file is fine: defaults plus environment are enough to run.
pub async fn load() -> Result<Config> {
    // A .env file is optional
    let _ = dotenvy::dotenv();

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(config_str) => parse(&config_str)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No configuration file at {}, using defaults", config_path);
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    apply_overrides(
        &mut config,
        env::var("GEMINI_API_KEY").ok(),
        env::var("PORT").ok(),
    )?;
    validate(&config)?;

    Ok(config)
}

pub fn parse(config_str: &str) -> Result<Config> {
    // An empty document deserializes to unit, not to an empty mapping
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

pub fn apply_overrides(
    config: &mut Config,
    api_key: Option<String>,
    port: Option<String>,
) -> Result<()> {
    if let Some(api_key) = api_key.filter(|k| !k.is_empty()) {
        config.llm.api_key = api_key;
    }

    if let Some(port) = port.filter(|p| !p.is_empty()) {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("Invalid PORT value: '{}'", port)))?;
    }

    Ok(())
}

pub fn validate(config: &Config) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        return Err(Error::config(
            "No API key configured: set GEMINI_API_KEY or llm.api_key",
        ));
    }
    if let Some(base_url) = config.llm.effective_base_url() {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::config(format!(
                "llm.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }
    }
    Ok(())
}
