//! Environment-driven service configuration.

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8723;
pub const DEFAULT_BUILD_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub anthropic_api_key: Option<String>,
    pub claude_model: Option<String>,
    pub build_concurrency: usize,
    /// When set, a service account with this key is provisioned at startup.
    pub bootstrap_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_port(std::env::var("PORT").ok())?;
        let data_dir = std::env::var("ARCHFORGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let artifacts_dir = std::env::var("ARCHFORGE_ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("artifacts"));
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        let claude_model = std::env::var("ARCHFORGE_CLAUDE_MODEL").ok();
        let build_concurrency =
            parse_build_concurrency(std::env::var("ARCHFORGE_BUILD_CONCURRENCY").ok());
        let bootstrap_api_key = std::env::var("ARCHFORGE_API_KEY").ok();

        if anthropic_api_key.is_none() {
            warn!("ANTHROPIC_API_KEY is not set; generation endpoints will fail until it is");
        }

        Ok(Self {
            host,
            port,
            data_dir,
            artifacts_dir,
            anthropic_api_key,
            claude_model,
            build_concurrency,
            bootstrap_api_key,
        })
    }
}

fn parse_port(value: Option<String>) -> Result<u16, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: raw,
        }),
        None => Ok(DEFAULT_PORT),
    }
}

/// Invalid or zero values fall back to the default rather than aborting
/// startup.
fn parse_build_concurrency(value: Option<String>) -> usize {
    match value {
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                warn!(value = %raw, "ignoring invalid ARCHFORGE_BUILD_CONCURRENCY");
                DEFAULT_BUILD_CONCURRENCY
            }
        },
        None => DEFAULT_BUILD_CONCURRENCY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_parses_or_defaults() {
        assert_eq!(parse_port(None).unwrap(), DEFAULT_PORT);
        assert_eq!(parse_port(Some("9000".to_string())).unwrap(), 9000);
        assert!(parse_port(Some("not-a-port".to_string())).is_err());
    }

    #[test]
    fn concurrency_rejects_zero_and_garbage() {
        assert_eq!(parse_build_concurrency(None), DEFAULT_BUILD_CONCURRENCY);
        assert_eq!(parse_build_concurrency(Some("8".to_string())), 8);
        assert_eq!(
            parse_build_concurrency(Some("0".to_string())),
            DEFAULT_BUILD_CONCURRENCY
        );
        assert_eq!(
            parse_build_concurrency(Some("lots".to_string())),
            DEFAULT_BUILD_CONCURRENCY
        );
    }
}
