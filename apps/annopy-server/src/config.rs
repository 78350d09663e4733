//! Configuration management for the annopy server

use serde::Deserialize;
use std::env;

use crate::anchoring::{AnchoringConfig, DEFAULT_CONTEXT_LENGTH};
use crate::html::HighlightConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub annotation: AnnotationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationConfig {
    /// Characters of prefix/suffix stored around each quote
    pub context_length: usize,
    /// Element name used for highlight markers
    pub marker_tag: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            annotation: AnnotationConfig {
                context_length: DEFAULT_CONTEXT_LENGTH,
                marker_tag: "span".to_string(),
            },
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let marker_tag = env::var("ANNOPY_MARKER_TAG").unwrap_or_else(|_| "span".to_string());
        if marker_tag.is_empty() || !marker_tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid {
                name: "ANNOPY_MARKER_TAG",
                value: marker_tag,
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parsed("SERVER_PORT", 3000)?,
            },
            annotation: AnnotationConfig {
                context_length: parsed("ANNOPY_CONTEXT_LENGTH", DEFAULT_CONTEXT_LENGTH)?,
                marker_tag: marker_tag.to_ascii_lowercase(),
            },
        })
    }

    pub fn anchoring(&self) -> AnchoringConfig {
        AnchoringConfig {
            context_length: self.annotation.context_length,
        }
    }

    pub fn highlight(&self) -> HighlightConfig {
        HighlightConfig {
            marker_tag: self.annotation.marker_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.anchoring().context_length, 32);
        assert_eq!(config.highlight().marker_tag, "span");
    }
}
