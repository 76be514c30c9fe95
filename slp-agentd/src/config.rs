use std::path::{Path, PathBuf};
use serde::Deserialize;
use anyhow::{Context, Result};
use crate::openslp::LIFETIME_MAXIMUM;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub regd: RegdConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// OpenSLP client library to load
    #[serde(default = "default_library")]
    pub library: PathBuf,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Attribute list sent with every registration
    #[serde(default = "default_reg_attributes")]
    pub reg_attributes: String,
    #[serde(default = "default_reg_lifetime")]
    pub reg_lifetime: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

/// Static registrations picked up by slpd
#[derive(Debug, Clone, Deserialize)]
pub struct RegdConfig {
    #[serde(default = "default_regd_dir")]
    pub dir: PathBuf,
}

fn default_library() -> PathBuf {
    PathBuf::from("libslp.so.1")
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_reg_attributes() -> String {
    "(public-key=......my_pgp_key.......)".to_string()
}

fn default_reg_lifetime() -> u16 {
    LIFETIME_MAXIMUM
}

fn default_listen() -> String {
    "127.0.0.1:8427".to_string()
}

fn default_regd_dir() -> PathBuf {
    PathBuf::from("/etc/slp.reg.d")
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            locale: default_locale(),
            reg_attributes: default_reg_attributes(),
            reg_lifetime: default_reg_lifetime(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl Default for RegdConfig {
    fn default() -> Self {
        Self {
            dir: default_regd_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.agent.locale, "en");
        assert_eq!(config.agent.reg_lifetime, 65535);
        assert_eq!(config.agent.library, PathBuf::from("libslp.so.1"));
        assert_eq!(config.api.listen, "127.0.0.1:8427");
        assert_eq!(config.regd.dir, PathBuf::from("/etc/slp.reg.d"));
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [agent]
            locale = "de"
            reg_lifetime = 300

            [api]
            listen = "[::1]:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.agent.locale, "de");
        assert_eq!(config.agent.reg_lifetime, 300);
        assert_eq!(config.agent.reg_attributes, "(public-key=......my_pgp_key.......)");
        assert_eq!(config.api.listen, "[::1]:9000");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/agentd.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
