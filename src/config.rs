//! Replident Configuration
//!
//! This module provides configuration structures for the replident
//! host-identity agent.

use serde::{Deserialize, Serialize};

/// Main replident configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplidentConfig {
    /// Fact gathering configuration
    #[serde(default)]
    pub facts: FactsConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Fact gathering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactsConfig {
    /// Network interface whose MAC feeds the macaddress fact
    /// (default: first non-loopback interface the OS reports)
    #[serde(default)]
    pub interface: Option<String>,

    /// mysqld binary probed by the mysqld_version fact
    #[serde(default = "default_mysqld_path")]
    pub mysqld_path: String,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable HTTP API
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HTTP API bind address
    #[serde(default = "default_api_address")]
    pub bind_address: String,
}

// Default value functions
fn default_mysqld_path() -> String {
    "mysqld".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_address() -> String {
    "0.0.0.0:9306".to_string()
}

impl Default for ReplidentConfig {
    fn default() -> Self {
        Self {
            facts: FactsConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            interface: None,
            mysqld_path: default_mysqld_path(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_api_address(),
        }
    }
}

impl ReplidentConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReplidentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: ReplidentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.facts.mysqld_path.is_empty() {
            return Err(crate::Error::Config(
                "facts.mysqld_path cannot be empty".into(),
            ));
        }

        if let Some(interface) = &self.facts.interface {
            if interface.is_empty() {
                return Err(crate::Error::Config(
                    "facts.interface cannot be empty when set".into(),
                ));
            }
        }

        if self.api.enabled && self.api.bind_address.is_empty() {
            return Err(crate::Error::Config(
                "api.bind_address cannot be empty when the API is enabled".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReplidentConfig::default();
        assert_eq!(config.facts.mysqld_path, "mysqld");
        assert_eq!(config.facts.interface, None);
        assert!(config.api.enabled);
        assert_eq!(config.api.bind_address, "0.0.0.0:9306");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[facts]
interface = "eth0"
mysqld_path = "/usr/sbin/mariadbd"

[api]
enabled = false
bind_address = "127.0.0.1:9306"
"#;

        let config = ReplidentConfig::from_str(toml).unwrap();
        assert_eq!(config.facts.interface.as_deref(), Some("eth0"));
        assert_eq!(config.facts.mysqld_path, "/usr/sbin/mariadbd");
        assert!(!config.api.enabled);
        assert_eq!(config.api.bind_address, "127.0.0.1:9306");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ReplidentConfig::from_str("").unwrap();
        assert_eq!(config.facts.mysqld_path, "mysqld");
        assert!(config.api.enabled);
    }

    #[test]
    fn test_rejects_empty_mysqld_path() {
        let toml = r#"
[facts]
mysqld_path = ""
"#;
        assert!(ReplidentConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_rejects_empty_interface() {
        let toml = r#"
[facts]
interface = ""
"#;
        assert!(ReplidentConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_rejects_empty_bind_address_when_enabled() {
        let toml = r#"
[api]
enabled = true
bind_address = ""
"#;
        assert!(ReplidentConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replident.toml");
        std::fs::write(&path, "[facts]\nmysqld_path = \"/opt/mysql/bin/mysqld\"\n").unwrap();

        let config = ReplidentConfig::from_file(&path).unwrap();
        assert_eq!(config.facts.mysqld_path, "/opt/mysql/bin/mysqld");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ReplidentConfig::from_file(std::path::Path::new("/nonexistent/replident.toml"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
