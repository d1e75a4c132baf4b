//! Server configuration.

use std::net::SocketAddr;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Top-level configuration, merged from `policies-server.yaml` (when present)
/// and `POLICIES_`-prefixed environment variables
/// (`POLICIES_RBAC__BASE_URL`, `POLICIES_STATUS__INTERVAL_SECS`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rbac: RbacConfig,
    pub engine: EngineConfig,
    pub database: DatabaseConfig,
    pub status: StatusConfig,
}

impl AppConfig {
    /// Load and merge all configuration sources.
    ///
    /// # Errors
    ///
    /// Returns an error when a source is present but malformed or a value
    /// cannot be deserialized into its typed field.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Figment::new()
            .merge(Yaml::file("policies-server.yaml"))
            .merge(Env::prefixed("POLICIES_").split("__"))
            .extract()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbacConfig {
    /// Base URL of the remote RBAC service.
    pub base_url: String,
    /// Application name sent with every grant lookup.
    pub application: String,
    /// Grant cache time-to-live.
    pub grant_ttl_secs: u64,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8086".to_owned(),
            application: "policies".to_owned(),
            grant_ttl_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Base URL of the rule-evaluation engine.
    pub base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8084".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/policies".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Seconds between aggregation cycles.
    pub interval_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}
