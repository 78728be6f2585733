//! Store configuration.
//!
//! Layered with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (`aettbok.toml` in the working directory, or an explicit path)
//! 3. `AETTBOK_`-prefixed environment variables, `__` separating sections
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_secs = 300
//! redis_url = "redis://127.0.0.1/"
//!
//! [neo4j]
//! uri = "127.0.0.1:7687"
//! user = "neo4j"
//! password = "secret"
//! ```
//!
//! `AETTBOK_CACHE__TTL_SECS=60` overrides `cache.ttl_secs`.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aettbok.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AETTBOK_";

/// Cache-aside settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve reads from the cache.
    pub enabled: bool,
    /// Entry lifetime in seconds.
    pub ttl_secs: u64,
    /// Redis URL; the in-process cache is used when absent.
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            redis_url: None,
        }
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// Bolt address, e.g. `127.0.0.1:7687`.
    pub uri: Option<String>,
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl Neo4jConfig {
    /// Returns `(uri, user, password)` when all three are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.uri.as_deref()?,
            self.user.as_deref()?,
            self.password.as_deref()?,
        ))
    }
}

/// Entity store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Cache settings.
    pub cache: CacheConfig,
    /// Graph store settings.
    pub neo4j: Neo4jConfig,
}

impl StoreConfig {
    /// Builds the layered figment without extracting it.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads the configuration.
    ///
    /// A missing default file is fine; a missing explicit `path` is not.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file is missing or malformed, a value
    /// has the wrong type, or [`StoreConfig::validate`] fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if caching is enabled with a zero TTL.
    pub fn validate(&self) -> Result<()> {
        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(Error::Config(
                "cache.ttl_secs must be positive when caching is enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Cache entry lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "AETTBOK_CACHE__ENABLED",
            "AETTBOK_CACHE__TTL_SECS",
            "AETTBOK_NEO4J__URI",
        ] {
            std::env::remove_var(key);
        }
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = StoreConfig::figment(Some(Path::new("/nonexistent/aettbok.toml")))
            .extract::<StoreConfig>()
            .unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.cache.enabled);
        assert_eq!(config.ttl(), Duration::from_secs(300));
        assert!(config.neo4j.credentials().is_none());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        clear_env();
        let file = toml_file(
            r#"
            [cache]
            ttl_secs = 42

            [neo4j]
            uri = "127.0.0.1:7687"
            user = "neo4j"
            password = "pw"
            "#,
        );

        let config = StoreConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.cache.ttl_secs, 42);
        assert!(config.cache.enabled);
        assert_eq!(
            config.neo4j.credentials(),
            Some(("127.0.0.1:7687", "neo4j", "pw"))
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let file = toml_file("[cache]\nttl_secs = 42\n");
        std::env::set_var("AETTBOK_CACHE__TTL_SECS", "7");
        std::env::set_var("AETTBOK_CACHE__ENABLED", "false");

        let config = StoreConfig::load(Some(file.path()));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.cache.ttl_secs, 7);
        assert!(!config.cache.enabled);
    }

    #[test]
    #[serial]
    fn test_zero_ttl_rejected_when_enabled() {
        clear_env();
        let file = toml_file("[cache]\nttl_secs = 0\n");
        let err = StoreConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let file = toml_file("[cache]\nenabled = false\nttl_secs = 0\n");
        assert!(StoreConfig::load(Some(file.path())).is_ok());
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_fails() {
        clear_env();
        let err = StoreConfig::load(Some(Path::new("/nonexistent/aettbok.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    #[serial]
    fn test_malformed_value_fails() {
        clear_env();
        let file = toml_file("[cache]\nttl_secs = \"soon\"\n");
        let err = StoreConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
