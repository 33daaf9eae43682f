//! Service configuration.
//!
//! Built-in defaults, optionally overlaid by a YAML file named in
//! `CONFIG_FILE`, then by environment variables.

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Release {
    Dev,
    Test,
    #[default]
    Prod,
}

impl FromStr for Release {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "prod" => Ok(Self::Prod),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbEngine {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for DbEngine {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub release: Release,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Route prefix, e.g. `api` -> `/api/login`
    pub context: String,
    pub shutdown_timeout_secs: u64,
    /// gzip responses
    pub compressed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            context: "api".to_string(),
            shutdown_timeout_secs: 10,
            compressed: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// 0 disables the expired-session sweeper
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_secs: 3600,
            sweep_interval_secs: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Bucket refill rate; 0 disables limiting
    pub per_second: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst: 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub engine: DbEngine,
    /// Full connection URL; overrides the individual parts when set
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    /// Create the users table at startup
    pub migrate: bool,
    pub pool_max_conns: u32,
    /// Connections kept open while idle (capped at `pool_max_conns`)
    pub max_idle_conns: u32,
    pub conn_max_lifetime_mins: u64,
    /// Postgres `search_path` for every pooled connection
    pub schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: DbEngine::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "yourpass".to_string(),
            name: "yourdb".to_string(),
            ssl_mode: "disable".to_string(),
            migrate: false,
            pool_max_conns: 10,
            max_idle_conns: 5,
            conn_max_lifetime_mins: 5,
            schema: "public".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    /// EnvFilter directive; defaults by release (dev: debug, else info)
    pub level: Option<String>,
    pub dir: String,
    pub file: String,
    pub json: bool,
    pub rotation: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: None,
            dir: "logs".to_string(),
            file: "simple-auth.log".to_string(),
            json: false,
            rotation: "daily".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults -> `CONFIG_FILE` (if set) -> process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        env.parsed("RELEASE", &mut self.release)?;

        env.string("HOST", &mut self.server.host);
        env.parsed("PORT", &mut self.server.port)?;
        env.string("CONTEXT", &mut self.server.context);
        env.parsed("SHUTDOWN_TIMEOUT", &mut self.server.shutdown_timeout_secs)?;
        env.flag("COMPRESSED", &mut self.server.compressed)?;

        env.string("JWT_SECRET", &mut self.session.jwt_secret);
        env.parsed("TOKEN_TTL_SECS", &mut self.session.token_ttl_secs)?;
        env.parsed(
            "SESSION_SWEEP_INTERVAL_SECS",
            &mut self.session.sweep_interval_secs,
        )?;

        env.parsed("RATE_LIMIT_PER_SECOND", &mut self.rate_limit.per_second)?;
        env.parsed("RATE_LIMIT_BURST", &mut self.rate_limit.burst)?;

        env.parsed("DB_ENGINE", &mut self.database.engine)?;
        if let Some(url) = (env.lookup)("DB_URL") {
            self.database.url = Some(url);
        }
        env.string("DB_HOST", &mut self.database.host);
        env.parsed("DB_PORT", &mut self.database.port)?;
        env.string("DB_USER", &mut self.database.user);
        env.string("DB_PASS", &mut self.database.password);
        env.string("DB_NAME", &mut self.database.name);
        env.string("SSL_MODE", &mut self.database.ssl_mode);
        env.flag("DB_MIGRATE", &mut self.database.migrate)?;
        env.parsed("DB_POOL_MAX_CONNS", &mut self.database.pool_max_conns)?;
        env.parsed("DB_MAX_IDLE_CONNS", &mut self.database.max_idle_conns)?;
        env.string("DB_SCHEMA", &mut self.database.schema);
        env.parsed(
            "DB_CONN_MAX_LIFETIME",
            &mut self.database.conn_max_lifetime_mins,
        )?;

        if let Some(level) = (env.lookup)("LOG_LEVEL") {
            self.log.level = Some(level);
        }
        env.string("LOG_DIR", &mut self.log.dir);
        env.string("LOG_FILE", &mut self.log.file);
        env.flag("LOG_JSON", &mut self.log.json)?;
        env.string("LOG_ROTATION", &mut self.log.rotation);

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET must not be empty".into()));
        }
        if self.session.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "TOKEN_TTL_SECS must be at least 1".into(),
            ));
        }
        let expiry_fits = i64::try_from(self.session.token_ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some();
        if !expiry_fits {
            return Err(ConfigError::Invalid(format!(
                "TOKEN_TTL_SECS={} is too large to compute a token expiry",
                self.session.token_ttl_secs
            )));
        }
        if self.rate_limit.per_second > 0 && self.rate_limit.burst == 0 {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_BURST must be at least 1 when rate limiting is enabled".into(),
            ));
        }
        if self.database.pool_max_conns == 0 {
            return Err(ConfigError::Invalid(
                "DB_POOL_MAX_CONNS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.session.jwt_secret == DEFAULT_JWT_SECRET
    }

    /// Route prefix with a leading slash and no trailing slash (`""` for root).
    pub fn base_path(&self) -> String {
        let trimmed = self.server.context.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.session.token_ttl_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }

    pub fn log_level(&self) -> String {
        self.log.level.clone().unwrap_or_else(|| match self.release {
            Release::Dev => "debug".to_string(),
            Release::Test | Release::Prod => "info".to_string(),
        })
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &'static str, target: &mut String) {
        if let Some(value) = (self.lookup)(key) {
            *target = value;
        }
    }

    fn parsed<T: FromStr>(&self, key: &'static str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(value) = (self.lookup)(key) {
            *target = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })?;
        }
        Ok(())
    }

    fn flag(&self, key: &'static str, target: &mut bool) -> Result<(), ConfigError> {
        if let Some(value) = (self.lookup)(key) {
            *target = parse_bool(value.trim()).ok_or(ConfigError::InvalidValue { key, value })?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.base_path(), "/api");
        assert_eq!(config.token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.rate_limit.per_second, 1);
        assert_eq!(config.rate_limit.burst, 3);
        assert_eq!(config.database.engine, DbEngine::Postgres);
        assert!(config.uses_default_secret());
        assert_eq!(config.log_level(), "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("CONTEXT", "/auth/"),
                ("JWT_SECRET", "s3cr3t"),
                ("TOKEN_TTL_SECS", "60"),
                ("DB_ENGINE", "memory"),
                ("DB_MIGRATE", "true"),
                ("DB_MAX_IDLE_CONNS", "2"),
                ("DB_SCHEMA", "auth"),
                ("COMPRESSED", "1"),
                ("RELEASE", "dev"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.base_path(), "/auth");
        assert_eq!(config.session.jwt_secret, "s3cr3t");
        assert!(!config.uses_default_secret());
        assert_eq!(config.token_ttl(), Duration::from_secs(60));
        assert_eq!(config.database.engine, DbEngine::Memory);
        assert!(config.database.migrate);
        assert_eq!(config.database.max_idle_conns, 2);
        assert_eq!(config.database.schema, "auth");
        assert!(config.server.compressed);
        assert_eq!(config.release, Release::Dev);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn test_invalid_release_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("RELEASE", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "RELEASE", .. }));
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("DB_MIGRATE", "yes")])).is_err());
    }

    #[test]
    fn test_root_base_path() {
        let mut config = AppConfig::default();
        config.server.context = "/".to_string();
        assert_eq!(config.base_path(), "");
    }

    #[test]
    fn test_yaml_partial_overlay() {
        let yaml = r#"
release: test
server:
  port: 7000
session:
  jwt_secret: from-yaml
  token_ttl_secs: 120
database:
  engine: memory
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.release, Release::Test);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.jwt_secret, "from-yaml");
        assert_eq!(config.session.token_ttl_secs, 120);
        assert_eq!(config.database.engine, DbEngine::Memory);
        assert_eq!(config.rate_limit.burst, 3);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = AppConfig::default();
        config.session.jwt_secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("TOKEN_TTL_SECS", "0")])).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_ttl() {
        for ttl in ["18446744073709551615", "9223372036854775807", "1000000000000000"] {
            let mut config = AppConfig::default();
            config.apply_env(env(&[("TOKEN_TTL_SECS", ttl)])).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "TOKEN_TTL_SECS={ttl} accepted"
            );
        }
    }

    #[test]
    fn test_validate_accepts_long_ttl() {
        let mut config = AppConfig::default();
        // Ten years
        config.session.token_ttl_secs = 10 * 365 * 24 * 3600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_burst() {
        let mut config = AppConfig::default();
        config.rate_limit.burst = 0;
        assert!(config.validate().is_err());

        config.rate_limit.per_second = 0;
        assert!(config.validate().is_ok());
    }
}
