//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `presence.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use chrono::FixedOffset;
use serde::Deserialize;

use presence_domain::geofence::MessageLocale;

/// Largest UTC offset accepted, in hours.
const MAX_UTC_OFFSET_HOURS: i32 = 14;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Site-specific presence settings.
    pub presence: PresenceConfig,
    /// Push gateway settings.
    pub push: PushConfig,
    /// Scheduled job settings.
    pub jobs: JobsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Offset of the site's wall-clock time from UTC. Day buckets follow
    /// local midnight at this offset.
    pub utc_offset_hours: i32,
    /// Language of geofence messages and notifications.
    pub locale: MessageLocale,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Gateway URL; notifications are only logged when absent.
    pub endpoint: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Append a midnight snapshot of every member each day.
    pub daily_snapshot: bool,
    /// Months of status log to keep; `0` keeps everything.
    pub retention_months: u32,
}

impl Config {
    /// Load configuration from `presence.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("presence.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PRESENCE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("PRESENCE_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("PRESENCE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("PRESENCE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("PRESENCE_PUSH_ENDPOINT") {
            self.push.endpoint = Some(val);
        }
        if let Ok(val) = std::env::var("PRESENCE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.utc_offset()?;
        if self.push.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "push timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// The configured site offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the offset is beyond ±14 hours.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        let hours = self.presence.utc_offset_hours;
        if hours.abs() > MAX_UTC_OFFSET_HOURS {
            return Err(ConfigError::Validation(format!(
                "utc offset {hours}h is out of range"
            )));
        }
        FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
            ConfigError::Validation(format!("utc offset {hours}h is out of range"))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:presence.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "presenced=info,presence=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
            locale: MessageLocale::En,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 10,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            daily_snapshot: true,
            retention_months: 3,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
