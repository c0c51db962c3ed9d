//! Process configuration, read once at startup and passed down explicitly.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "database.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
    /// How long a pool checkout may wait before the store reports
    /// `StorageUnavailable`.
    pub connect_timeout: Duration,
    /// Mixed into every password digest when set.
    pub password_secret: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("pool_size", &self.pool_size)
            .field("busy_timeout", &self.busy_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field(
                "password_secret",
                &self.password_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            password_secret: None,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// Unset and blank variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let pool_size = match var("DATABASE_POOL_SIZE") {
            Some(raw) => parse_positive("DATABASE_POOL_SIZE", &raw)?,
            None => defaults.pool_size,
        };
        let busy_timeout = match var("DATABASE_BUSY_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_positive("DATABASE_BUSY_TIMEOUT_MS", &raw)?),
            None => defaults.busy_timeout,
        };
        let connect_timeout = match var("DATABASE_CONNECT_TIMEOUT_MS") {
            Some(raw) => {
                Duration::from_millis(parse_positive("DATABASE_CONNECT_TIMEOUT_MS", &raw)?)
            }
            None => defaults.connect_timeout,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_address: var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            pool_size,
            busy_timeout,
            connect_timeout,
            password_secret: var("PASSWORD_SECRET"),
        })
    }

    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value: T = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_owned(),
    })?;
    if value == T::default() {
        return Err(ConfigError::Zero { name });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.database_url, "database.db");
        assert_eq!(config.bind_address, "127.0.0.1:8000");
        assert_eq!(config.password_secret, None);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "/tmp/accounts.db"),
            ("BIND_ADDRESS", "0.0.0.0:9000"),
            ("DATABASE_POOL_SIZE", "3"),
            ("DATABASE_BUSY_TIMEOUT_MS", "250"),
            ("DATABASE_CONNECT_TIMEOUT_MS", "750"),
            ("PASSWORD_SECRET", "pepper"),
        ]))
        .expect("config");

        assert_eq!(config.database_url, "/tmp/accounts.db");
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(750));
        assert_eq!(config.password_secret.as_deref(), Some("pepper"));
    }

    #[test]
    fn blank_variables_are_ignored() {
        let config =
            Config::from_lookup(lookup(&[("DATABASE_URL", "  "), ("PASSWORD_SECRET", "")]))
                .expect("config");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.password_secret, None);
    }

    #[rstest]
    #[case("DATABASE_POOL_SIZE", "lots")]
    #[case("DATABASE_POOL_SIZE", "-1")]
    #[case("DATABASE_BUSY_TIMEOUT_MS", "1.5")]
    #[case("DATABASE_CONNECT_TIMEOUT_MS", "soon")]
    fn malformed_numbers_are_rejected(#[case] name: &str, #[case] value: &str) {
        let err = Config::from_lookup(lookup(&[(name, value)])).expect_err("should fail");
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[rstest]
    #[case("DATABASE_POOL_SIZE")]
    #[case("DATABASE_BUSY_TIMEOUT_MS")]
    #[case("DATABASE_CONNECT_TIMEOUT_MS")]
    fn zero_is_rejected(#[case] name: &str) {
        let err = Config::from_lookup(lookup(&[(name, "0")])).expect_err("should fail");
        assert!(matches!(err, ConfigError::Zero { .. }));
    }

    #[test]
    fn debug_redacts_the_secret() {
        let config = Config {
            password_secret: Some("pepper".to_owned()),
            ..Config::default()
        };
        assert!(!format!("{config:?}").contains("pepper"));
    }
}
