use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_SCRAPE_SCHEDULE: &str = "0 */15 * * * *";
pub const DEFAULT_HISTORY_SCHEDULE: &str = "0 59 23 * * *";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_SERVICE_SID must be set together")]
    PartialTwilio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub service_sid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub db_max_connections: u32,
    pub rate_cache_ttl: Duration,
    pub scrape_schedule: String,
    pub history_schedule: String,
    pub scheduler_enabled: bool,
    pub upsert_batch_size: usize,
    pub http_timeout: Duration,
    pub twilio: Option<TwilioConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let twilio = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_SERVICE_SID"),
        ) {
            (Some(account_sid), Some(auth_token), Some(service_sid)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                service_sid,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::PartialTwilio),
        };

        let upsert_batch_size: usize = parse_or(get("UPSERT_BATCH_SIZE"), "UPSERT_BATCH_SIZE", 500)?;
        if upsert_batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: "UPSERT_BATCH_SIZE",
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url,
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            jwt_secret,
            jwt_expire_hours: parse_or(get("JWT_EXPIRE_HOURS"), "JWT_EXPIRE_HOURS", 720)?,
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 10)?,
            rate_cache_ttl: Duration::from_secs(parse_or(
                get("RATE_CACHE_TTL_SECS"),
                "RATE_CACHE_TTL_SECS",
                600,
            )?),
            scrape_schedule: get("SCRAPE_SCHEDULE").unwrap_or_else(|| DEFAULT_SCRAPE_SCHEDULE.into()),
            history_schedule: get("HISTORY_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_HISTORY_SCHEDULE.into()),
            scheduler_enabled: parse_or(get("SCHEDULER_ENABLED"), "SCHEDULER_ENABLED", true)?,
            upsert_batch_size,
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                60,
            )?),
            twilio,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/assets"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.jwt_expire_hours, 720);
        assert_eq!(config.rate_cache_ttl, Duration::from_secs(600));
        assert_eq!(config.scrape_schedule, DEFAULT_SCRAPE_SCHEDULE);
        assert_eq!(config.history_schedule, DEFAULT_HISTORY_SCHEDULE);
        assert!(config.scheduler_enabled);
        assert_eq!(config.upsert_batch_size, 500);
        assert!(config.twilio.is_none());
    }

    #[test]
    fn requires_database_url_and_secret() {
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s")])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
        assert_eq!(
            AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])),
            Err(ConfigError::Missing("JWT_SECRET"))
        );
    }

    #[test]
    fn rejects_invalid_numbers_and_partial_twilio() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".into()
            }
        );

        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("TWILIO_ACCOUNT_SID", "AC1"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::PartialTwilio);
    }
}
