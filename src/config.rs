use crate::bidding::rules::{DEFAULT_COOLDOWN_SECS, MAX_COOLDOWN_SECS};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub notifier: NotifierKind,
    pub kafka_brokers: String,
    pub sales_topic: String,
    pub notify_webhook_url: Option<String>,
    pub sweep: SweepConfig,
    pub bid_cooldown_secs: i64,
    pub max_append_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Log,
    Kafka,
    Webhook,
}

/// Closing sweep tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    pub interval: Duration,
    pub concurrency: usize,
    pub notify_timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            concurrency: 4,
            notify_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 3000u16)?;
        let database_url = env_map
            .get("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .cloned();
        let db_max_connections = positive(&env_map, "DB_MAX_CONNECTIONS", 5u32)?;

        let notifier = match env_map
            .get("NOTIFIER")
            .map(|s| s.as_str())
            .unwrap_or("log")
        {
            "log" => NotifierKind::Log,
            "kafka" => NotifierKind::Kafka,
            "webhook" => NotifierKind::Webhook,
            other => {
                return Err(ConfigError::InvalidValue(
                    "NOTIFIER".to_string(),
                    format!("must be log, kafka, or webhook, got {}", other),
                ))
            }
        };

        let kafka_brokers = env_map
            .get("KAFKA_BROKERS")
            .cloned()
            .unwrap_or_else(|| "localhost:9092".to_string());
        let sales_topic = env_map
            .get("SALES_TOPIC")
            .cloned()
            .unwrap_or_else(|| "auction-sales".to_string());
        let notify_webhook_url = env_map.get("NOTIFY_WEBHOOK_URL").cloned();
        if notifier == NotifierKind::Webhook && notify_webhook_url.is_none() {
            return Err(ConfigError::MissingEnv("NOTIFY_WEBHOOK_URL".to_string()));
        }

        let sweep = SweepConfig {
            interval: Duration::from_secs(positive(&env_map, "SWEEP_INTERVAL_SECS", 300u64)?),
            concurrency: positive(&env_map, "SWEEP_CONCURRENCY", 4usize)?,
            notify_timeout: Duration::from_secs(positive(&env_map, "NOTIFY_TIMEOUT_SECS", 10u64)?),
        };

        let bid_cooldown_secs = parse_or(
            &env_map,
            "BID_COOLDOWN_SECS",
            DEFAULT_COOLDOWN_SECS,
        )?;
        if !(0..=MAX_COOLDOWN_SECS).contains(&bid_cooldown_secs) {
            return Err(ConfigError::InvalidValue(
                "BID_COOLDOWN_SECS".to_string(),
                format!("must be between 0 and {}", MAX_COOLDOWN_SECS),
            ));
        }
        let max_append_retries = positive(&env_map, "MAX_APPEND_RETRIES", 10u32)?;

        Ok(Config {
            port,
            database_url,
            db_max_connections,
            notifier,
            kafka_brokers,
            sales_topic,
            notify_webhook_url,
            sweep,
            bid_cooldown_secs,
            max_append_retries,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("cannot parse {:?}", raw))
        }),
    }
}

fn positive<T>(env_map: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = parse_or(env_map, key, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}
