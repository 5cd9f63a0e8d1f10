use serde::Deserialize;
use std::env;

use trailway_seats::SeatSettings;

use crate::StoreError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    pub seats: SeatRules,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeatRules {
    pub hold_seconds: u64,
    pub max_seats_per_booking: usize,
    pub sweep_interval_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_booking_prefix")]
    pub booking_prefix: String,
}

fn default_channel_capacity() -> usize { 100 }

fn default_booking_prefix() -> String { "ABC".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TRAILWAY__SEATS__HOLD_SECONDS=120`
            .add_source(config::Environment::with_prefix("TRAILWAY").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let seats = &self.seats;
        if seats.hold_seconds == 0 {
            return Err(StoreError::Config("seats.hold_seconds must be positive".into()));
        }
        if seats.sweep_interval_ms == 0 || seats.sweep_interval_ms >= seats.hold_seconds * 1000 {
            return Err(StoreError::Config(
                "seats.sweep_interval_ms must be positive and shorter than the hold".into(),
            ));
        }
        if seats.max_seats_per_booking == 0 {
            return Err(StoreError::Config("seats.max_seats_per_booking must be positive".into()));
        }
        if seats.booking_prefix.is_empty() || !seats.booking_prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(StoreError::Config("seats.booking_prefix must be upper-case letters".into()));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(StoreError::Config("auth.jwt_secret is too short".into()));
        }
        if self.rate_limit.requests <= 0 || self.rate_limit.window_seconds <= 0 {
            return Err(StoreError::Config("rate_limit values must be positive".into()));
        }
        Ok(())
    }
}

impl SeatRules {
    pub fn to_settings(&self) -> SeatSettings {
        SeatSettings {
            hold_duration: chrono::Duration::seconds(self.hold_seconds as i64),
            max_seats_per_booking: self.max_seats_per_booking,
            sweep_interval: std::time::Duration::from_millis(self.sweep_interval_ms),
            channel_capacity: self.channel_capacity,
            booking_prefix: self.booking_prefix.clone(),
        }
    }
}
