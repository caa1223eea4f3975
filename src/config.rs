use thiserror::Error;

use crate::keys::{self, StringKey};
use crate::submission::GameRegistration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("ADMIN_KEY may only contain ASCII letters and digits")]
    InvalidAdminKey,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// `None` keeps everything in memory.
    pub database_url: Option<String>,
    pub admin_key: StringKey,
    /// Whether `admin_key` was generated rather than configured.
    pub admin_key_generated: bool,
    pub game_registration: GameRegistration,
    pub seed_catalog: bool,
    /// Demo users and scores, added only to an empty score store.
    pub seed_sample_data: bool,
}

impl Config {
    /// Reads the configuration from the environment (and a `.env` file if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| dotenv::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let (admin_key, admin_key_generated) = match lookup("ADMIN_KEY") {
            Some(key) if keys::is_valid_key(&key) => (StringKey::new(key), false),
            Some(key) if !key.is_empty() => return Err(ConfigError::InvalidAdminKey),
            _ => (StringKey::generate_admin_key(), true),
        };

        let game_registration = if parse_bool(&lookup, "LAZY_GAME_REGISTRATION", true)? {
            GameRegistration::Lazy
        } else {
            GameRegistration::KnownOnly
        };
        let seed_catalog = parse_bool(&lookup, "SEED_CATALOG", true)?;
        let seed_sample_data = parse_bool(&lookup, "SEED_SAMPLE_DATA", false)?;

        Ok(Self {
            database_url,
            admin_key,
            admin_key_generated,
            game_registration,
            seed_catalog,
            seed_sample_data,
        })
    }

    /// In-memory configuration with a fixed admin key.
    pub fn in_memory(admin_key: &str) -> Self {
        Self {
            database_url: None,
            admin_key: StringKey::new(admin_key),
            admin_key_generated: false,
            game_registration: GameRegistration::Lazy,
            seed_catalog: true,
            seed_sample_data: false,
        }
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let value = match lookup(name) {
        Some(value) => value,
        None => return Ok(default),
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { name, value }),
    }
}
