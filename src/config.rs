//! Checkout configuration
//!
//! Defaults mirror a sandbox storefront; every field can be overridden from
//! the environment (see [`CheckoutConfig::from_env`]).

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use crate::domain::value_objects::Coordinates;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Map picker settings.
#[derive(Debug, Clone)]
pub struct MapSettings {
    /// Centre used until geolocation (or an earlier pin) says otherwise
    pub default_center: Coordinates,
    pub default_zoom: u8,
    /// Zoom applied after a geolocation fix
    pub located_zoom: u8,
    pub max_zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub geolocation_timeout: Duration,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            default_center: Coordinates::new(-8.6500, 115.2167),
            default_zoom: 13,
            located_zoom: 16,
            max_zoom: 19,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap".to_string(),
            geolocation_timeout: Duration::from_secs(10),
        }
    }
}

/// Storefront checkout configuration
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Merchant backend base URL (e.g., "http://localhost:8080/api/v1")
    pub api_base_url: String,

    /// Store the customer is buying from
    pub store_slug: String,

    /// Currency every cart line is priced in
    pub currency: String,

    /// Request timeout for backend and gateway calls
    pub request_timeout: Duration,

    /// Domain for the phone-based email handle sent to the payment gateway
    pub guest_email_domain: String,

    pub map: MapSettings,
}

impl CheckoutConfig {
    pub fn new(api_base_url: impl Into<String>, store_slug: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            store_slug: store_slug.into(),
            currency: "IDR".to_string(),
            request_timeout: Duration::from_secs(30),
            guest_email_domain: "customer.codapos.com".to_string(),
            map: MapSettings::default(),
        }
    }

    /// Reads `STORE_API_URL` and `STORE_SLUG` (required) plus optional overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = required("STORE_API_URL")?;
        let store_slug = required("STORE_SLUG")?;
        let mut config = Self::new(api_base_url, store_slug);

        if let Ok(currency) = std::env::var("STORE_CURRENCY") {
            config.currency = currency.trim().to_uppercase();
        }
        if let Ok(domain) = std::env::var("GUEST_EMAIL_DOMAIN") {
            config.guest_email_domain = domain;
        }
        config.request_timeout = Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?);
        config.map.geolocation_timeout = Duration::from_millis(parse_or("GEOLOCATION_TIMEOUT_MS", 10_000)?);

        let default = config.map.default_center;
        let center = Coordinates::new(
            parse_or("MAP_DEFAULT_LAT", default.latitude)?,
            parse_or("MAP_DEFAULT_LNG", default.longitude)?,
        );
        if !center.is_valid() {
            return Err(ConfigError::Invalid { key: "MAP_DEFAULT_LAT/MAP_DEFAULT_LNG", value: center.to_string() });
        }
        config.map.default_center = center;

        Ok(config)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
