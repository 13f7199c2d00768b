use std::{fmt, net::SocketAddr, time::Duration};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Marketplace user the service acts as.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Service settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub asset_base_url: String,
    pub client_id: String,
    pub marketplace_currency: String,
    pub sdk_base_url: String,
    pub mapbox_access_token: Option<String>,
    /// Logged in at startup when both username and password are set.
    pub credentials: Option<Credentials>,
    /// `None` keeps the first fetched config for the process lifetime.
    pub config_cache_ttl: Option<Duration>,
}

fn required(name: &'static str) -> Result<String, SettingsError> {
    std::env::var(name).map_err(|_| SettingsError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, SettingsError> {
    optional(name).map_or(Ok(default), |value| {
        value
            .parse()
            .map_err(|_| SettingsError::Invalid { name, value })
    })
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let ttl_secs: u64 = parsed("CONFIG_CACHE_TTL_SECS", 0)?;
        Ok(Self {
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            asset_base_url: optional("ASSET_BASE_URL")
                .unwrap_or_else(|| "https://cdn.st-api.com/v1/assets".to_string()),
            client_id: required("MARKETPLACE_CLIENT_ID")?,
            marketplace_currency: optional("MARKETPLACE_CURRENCY")
                .unwrap_or_else(|| "USD".to_string())
                .to_ascii_uppercase(),
            sdk_base_url: optional("SDK_BASE_URL")
                .unwrap_or_else(|| "https://flex-api.sharetribe.com".to_string()),
            mapbox_access_token: optional("MAPBOX_ACCESS_TOKEN"),
            credentials: optional("MARKETPLACE_USERNAME")
                .zip(optional("MARKETPLACE_PASSWORD"))
                .map(|(username, password)| Credentials { username, password }),
            config_cache_ttl: (ttl_secs > 0).then_some(Duration::from_secs(ttl_secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            username: "ops@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("ops@example.com"));
        assert!(!printed.contains("hunter2"));
    }
}
