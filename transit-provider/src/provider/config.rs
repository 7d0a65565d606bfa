//! Backend configuration.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of trips per page.
const DEFAULT_NUM_TRIPS: u32 = 6;

/// Error returned when configuration values cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {var}: {value:?}")]
pub struct ConfigError {
    var: String,
    value: String,
}

/// Configuration for a backend driver.
///
/// Unset optional fields fall back to the driver's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL replacing the driver's default endpoint
    #[serde(default)]
    pub endpoint_override: Option<String>,

    /// Credential sent in the `Authorization` header
    #[serde(default, skip_serializing)]
    pub api_authorization: Option<SecretString>,

    /// Request timeout in seconds; `0` means the default
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of trips a driver returns per page
    #[serde(default = "default_num_trips")]
    pub num_trips: u32,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_num_trips() -> u32 {
    DEFAULT_NUM_TRIPS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint_override: None,
            api_authorization: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            num_trips: DEFAULT_NUM_TRIPS,
        }
    }
}

impl ProviderConfig {
    /// Use a custom endpoint (for testing or self-hosted backends).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    /// Set the API credential.
    pub fn with_api_authorization(mut self, credential: impl Into<String>) -> Self {
        self.api_authorization = Some(SecretString::from(credential.into()));
        self
    }

    /// Set request timeout. `0` restores the default.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the page size for trip queries.
    pub fn with_num_trips(mut self, n: u32) -> Self {
        self.num_trips = n;
        self
    }

    /// Request timeout, never zero.
    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// The endpoint to use: the override if set, otherwise `default`.
    pub fn endpoint<'a>(&'a self, default: &'a str) -> &'a str {
        self.endpoint_override.as_deref().unwrap_or(default)
    }

    /// Read configuration from environment variables.
    ///
    /// Recognised variables are `{prefix}_ENDPOINT`, `{prefix}_API_AUTHORIZATION`,
    /// `{prefix}_TIMEOUT_SECS` and `{prefix}_NUM_TRIPS`. Missing variables keep
    /// their defaults.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(
        prefix: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            let key = format!("{prefix}_{name}");
            lookup(&key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (key, v))
        };

        let mut config = Self::default();
        if let Some((_, url)) = var("ENDPOINT") {
            config.endpoint_override = Some(url);
        }
        if let Some((_, credential)) = var("API_AUTHORIZATION") {
            config.api_authorization = Some(SecretString::from(credential));
        }
        if let Some((key, secs)) = var("TIMEOUT_SECS") {
            config.timeout_secs = parse_var(key, secs)?;
        }
        if let Some((key, n)) = var("NUM_TRIPS") {
            config.num_trips = parse_var(key, n)?;
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: String, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError { var, value })
}
