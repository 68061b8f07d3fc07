use std::{env, time::Duration};

use crate::constants::{NWS_API_BASE, REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::error::ConfigError;

/// Runtime settings for the NWS client
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_base: NWS_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl WeatherConfig {
    /// Reads overrides from `NWS_API_BASE`, `NWS_USER_AGENT` and `NWS_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base) = lookup("NWS_API_BASE") {
            let trimmed = base.trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid("NWS_API_BASE is empty".into()));
            }
            config.api_base = trimmed.to_string();
        }

        if let Some(agent) = lookup("NWS_USER_AGENT") {
            if agent.trim().is_empty() {
                return Err(ConfigError::Invalid("NWS_USER_AGENT is empty".into()));
            }
            config.user_agent = agent;
        }

        if let Some(raw) = lookup("NWS_TIMEOUT_SECONDS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::Invalid(format!("NWS_TIMEOUT_SECONDS parse error: {}", e))
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "NWS_TIMEOUT_SECONDS must be positive".into(),
                ));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
