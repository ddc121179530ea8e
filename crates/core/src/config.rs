use std::time::Duration;

pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/summarize";
pub const RELAY_URL_ENV: &str = "ELISUM_RELAY_URL";
pub const TIMEOUT_ENV: &str = "ELISUM_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {env_var}: {reason}")]
    InvalidValue {
        env_var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub relay_url: String,
    /// Per-request timeout for every fetch and relay call. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            timeout: None,
            user_agent: format!("elisum/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(RELAY_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.relay_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            config.timeout = Some(parse_timeout_secs(TIMEOUT_ENV, &raw)?);
        }

        Ok(config)
    }

    /// Build the shared HTTP client used by both the fetcher and the relay client.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(&self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

pub fn parse_timeout_secs(env_var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            env_var,
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            env_var,
            value: raw.to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_relay() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.relay_url, DEFAULT_RELAY_URL);
        assert!(config.timeout.is_none());
        assert!(config.user_agent.starts_with("elisum/"));
    }

    #[test]
    fn env_overrides_relay_and_timeout() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (RELAY_URL_ENV, " https://relay.example/summarize "),
            (TIMEOUT_ENV, "15"),
        ]))
        .unwrap();
        assert_eq!(config.relay_url, "https://relay.example/summarize");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn rejects_zero_and_garbage_timeouts() {
        for raw in ["0", "soon", "-3"] {
            let err = ClientConfig::from_lookup(lookup_from(&[(TIMEOUT_ENV, raw)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { env_var, .. } if env_var == TIMEOUT_ENV),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[(RELAY_URL_ENV, "  "), (TIMEOUT_ENV, "")]))
                .unwrap();
        assert_eq!(config.relay_url, DEFAULT_RELAY_URL);
        assert!(config.timeout.is_none());
    }
}
