//! Connector configuration (endpoint, timeouts, export polling).

use std::time::Duration;

use url::Url;

use crate::connector::ConnectorError;
use crate::user_agent;

/// Public OB database API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ashraeobdatabase.com";

/// Default HTTP connect timeout (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes without data).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Default delay between export status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound accepted for either timeout.
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Upper bound accepted for the poll interval.
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Settings used to build a [`Connector`](crate::Connector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Base URL of the API, without the `/api/v1` prefix.
    pub endpoint: String,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds for each read, including the wait for headers.
    /// Resets after every received chunk, so long downloads are not capped.
    pub read_timeout_secs: u64,
    /// Delay between polls while an export job is pending.
    pub poll_interval: Duration,
    /// Give up after this many pending polls. `None` waits indefinitely.
    pub max_poll_attempts: Option<u32>,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
            user_agent: user_agent::default_user_agent(),
        }
    }
}

impl ConnectorConfig {
    /// Default configuration pointed at another endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Validates values and returns the parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidUrl`] when the endpoint is not an
    /// absolute http(s) URL, and [`ConnectorError::InvalidConfig`] when a
    /// timeout, the poll interval or the poll limit is out of range.
    pub fn validate(&self) -> Result<Url, ConnectorError> {
        let endpoint = parse_endpoint(&self.endpoint)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ConnectorError::invalid_config(
                "poll_interval",
                format!(
                    "{}ms exceeds maximum of {}ms",
                    self.poll_interval.as_millis(),
                    MAX_POLL_INTERVAL.as_millis()
                ),
            ));
        }
        if self.max_poll_attempts == Some(0) {
            return Err(ConnectorError::invalid_config(
                "max_poll_attempts",
                "must be at least 1 when set",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConnectorError::invalid_config(
                "user_agent",
                "must not be empty",
            ));
        }
        Ok(endpoint)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConnectorError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConnectorError::invalid_config(
            field,
            format!("{value} is outside 1..={MAX_TIMEOUT_SECS}"),
        ));
    }
    Ok(())
}

/// Parses the endpoint so that API paths can be joined onto it.
///
/// A trailing slash is added when missing; otherwise `Url::join` would drop
/// the last path segment of endpoints mounted below the host root.
fn parse_endpoint(raw: &str) -> Result<Url, ConnectorError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed).map_err(|_| ConnectorError::invalid_url(trimmed))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConnectorError::invalid_url(trimmed));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
