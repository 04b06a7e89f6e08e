//! HTTP client construction and response status mapping.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ConnectorError;
use crate::config::ConnectorConfig;

/// Builds the shared reqwest client from connector settings.
pub(crate) fn build_client(config: &ConnectorConfig) -> Result<Client, ConnectorError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .gzip(true)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|source| ConnectorError::ClientBuild { source })
}

/// Sends a request and rejects non-success responses.
///
/// The response is returned unread so callers can stream the body.
pub(crate) async fn send(request: RequestBuilder, url: &str) -> Result<Response, ConnectorError> {
    let response = send_unchecked(request, url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ConnectorError::http_status(url, status.as_u16()));
    }
    Ok(response)
}

/// Sends a request, mapping only transport failures.
pub(crate) async fn send_unchecked(
    request: RequestBuilder,
    url: &str,
) -> Result<Response, ConnectorError> {
    let response = request
        .send()
        .await
        .map_err(|e| ConnectorError::transport(url, e))?;
    debug!(url, status = response.status().as_u16(), "received response");
    Ok(response)
}

/// Reads and decodes a JSON response body.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    url: &str,
) -> Result<T, ConnectorError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            ConnectorError::decode(url, e)
        } else {
            ConnectorError::transport(url, e)
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_default_config() {
        assert!(build_client(&ConnectorConfig::default()).is_ok());
    }
}
