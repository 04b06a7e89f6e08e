//! Connector to the OB database API.
//!
//! [`Connector`] wraps a configured HTTP client and the API endpoint. Each
//! operation is one sequential round trip, except exports, which start a
//! server-side job, wait for it and stream the archive to disk.
//!
//! # Example
//!
//! ```no_run
//! use obplatform::{BehaviorId, Connector, ExportOptions, StudyId};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = Connector::new()?;
//! for behavior in connector.list_behaviors().await? {
//!     println!("{}", behavior.id);
//! }
//!
//! let behaviors = [BehaviorId::from("Appliance_Usage"), BehaviorId::from("Occupancy_Measurement")];
//! let studies = [StudyId::from(22_u32), StudyId::from(11_u32), StudyId::from(2_u32)];
//! connector
//!     .download_export(
//!         Path::new("data.zip"),
//!         &behaviors,
//!         &studies,
//!         &ExportOptions::default().with_progress_bar(true),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod export;
mod http;
mod progress;
mod types;

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::{ConnectorError, SelectionKind};
pub use export::{DEFAULT_CHUNK_SIZE, ExportOptions};
pub use progress::ProgressCallback;
pub use types::{Behavior, BehaviorId, ExportSummary, HealthStatus, StudyBehaviors, StudyId};

use crate::config::ConnectorConfig;

const BEHAVIORS_PATH: &str = "api/v1/behaviors";
const STUDY_BEHAVIORS_PATH: &str = "api/v1/studies/behaviors";
const HEALTH_PATH: &str = "api/v1/health";
const EXPORTS_PATH: &str = "api/v1/exports";

/// Client for the OB database API.
///
/// Create once and reuse; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Connector {
    client: Client,
    endpoint: Url,
    poll_interval: Duration,
    max_poll_attempts: Option<u32>,
}

impl Connector {
    /// Creates a connector for the public endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ConnectorError> {
        Self::with_config(&ConnectorConfig::default())
    }

    /// Creates a connector for another endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidUrl`] for a malformed endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, ConnectorError> {
        Self::with_config(&ConnectorConfig::with_endpoint(endpoint))
    }

    /// Creates a connector from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the validation error from [`ConnectorConfig::validate`] or
    /// [`ConnectorError::ClientBuild`].
    #[instrument(level = "debug", skip(config), fields(endpoint = %config.endpoint))]
    pub fn with_config(config: &ConnectorConfig) -> Result<Self, ConnectorError> {
        let endpoint = config.validate()?;
        let client = http::build_client(config)?;
        debug!("connector ready");
        Ok(Self {
            client,
            endpoint,
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
        })
    }

    /// Returns the API endpoint this connector talks to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Lists all behaviors available in the database.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] on transport failure, a non-success
    /// status, or a body that is not a JSON array of behaviors.
    #[instrument(skip(self))]
    pub async fn list_behaviors(&self) -> Result<Vec<Behavior>, ConnectorError> {
        let url = self.api_url(BEHAVIORS_PATH)?;
        let response = http::send(self.client.get(url.clone()), url.as_str()).await?;
        let behaviors: Vec<Behavior> = http::decode_json(response, url.as_str()).await?;
        debug!(count = behaviors.len(), "listed behaviors");
        Ok(behaviors)
    }

    /// Lists the behaviors available in each of the given studies.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::EmptySelection`] for an empty study list,
    /// otherwise the same errors as [`list_behaviors`](Self::list_behaviors).
    #[instrument(skip(self, studies), fields(studies = studies.len()))]
    pub async fn list_behaviors_in_studies(
        &self,
        studies: &[StudyId],
    ) -> Result<StudyBehaviors, ConnectorError> {
        if studies.is_empty() {
            return Err(ConnectorError::empty_selection(SelectionKind::Studies));
        }
        let url = self.api_url(STUDY_BEHAVIORS_PATH)?;
        let body = serde_json::json!({ "studies": studies });
        let response = http::send(self.client.post(url.clone()).json(&body), url.as_str()).await?;
        http::decode_json(response, url.as_str()).await
    }

    /// Checks whether the service is up.
    ///
    /// A non-success status is reported as unhealthy rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] only when the server cannot be reached.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> Result<HealthStatus, ConnectorError> {
        let url = self.api_url(HEALTH_PATH)?;
        let response = http::send_unchecked(self.client.get(url.clone()), url.as_str()).await?;
        let status = response.status();
        let details = match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(%error, "health response has no JSON body");
                None
            }
        };
        if !status.is_success() {
            warn!(status = status.as_u16(), "service reported unhealthy");
        }
        Ok(HealthStatus {
            healthy: status.is_success(),
            status: status.as_u16(),
            details,
        })
    }

    /// Downloads the export archive (ZIP) for the given behaviors and studies.
    ///
    /// The archive is written verbatim to `output_path`, replacing any
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError`] if a selection is empty, the output path
    /// cannot receive a file, a request fails or returns a non-success
    /// status, the job never becomes ready within the poll limit, or
    /// writing to disk fails.
    #[instrument(
        skip(self, behaviors, studies, options),
        fields(path = %output_path.display(), behaviors = behaviors.len(), studies = studies.len())
    )]
    pub async fn download_export(
        &self,
        output_path: &Path,
        behaviors: &[BehaviorId],
        studies: &[StudyId],
        options: &ExportOptions,
    ) -> Result<ExportSummary, ConnectorError> {
        let request = export::ExportRequest::new(behaviors, studies)?;
        export::validate_output_path(output_path)?;

        let exports_url = self.api_url(EXPORTS_PATH)?;
        let job_url =
            export::start_export_job(&self.client, &self.endpoint, &exports_url, &request).await?;
        let response = export::poll_export_job(
            &self.client,
            &job_url,
            self.poll_interval,
            self.max_poll_attempts,
        )
        .await?;

        let (bytes_written, content_length) =
            export::write_archive(response, output_path, options).await?;

        info!(
            path = %output_path.display(),
            bytes = bytes_written,
            "export complete"
        );
        Ok(ExportSummary {
            path: output_path.to_path_buf(),
            bytes_written,
            content_length,
        })
    }

    fn api_url(&self, path: &str) -> Result<Url, ConnectorError> {
        self.endpoint
            .join(path)
            .map_err(|_| ConnectorError::invalid_url(format!("{}{path}", self.endpoint)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connector_targets_public_endpoint() {
        let connector = Connector::new().unwrap();
        assert_eq!(
            connector.endpoint().as_str(),
            "https://api.ashraeobdatabase.com/"
        );
    }

    #[test]
    fn test_api_url_joins_under_endpoint_path() {
        let connector = Connector::with_endpoint("http://127.0.0.1:9000/ob").unwrap();
        assert_eq!(
            connector.api_url(EXPORTS_PATH).unwrap().as_str(),
            "http://127.0.0.1:9000/ob/api/v1/exports"
        );
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = Connector::with_endpoint("definitely-not-a-url");
        assert!(matches!(result, Err(ConnectorError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_empty_study_query_fails_without_request() {
        // Unroutable endpoint: reaching the network would fail differently.
        let connector = Connector::with_endpoint("http://127.0.0.1:1").unwrap();
        let result = connector.list_behaviors_in_studies(&[]).await;
        assert!(matches!(
            result,
            Err(ConnectorError::EmptySelection {
                selection: SelectionKind::Studies
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_export_selection_fails_without_request() {
        let connector = Connector::with_endpoint("http://127.0.0.1:1").unwrap();
        let studies = [StudyId::from(1_u32)];
        let result = connector
            .download_export(
                Path::new("data.zip"),
                &[],
                &studies,
                &ExportOptions::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ConnectorError::EmptySelection {
                selection: SelectionKind::Behaviors
            })
        ));
    }
}
