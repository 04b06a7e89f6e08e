//! Export job flow: start the job, wait for it, stream the archive to disk.
//!
//! The server compresses the requested files asynchronously. `POST /exports`
//! answers with a `Location` to poll; the job URI answers `202 Accepted`
//! while it is still working and `200 OK` with the archive body once ready.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::{ConnectorError, SelectionKind};
use super::http;
use super::progress::{ProgressCallback, TransferProgress};
use super::types::{BehaviorId, StudyId};

/// Default write buffer size for archive downloads (1000 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1000 * 1024;

/// Options for [`Connector::download_export`](crate::Connector::download_export).
#[derive(Clone)]
pub struct ExportOptions {
    /// Render a progress bar on stderr while downloading.
    pub show_progress_bar: bool,
    /// Bytes buffered before each write to disk.
    pub chunk_size: usize,
    /// Optional hook invoked after every received chunk.
    pub on_progress: Option<ProgressCallback>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_progress_bar: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            on_progress: None,
        }
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("show_progress_bar", &self.show_progress_bar)
            .field("chunk_size", &self.chunk_size)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl ExportOptions {
    /// Enables or disables the progress bar.
    #[must_use]
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Sets the write buffer size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Registers a progress hook.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

/// Request body of `POST /api/v1/exports`.
#[derive(Debug, Serialize)]
pub(crate) struct ExportRequest<'a> {
    pub(crate) behaviors: &'a [BehaviorId],
    pub(crate) studies: &'a [StudyId],
}

impl<'a> ExportRequest<'a> {
    pub(crate) fn new(
        behaviors: &'a [BehaviorId],
        studies: &'a [StudyId],
    ) -> Result<Self, ConnectorError> {
        if behaviors.is_empty() {
            return Err(ConnectorError::empty_selection(SelectionKind::Behaviors));
        }
        if studies.is_empty() {
            return Err(ConnectorError::empty_selection(SelectionKind::Studies));
        }
        Ok(Self {
            behaviors,
            studies,
        })
    }
}

/// Rejects output paths that cannot receive a file before any request is made.
pub(crate) fn validate_output_path(path: &Path) -> Result<(), ConnectorError> {
    if path.as_os_str().is_empty() {
        return Err(ConnectorError::invalid_output_path(path, "path is empty"));
    }
    if path.is_dir() {
        return Err(ConnectorError::invalid_output_path(
            path,
            "path is a directory",
        ));
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            ConnectorError::invalid_output_path(path, "parent directory does not exist"),
        ),
        _ => Ok(()),
    }
}

/// Asks the server to start compressing the selection; returns the job URL.
#[instrument(skip(client, endpoint, request), fields(url = %exports_url))]
pub(crate) async fn start_export_job(
    client: &Client,
    endpoint: &Url,
    exports_url: &Url,
    request: &ExportRequest<'_>,
) -> Result<Url, ConnectorError> {
    let url = exports_url.as_str();
    let response = http::send(client.post(exports_url.clone()).json(request), url).await?;

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConnectorError::missing_job_location(url))?;

    let job_url = resolve_job_url(endpoint, location)?;
    debug!(job = %job_url, "export job started");
    Ok(job_url)
}

/// Absolute locations are used as given. Relative ones are appended to the
/// endpoint path, so an endpoint mounted under a prefix keeps it.
pub(crate) fn resolve_job_url(endpoint: &Url, location: &str) -> Result<Url, ConnectorError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => endpoint
            .join(location.trim_start_matches('/'))
            .map_err(|_| ConnectorError::invalid_url(location)),
        Err(_) => Err(ConnectorError::invalid_url(location)),
    }
}

/// Polls the job URL until the archive is ready and returns the unread response.
#[instrument(skip(client), fields(url = %job_url))]
pub(crate) async fn poll_export_job(
    client: &Client,
    job_url: &Url,
    poll_interval: Duration,
    max_poll_attempts: Option<u32>,
) -> Result<Response, ConnectorError> {
    let url = job_url.as_str();
    info!("Waiting for server to finish...");

    let mut attempts: u32 = 0;
    loop {
        let response = http::send(client.get(job_url.clone()), url).await?;
        attempts = attempts.saturating_add(1);

        let status = response.status();
        if status == StatusCode::OK {
            debug!(attempts, "export ready");
            return Ok(response);
        }
        if status != StatusCode::ACCEPTED {
            return Err(ConnectorError::unexpected_status(url, status.as_u16()));
        }

        info!(attempts, "Polling status");
        drop(response);
        if max_poll_attempts.is_some_and(|limit| attempts >= limit) {
            return Err(ConnectorError::export_not_ready(url, attempts));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Streams the archive body into `output_path`, returning bytes written.
///
/// The file is truncated if it exists. A partial file is removed when the
/// transfer fails.
#[instrument(skip(response, options), fields(path = %output_path.display()))]
pub(crate) async fn write_archive(
    response: Response,
    output_path: &Path,
    options: &ExportOptions,
) -> Result<(u64, Option<u64>), ConnectorError> {
    let content_length = response.content_length();
    info!("Downloading {}", output_path.display());

    let file = File::create(output_path)
        .await
        .map_err(|e| ConnectorError::io(output_path, e))?;

    let mut progress = TransferProgress::new(
        content_length,
        options.show_progress_bar,
        options.on_progress.clone(),
    );
    let result = stream_to_file(
        file,
        response,
        output_path,
        options.chunk_size,
        &mut progress,
    )
    .await;
    progress.finish();

    match result {
        Ok(bytes) => Ok((bytes, content_length)),
        Err(error) => {
            debug!(path = %output_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(output_path).await;
            Err(error)
        }
    }
}

async fn stream_to_file(
    file: File,
    response: Response,
    output_path: &Path,
    chunk_size: usize,
    progress: &mut TransferProgress,
) -> Result<u64, ConnectorError> {
    let url = response.url().to_string();
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| ConnectorError::transport(url.as_str(), e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| ConnectorError::io(output_path, e))?;
        progress.update(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| ConnectorError::io(output_path, e))?;

    Ok(progress.current())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_request_rejects_empty_behaviors() {
        let studies = [StudyId::from("1")];
        let err = ExportRequest::new(&[], &studies).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::EmptySelection {
                selection: SelectionKind::Behaviors
            }
        ));
    }

    #[test]
    fn test_export_request_rejects_empty_studies() {
        let behaviors = [BehaviorId::from("Occupancy_Measurement")];
        let err = ExportRequest::new(&behaviors, &[]).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::EmptySelection {
                selection: SelectionKind::Studies
            }
        ));
    }

    #[test]
    fn test_export_request_serializes_string_ids() {
        let behaviors = [BehaviorId::from("Appliance_Usage")];
        let studies = [StudyId::from(22_u32), StudyId::from("11")];
        let request = ExportRequest::new(&behaviors, &studies).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"behaviors": ["Appliance_Usage"], "studies": ["22", "11"]})
        );
    }

    #[test]
    fn test_validate_output_path_accepts_new_file_in_existing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(validate_output_path(&dir.path().join("data.zip")).is_ok());
    }

    #[test]
    fn test_validate_output_path_accepts_bare_filename() {
        assert!(validate_output_path(Path::new("data.zip")).is_ok());
    }

    #[test]
    fn test_validate_output_path_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = validate_output_path(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::InvalidOutputPath {
                reason: "path is a directory",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_output_path_rejects_missing_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("data.zip");
        let err = validate_output_path(&path).unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidOutputPath { .. }));
    }

    #[test]
    fn test_resolve_job_url_keeps_endpoint_prefix() {
        let endpoint = Url::parse("http://127.0.0.1:9000/ob/").unwrap();
        let job = resolve_job_url(&endpoint, "/api/v1/exports/7").unwrap();
        assert_eq!(job.as_str(), "http://127.0.0.1:9000/ob/api/v1/exports/7");
    }

    #[test]
    fn test_resolve_job_url_at_root_endpoint() {
        let endpoint = Url::parse("https://api.ashraeobdatabase.com/").unwrap();
        let job = resolve_job_url(&endpoint, "api/v1/exports/7").unwrap();
        assert_eq!(
            job.as_str(),
            "https://api.ashraeobdatabase.com/api/v1/exports/7"
        );
    }

    #[test]
    fn test_resolve_job_url_uses_absolute_location_as_is() {
        let endpoint = Url::parse("http://127.0.0.1:9000/ob/").unwrap();
        let job = resolve_job_url(&endpoint, "https://jobs.example.org/exports/7").unwrap();
        assert_eq!(job.as_str(), "https://jobs.example.org/exports/7");
    }

    #[test]
    fn test_resolve_job_url_rejects_malformed_absolute_location() {
        let endpoint = Url::parse("http://127.0.0.1:9000/").unwrap();
        let err = resolve_job_url(&endpoint, "http://[::1").unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidUrl { .. }));
    }

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::default()
            .with_progress_bar(true)
            .with_chunk_size(4096);
        assert!(options.show_progress_bar);
        assert_eq!(options.chunk_size, 4096);
        assert!(options.on_progress.is_none());
        assert!(format!("{options:?}").contains("on_progress: false"));
    }
}
