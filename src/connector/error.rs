//! Error types for the connector module.
//!
//! Every variant carries the context (URL, path, selection) needed to act on
//! the failure. Errors are surfaced to the caller as-is; the connector never
//! retries.

use std::path::PathBuf;

use thiserror::Error;

/// Which identifier list of a request was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// The behavior identifier list.
    Behaviors,
    /// The study identifier list.
    Studies,
}

impl SelectionKind {
    /// Returns the label used in messages and request bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Behaviors => "behaviors",
            Self::Studies => "studies",
        }
    }
}

impl std::fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to the OB database API.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A success status the export protocol does not expect at this step.
    #[error("unexpected HTTP {status} from {url}")]
    UnexpectedStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The export job was accepted but the server did not say where to poll.
    #[error("export job started at {url} but the response has no Location header")]
    MissingJobLocation {
        /// The export endpoint URL.
        url: String,
    },

    /// The response body could not be decoded as the expected JSON shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// File system error while writing the archive.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output path cannot receive a file.
    #[error("invalid output path {path}: {reason}")]
    InvalidOutputPath {
        /// The rejected path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The endpoint or a job location is not a valid URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// An identifier list that must be non-empty was empty.
    #[error("at least one identifier is required in {selection}")]
    EmptySelection {
        /// Which list was empty.
        selection: SelectionKind,
    },

    /// The export job was still pending after the configured number of polls.
    #[error("export at {url} still not ready after {attempts} polls")]
    ExportNotReady {
        /// The job URL being polled.
        url: String,
        /// Number of polls performed.
        attempts: u32,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ConnectorError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Maps a transport error, promoting timeouts to [`ConnectorError::Timeout`].
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an unexpected-status error.
    pub fn unexpected_status(url: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a missing-Location error.
    pub fn missing_job_location(url: impl Into<String>) -> Self {
        Self::MissingJobLocation { url: url.into() }
    }

    /// Creates a body decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid output path error.
    pub fn invalid_output_path(path: impl Into<PathBuf>, reason: &'static str) -> Self {
        Self::InvalidOutputPath {
            path: path.into(),
            reason,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an empty-selection error.
    #[must_use]
    pub fn empty_selection(selection: SelectionKind) -> Self {
        Self::EmptySelection { selection }
    }

    /// Creates an export-not-ready error.
    pub fn export_not_ready(url: impl Into<String>, attempts: u32) -> Self {
        Self::ExportNotReady {
            url: url.into(),
            attempts,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs a
// url or path the source error does not carry.
