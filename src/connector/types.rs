//! Identifiers and response records exchanged with the OB database API.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-defined behavior (data category) identifier, e.g. `Appliance_Usage`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorId(String);

impl BehaviorId {
    /// Creates a behavior identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BehaviorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BehaviorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Server-defined study identifier.
///
/// Studies are numbered, but the export endpoint only accepts string ids, so
/// numeric input is stringified on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyId(String);

impl StudyId {
    /// Creates a study identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StudyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u32> for StudyId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for StudyId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for StudyId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

/// One entry of the behavior listing.
///
/// Only `id` is interpreted; every other field the server sends is kept in
/// `extra` so callers see the listing unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    /// Behavior identifier, usable in export requests.
    pub id: BehaviorId,
    /// Remaining server-provided fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Behavior {
    /// Returns a string field from the server-provided extras.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }
}

/// Behaviors available per study, keyed by study id.
pub type StudyBehaviors = BTreeMap<StudyId, Vec<BehaviorId>>;

/// Result of the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// Whether the server answered with a success status.
    pub healthy: bool,
    /// HTTP status returned by the health endpoint.
    pub status: u16,
    /// JSON body returned by the server, when it sent one.
    pub details: Option<Value>,
}

/// Outcome of a completed export download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Bytes written to `path`.
    pub bytes_written: u64,
    /// Size announced by the server via Content-Length, when present.
    pub content_length: Option<u64>,
}
