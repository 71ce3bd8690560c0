//! Workflow models

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Name shown for workflows without one
pub const UNNAMED: &str = "unnamed";

/// One workflow as reported by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawWorkflowRecord", rename_all = "camelCase")]
pub struct WorkflowRecord {
    /// Opaque unique workflow ID
    pub id: String,

    /// Workflow name, may be absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the workflow is enabled on the remote service
    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Either `archived` or `isArchived` was set on the wire
    pub archived: bool,

    /// Fields passed through untouched (nodes, connections, settings, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape, carrying both archived flags
#[derive(Deserialize)]
struct RawWorkflowRecord {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,

    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    name: Option<String>,

    #[serde(default)]
    active: Option<bool>,

    #[serde(default, rename = "createdAt", deserialize_with = "deserialize_lenient_string")]
    created_at: Option<String>,

    #[serde(default, rename = "updatedAt", deserialize_with = "deserialize_lenient_string")]
    updated_at: Option<String>,

    #[serde(default, rename = "publishedAt", deserialize_with = "deserialize_lenient_string")]
    published_at: Option<String>,

    #[serde(default)]
    archived: Option<bool>,

    #[serde(default, rename = "isArchived")]
    is_archived: Option<bool>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawWorkflowRecord> for WorkflowRecord {
    fn from(raw: RawWorkflowRecord) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            active: raw.active.unwrap_or(false),
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            published_at: raw.published_at,
            archived: raw.archived == Some(true) || raw.is_archived == Some(true),
            extra: raw.extra,
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("invalid workflow id: {}", other))),
    }
}

/// Strings pass through; any other JSON value counts as absent
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

impl WorkflowRecord {
    /// Create a bare record, mostly useful in tests
    pub fn new(id: impl Into<String>, name: impl Into<String>, active: bool) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            active,
            created_at: None,
            updated_at: None,
            published_at: None,
            archived: false,
            extra: Map::new(),
        }
    }

    /// Name for display, falling back to [`UNNAMED`]
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED,
        }
    }

    /// Name used for ordering; absent names sort as the empty string
    pub fn sort_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Published timestamp, else created timestamp
    pub fn reference_date(&self) -> Option<&str> {
        self.published_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.created_at.as_deref().filter(|s| !s.is_empty()))
    }

    /// Milliseconds since the epoch of [`Self::reference_date`], 0 when unknown
    pub fn timestamp_millis(&self) -> i64 {
        self.reference_date()
            .and_then(parse_timestamp)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }

    /// Reference date as `dd/mm/yyyy`, or `-`
    pub fn display_date(&self) -> String {
        match self.reference_date().and_then(parse_timestamp) {
            Some(dt) => dt.format("%d/%m/%Y").to_string(),
            None => "-".to_string(),
        }
    }
}

/// Parse the timestamp formats the remote service is known to emit
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
