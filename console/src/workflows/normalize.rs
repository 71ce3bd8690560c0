//! Normalization of list responses into workflow records
//!
//! The list webhook may answer with a bare array, an object wrapping the
//! array under `workflows` or `data`, or a single workflow object. Shapes
//! are tried in [`RESPONSE_SHAPES`] order and the first match wins; new
//! shapes go into the table at the priority they need.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::workflow::WorkflowRecord;

/// A recognised response encoding
pub struct ResponseShape {
    /// Short name used in logs
    pub name: &'static str,

    /// Returns the raw workflow entries when the body has this shape
    pub extract: fn(&Value) -> Option<Vec<Value>>,
}

/// Detectors in priority order
pub const RESPONSE_SHAPES: &[ResponseShape] = &[
    ResponseShape {
        name: "array",
        extract: extract_array,
    },
    ResponseShape {
        name: "workflows",
        extract: extract_workflows_field,
    },
    ResponseShape {
        name: "data",
        extract: extract_data_field,
    },
    ResponseShape {
        name: "single",
        extract: extract_single,
    },
];

fn extract_array(body: &Value) -> Option<Vec<Value>> {
    body.as_array().cloned()
}

fn extract_workflows_field(body: &Value) -> Option<Vec<Value>> {
    body.get("workflows").and_then(Value::as_array).cloned()
}

fn extract_data_field(body: &Value) -> Option<Vec<Value>> {
    body.get("data").and_then(Value::as_array).cloned()
}

fn extract_single(body: &Value) -> Option<Vec<Value>> {
    let has_id = body.get("id").is_some_and(is_truthy);
    let has_name = body.get("name").is_some_and(is_truthy);
    (body.is_object() && has_id && has_name).then(|| vec![body.clone()])
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Name of the first shape matching `body`, if any
pub fn detect_shape(body: &Value) -> Option<&'static str> {
    RESPONSE_SHAPES
        .iter()
        .find(|shape| (shape.extract)(body).is_some())
        .map(|shape| shape.name)
}

/// Convert a list response body into workflow records.
///
/// Bodies matching no shape yield an empty list. Entries that cannot be
/// decoded as a workflow (no usable `id`) are skipped.
pub fn normalize(body: &Value) -> Vec<WorkflowRecord> {
    let Some((shape, entries)) = RESPONSE_SHAPES
        .iter()
        .find_map(|shape| (shape.extract)(body).map(|entries| (shape.name, entries)))
    else {
        debug!("List response matched no known shape");
        return Vec::new();
    };

    debug!("List response shape: {} ({} entries)", shape, entries.len());

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<WorkflowRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping workflow entry {}: {}", index, e);
                None
            }
        })
        .collect()
}
