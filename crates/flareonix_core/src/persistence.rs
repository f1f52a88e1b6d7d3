//! crates/flareonix_core/src/persistence.rs
//!
//! Versioned encoding of the two persisted records.
//!
//! Every record is written as `{ "version": N, "data": ... }`. Records written
//! before versioning existed (version 0) are the bare JSON document, with
//! grounding sources nested as `{ "web": { "title", "uri" } }`.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::domain::{IdeaEvaluation, UserProfile};

pub const SCHEMA_VERSION: u64 = 1;

pub const PROFILE_KEY: &str = "flareonix_user";
pub const HISTORY_KEY: &str = "flareonix_evals";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record is not valid JSON: {0}")]
    Syntax(String),
    #[error("record version {0} is newer than this build supports")]
    UnsupportedVersion(u64),
    #[error("record does not match the expected shape: {0}")]
    Shape(String),
}

/// Wraps a value in the current envelope.
pub fn encode_record<T: Serialize + ?Sized>(data: &T) -> Result<String, RecordError> {
    let envelope = json!({
        "version": SCHEMA_VERSION,
        "data": serde_json::to_value(data).map_err(|e| RecordError::Shape(e.to_string()))?,
    });
    serde_json::to_string_pretty(&envelope).map_err(|e| RecordError::Shape(e.to_string()))
}

/// Parses, migrates, and deserializes a stored record.
pub fn decode_record<T: DeserializeOwned>(raw: &str) -> Result<T, RecordError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| RecordError::Syntax(e.to_string()))?;
    let migrated = migrate(value)?;
    serde_json::from_value(migrated).map_err(|e| RecordError::Shape(e.to_string()))
}

pub fn decode_profile(raw: &str) -> Result<UserProfile, RecordError> {
    decode_record(raw)
}

pub fn decode_history(raw: &str) -> Result<Vec<IdeaEvaluation>, RecordError> {
    decode_record(raw)
}

fn version_of(value: &Value) -> u64 {
    match value {
        Value::Object(map) if map.contains_key("data") => {
            map.get("version").and_then(Value::as_u64).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Brings a stored record up to the current version and returns its payload.
pub fn migrate(value: Value) -> Result<Value, RecordError> {
    let mut version = version_of(&value);
    if version > SCHEMA_VERSION {
        return Err(RecordError::UnsupportedVersion(version));
    }

    let mut data = if version == 0 {
        value
    } else {
        match value {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            other => other,
        }
    };

    while version < SCHEMA_VERSION {
        data = match version {
            0 => migrate_v0_to_v1(data),
            _ => data,
        };
        version += 1;
    }

    Ok(data)
}

const LEGACY_SCORES: [&str; 4] = [
    "problemRelevance",
    "marketDemand",
    "successProbability",
    "improvedProbability",
];

/// Flattens `{ "web": { title, uri } }` grounding sources inside history
/// entries, dropping chunks without a web source, and clamps scores to 0..=100.
fn migrate_v0_to_v1(mut data: Value) -> Value {
    if let Value::Array(entries) = &mut data {
        for analysis in entries.iter_mut().filter_map(|e| e.get_mut("analysis")) {
            for key in LEGACY_SCORES {
                if let Some(score) = analysis.get_mut(key) {
                    if let Some(n) = score.as_f64() {
                        *score = json!(n.round().clamp(0.0, 100.0) as u8);
                    }
                }
            }
            if let Some(sources) = analysis
                .get_mut("groundingSources")
                .and_then(Value::as_array_mut)
            {
                let flattened = sources.drain(..).filter_map(flatten_source).collect();
                *sources = flattened;
            }
        }
    }
    data
}

fn flatten_source(source: Value) -> Option<Value> {
    if let Some(web) = source.get("web") {
        return Some(json!({
            "title": web.get("title").and_then(Value::as_str).unwrap_or(""),
            "uri": web.get("uri").and_then(Value::as_str).unwrap_or(""),
        }));
    }
    source.get("uri").is_some().then_some(source)
}
