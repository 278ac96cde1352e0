//! Backend response envelope.
//!
//! List endpoints answer `{ "success": true, "data": [...], "total": n,
//! "totalPages": n, "currentPage": n }`. Exports saved to disk may also be a
//! bare array; both shapes decode through [`decode_list`].
//!
//! Rows are decoded one at a time. A row of the wrong shape is counted and
//! dropped so one bad row never rejects the rest of the batch.

use crate::error::BuddyError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,

    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub current_page: Option<u32>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` into an error.
    pub fn into_data(self) -> Result<Option<T>, BuddyError> {
        if !self.success {
            return Err(BuddyError::Backend(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        Ok(self.data)
    }
}

/// Rows that decoded, plus how many did not.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedList<T> {
    pub items: Vec<T>,
    pub malformed: usize,
}

/// Raw rows of a list response or a bare JSON array.
/// A successful envelope without `data` yields no rows.
pub fn decode_rows(json: &str) -> Result<Vec<Value>, BuddyError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(rows) => Ok(rows),
        object @ Value::Object(_) => {
            let envelope: ApiEnvelope<Vec<Value>> = serde_json::from_value(object)?;
            Ok(envelope.into_data()?.unwrap_or_default())
        }
        other => Err(BuddyError::Validation(format!(
            "Expected a JSON array or a response envelope, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode every row of a list response, dropping rows of the wrong shape.
pub fn decode_list<T: DeserializeOwned>(json: &str) -> Result<DecodedList<T>, BuddyError> {
    let rows = decode_rows(json)?;
    let mut decoded = DecodedList {
        items: Vec::with_capacity(rows.len()),
        malformed: 0,
    };
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<T>(row) {
            Ok(item) => decoded.items.push(item),
            Err(e) => {
                decoded.malformed += 1;
                debug!("Dropping malformed row {}: {}", index, e);
            }
        }
    }
    Ok(decoded)
}
