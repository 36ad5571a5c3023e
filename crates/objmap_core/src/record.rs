//! Mapping record JSON codec.
//!
//! The forward value stored under a raw key is a JSON array holding exactly
//! one object:
//!
//! ```json
//! [{"object_id": "...", "order": "...", "apiVersion": "..."}]
//! ```
//!
//! `order` is omitted entirely when a record is created without one, which
//! keeps "create without order" distinguishable from "update order".

use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};

/// A decoded forward mapping record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Globally unique synchronized object identifier.
    pub object_id: String,
    /// Opaque externally-generated sort key, if one has been assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Store-wide API version at the time of the write.
    #[serde(default, rename = "apiVersion")]
    pub api_version: String,
}

impl MappingRecord {
    /// Creates a record without an order.
    #[must_use]
    pub fn new(object_id: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            order: None,
            api_version: api_version.into(),
        }
    }

    /// Creates a record carrying an order.
    #[must_use]
    pub fn with_order(
        object_id: impl Into<String>,
        order: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            order: Some(order.into()),
            api_version: api_version.into(),
        }
    }

    /// Serializes the record to its one-element-array JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> MapResult<String> {
        serde_json::to_string(&[self]).map_err(|e| MapError::encode(e.to_string()))
    }

    /// Parses a record from its one-element-array JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not parse, is not an array of
    /// length 1, or the single element lacks `object_id`. An absent `order`
    /// or `apiVersion` is not an error; `order` decodes to `None` and
    /// `apiVersion` to the empty string.
    pub fn from_json(json: &str) -> MapResult<Self> {
        let mut records: Vec<MappingRecord> =
            serde_json::from_str(json).map_err(|e| MapError::decode(e.to_string()))?;
        if records.len() != 1 {
            return Err(MapError::decode(format!(
                "expected a one-element array, got {} elements",
                records.len()
            )));
        }
        records
            .pop()
            .ok_or_else(|| MapError::decode("expected a one-element array"))
    }

    /// Returns the order, or the empty string if none was assigned.
    #[must_use]
    pub fn order_or_empty(&self) -> &str {
        self.order.as_deref().unwrap_or("")
    }
}
