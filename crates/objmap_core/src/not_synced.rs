//! Not-synced record sets.
//!
//! For every `(record type, action)` pair the store keeps a set of local ids
//! pending outbound synchronization, serialized as a JSON array of unique
//! strings under the key `record_type_name + action`.

use crate::category::Category;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Operation applied to a not-synced record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotSyncedOperation {
    /// Return the current set unchanged.
    GetItems,
    /// Union the given local ids into the set.
    AddItems,
    /// Remove the given local ids from the set.
    DeleteItems,
}

impl fmt::Display for NotSyncedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotSyncedOperation::GetItems => "GetItems",
            NotSyncedOperation::AddItems => "AddItems",
            NotSyncedOperation::DeleteItems => "DeleteItems",
        };
        f.write_str(name)
    }
}

/// Action codes assigned by the sync protocol layer.
///
/// The store treats these as opaque comparisons; only
/// [`DELETE_RECORD`] carries extra meaning ("fully delete, purge the
/// mapping record too") inside
/// [`DeleteItems`](super::NotSyncedOperation::DeleteItems) processing.
pub mod actions {
    /// Record creation is pending.
    pub const CREATE_RECORD: i32 = 0;
    /// Record update is pending.
    pub const UPDATE_RECORD: i32 = 1;
    /// Record deletion is pending; local mappings are purged alongside.
    pub const DELETE_RECORD: i32 = 2;
}

/// Builds the store key for a `(category, action)` pending set.
///
/// # Panics
///
/// Panics for [`Category::Unset`] (no record type name exists for it).
pub(crate) fn not_synced_key(category: Category, action: i32) -> String {
    format!("{}{}", category.record_type_name(), action)
}

/// Serializes a set as a JSON array of unique strings.
pub(crate) fn serialize_set(set: &BTreeSet<String>) -> String {
    serde_json::to_string(set).unwrap_or_else(|e| {
        // String sets cannot fail to serialize; keep the read path sane anyway
        warn!(error = %e, "not-synced set serialization failed");
        "[]".to_string()
    })
}

/// Parses a set from a JSON array of strings.
///
/// Malformed input yields an empty set: this path follows the store's
/// tolerant-read policy instead of propagating decode errors.
pub(crate) fn deserialize_set(raw: &str) -> BTreeSet<String> {
    if raw.is_empty() {
        return BTreeSet::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            warn!(error = %e, "not-synced set deserialization failed, treating as empty");
            BTreeSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_concatenates_type_and_action() {
        assert_eq!(
            not_synced_key(Category::Bookmark, actions::CREATE_RECORD),
            "BOOKMARKS0"
        );
        assert_eq!(
            not_synced_key(Category::History, actions::DELETE_RECORD),
            "HISTORY_SITES2"
        );
    }

    #[test]
    #[should_panic(expected = "no record type")]
    fn key_unset_category_panics() {
        let _ = not_synced_key(Category::Unset, actions::CREATE_RECORD);
    }

    #[test]
    fn serialize_is_sorted_and_unique() {
        let set = set_of(&["b", "a", "c"]);
        assert_eq!(serialize_set(&set), r#"["a","b","c"]"#);
    }

    #[test]
    fn round_trip() {
        let set = set_of(&["10", "11"]);
        assert_eq!(deserialize_set(&serialize_set(&set)), set);
    }

    #[test]
    fn deserialize_dedups() {
        assert_eq!(deserialize_set(r#"["a","a","b"]"#), set_of(&["a", "b"]));
    }

    #[test]
    fn deserialize_tolerates_garbage() {
        assert!(deserialize_set("").is_empty());
        assert!(deserialize_set("not json").is_empty());
        assert!(deserialize_set(r#"{"a":1}"#).is_empty());
        assert!(deserialize_set("[1,2]").is_empty());
    }

    #[test]
    fn operation_display() {
        assert_eq!(NotSyncedOperation::GetItems.to_string(), "GetItems");
        assert_eq!(NotSyncedOperation::AddItems.to_string(), "AddItems");
        assert_eq!(NotSyncedOperation::DeleteItems.to_string(), "DeleteItems");
    }
}
