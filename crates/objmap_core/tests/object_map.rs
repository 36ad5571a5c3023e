//! End-to-end tests for the object mapping store.
//!
//! These drive the public [`ObjectMap`] handle against a real on-disk
//! engine, covering persistence, lifecycle, and sequencing behavior.

use objmap_core::{actions, Category, NotSyncedOperation, ObjectMap};
use std::collections::BTreeSet;
use tempfile::tempdir;

fn set_of(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_mapping_lifecycle_on_disk() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    assert_eq!(map.set_api_version("0").wait(), Some(true));

    assert_eq!(
        map.save_object_id_and_order(Category::Bookmark, "123", "obj-abc", "1.1.1")
            .wait(),
        Some(true)
    );

    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some("obj-abc".to_string())
    );
    assert_eq!(
        map.get_order_by_local_id(Category::Bookmark, "123").wait(),
        Some("1.1.1".to_string())
    );
    assert_eq!(
        map.get_local_id_by_object_id(Category::Bookmark, "obj-abc").wait(),
        Some("123".to_string())
    );

    assert_eq!(
        map.delete_by_local_id(Category::Bookmark, "123").wait(),
        Some(true)
    );
    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some(String::new())
    );
    assert_eq!(
        map.get_local_id_by_object_id(Category::Bookmark, "obj-abc").wait(),
        Some(String::new())
    );
}

#[test]
fn records_survive_handle_restart() {
    let profile = tempdir().unwrap();

    {
        let map = ObjectMap::new(profile.path());
        map.set_api_version("0").wait();
        assert_eq!(
            map.save_object_id_and_order(Category::History, "42", "obj-h", "0.2")
                .wait(),
            Some(true)
        );
    }

    let map = ObjectMap::new(profile.path());
    assert_eq!(
        map.get_object_id_by_local_id(Category::History, "42").wait(),
        Some("obj-h".to_string())
    );
    assert_eq!(
        map.get_order_by_local_id(Category::History, "42").wait(),
        Some("0.2".to_string())
    );
}

#[test]
fn close_reopens_lazily_on_next_access() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    assert_eq!(
        map.save_object_id(Category::Bookmark, "1", "obj-1").wait(),
        Some(true)
    );
    assert_eq!(map.close().wait(), Some(()));

    // Close is not terminal; the next read reopens the store from disk
    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "1").wait(),
        Some("obj-1".to_string())
    );
}

#[test]
fn update_order_on_missing_record_leaves_store_unchanged() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    assert_eq!(
        map.update_order(Category::Bookmark, "123", "9.9.9").wait(),
        Some(false)
    );
    assert_eq!(
        map.get_order_by_local_id(Category::Bookmark, "123").wait(),
        Some(String::new())
    );
}

#[test]
fn create_order_matches_save_object_id_and_order() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    assert_eq!(
        map.create_order(Category::Bookmark, "5", "obj-5", "1.0.5").wait(),
        Some(true)
    );
    assert_eq!(
        map.get_order_by_object_id(Category::Bookmark, "obj-5").wait(),
        Some("1.0.5".to_string())
    );
}

#[test]
fn not_synced_set_round_trip() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();
    let action = actions::CREATE_RECORD;

    let added = map
        .save_get_delete_not_synced_records(
            Category::Bookmark,
            action,
            set_of(&["a", "b"]),
            NotSyncedOperation::AddItems,
        )
        .wait()
        .unwrap();
    assert_eq!(added, set_of(&["a", "b"]));

    // Duplicate add is idempotent
    let again = map
        .save_get_delete_not_synced_records(
            Category::Bookmark,
            action,
            set_of(&["a"]),
            NotSyncedOperation::AddItems,
        )
        .wait()
        .unwrap();
    assert_eq!(again.len(), 2);

    let reduced = map
        .save_get_delete_not_synced_records(
            Category::Bookmark,
            action,
            set_of(&["a"]),
            NotSyncedOperation::DeleteItems,
        )
        .wait()
        .unwrap();
    assert_eq!(reduced, set_of(&["b"]));

    let current = map
        .save_get_delete_not_synced_records(
            Category::Bookmark,
            action,
            BTreeSet::new(),
            NotSyncedOperation::GetItems,
        )
        .wait()
        .unwrap();
    assert_eq!(current, set_of(&["b"]));
}

#[test]
fn full_delete_action_purges_mapping_records() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    map.save_object_id_and_order(Category::Bookmark, "123", "obj-abc", "1.1.1")
        .wait();
    map.save_get_delete_not_synced_records(
        Category::Bookmark,
        actions::DELETE_RECORD,
        set_of(&["123"]),
        NotSyncedOperation::AddItems,
    )
    .wait();
    map.save_get_delete_not_synced_records(
        Category::Bookmark,
        actions::DELETE_RECORD,
        set_of(&["123"]),
        NotSyncedOperation::DeleteItems,
    )
    .wait();

    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some(String::new())
    );
    assert_eq!(
        map.get_local_id_by_object_id(Category::Bookmark, "obj-abc").wait(),
        Some(String::new())
    );
}

#[test]
fn non_delete_action_keeps_mapping_records() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    map.save_object_id(Category::Bookmark, "123", "obj-abc").wait();
    map.save_get_delete_not_synced_records(
        Category::Bookmark,
        actions::UPDATE_RECORD,
        set_of(&["123"]),
        NotSyncedOperation::AddItems,
    )
    .wait();
    map.save_get_delete_not_synced_records(
        Category::Bookmark,
        actions::UPDATE_RECORD,
        set_of(&["123"]),
        NotSyncedOperation::DeleteItems,
    )
    .wait();

    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some("obj-abc".to_string())
    );
}

#[test]
fn destroy_wipes_all_state() {
    let profile = tempdir().unwrap();

    {
        let map = ObjectMap::new(profile.path());
        assert_eq!(map.set_api_version("v1").wait(), Some(true));
        assert_eq!(
            map.save_object_id_and_order(Category::Bookmark, "123", "obj-abc", "1.1.1")
                .wait(),
            Some(true)
        );
        assert_eq!(
            map.get_order_by_object_id(Category::Bookmark, "obj-abc").wait(),
            Some("1.1.1".to_string())
        );

        assert_eq!(map.destroy_db().wait(), Some(()));

        // Same handle reopens a fresh store on next access
        assert_eq!(
            map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
            Some(String::new())
        );
    }

    // A fresh handle at the same path sees no prior records either
    let map = ObjectMap::new(profile.path());
    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some(String::new())
    );
}

#[test]
fn destroy_without_prior_open_succeeds() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    assert_eq!(map.destroy_db().wait(), Some(()));
}

#[test]
fn back_to_back_writes_keep_the_last_order() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    map.save_object_id_and_order(Category::Bookmark, "1", "obj-1", "first");
    map.save_object_id_and_order(Category::Bookmark, "1", "obj-1", "second");

    // Reads queue behind both writes on the sequencing worker
    assert_eq!(
        map.get_order_by_local_id(Category::Bookmark, "1").wait(),
        Some("second".to_string())
    );
}

#[test]
fn special_records_bypass_the_schema() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    let blob = r#"{"devices":[{"name":"laptop"}]}"#;
    assert_eq!(map.save_special_record("DEVICES", blob).wait(), Some(true));
    assert_eq!(
        map.get_special_record_by_local_id("DEVICES").wait(),
        Some(blob.to_string())
    );
}

#[test]
fn reset_key_is_a_surgical_delete() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    map.save_object_id(Category::Bookmark, "123", "obj-abc").wait();
    map.reset_key("b123").wait();

    assert_eq!(
        map.get_object_id_by_local_id(Category::Bookmark, "123").wait(),
        Some(String::new())
    );
}

#[test]
fn api_version_is_one_time() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());

    assert_eq!(map.set_api_version("").wait(), Some(false));
    assert_eq!(map.set_api_version("v1").wait(), Some(true));
    assert_eq!(map.set_api_version("v2").wait(), Some(false));
}

#[test]
fn dump_all_reflects_live_entries() {
    let profile = tempdir().unwrap();
    let map = ObjectMap::new(profile.path());
    map.set_api_version("0").wait();

    map.save_object_id(Category::Bookmark, "123", "obj-abc").wait();
    let entries = map.dump_all().wait().unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|(k, _)| k == "b123"));
    assert!(entries.iter().any(|(k, v)| k == "obj-abc" && v == "b123"));
}
