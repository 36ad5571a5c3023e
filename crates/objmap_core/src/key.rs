//! Composite raw key codec.
//!
//! A raw key is the category prefix followed by the local id. Splitting
//! reverses composition: the first byte selects the category when it is a
//! known prefix, otherwise the whole string is an `Unset` local id.

use crate::category::Category;

/// Composes the raw store key for a `(category, local_id)` pair.
#[must_use]
pub fn compose_raw_key(category: Category, local_id: &str) -> String {
    let mut raw = String::with_capacity(category.prefix().len() + local_id.len());
    raw.push_str(category.prefix());
    raw.push_str(local_id);
    raw
}

/// Splits a raw store key back into `(local_id, category)`.
///
/// An empty input yields `("", Unset)`.
#[must_use]
pub fn split_raw_key(raw: &str) -> (String, Category) {
    let Some(&first) = raw.as_bytes().first() else {
        return (String::new(), Category::Unset);
    };

    match Category::from_prefix_byte(first) {
        Some(category) => (raw[1..].to_string(), category),
        None => (raw.to_string(), Category::Unset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn compose_prefixes_by_category() {
        assert_eq!(compose_raw_key(Category::Bookmark, "123"), "b123");
        assert_eq!(compose_raw_key(Category::History, "123"), "h123");
        assert_eq!(compose_raw_key(Category::Unset, "123"), "123");
    }

    #[test]
    fn split_empty_is_unset() {
        assert_eq!(split_raw_key(""), (String::new(), Category::Unset));
    }

    #[test]
    fn split_unknown_prefix_is_unset() {
        assert_eq!(split_raw_key("x42"), ("x42".to_string(), Category::Unset));
    }

    #[test]
    fn split_bare_prefix() {
        assert_eq!(split_raw_key("b"), (String::new(), Category::Bookmark));
        assert_eq!(split_raw_key("h"), (String::new(), Category::History));
    }

    proptest! {
        #[test]
        fn round_trip_all_categories(local_id in "\\PC*") {
            for category in [Category::Unset, Category::Bookmark, Category::History] {
                // An Unset local id starting with a category prefix is not
                // distinguishable from a prefixed key; skip that corner.
                if category == Category::Unset {
                    if let Some(&first) = local_id.as_bytes().first() {
                        prop_assume!(Category::from_prefix_byte(first).is_none());
                    }
                }
                let raw = compose_raw_key(category, &local_id);
                prop_assert_eq!(split_raw_key(&raw), (local_id.clone(), category));
            }
        }
    }
}
