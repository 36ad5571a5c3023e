//! Record categories.

use std::fmt;

/// Namespace tag for a local identifier.
///
/// Local ids of bookmarks and history records are assigned independently and
/// can collide numerically; the category disambiguates them in the composite
/// raw key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// No category; the raw key is the bare local id.
    Unset,
    /// Bookmark records.
    Bookmark,
    /// History records.
    History,
}

impl Category {
    /// Returns the one-character key prefix for this category.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Category::Unset => "",
            Category::Bookmark => "b",
            Category::History => "h",
        }
    }

    /// Returns the category selected by a raw key's first byte, if any.
    #[must_use]
    pub fn from_prefix_byte(byte: u8) -> Option<Self> {
        match byte {
            b'b' => Some(Category::Bookmark),
            b'h' => Some(Category::History),
            _ => None,
        }
    }

    /// Returns the record-type name used in not-synced set keys.
    ///
    /// # Panics
    ///
    /// Panics for [`Category::Unset`]: pending-change sets exist only for
    /// concrete record categories, so reaching this with `Unset` is a
    /// programming error.
    #[must_use]
    pub fn record_type_name(self) -> &'static str {
        match self {
            Category::Bookmark => "BOOKMARKS",
            Category::History => "HISTORY_SITES",
            Category::Unset => panic!("no record type for Category::Unset"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Unset => "Unset",
            Category::Bookmark => "Bookmark",
            Category::History => "History",
        };
        f.write_str(name)
    }
}
