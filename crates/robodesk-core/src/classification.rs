//! # Client Classification
//!
//! Clients carry three sets of string codes: types, markets and tags.
//! Saving a client form replaces each set with the one the user picked.
//!
//! Instead of deleting every row and inserting the new set, the change is
//! expressed as a diff and applied in one transaction by the repository:
//!
//! ```text
//! current {retail, hotel}     desired {hotel, hospital}
//!         └─────────── diff_sets ───────────┘
//!              to_add    {hospital}
//!              to_remove {retail}
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One of the classification sets of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKind {
    ClientType,
    Market,
    Tag,
}

impl ClassificationKind {
    pub const ALL: [ClassificationKind; 3] = [
        ClassificationKind::ClientType,
        ClassificationKind::Market,
        ClassificationKind::Tag,
    ];

    /// Link table holding `(client_id, code)` rows.
    pub const fn table_name(&self) -> &'static str {
        match self {
            ClassificationKind::ClientType => "client_types",
            ClassificationKind::Market => "client_markets",
            ClassificationKind::Tag => "client_tags",
        }
    }
}

/// Rows to insert and delete to turn one set into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SetDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl SetDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the diff from `current` to `desired`.
///
/// Codes are trimmed; blank codes and duplicates are ignored. Both lists
/// come back sorted.
///
/// ## Example
/// ```rust
/// use robodesk_core::classification::diff_sets;
///
/// let diff = diff_sets(&["retail", "hotel"], &["hotel", "hospital"]);
/// assert_eq!(diff.to_add, vec!["hospital"]);
/// assert_eq!(diff.to_remove, vec!["retail"]);
/// ```
pub fn diff_sets<C, D>(current: &[C], desired: &[D]) -> SetDiff
where
    C: AsRef<str>,
    D: AsRef<str>,
{
    let current = normalize(current);
    let desired = normalize(desired);

    SetDiff {
        to_add: desired.difference(&current).map(|s| s.to_string()).collect(),
        to_remove: current.difference(&desired).map(|s| s.to_string()).collect(),
    }
}

fn normalize<S: AsRef<str>>(codes: &[S]) -> BTreeSet<&str> {
    codes
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_adds_and_removes() {
        let diff = diff_sets(&["a", "b", "c"], &["b", "d"]);
        assert_eq!(diff.to_add, vec!["d"]);
        assert_eq!(diff.to_remove, vec!["a", "c"]);
    }

    #[test]
    fn test_identical_sets_produce_empty_diff() {
        let diff = diff_sets(&["tag", "other"], &["other", "tag", "tag"]);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_blank_codes_ignored() {
        let empty: [&str; 0] = [];
        let diff = diff_sets(&empty, &["  ", " vip "]);
        assert_eq!(diff.to_add, vec!["vip"]);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_clear_all() {
        let empty: [String; 0] = [];
        let diff = diff_sets(&["x".to_string(), "y".to_string()], &empty);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, vec!["x", "y"]);
    }

    #[test]
    fn test_tables() {
        assert_eq!(ClassificationKind::Market.table_name(), "client_markets");
        assert_eq!(ClassificationKind::ALL.len(), 3);
    }
}
