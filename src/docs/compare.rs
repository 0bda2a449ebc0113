//! Symbol-level comparison of two inventories.

use crate::models::{ChangeKind, InventoryChange, InventoryRecord};
use crate::table::Table;
use std::collections::BTreeSet;

/// List the `(domain_role, fullname)` pairs added or removed going from
/// `from` to `to`, sorted by change, role and name
pub fn compare_inventories(from: &[InventoryRecord], to: &[InventoryRecord]) -> Table<InventoryChange> {
    let keys = |records: &[InventoryRecord]| -> BTreeSet<(String, String)> {
        records
            .iter()
            .map(|r| (r.domain_role.clone(), r.fullname.clone()))
            .collect()
    };
    let before = keys(from);
    let after = keys(to);

    let added = after.difference(&before).map(|k| (ChangeKind::Added, k));
    let removed = before.difference(&after).map(|k| (ChangeKind::Removed, k));

    added
        .chain(removed)
        .map(|(change, (domain_role, fullname))| InventoryChange {
            change,
            domain_role: domain_role.clone(),
            fullname: fullname.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: &str, name: &str, uri: &str) -> InventoryRecord {
        InventoryRecord {
            domain_role: role.to_string(),
            fullname: name.to_string(),
            display_name: "-".to_string(),
            project_name: "Demo".to_string(),
            project_version: String::new(),
            uri: uri.to_string(),
        }
    }

    #[test]
    fn reports_added_then_removed() {
        let old = vec![
            record("py:function", "demo.kept", "a.html"),
            record("py:function", "demo.gone", "a.html"),
        ];
        let new = vec![
            record("py:function", "demo.kept", "moved.html"),
            record("py:class", "demo.New", "b.html"),
            record("py:function", "demo.fresh", "b.html"),
        ];

        let changes = compare_inventories(&old, &new);
        let rows: Vec<_> = changes
            .iter()
            .map(|c| (c.change, c.fullname.as_str()))
            .collect();

        assert_eq!(
            rows,
            [
                (ChangeKind::Added, "demo.New"),
                (ChangeKind::Added, "demo.fresh"),
                (ChangeKind::Removed, "demo.gone"),
            ]
        );
    }

    #[test]
    fn role_change_counts_as_remove_and_add() {
        let old = vec![record("py:function", "demo.x", "")];
        let new = vec![record("py:method", "demo.x", "")];
        assert_eq!(compare_inventories(&old, &new).len(), 2);
    }

    #[test]
    fn identical_inventories_have_no_changes() {
        let inv = vec![record("py:class", "demo.A", "a.html")];
        assert!(compare_inventories(&inv, &inv).is_empty());
    }
}
