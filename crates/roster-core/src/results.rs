//! Search result rows and the result collection.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::identity::IdentityId;

/// One search hit, passed through from the remote search service.
///
/// Only `id` is interpreted. The display fields keep whatever JSON the service
/// sent (null, a negative or fractional age, a number as text), and fields the
/// client does not know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Row id; list identity and ordering key.
    pub id: IdentityId,
    /// Display name.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub name: serde_json::Value,
    /// Age, as sent.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub age: serde_json::Value,
    /// Sex, as sent.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub sex: serde_json::Value,
    /// Any other fields, untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResultRow {
    /// Display text for `name`, `None` when absent or null.
    #[must_use]
    pub fn name_text(&self) -> Option<String> {
        field_text(&self.name)
    }

    /// Display text for `age`, `None` when absent or null.
    #[must_use]
    pub fn age_text(&self) -> Option<String> {
        field_text(&self.age)
    }

    /// Display text for `sex`, `None` when absent or null.
    #[must_use]
    pub fn sex_text(&self) -> Option<String> {
        field_text(&self.sex)
    }
}

fn field_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Normalizes a search response body into rows.
///
/// Anything other than a JSON array becomes an empty collection. Array
/// elements are kept as sent; only elements that are not objects or carry no
/// usable `id` are skipped.
#[must_use]
pub fn normalize_rows(body: serde_json::Value) -> Vec<ResultRow> {
    let serde_json::Value::Array(items) = body else {
        warn!("search response is not an array, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<ResultRow>(item) {
            Ok(row) if !row.id.is_blank() => Some(row),
            Ok(_) => {
                warn!(index, "skipping search row with a blank id");
                None
            }
            Err(e) => {
                warn!(index, error = %e, "skipping search row without a usable id");
                None
            }
        })
        .collect()
}

/// How the current result collection came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// Nothing fetched yet.
    Idle,
    /// Rows from a successful fetch.
    Loaded,
    /// A fetch failed; rows were reset to empty.
    Failed,
}

/// The displayed result collection, tagged with the snapshot revision that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Snapshot revision whose fetch produced these rows.
    pub revision: u64,
    /// How the rows were obtained.
    pub status: ResultStatus,
    /// Rows, in server order.
    pub rows: Vec<ResultRow>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self {
            revision: 0,
            status: ResultStatus::Idle,
            rows: Vec::new(),
        }
    }
}

impl ResultSet {
    /// Rows from a successful fetch of `revision`.
    #[must_use]
    pub fn loaded(revision: u64, rows: Vec<ResultRow>) -> Self {
        Self {
            revision,
            status: ResultStatus::Loaded,
            rows,
        }
    }

    /// The empty collection published after a failed fetch of `revision`.
    #[must_use]
    pub fn failed(revision: u64) -> Self {
        Self {
            revision,
            status: ResultStatus::Failed,
            rows: Vec::new(),
        }
    }

    /// Returns true if a response for `revision` may replace this collection.
    ///
    /// Only strictly newer snapshots are accepted, so a late response from an
    /// older snapshot can never overwrite a newer one.
    #[must_use]
    pub fn accepts(&self, revision: u64) -> bool {
        revision > self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn array_becomes_rows() {
        let rows = normalize_rows(json!([{"id": 1, "name": "Sam", "age": 29, "sex": "M"}]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, IdentityId::from(1));
        assert_eq!(rows[0].name, "Sam");
        assert_eq!(rows[0].age_text().as_deref(), Some("29"));
        assert_eq!(rows[0].sex_text().as_deref(), Some("M"));
        assert!(rows[0].extra.is_empty());
    }

    #[test]
    fn non_array_becomes_empty() {
        assert!(normalize_rows(json!({"detail": "User not found"})).is_empty());
        assert!(normalize_rows(json!(null)).is_empty());
        assert!(normalize_rows(json!("oops")).is_empty());
    }

    #[test]
    fn elements_without_a_usable_id_are_skipped() {
        let rows = normalize_rows(json!([
            42,
            {"id": 2, "name": "Ana"},
            {"name": "no id"},
            {"id": null, "name": "null id"},
            {"id": "  ", "name": "blank id"}
        ]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[0].age_text(), None);
    }

    #[test]
    fn loosely_typed_fields_pass_through() {
        let rows = normalize_rows(json!([
            {"id": 1, "name": null, "age": 29},
            {"id": 2, "age": -1},
            {"id": 3, "age": "29"},
            {"id": 4, "age": 29.5},
            {"id": 5, "name": "Ok", "age": 29, "sex": null}
        ]));

        let ids: Vec<String> = rows.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
        assert_eq!(rows[0].name_text(), None);
        assert_eq!(rows[1].age_text().as_deref(), Some("-1"));
        assert_eq!(rows[2].age_text().as_deref(), Some("29"));
        assert_eq!(rows[3].age_text().as_deref(), Some("29.5"));
        assert_eq!(rows[4].name_text().as_deref(), Some("Ok"));
        assert_eq!(rows[4].sex_text(), None);
    }

    #[test]
    fn unknown_fields_are_kept() {
        let rows = normalize_rows(json!([{"id": 3, "name": "Li", "city": "Pune"}]));
        assert_eq!(rows[0].extra.get("city"), Some(&json!("Pune")));
    }

    #[test]
    fn only_newer_revisions_are_accepted() {
        let current = ResultSet::loaded(4, Vec::new());
        assert!(current.accepts(5));
        assert!(!current.accepts(4));
        assert!(!current.accepts(3));
        assert!(ResultSet::default().accepts(1));
    }
}
