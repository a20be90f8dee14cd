//! Generic resource store consumed by the application: select/insert/update/delete
//! over named tables whose rows are JSON objects. The identity core only touches
//! the `users` table through [`UserRepository`]; the other tables belong to the
//! CRUD views and are listed here so unique constraints are declared in one place.

mod memory;
mod users;

pub use memory::{MemoryResourceStore, UnconfiguredStore};
pub use users::{NewUser, UserRepository, USERS_TABLE};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub type Row = Map<String, Value>;

pub const EVENTS_TABLE: &str = "events";
pub const MEMBERS_TABLE: &str = "members";
pub const SUPPLIERS_TABLE: &str = "suppliers";
pub const BILL_CATEGORIES_TABLE: &str = "bill_categories";
pub const BILLS_TABLE: &str = "bills";
pub const CASH_TRANSACTIONS_TABLE: &str = "cash_transactions";

/// (table, column) pairs whose values must be unique. String values compare
/// case-insensitively.
pub const UNIQUE_COLUMNS: &[(&str, &str)] = &[(USERS_TABLE, "email"), (BILL_CATEGORIES_TABLE, "name")];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence boundary is not configured")]
    NotConfigured,

    #[error("duplicate value for unique column {table}.{column}")]
    DuplicateUnique { table: String, column: String },

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Equality predicate applied by `select`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
    pub ignore_case: bool,
}

impl Filter {
    pub fn eq<C: Into<String>, V: Into<Value>>(column: C, value: V) -> Self {
        Self { column: column.into(), value: value.into(), ignore_case: false }
    }

    pub fn eq_ignore_case<C: Into<String>, V: Into<Value>>(column: C, value: V) -> Self {
        Self { column: column.into(), value: value.into(), ignore_case: true }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let Some(cell) = row.get(&self.column) else { return false; };
        if self.ignore_case {
            if let (Some(a), Some(b)) = (cell.as_str(), self.value.as_str()) {
                return a.to_lowercase() == b.to_lowercase();
            }
        }
        cell == &self.value
    }
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Rows of `table` matching every filter, in insertion order.
    async fn select(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Row>>;

    /// Insert a row; assigns a UUID `id` when the row has none. Returns the stored row.
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Merge `patch` into the row with the given id. `None` if no such row.
    async fn update(&self, table: &str, id: &str, patch: Row) -> StoreResult<Option<Row>>;

    /// Remove the row with the given id; returns whether a row was removed.
    async fn delete(&self, table: &str, id: &str) -> StoreResult<bool>;

    async fn count(&self, table: &str) -> StoreResult<usize> {
        Ok(self.select(table, &[]).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn filter_eq_is_exact() {
        let r = row(json!({"email": "Ana@Igreja.org", "active": true}));
        assert!(Filter::eq("active", true).matches(&r));
        assert!(!Filter::eq("email", "ana@igreja.org").matches(&r));
        assert!(!Filter::eq("missing", 1).matches(&r));
    }

    #[test]
    fn filter_ignore_case_only_applies_to_strings() {
        let r = row(json!({"email": "Ana@Igreja.org", "n": 1}));
        assert!(Filter::eq_ignore_case("email", "ana@igreja.ORG").matches(&r));
        assert!(Filter::eq_ignore_case("n", 1).matches(&r));
        assert!(!Filter::eq_ignore_case("n", 2).matches(&r));
    }
}
