use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::{Filter, ResourceStore, Row, StoreError, StoreResult, UNIQUE_COLUMNS};

type Tables = HashMap<String, Vec<Row>>;

/// In-memory table store. When opened with a snapshot path the whole table set is
/// loaded from that JSON file and rewritten after every mutation. A mutation whose
/// snapshot write fails is undone in memory before the error is returned.
#[derive(Clone, Default)]
pub struct MemoryResourceStore {
    tables: Arc<RwLock<Tables>>,
    snapshot: Option<PathBuf>,
}

impl MemoryResourceStore {
    pub fn new() -> Self { Self::default() }

    /// Open a store persisted at `path`. A missing file starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tables: Tables = match std::fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => serde_json::from_slice(&bytes)?,
            Ok(_) => Tables::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::new(),
            Err(e) => return Err(e.into()),
        };
        let n: usize = tables.values().map(|t| t.len()).sum();
        tracing::info!(target: "persistence", "opened snapshot {} ({} tables, {} rows)", path.display(), tables.len(), n);
        Ok(Self { tables: Arc::new(RwLock::new(tables)), snapshot: Some(path) })
    }

    fn persist(&self, tables: &Tables) -> StoreResult<()> {
        let Some(path) = self.snapshot.as_ref() else { return Ok(()); };
        if let Some(dir) = path.parent() { std::fs::create_dir_all(dir)?; }
        // write-then-rename: the snapshot on disk is never partially written
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(tables)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn unique_violation(table: &str, rows: &[Row], candidate: &Row, skip_id: Option<&str>) -> Option<StoreError> {
    for (t, column) in UNIQUE_COLUMNS.iter().filter(|(t, _)| *t == table) {
        let Some(value) = candidate.get(*column) else { continue; };
        if value.is_null() { continue; }
        let probe = Filter::eq_ignore_case(*column, value.clone());
        let clash = rows
            .iter()
            .filter(|r| skip_id.map_or(true, |id| row_id(r) != Some(id)))
            .any(|r| probe.matches(r));
        if clash {
            return Some(StoreError::DuplicateUnique { table: t.to_string(), column: column.to_string() });
        }
    }
    None
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(|v| v.as_str())
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn select(&self, table: &str, filters: &[Filter]) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(table) else { return Ok(Vec::new()); };
        Ok(rows.iter().filter(|r| filters.iter().all(|f| f.matches(r))).cloned().collect())
    }

    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Row> {
        match row.get("id") {
            None | Some(Value::Null) => {
                row.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
            }
            Some(Value::String(_)) => {}
            Some(other) => return Err(StoreError::InvalidRow(format!("id must be a string, got {}", other))),
        }
        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| row_id(r) == row_id(&row)) {
            return Err(StoreError::DuplicateUnique { table: table.to_string(), column: "id".to_string() });
        }
        if let Some(e) = unique_violation(table, rows, &row, None) { return Err(e); }
        rows.push(row.clone());
        if let Err(e) = self.persist(&tables) {
            if let Some(rows) = tables.get_mut(table) { rows.pop(); }
            return Err(e);
        }
        tracing::debug!(target: "persistence", table = table, "insert");
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, mut patch: Row) -> StoreResult<Option<Row>> {
        patch.remove("id");
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else { return Ok(None); };
        let Some(idx) = rows.iter().position(|r| row_id(r) == Some(id)) else { return Ok(None); };
        let mut merged = rows[idx].clone();
        for (k, v) in patch { merged.insert(k, v); }
        if let Some(e) = unique_violation(table, rows, &merged, Some(id)) { return Err(e); }
        let previous = std::mem::replace(&mut rows[idx], merged.clone());
        if let Err(e) = self.persist(&tables) {
            if let Some(rows) = tables.get_mut(table) { rows[idx] = previous; }
            return Err(e);
        }
        tracing::debug!(target: "persistence", table = table, id = id, "update");
        Ok(Some(merged))
    }

    async fn delete(&self, table: &str, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else { return Ok(false); };
        let Some(idx) = rows.iter().position(|r| row_id(r) == Some(id)) else { return Ok(false); };
        let removed = rows.remove(idx);
        if let Err(e) = self.persist(&tables) {
            if let Some(rows) = tables.get_mut(table) { rows.insert(idx, removed); }
            return Err(e);
        }
        Ok(true)
    }

    async fn count(&self, table: &str) -> StoreResult<usize> {
        Ok(self.tables.read().get(table).map(|r| r.len()).unwrap_or(0))
    }
}

/// Stand-in used when no persistence backend is configured: every call fails
/// with `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStore;

#[async_trait]
impl ResourceStore for UnconfiguredStore {
    async fn select(&self, _table: &str, _filters: &[Filter]) -> StoreResult<Vec<Row>> { Err(StoreError::NotConfigured) }
    async fn insert(&self, _table: &str, _row: Row) -> StoreResult<Row> { Err(StoreError::NotConfigured) }
    async fn update(&self, _table: &str, _id: &str, _patch: Row) -> StoreResult<Option<Row>> { Err(StoreError::NotConfigured) }
    async fn delete(&self, _table: &str, _id: &str) -> StoreResult<bool> { Err(StoreError::NotConfigured) }
}
