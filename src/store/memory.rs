//! In-Memory Record Store
//!
//! A faithful local stand-in for the remote store: per-table key schemas,
//! key-shape validation, conditional updates, and single-page scans. Every
//! trait call bumps a counter so tests can assert exactly how many store
//! operations a statement issued.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DynqlError, Result};
use crate::expression::UpdateExpression;
use crate::store::{unknown_table, RecordStore};
use crate::value::Record;

#[derive(Debug, Default)]
struct TableData {
    key_schema: Vec<String>,
    items: Vec<Record>,
}

/// In-memory [`RecordStore`] implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<BTreeMap<String, TableData>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table and its key fields (partition key first)
    pub fn create_table(&self, name: &str, key_schema: &[&str]) {
        let mut tables = self.tables.lock().expect("store lock poisoned");
        tables.insert(
            name.to_string(),
            TableData {
                key_schema: key_schema.iter().map(|f| (*f).to_string()).collect(),
                items: Vec::new(),
            },
        );
    }

    /// Total number of store operations issued so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Whether the key's field set exactly matches the table's key schema
fn key_shape_matches(key: &Record, schema: &[String]) -> bool {
    key.len() == schema.len() && schema.iter().all(|field| key.contains_key(field))
}

fn wrong_key_shape(table: &str, schema: &[String]) -> DynqlError {
    DynqlError::key_mismatch(format!(
        "the provided key does not match the key schema of '{table}' ({})",
        schema.join(", ")
    ))
}

/// Whether every equality in `conditions` holds on the record
///
/// Used both for scan filters and for matching a record against a key
/// projection.
fn matches_all(record: &Record, conditions: &Record) -> bool {
    conditions.iter().all(|(field, value)| record.get(field) == Some(value))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, table: &str, key: &Record) -> Result<Option<Record>> {
        self.record_call();
        let tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get(table).ok_or_else(|| unknown_table(table))?;
        if !key_shape_matches(key, &data.key_schema) {
            return Err(wrong_key_shape(table, &data.key_schema));
        }
        Ok(data.items.iter().find(|item| matches_all(item, key)).cloned())
    }

    async fn scan(&self, table: &str, filter: Option<&Record>) -> Result<Vec<Record>> {
        self.record_call();
        let tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get(table).ok_or_else(|| unknown_table(table))?;
        Ok(data
            .items
            .iter()
            .filter(|item| filter.map_or(true, |f| matches_all(item, f)))
            .cloned()
            .collect())
    }

    async fn put(&self, table: &str, item: Record) -> Result<()> {
        self.record_call();
        let mut tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        let missing: Vec<&String> =
            data.key_schema.iter().filter(|field| !item.contains_key(*field)).collect();
        if !missing.is_empty() {
            return Err(DynqlError::key_mismatch(format!(
                "item is missing key attribute(s) {} required by '{table}'",
                missing.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
            )));
        }
        let key: Record = data
            .key_schema
            .iter()
            .map(|field| (field.clone(), item[field].clone()))
            .collect();
        data.items.retain(|existing| !matches_all(existing, &key));
        data.items.push(item);
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key: &Record,
        expression: &UpdateExpression,
        require_exists: bool,
    ) -> Result<()> {
        self.record_call();
        let mut tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        if !key_shape_matches(key, &data.key_schema) {
            return Err(wrong_key_shape(table, &data.key_schema));
        }
        match data.items.iter_mut().find(|item| matches_all(item, key)) {
            Some(item) => {
                for (field, value) in expression.assignments() {
                    item.insert(field.clone(), value.clone());
                }
            }
            None if require_exists => {
                return Err(DynqlError::precondition_failed("the conditional request failed"));
            }
            None => {
                // Upsert: the key plus the assignments become a new record
                let mut item = key.clone();
                for (field, value) in expression.assignments() {
                    item.insert(field.clone(), value.clone());
                }
                data.items.push(item);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, key: &Record) -> Result<()> {
        self.record_call();
        let mut tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;
        if !key_shape_matches(key, &data.key_schema) {
            return Err(wrong_key_shape(table, &data.key_schema));
        }
        data.items.retain(|item| !matches_all(item, key));
        Ok(())
    }

    async fn describe_key_schema(&self, table: &str) -> Result<Vec<String>> {
        self.record_call();
        let tables = self.tables.lock().expect("store lock poisoned");
        let data = tables.get(table).ok_or_else(|| unknown_table(table))?;
        Ok(data.key_schema.clone())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.record_call();
        let tables = self.tables.lock().expect("store lock poisoned");
        Ok(tables.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(f, v)| ((*f).to_string(), v.clone())).collect()
    }

    fn store_with_inventory() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("inventory", &["sku"]);
        store
    }

    #[tokio::test]
    async fn test_put_then_get_by_key() {
        let store = store_with_inventory();
        let item = record(&[("sku", Value::from("A-1")), ("qty", Value::Int(3))]);
        store.put("inventory", item.clone()).await.unwrap();

        let key = record(&[("sku", Value::from("A-1"))]);
        assert_eq!(store.get("inventory", &key).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn test_put_replaces_whole_record() {
        let store = store_with_inventory();
        store
            .put("inventory", record(&[("sku", Value::from("A-1")), ("qty", Value::Int(3))]))
            .await
            .unwrap();
        store
            .put("inventory", record(&[("sku", Value::from("A-1")), ("loc", Value::from("B2"))]))
            .await
            .unwrap();

        let key = record(&[("sku", Value::from("A-1"))]);
        let item = store.get("inventory", &key).await.unwrap().unwrap();
        // Last writer wins: the qty field from the first put is gone
        assert_eq!(item.get("qty"), None);
        assert_eq!(item.get("loc"), Some(&Value::from("B2")));
    }

    #[tokio::test]
    async fn test_get_with_non_key_field_is_key_mismatch() {
        let store = store_with_inventory();
        let err = store
            .get("inventory", &record(&[("qty", Value::Int(3))]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "KEY_MISMATCH");
    }

    #[tokio::test]
    async fn test_composite_key_requires_both_fields() {
        let store = MemoryStore::new();
        store.create_table("orders", &["customer", "order_id"]);
        let err = store
            .get("orders", &record(&[("customer", Value::from("c1"))]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "KEY_MISMATCH");
    }

    #[tokio::test]
    async fn test_scan_filter_is_a_conjunction() {
        let store = store_with_inventory();
        for (sku, loc, qty) in [("A-1", "B2", 3), ("A-2", "B2", 5), ("A-3", "C1", 3)] {
            store
                .put(
                    "inventory",
                    record(&[
                        ("sku", Value::from(sku)),
                        ("loc", Value::from(loc)),
                        ("qty", Value::Int(qty)),
                    ]),
                )
                .await
                .unwrap();
        }
        let filter = record(&[("loc", Value::from("B2")), ("qty", Value::Int(3))]);
        let rows = store.scan("inventory", Some(&filter)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["sku"], Value::from("A-1"));
    }

    #[tokio::test]
    async fn test_update_require_exists_on_absent_record() {
        let store = store_with_inventory();
        let expr = UpdateExpression::set(vec![("qty".to_string(), Value::Int(9))]);
        let key = record(&[("sku", Value::from("missing"))]);
        let err = store.update("inventory", &key, &expr, true).await.unwrap_err();
        assert_eq!(err.error_code(), "PRECONDITION_FAILED");
        // The failed conditional must not create the record
        assert!(store.scan("inventory", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconditional_update_upserts() {
        let store = store_with_inventory();
        let expr = UpdateExpression::set(vec![("qty".to_string(), Value::Int(9))]);
        let key = record(&[("sku", Value::from("new"))]);
        store.update("inventory", &key, &expr, false).await.unwrap();

        let item = store.get("inventory", &key).await.unwrap().unwrap();
        assert_eq!(item["qty"], Value::Int(9));
        assert_eq!(item["sku"], Value::from("new"));
    }

    #[tokio::test]
    async fn test_delete_absent_record_is_silent_success() {
        let store = store_with_inventory();
        let key = record(&[("sku", Value::from("ghost"))]);
        assert!(store.delete("inventory", &key).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_table_is_store_error() {
        let store = MemoryStore::new();
        let err = store.scan("nope", None).await.unwrap_err();
        assert_eq!(err.error_code(), "STORE_ERROR");
    }

    #[tokio::test]
    async fn test_call_counter() {
        let store = store_with_inventory();
        assert_eq!(store.calls(), 0);
        let _ = store.scan("inventory", None).await;
        let _ = store.list_tables().await;
        assert_eq!(store.calls(), 2);
    }
}
