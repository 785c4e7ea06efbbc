//! Store Collaborator Interface
//!
//! The executor plans against this trait, never against a concrete store,
//! so a fake collaborator can stand in during tests. Implementations:
//! - [`memory`]: in-memory store with per-table key schemas and a call
//!   counter (tests and `--memory` mode)
//! - [`dynamo`]: DynamoDB-backed store (feature `dynamodb`)
//!
//! # Contract notes
//! - `get`/`update`/`delete` take a full primary key; a key whose field
//!   set does not match the table's key schema fails with
//!   [`DynqlError::KeyMismatch`], the signal the executor's scan fallback
//!   recognizes.
//! - `scan`'s filter is a conjunction of field equalities; `None` returns
//!   everything the store yields in a single page (no pagination).
//! - `put` fully replaces any record sharing the item's key.
//! - `update` with `require_exists` fails with
//!   [`DynqlError::PreconditionFailed`] when the keyed record is absent;
//!   without it, an absent record is created (upsert).

use async_trait::async_trait;

use crate::error::{DynqlError, Result};
use crate::expression::UpdateExpression;
use crate::value::Record;

#[cfg(feature = "dynamodb")]
pub mod dynamo;
pub mod memory;

/// The capability set consumed from the remote record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Exact fetch by full primary key
    async fn get(&self, table: &str, key: &Record) -> Result<Option<Record>>;

    /// Full-table scan, optionally filtered by field equalities
    async fn scan(&self, table: &str, filter: Option<&Record>) -> Result<Vec<Record>>;

    /// Write a record, replacing any record with the same key
    async fn put(&self, table: &str, item: Record) -> Result<()>;

    /// Apply a partial update to the keyed record
    async fn update(
        &self,
        table: &str,
        key: &Record,
        expression: &UpdateExpression,
        require_exists: bool,
    ) -> Result<()>;

    /// Delete by key; deleting an absent record is a success
    async fn delete(&self, table: &str, key: &Record) -> Result<()>;

    /// The table's declared key fields, partition key first
    async fn describe_key_schema(&self, table: &str) -> Result<Vec<String>>;

    /// Names of all tables, single page
    async fn list_tables(&self) -> Result<Vec<String>>;
}

pub(crate) fn unknown_table(table: &str) -> DynqlError {
    DynqlError::store(format!("table '{table}' does not exist"))
}
