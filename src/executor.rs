//! Execution Planning and Execution
//!
//! Turns a validated statement into concrete store operations. The planner
//! decides between an exact-key fetch and a predicate scan, partitions
//! update input into key and non-key fields, and builds the aliased
//! expression for partial updates. Exactly one logical store operation is
//! issued per statement, except the fetch→scan fallback: a deliberate
//! reclassification into a different operation, not a retry.

use std::sync::Arc;

use crate::error::{DynqlError, Result};
use crate::expression::UpdateExpression;
use crate::statement::Statement;
use crate::store::RecordStore;
use crate::value::Record;

/// The result of executing one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Records from a lookup or scan; `via_scan_fallback` is set when an
    /// exact-key fetch was rejected for key shape and reissued as a
    /// filtered scan
    Rows { records: Vec<Record>, via_scan_fallback: bool },

    /// A record was written (insert/put)
    Stored,

    /// A partial update was applied
    Updated,

    /// A delete completed (absent records delete silently)
    Deleted,

    /// Nothing to do; carries the reason (e.g. an update with no non-key
    /// fields)
    NoOp { reason: String },

    /// Table names from `list-tables`
    Tables(Vec<String>),
}

/// Plans and executes statements against an injected store
pub struct Executor {
    store: Arc<dyn RecordStore>,
}

impl Executor {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Execute one permission-checked statement
    ///
    /// The caller has already run the statement through the permission
    /// gate; nothing here re-checks capabilities.
    pub async fn execute(&self, statement: Statement) -> Result<Outcome> {
        match statement {
            Statement::Select { table, predicate: None } | Statement::Scan { table } => {
                let records = self.store.scan(&table, None).await?;
                Ok(Outcome::Rows { records, via_scan_fallback: false })
            }

            Statement::Select { table, predicate: Some((field, value)) } => {
                let key = Record::from([(field, value)]);
                self.lookup(&table, key).await
            }

            Statement::Get { table, key } => self.lookup(&table, key).await,

            Statement::Insert { table, fields } => {
                let item: Record = fields.into_iter().collect();
                self.store.put(&table, item).await?;
                Ok(Outcome::Stored)
            }

            Statement::Put { table, item } => {
                self.store.put(&table, item).await?;
                Ok(Outcome::Stored)
            }

            Statement::Update { table, assignments, predicate } => {
                // The predicate field is assumed to be the key; no schema
                // lookup on this path
                let (field, value) = predicate;
                let shown = value.clone();
                let key = Record::from([(field.clone(), value)]);
                let expression = UpdateExpression::set(assignments);
                match self.store.update(&table, &key, &expression, true).await {
                    Ok(()) => Ok(Outcome::Updated),
                    Err(DynqlError::PreconditionFailed(_)) => {
                        Err(DynqlError::precondition_failed(format!(
                            "no record in '{table}' matches {field} = '{shown}'"
                        )))
                    }
                    Err(e) => Err(e),
                }
            }

            Statement::UpdateItem { table, fields } => {
                let schema = self.store.describe_key_schema(&table).await?;
                let (key, updates) = partition_by_key_schema(&schema, fields)?;
                if updates.is_empty() {
                    return Ok(Outcome::NoOp {
                        reason: "the record contains only key fields; nothing to update"
                            .to_string(),
                    });
                }
                let expression = UpdateExpression::set(updates.into_iter().collect());
                // Unconditional: the store creates an absent record
                self.store.update(&table, &key, &expression, false).await?;
                Ok(Outcome::Updated)
            }

            Statement::Delete { table, predicate: (field, value) } => {
                let key = Record::from([(field, value)]);
                self.store.delete(&table, &key).await?;
                Ok(Outcome::Deleted)
            }

            Statement::DeleteItem { table, key } => {
                self.store.delete(&table, &key).await?;
                Ok(Outcome::Deleted)
            }

            Statement::ListTables => {
                let tables = self.store.list_tables().await?;
                Ok(Outcome::Tables(tables))
            }
        }
    }

    /// Exact fetch first; on the recognized key-shape rejection, reissue as
    /// a single scan filtered by the same equalities
    ///
    /// The scan is only issued after the fetch attempt definitively fails
    /// with a key mismatch; any other store error is fatal for the
    /// statement.
    async fn lookup(&self, table: &str, key: Record) -> Result<Outcome> {
        match self.store.get(table, &key).await {
            Ok(found) => {
                Ok(Outcome::Rows { records: found.into_iter().collect(), via_scan_fallback: false })
            }
            Err(DynqlError::KeyMismatch(detail)) => {
                tracing::debug!("exact fetch on '{}' rejected ({}); retrying as scan", table, detail);
                let records = self.store.scan(table, Some(&key)).await?;
                Ok(Outcome::Rows { records, via_scan_fallback: true })
            }
            Err(e) => Err(e),
        }
    }
}

/// Split update input into key fields (present in the schema) and update
/// fields (the remainder)
///
/// Input without any key field is a validation failure; the caller decides
/// what an empty update set means.
fn partition_by_key_schema(schema: &[String], fields: Record) -> Result<(Record, Record)> {
    let (key, updates): (Record, Record) =
        fields.into_iter().partition(|(field, _)| schema.contains(field));
    if key.is_empty() {
        return Err(DynqlError::validation(format!(
            "the record must include the table's primary key ({})",
            schema.join(", ")
        )));
    }
    Ok((key, updates))
}
