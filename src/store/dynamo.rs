//! DynamoDB Record Store
//!
//! Implements [`RecordStore`] against DynamoDB (or a local DynamoDB-
//! compatible endpoint). Static `local` credentials are used because the
//! target is a local endpoint; a real deployment would swap the
//! credentials provider, not this module's logic.
//!
//! # Error mapping
//! - `ValidationException` → [`DynqlError::KeyMismatch`], the signal the
//!   executor's scan fallback recognizes (a fetch keyed on a non-key
//!   attribute fails this way)
//! - `ConditionalCheckFailedException` → [`DynqlError::PreconditionFailed`]
//! - everything else → [`DynqlError::Store`] with the SDK message surfaced
//!
//! # Value mapping
//! Strings and numbers map onto the scalar value model. Attribute types
//! outside it (bools, sets, documents) are coerced to display strings at
//! this deserialization boundary rather than leaking SDK types upward.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, KeyType};
use aws_sdk_dynamodb::Client;

use crate::config::StoreConfig;
use crate::error::{DynqlError, Result};
use crate::expression::UpdateExpression;
use crate::store::RecordStore;
use crate::value::{Record, Value};

/// DynamoDB-backed [`RecordStore`]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Build a client for the configured endpoint and region
    pub async fn connect(config: &StoreConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.as_str())
            .credentials_provider(Credentials::new("local", "local", None, None, "dynql-local"))
            .load()
            .await;
        Self { client: Client::new(&sdk_config) }
    }
}

#[async_trait]
impl RecordStore for DynamoStore {
    async fn get(&self, table: &str, key: &Record) -> Result<Option<Record>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(to_item(key)))
            .send()
            .await
            .map_err(map_sdk_err)?;
        Ok(output.item().map(from_item))
    }

    async fn scan(&self, table: &str, filter: Option<&Record>) -> Result<Vec<Record>> {
        let mut request = self.client.scan().table_name(table);
        if let Some(filter) = filter {
            let mut clauses = Vec::with_capacity(filter.len());
            for (i, (field, value)) in filter.iter().enumerate() {
                let name_alias = format!("#f{i}");
                let value_alias = format!(":f{i}");
                clauses.push(format!("{name_alias} = {value_alias}"));
                request = request
                    .expression_attribute_names(name_alias, field.as_str())
                    .expression_attribute_values(value_alias, to_attribute_value(value));
            }
            request = request.filter_expression(clauses.join(" AND "));
        }
        // Single page; no pagination beyond what the store returns
        let output = request.send().await.map_err(map_sdk_err)?;
        Ok(output.items().iter().map(from_item).collect())
    }

    async fn put(&self, table: &str, item: Record) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(&item)))
            .send()
            .await
            .map_err(map_sdk_err)?;
        Ok(())
    }

    async fn update(
        &self,
        table: &str,
        key: &Record,
        expression: &UpdateExpression,
        require_exists: bool,
    ) -> Result<()> {
        let mut names: HashMap<String, String> =
            expression.names.iter().map(|(a, f)| (a.clone(), f.clone())).collect();
        let values: HashMap<String, AttributeValue> = expression
            .values
            .iter()
            .map(|(a, v)| (a.clone(), to_attribute_value(v)))
            .collect();

        let mut request = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(to_item(key)))
            .update_expression(expression.expression.clone());

        if require_exists {
            // A record exists iff its key attribute exists
            if let Some(key_field) = key.keys().next() {
                names.insert("#key".to_string(), key_field.clone());
                request = request.condition_expression("attribute_exists(#key)");
            }
        }

        request
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await
            .map_err(map_sdk_err)?;
        Ok(())
    }

    async fn delete(&self, table: &str, key: &Record) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(to_item(key)))
            .send()
            .await
            .map_err(map_sdk_err)?;
        Ok(())
    }

    async fn describe_key_schema(&self, table: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(map_sdk_err)?;
        let description = output
            .table()
            .ok_or_else(|| DynqlError::store(format!("no description returned for '{table}'")))?;

        // Partition key first, then the sort key if the table has one
        let mut elements: Vec<(bool, String)> = description
            .key_schema()
            .iter()
            .map(|element| {
                (element.key_type() == &KeyType::Range, element.attribute_name().to_string())
            })
            .collect();
        elements.sort_by_key(|(is_range, _)| *is_range);
        Ok(elements.into_iter().map(|(_, name)| name).collect())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let output = self.client.list_tables().send().await.map_err(map_sdk_err)?;
        Ok(output.table_names().to_vec())
    }
}

/// Convert a scalar to its DynamoDB attribute representation
fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Str(s) => AttributeValue::S(s.clone()),
        Value::Int(n) => AttributeValue::N(n.to_string()),
        Value::Float(x) => AttributeValue::N(x.to_string()),
    }
}

/// Coerce an attribute back into the scalar value model
fn from_attribute_value(attribute: &AttributeValue) -> Value {
    match attribute {
        AttributeValue::S(s) => Value::Str(s.clone()),
        AttributeValue::N(n) => n
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| n.parse::<f64>().map(Value::Float))
            .unwrap_or_else(|_| Value::Str(n.clone())),
        AttributeValue::Bool(b) => Value::Str(b.to_string()),
        other => Value::Str(format!("{other:?}")),
    }
}

fn to_item(record: &Record) -> HashMap<String, AttributeValue> {
    record.iter().map(|(field, value)| (field.clone(), to_attribute_value(value))).collect()
}

fn from_item(item: &HashMap<String, AttributeValue>) -> Record {
    item.iter().map(|(field, value)| (field.clone(), from_attribute_value(value))).collect()
}

/// Map an SDK failure onto the error taxonomy by its service error code
fn map_sdk_err<E, R>(err: SdkError<E, R>) -> DynqlError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let message = err.message().unwrap_or("request failed").to_string();
    match code.as_deref() {
        Some("ValidationException") => DynqlError::key_mismatch(message),
        Some("ConditionalCheckFailedException") => DynqlError::precondition_failed(message),
        _ => DynqlError::store(DisplayErrorContext(err).to_string()),
    }
}
