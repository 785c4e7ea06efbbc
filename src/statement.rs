//! Statement Grammar and Parsing
//!
//! This module classifies a raw command line by its leading verb and
//! extracts typed fields via fixed grammars. Two families are recognized:
//!
//! - A minimal SQL-like dialect:
//!   - `SELECT * FROM <table> [WHERE <field> = '<value>']`
//!   - `INSERT INTO <table> VALUES (<field>=<value>, ...)`
//!   - `UPDATE <table> SET <field>=<value>[, ...] WHERE <field>='<value>'`
//!   - `DELETE FROM <table> WHERE <field>='<value>'`
//! - Structured verbs: `put-item`, `get-item`, `update-item`, `delete-item`
//!   take `<verb> <table> <json-object>`; `scan` takes a table; and
//!   `list-tables` takes nothing.
//!
//! # Contract
//! A line that does not match any recognized grammar yields a syntax error
//! and performs no store access. Table and field names are restricted to
//! word characters (letters, digits, underscore); the parser never attempts
//! partial recovery, so a malformed third pair rejects the whole statement
//! before the first two could apply.

use crate::error::{DynqlError, Result};
use crate::value::{coerce_literal, record_from_json, Record, Value};

/// A validated statement, one per input line
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SELECT * FROM t [WHERE f = 'v']`; no predicate means all records
    Select { table: String, predicate: Option<(String, Value)> },

    /// `INSERT INTO t VALUES (f1=v1, ...)`
    Insert { table: String, fields: Vec<(String, Value)> },

    /// `UPDATE t SET f1=v1[, ...] WHERE f='v'`
    Update { table: String, assignments: Vec<(String, Value)>, predicate: (String, Value) },

    /// `DELETE FROM t WHERE f='v'`
    Delete { table: String, predicate: (String, Value) },

    /// `put-item t {json}`
    Put { table: String, item: Record },

    /// `get-item t {json}`
    Get { table: String, key: Record },

    /// `update-item t {json}`; key/non-key partitioning happens at
    /// execution time against the table's resolved key schema
    UpdateItem { table: String, fields: Record },

    /// `delete-item t {json}`
    DeleteItem { table: String, key: Record },

    /// `scan t`
    Scan { table: String },

    /// `list-tables`
    ListTables,
}

/// Parse one input line into a statement
///
/// The leading verb is case-insensitive, as are the SQL keywords. `help`,
/// `exit`, and `quit` are REPL vocabulary, handled before this is called.
pub fn parse(line: &str) -> Result<Statement> {
    let line = line.trim();
    if line.is_empty() {
        return Err(DynqlError::syntax("empty statement"));
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "select" => parse_select(rest),
        "insert" => parse_insert(rest),
        "update" => parse_update(rest),
        "delete" => parse_delete(rest),
        "put-item" => {
            let (table, item) = parse_table_and_payload(rest)?;
            Ok(Statement::Put { table, item })
        }
        "get-item" => {
            let (table, key) = parse_table_and_payload(rest)?;
            Ok(Statement::Get { table, key })
        }
        "update-item" => {
            let (table, fields) = parse_table_and_payload(rest)?;
            Ok(Statement::UpdateItem { table, fields })
        }
        "delete-item" => {
            let (table, key) = parse_table_and_payload(rest)?;
            Ok(Statement::DeleteItem { table, key })
        }
        "scan" => {
            let (table, tail) = take_ident(rest)?;
            if !tail.trim().is_empty() {
                return Err(DynqlError::syntax("scan takes a single table name"));
            }
            Ok(Statement::Scan { table })
        }
        "list-tables" => {
            if !rest.trim().is_empty() {
                return Err(DynqlError::syntax("list-tables takes no arguments"));
            }
            Ok(Statement::ListTables)
        }
        other => Err(DynqlError::syntax(format!("unknown command '{other}'"))),
    }
}

// ---------------------------------------------------------------------------
// SQL-dialect grammars
// ---------------------------------------------------------------------------

fn parse_select(rest: &str) -> Result<Statement> {
    let rest = expect_keyword(rest, "*")?;
    let rest = expect_keyword(rest, "FROM")?;
    let (table, tail) = take_ident(rest)?;
    let tail = tail.trim();
    if tail.is_empty() {
        return Ok(Statement::Select { table, predicate: None });
    }
    let predicate_text = expect_keyword(tail, "WHERE")?;
    let predicate = parse_predicate(predicate_text)?;
    Ok(Statement::Select { table, predicate: Some(predicate) })
}

fn parse_insert(rest: &str) -> Result<Statement> {
    let rest = expect_keyword(rest, "INTO")?;
    let (table, tail) = take_ident(rest)?;
    let tail = expect_keyword(tail, "VALUES")?;
    let list = tail.trim();
    if !(list.len() >= 2 && list.starts_with('(') && list.ends_with(')')) {
        return Err(DynqlError::syntax("expected a parenthesized VALUES list"));
    }
    let fields = parse_pair_list(&list[1..list.len() - 1])?;
    Ok(Statement::Insert { table, fields })
}

fn parse_update(rest: &str) -> Result<Statement> {
    let (table, tail) = take_ident(rest)?;
    let tail = expect_keyword(tail, "SET")?;
    let Some((assignment_text, predicate_text)) = split_on_keyword(tail, "WHERE") else {
        return Err(DynqlError::syntax("UPDATE requires a WHERE clause"));
    };
    let assignments = parse_pair_list(assignment_text)?;
    let predicate = parse_predicate(predicate_text)?;
    Ok(Statement::Update { table, assignments, predicate })
}

fn parse_delete(rest: &str) -> Result<Statement> {
    let rest = expect_keyword(rest, "FROM")?;
    let (table, tail) = take_ident(rest)?;
    let predicate_text = expect_keyword(tail, "WHERE")?;
    let predicate = parse_predicate(predicate_text)?;
    Ok(Statement::Delete { table, predicate })
}

// ---------------------------------------------------------------------------
// Structured-verb grammar
// ---------------------------------------------------------------------------

/// Parse `<table> <json-object>` for the item verbs
///
/// JSON that fails to parse is a syntax error; a JSON object whose field
/// values are not scalars is a validation error; an empty object violates
/// the non-empty key/item invariant.
fn parse_table_and_payload(rest: &str) -> Result<(String, Record)> {
    let (table, tail) = take_ident(rest)?;
    let payload = tail.trim();
    if payload.is_empty() {
        return Err(DynqlError::syntax("expected a JSON object after the table name"));
    }
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(payload)
        .map_err(|e| DynqlError::syntax(format!("invalid JSON payload: {e}")))?;
    if object.is_empty() {
        return Err(DynqlError::validation("the JSON object must not be empty"));
    }
    let record = record_from_json(object)?;
    Ok((table, record))
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Take a leading word-character name, returning it and the remainder
fn take_ident(input: &str) -> Result<(String, &str)> {
    let input = input.trim_start();
    let end = input
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(input.len());
    if end == 0 {
        return Err(DynqlError::syntax(format!("expected a name, found '{input}'")));
    }
    Ok((input[..end].to_string(), &input[end..]))
}

/// Consume one keyword token (case-insensitive), returning the remainder
fn expect_keyword<'a>(input: &'a str, keyword: &str) -> Result<&'a str> {
    let input = input.trim_start();
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    let word = &input[..end];
    if word.eq_ignore_ascii_case(keyword) {
        Ok(&input[end..])
    } else {
        Err(DynqlError::syntax(format!("expected '{keyword}', found '{word}'")))
    }
}

/// Split on the first occurrence of a keyword outside quoted text
///
/// The keyword must stand alone as a word; `WHERE` inside a quoted value
/// does not count.
fn split_on_keyword<'a>(input: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let bytes = input.as_bytes();
    let mut quote: Option<u8> = None;
    for i in 0..bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None => {
                let starts_word = i == 0 || bytes[i - 1].is_ascii_whitespace();
                let end = i + keyword.len();
                if starts_word
                    && end <= bytes.len()
                    && input[i..end].eq_ignore_ascii_case(keyword)
                    && (end == bytes.len() || bytes[end].is_ascii_whitespace())
                {
                    return Some((&input[..i], &input[end..]));
                }
            }
        }
    }
    None
}

/// Split comma-separated text, ignoring commas inside quoted values
fn split_quoted(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Split one `field=value` entry; the entire list is rejected if any entry
/// lacks a literal `=`, so nothing partially applies
fn split_assignment(entry: &str) -> Result<(String, &str)> {
    let Some((lhs, rhs)) = entry.split_once('=') else {
        return Err(DynqlError::syntax(format!("expected field=value, found '{}'", entry.trim())));
    };
    let field = lhs.trim();
    if !is_ident(field) {
        return Err(DynqlError::syntax(format!("invalid field name '{field}'")));
    }
    let raw = rhs.trim();
    if raw.is_empty() {
        return Err(DynqlError::syntax(format!("missing value for field '{field}'")));
    }
    Ok((field.to_string(), raw))
}

/// Parse a comma-separated assignment list through literal coercion
fn parse_pair_list(text: &str) -> Result<Vec<(String, Value)>> {
    let mut pairs = Vec::new();
    for entry in split_quoted(text) {
        if entry.trim().is_empty() {
            return Err(DynqlError::syntax("expected field=value pairs"));
        }
        let (field, raw) = split_assignment(entry)?;
        pairs.push((field, coerce_literal(raw)));
    }
    if pairs.is_empty() {
        return Err(DynqlError::syntax("expected field=value pairs"));
    }
    Ok(pairs)
}

/// Parse one `field = '<value>'` equality predicate
///
/// Predicate values in the SQL dialect are single-quoted only; an interior
/// quote character is preserved literally.
fn parse_predicate(input: &str) -> Result<(String, Value)> {
    let (field, raw) = split_assignment(input)?;
    if !(raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'')) {
        return Err(DynqlError::syntax(format!(
            "predicate value for '{field}' must be single-quoted"
        )));
    }
    Ok((field, Value::Str(raw[1..raw.len() - 1].to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    // SELECT tests

    #[test]
    fn test_select_without_predicate() {
        let statement = parse("SELECT * FROM users").unwrap();
        assert_eq!(
            statement,
            Statement::Select { table: "users".to_string(), predicate: None }
        );
    }

    #[test]
    fn test_select_with_predicate() {
        let statement = parse("SELECT * FROM users WHERE username = 'alice'").unwrap();
        assert_eq!(
            statement,
            Statement::Select {
                table: "users".to_string(),
                predicate: Some(("username".to_string(), Value::Str("alice".to_string()))),
            }
        );
    }

    #[test]
    fn test_select_compact_predicate_spacing() {
        let statement = parse("select * from users where username='alice'").unwrap();
        assert!(matches!(statement, Statement::Select { predicate: Some(_), .. }));
    }

    #[test]
    fn test_select_requires_single_quoted_predicate() {
        assert!(parse("SELECT * FROM users WHERE id = 5").is_err());
        assert!(parse("SELECT * FROM users WHERE id = \"5\"").is_err());
    }

    #[test]
    fn test_select_rejects_missing_star() {
        let err = parse("SELECT name FROM users").unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
    }

    #[test]
    fn test_select_rejects_bad_table_name() {
        assert!(parse("SELECT * FROM us-ers").is_err());
        assert!(parse("SELECT * FROM 'users'").is_err());
    }

    #[test]
    fn test_select_predicate_value_may_contain_spaces() {
        let statement = parse("SELECT * FROM books WHERE title = 'war and peace'").unwrap();
        assert_eq!(
            statement,
            Statement::Select {
                table: "books".to_string(),
                predicate: Some(("title".to_string(), Value::Str("war and peace".to_string()))),
            }
        );
    }

    // INSERT tests

    #[test]
    fn test_insert_mixed_literals() {
        let statement = parse("INSERT INTO inv VALUES (sku='A-1', qty=3, label=\"two\")").unwrap();
        assert_eq!(
            statement,
            Statement::Insert {
                table: "inv".to_string(),
                fields: vec![
                    ("sku".to_string(), Value::Str("A-1".to_string())),
                    ("qty".to_string(), Value::Int(3)),
                    ("label".to_string(), Value::Str("two".to_string())),
                ],
            }
        );
    }

    #[test]
    fn test_insert_value_with_comma_inside_quotes() {
        let statement = parse("INSERT INTO inv VALUES (sku='A-1', note='red, large')").unwrap();
        let Statement::Insert { fields, .. } = statement else { panic!("expected insert") };
        assert_eq!(fields[1].1, Value::Str("red, large".to_string()));
    }

    #[test]
    fn test_insert_malformed_third_pair_rejects_whole_statement() {
        let err = parse("INSERT INTO inv VALUES (sku='A-1', qty=3, broken)").unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
    }

    #[test]
    fn test_insert_empty_values_list_rejected() {
        assert!(parse("INSERT INTO inv VALUES ()").is_err());
    }

    #[test]
    fn test_insert_requires_parentheses() {
        assert!(parse("INSERT INTO inv VALUES sku='A-1'").is_err());
    }

    // UPDATE tests

    #[test]
    fn test_update_multiple_assignments() {
        let statement = parse("UPDATE inv SET qty=9, loc='B2' WHERE sku='A-1'").unwrap();
        assert_eq!(
            statement,
            Statement::Update {
                table: "inv".to_string(),
                assignments: vec![
                    ("qty".to_string(), Value::Int(9)),
                    ("loc".to_string(), Value::Str("B2".to_string())),
                ],
                predicate: ("sku".to_string(), Value::Str("A-1".to_string())),
            }
        );
    }

    #[test]
    fn test_update_requires_where() {
        let err = parse("UPDATE inv SET qty=9").unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
    }

    #[test]
    fn test_update_where_inside_quoted_value_does_not_split() {
        let statement = parse("UPDATE inv SET note='tell me where' WHERE sku='A-1'").unwrap();
        let Statement::Update { assignments, predicate, .. } = statement else {
            panic!("expected update")
        };
        assert_eq!(assignments[0].1, Value::Str("tell me where".to_string()));
        assert_eq!(predicate.0, "sku");
    }

    // DELETE tests

    #[test]
    fn test_delete_with_predicate() {
        let statement = parse("DELETE FROM inv WHERE sku='A-1'").unwrap();
        assert_eq!(
            statement,
            Statement::Delete {
                table: "inv".to_string(),
                predicate: ("sku".to_string(), Value::Str("A-1".to_string())),
            }
        );
    }

    #[test]
    fn test_delete_requires_where() {
        assert!(parse("DELETE FROM inv").is_err());
    }

    // Structured-verb tests

    #[test]
    fn test_put_item_json_payload() {
        let statement = parse(r#"put-item inv {"sku": "A-1", "qty": 3}"#).unwrap();
        let Statement::Put { table, item } = statement else { panic!("expected put") };
        assert_eq!(table, "inv");
        assert_eq!(item["sku"], Value::Str("A-1".to_string()));
        assert_eq!(item["qty"], Value::Int(3));
    }

    #[test]
    fn test_get_item_invalid_json_is_syntax_error() {
        let err = parse("get-item inv {sku: A-1}").unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
    }

    #[test]
    fn test_put_item_nested_value_is_validation_error() {
        let err = parse(r#"put-item inv {"sku": "A-1", "tags": ["a"]}"#).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_get_item_empty_object_rejected() {
        let err = parse("get-item inv {}").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_item_verbs_require_payload() {
        assert!(parse("put-item inv").is_err());
        assert!(parse("delete-item inv").is_err());
    }

    // Scan and list-tables tests

    #[test]
    fn test_scan_single_table() {
        assert_eq!(parse("scan inv").unwrap(), Statement::Scan { table: "inv".to_string() });
    }

    #[test]
    fn test_scan_rejects_trailing_junk() {
        assert!(parse("scan inv extra").is_err());
    }

    #[test]
    fn test_list_tables() {
        assert_eq!(parse("list-tables").unwrap(), Statement::ListTables);
        assert!(parse("list-tables extra").is_err());
    }

    // Verb dispatch tests

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert!(parse("SeLeCt * FrOm users").is_ok());
        assert!(parse("PUT-ITEM inv {\"sku\": \"A-1\"}").is_ok());
    }

    #[test]
    fn test_unknown_verb() {
        let err = parse("truncate inv").unwrap_err();
        assert_eq!(err.error_code(), "SYNTAX_ERROR");
        assert!(err.to_string().contains("truncate"));
    }
}
