//! dynql - Role-Gated Key-Value Store Shell
//!
//! dynql is an interactive command shell for querying and mutating a
//! remote schema-less key-value store through a restricted command
//! syntax: structured verbs (`put-item`, `get-item`, `update-item`,
//! `delete-item`, `scan`, `list-tables`) or a minimal SQL-like dialect
//! (`SELECT`/`INSERT`/`UPDATE`/`DELETE`). Every statement is parsed,
//! checked against the session's role capabilities, planned, and executed
//! before the next line is read.
//!
//! # Core Behaviors
//! - Lookup planning: an equality predicate is first tried as an exact-key
//!   fetch and transparently reissued as a filtered scan when the field
//!   turns out not to be the table's key
//! - Partial updates: input fields are partitioned into key and non-key
//!   fields against the table's live key schema, and the generated SET
//!   expression aliases every field and value to positional placeholders
//! - Least privilege: a fixed statement-kind → capability mapping is
//!   re-checked on every line before any store access
//!
//! # Module Organization
//! - [`error`] - Error types and stable error codes
//! - [`value`] - Scalar values, records, literal coercion
//! - [`statement`] - Statement grammars and parsing
//! - [`session`] - Capabilities, sessions, the permission gate
//! - [`auth`] - Two-step login lookup
//! - [`expression`] - Aliased SET-expression builder
//! - [`executor`] - Execution planning and the fetch→scan fallback
//! - [`store`] - The store collaborator trait and its backends
//! - [`output`] - Tabular result rendering
//! - [`repl`] - The interpreter pipeline and interactive loop
//! - [`config`] - Endpoint/region resolution

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod expression;
pub mod output;
pub mod repl;
pub mod session;
pub mod statement;
pub mod store;
pub mod value;

// Re-export commonly used types for convenience
pub use config::StoreConfig;
pub use error::{DynqlError, Result};
pub use executor::{Executor, Outcome};
pub use expression::UpdateExpression;
pub use repl::Interpreter;
pub use session::{Capability, Session};
pub use statement::Statement;
pub use store::memory::MemoryStore;
pub use store::RecordStore;
pub use value::{coerce_literal, Record, Value};
