//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout dynql.
//! All errors are structured and map to stable error codes.
//!
//! # Error Categories
//! - `Syntax`: input did not match any statement grammar; no store access
//! - `PermissionDenied`: capability check failed; no store access
//! - `Validation`: well-formed input that fails a semantic check
//! - `PreconditionFailed`: a conditional mutation targeted an absent record
//! - `KeyMismatch`: the store rejected a key whose shape does not match the
//!   table's key schema; the executor consumes this to trigger the scan
//!   fallback, and it only surfaces when no fallback applies
//! - `Store`: any other failure from the store collaborator

use thiserror::Error;

/// Main error type for dynql operations
#[derive(Error, Debug)]
pub enum DynqlError {
    /// Input did not match any recognized statement grammar
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The session's role lacks the capability the statement requires
    #[error("permission denied: role '{role}' lacks the {capability} capability")]
    PermissionDenied { capability: String, role: String },

    /// Input parsed but failed a semantic check (e.g. an update without any
    /// key field, or an unsupported value literal)
    #[error("validation error: {0}")]
    Validation(String),

    /// A conditional mutation found no record to mutate
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The store rejected the supplied key as not matching the table's
    /// key schema
    #[error("key schema mismatch: {0}")]
    KeyMismatch(String),

    /// Any other store failure, message surfaced verbatim
    #[error("store error: {0}")]
    Store(String),
}

impl DynqlError {
    /// Convert error to a stable code string
    ///
    /// Codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "SYNTAX_ERROR",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::KeyMismatch(_) => "KEY_MISMATCH",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Create a syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    /// Create a permission-denied error naming the missing capability
    pub fn permission_denied(capability: impl Into<String>, role: impl Into<String>) -> Self {
        Self::PermissionDenied { capability: capability.into(), role: role.into() }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a precondition-failed error
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create a key-mismatch error
    pub fn key_mismatch(message: impl Into<String>) -> Self {
        Self::KeyMismatch(message.into())
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}

/// Result type alias for dynql operations
pub type Result<T> = std::result::Result<T, DynqlError>;
