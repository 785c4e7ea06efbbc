//! Sessions and the Permission Gate
//!
//! A session is created once at login and is immutable for the process
//! lifetime. Every statement maps to exactly one required capability, and
//! the gate re-evaluates that mapping against the session before any store
//! call; there is no caching of already-approved statement kinds.

use std::collections::HashSet;
use std::fmt;

use crate::error::{DynqlError, Result};
use crate::statement::Statement;

/// One of the fixed vocabulary of permission strings gating a class of
/// statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    Insert,
    Update,
    Delete,
}

impl Capability {
    /// The capability a statement requires. Fixed and exhaustive:
    /// reads need `READ`, inserts `INSERT`, updates `UPDATE`, deletes
    /// `DELETE`.
    #[must_use]
    pub const fn required_for(statement: &Statement) -> Self {
        match statement {
            Statement::Select { .. }
            | Statement::Get { .. }
            | Statement::Scan { .. }
            | Statement::ListTables => Self::Read,
            Statement::Insert { .. } | Statement::Put { .. } => Self::Insert,
            Statement::Update { .. } | Statement::UpdateItem { .. } => Self::Update,
            Statement::Delete { .. } | Statement::DeleteItem { .. } => Self::Delete,
        }
    }

    /// The wire/storage spelling of this capability
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Parse one capability token as stored in a role record
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "READ" => Some(Self::Read),
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated operator session
#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    role: String,
    permissions: HashSet<Capability>,
}

impl Session {
    pub fn new(
        username: impl Into<String>,
        role: impl Into<String>,
        permissions: HashSet<Capability>,
    ) -> Self {
        Self { username: username.into(), role: role.into(), permissions }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn permissions(&self) -> &HashSet<Capability> {
        &self.permissions
    }

    /// Check the statement's required capability against this session
    ///
    /// On failure the denial names the missing capability and this
    /// session's role. The caller must not have touched the store yet.
    pub fn authorize(&self, statement: &Statement) -> Result<()> {
        let required = Capability::required_for(statement);
        if self.permissions.contains(&required) {
            Ok(())
        } else {
            Err(DynqlError::permission_denied(required.as_str(), &self.role))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    fn session_with(capabilities: &[Capability]) -> Session {
        Session::new("op", "tester", capabilities.iter().copied().collect())
    }

    fn select_all() -> Statement {
        Statement::Select { table: "t".to_string(), predicate: None }
    }

    #[test]
    fn test_required_capability_mapping() {
        assert_eq!(Capability::required_for(&select_all()), Capability::Read);
        assert_eq!(
            Capability::required_for(&Statement::Scan { table: "t".to_string() }),
            Capability::Read
        );
        assert_eq!(Capability::required_for(&Statement::ListTables), Capability::Read);
        assert_eq!(
            Capability::required_for(&Statement::Get { table: "t".to_string(), key: Record::new() }),
            Capability::Read
        );
        assert_eq!(
            Capability::required_for(&Statement::Insert { table: "t".to_string(), fields: vec![] }),
            Capability::Insert
        );
        assert_eq!(
            Capability::required_for(&Statement::Put {
                table: "t".to_string(),
                item: Record::new()
            }),
            Capability::Insert
        );
        assert_eq!(
            Capability::required_for(&Statement::UpdateItem {
                table: "t".to_string(),
                fields: Record::new()
            }),
            Capability::Update
        );
        assert_eq!(
            Capability::required_for(&Statement::DeleteItem {
                table: "t".to_string(),
                key: Record::new()
            }),
            Capability::Delete
        );
    }

    #[test]
    fn test_authorize_allows_granted_capability() {
        let session = session_with(&[Capability::Read]);
        assert!(session.authorize(&select_all()).is_ok());
    }

    #[test]
    fn test_authorize_denial_names_capability_and_role() {
        let session = session_with(&[Capability::Read]);
        let statement = Statement::Delete {
            table: "t".to_string(),
            predicate: ("pk".to_string(), crate::value::Value::Str("x".to_string())),
        };
        let err = session.authorize(&statement).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        let message = err.to_string();
        assert!(message.contains("DELETE"));
        assert!(message.contains("tester"));
    }

    #[test]
    fn test_capability_parse_is_case_insensitive() {
        assert_eq!(Capability::parse("read"), Some(Capability::Read));
        assert_eq!(Capability::parse(" INSERT "), Some(Capability::Insert));
        assert_eq!(Capability::parse("grant"), None);
    }
}
