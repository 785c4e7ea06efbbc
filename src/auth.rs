//! Authentication
//!
//! Login resolves against two well-known tables with exactly two lookups
//! and no retry: the user record by `username`, then the role record by
//! `role_name`. A role's capability list lives in a single
//! comma/whitespace-separated `permissions` string, parsed here; unknown
//! tokens are logged and skipped rather than failing the login.
//!
//! Passwords are compared in plain text against the stored user record.

use std::collections::HashSet;

use crate::error::Result;
use crate::session::{Capability, Session};
use crate::store::RecordStore;
use crate::value::{Record, Value};

/// Table holding user records keyed by `username`
pub const USERS_TABLE: &str = "users";
/// Table holding role records keyed by `role_name`
pub const ROLES_TABLE: &str = "roles";

/// Resolve credentials to a session, or `None` to deny
///
/// Denial reasons (unknown user, wrong password) are deliberately not
/// distinguished to the caller. A user without a role logs in with an
/// empty permission set.
pub async fn authenticate(
    store: &dyn RecordStore,
    username: &str,
    password: &str,
) -> Result<Option<Session>> {
    let key = Record::from([("username".to_string(), Value::Str(username.to_string()))]);
    let Some(user) = store.get(USERS_TABLE, &key).await? else {
        return Ok(None);
    };

    match user.get("password") {
        Some(Value::Str(stored)) if stored == password => {}
        _ => return Ok(None),
    }

    let Some(Value::Str(role)) = user.get("role") else {
        tracing::debug!("user '{}' has no role; granting no capabilities", username);
        return Ok(Some(Session::new(username, "none", HashSet::new())));
    };

    let role_key = Record::from([("role_name".to_string(), Value::Str(role.clone()))]);
    let permissions = match store.get(ROLES_TABLE, &role_key).await? {
        Some(role_record) => parse_permissions(&role_record),
        None => {
            tracing::warn!("role '{}' has no record in '{}'", role, ROLES_TABLE);
            HashSet::new()
        }
    };

    Ok(Some(Session::new(username, role.clone(), permissions)))
}

/// Parse the `permissions` string field of a role record
fn parse_permissions(role_record: &Record) -> HashSet<Capability> {
    let Some(Value::Str(raw)) = role_record.get("permissions") else {
        return HashSet::new();
    };
    let mut permissions = HashSet::new();
    for token in raw.split([',', ' ']).filter(|t| !t.is_empty()) {
        match Capability::parse(token) {
            Some(capability) => {
                permissions.insert(capability);
            }
            None => tracing::warn!("ignoring unknown permission token '{}'", token),
        }
    }
    permissions
}
