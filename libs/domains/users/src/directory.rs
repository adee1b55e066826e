//! Assignee lookup used by the project overview.
//!
//! The overview accepts exactly one representation: a [`UserDirectory`].
//! Callers holding users in another shape convert at this boundary:
//! - typed records: [`UserDirectory::from_users`]
//! - raw JSON (an array of records, or an object keyed by user id):
//!   [`UserDirectory::from_json`]

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Normalized id → display name lookup.
///
/// When the same id appears more than once, the last record wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    /// Bucket name for assignees that are absent or not in the directory.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from typed user records.
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let mut directory = Self::new();
        for user in users {
            directory.insert(user.id, user.name);
        }
        directory
    }

    /// Build from a raw JSON user collection.
    ///
    /// Accepted shapes:
    /// - an array of objects, each with an `id` and optional `name`
    /// - an object mapping user id to such an object (a record without `id`
    ///   takes the key)
    ///
    /// A record without `name` uses its id as the display name. Anything else
    /// is rejected instead of silently producing an empty lookup.
    pub fn from_json(value: &Value) -> UserResult<Self> {
        let mut directory = Self::new();

        match value {
            Value::Array(records) => {
                for (index, record) in records.iter().enumerate() {
                    let (id, name) = parse_record(record, None, &format!("[{}]", index))?;
                    directory.insert(id, name);
                }
            }
            Value::Object(map) => {
                for (key, record) in map {
                    let (id, name) = parse_record(record, Some(key), &format!("[{:?}]", key))?;
                    directory.insert(id, name);
                }
            }
            other => {
                return Err(UserError::UnsupportedShape(format!(
                    "expected an array or an object of user records, got {}",
                    json_kind(other)
                )));
            }
        }

        Ok(directory)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        if let Some(previous) = self.names.insert(id.clone(), name) {
            debug!(user_id = %id, previous = %previous, "Duplicate user id, last record wins");
        }
    }

    /// Display name for a known id.
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Display name for an assignee, or [`Self::UNKNOWN`].
    pub fn display_name(&self, assignee: Option<&str>) -> &str {
        assignee
            .and_then(|id| self.resolve(id))
            .unwrap_or(Self::UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<User> for UserDirectory {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self::from_users(iter)
    }
}

fn parse_record(
    record: &Value,
    key: Option<&String>,
    location: &str,
) -> UserResult<(String, String)> {
    let Value::Object(fields) = record else {
        return Err(UserError::UnsupportedShape(format!(
            "user record {} must be an object, got {}",
            location,
            json_kind(record)
        )));
    };

    let id = match (fields.get("id"), key) {
        (Some(Value::String(id)), _) => id.clone(),
        (Some(Value::Number(id)), _) => id.to_string(),
        (Some(other), _) => {
            return Err(UserError::invalid_record(
                location,
                format!("`id` must be a string or number, got {}", json_kind(other)),
            ));
        }
        (None, Some(key)) => key.clone(),
        (None, None) => return Err(UserError::invalid_record(location, "missing `id`")),
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) => name.clone(),
        None | Some(Value::Null) => id.clone(),
        Some(other) => {
            return Err(UserError::invalid_record(
                location,
                format!("`name` must be a string, got {}", json_kind(other)),
            ));
        }
    };

    Ok((id, name))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
