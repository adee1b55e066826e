use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// User roles
///
/// Roles are tagging only; nothing in the board enforces them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    #[default]
    #[serde(alias = "user")]
    #[strum(to_string = "standard", serialize = "user")]
    Standard,
}

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (assignee ids on tasks refer to this)
    pub id: String,
    /// Display name
    pub name: String,
    /// Role tag
    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
