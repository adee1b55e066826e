//! Seed document loading.
//!
//! The board starts from a JSON document with a `tasks` array and a `users`
//! collection (either an array of records or an object keyed by user id).

use std::path::Path;

use domain_users::UserDirectory;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::{TaskError, TaskResult};
use crate::memory::{InMemoryTaskRepository, ensure_unique};
use crate::models::Task;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "no_users")]
    pub users: Value,
}

fn no_users() -> Value {
    Value::Array(Vec::new())
}

impl SeedDocument {
    /// Parse and check a seed document.
    ///
    /// # Errors
    ///
    /// `Serialization` for malformed JSON or task records, `Validation` for
    /// duplicate task ids and `Users` for an unsupported user collection.
    pub fn from_json_str(raw: &str) -> TaskResult<Self> {
        let document: SeedDocument = serde_json::from_str(raw)?;
        ensure_unique(&document.tasks)?;
        document.directory()?;
        Ok(document)
    }

    /// Read a seed document from disk.
    #[instrument]
    pub async fn load(path: &Path) -> TaskResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TaskError::Storage(format!("{}: {}", path.display(), e)))?;
        let document = Self::from_json_str(&raw)?;
        info!(tasks = document.tasks.len(), "Seed document loaded");
        Ok(document)
    }

    /// Normalized assignee lookup
    pub fn directory(&self) -> TaskResult<UserDirectory> {
        Ok(UserDirectory::from_json(&self.users)?)
    }

    /// Split into a preloaded store and the user directory.
    pub fn into_parts(self) -> TaskResult<(InMemoryTaskRepository, UserDirectory)> {
        let directory = self.directory()?;
        let repository = InMemoryTaskRepository::from_tasks(self.tasks)?;
        Ok((repository, directory))
    }
}
