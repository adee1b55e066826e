//! Shared test utilities for domain testing
//!
//! - `TestDataBuilder`: deterministic ids, names and dates
//! - `assertions`: custom assertion helpers
//! - `init_test_tracing`: opt-in log output for a test run
//!
//! # Usage
//!
//! ```rust
//! use test_utils::TestDataBuilder;
//!
//! let builder = TestDataBuilder::from_test_name("my_test");
//!
//! let task_id = builder.task_id("main");
//! let owner = builder.user_id("owner");
//! assert_ne!(task_id, owner);
//! ```

use chrono::{Days, NaiveDate};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic UUID derived from the seed
    pub fn uuid(&self) -> Uuid {
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&bytes);
        Uuid::from_bytes(uuid_bytes)
    }

    /// Task id unique to this builder and `suffix`
    pub fn task_id(&self, suffix: &str) -> String {
        format!("task-{}-{}", self.uuid().simple(), suffix)
    }

    /// User id unique to this builder and `suffix`
    pub fn user_id(&self, suffix: &str) -> String {
        format!("user-{}-{}", self.uuid().simple(), suffix)
    }

    /// Generate a unique name for testing
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("project", "main"), "test-project-7-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// `YYYY-MM-DD` string for `days` before `today`
    pub fn date_days_ago(&self, today: NaiveDate, days: u64) -> String {
        today
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN)
            .format("%Y-%m-%d")
            .to_string()
    }
}

/// Install a test subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Test assertion helpers
pub mod assertions {
    use std::collections::BTreeMap;

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert a tally holds exactly the expected buckets
    pub fn assert_tally(actual: &BTreeMap<String, usize>, expected: &[(&str, usize)], context: &str) {
        let expected: BTreeMap<String, usize> = expected
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect();
        assert_eq!(
            actual, &expected,
            "{}: expected tally {:?}, got {:?}",
            context, expected, actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.task_id("a"), builder2.task_id("a"));
        assert_eq!(
            builder1.name("project", "test"),
            builder2.name("project", "test")
        );
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.user_id("u"), builder2.user_id("u"));
    }

    #[test]
    fn test_date_days_ago() {
        let builder = TestDataBuilder::new(1);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert_eq!(builder.date_days_ago(today, 0), "2025-03-01");
        assert_eq!(builder.date_days_ago(today, 1), "2025-02-28");
    }

    #[test]
    fn test_assert_tally() {
        let mut tally = std::collections::BTreeMap::new();
        tally.insert("done".to_string(), 2);

        assertions::assert_tally(&tally, &[("done", 2)], "tally");
    }
}
