//! Users Domain
//!
//! Users only matter to the task board as assignees: the overview resolves
//! an assignee id to a display name through a [`UserDirectory`].
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ UserDirectory │  ← id → display name lookup, built once per overview
//! └───────┬───────┘
//!         │
//! ┌───────▼───────┐
//! │    Models     │  ← User, Role
//! └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use domain_users::{Role, User, UserDirectory};
//!
//! let directory = UserDirectory::from_users(vec![
//!     User::new("u1", "Alice", Role::Admin),
//! ]);
//!
//! assert_eq!(directory.display_name(Some("u1")), "Alice");
//! assert_eq!(directory.display_name(Some("ghost")), UserDirectory::UNKNOWN);
//! ```

pub mod directory;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use directory::UserDirectory;
pub use error::{UserError, UserResult};
pub use models::{Role, User};
