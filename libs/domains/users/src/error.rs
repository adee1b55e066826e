use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Unsupported user collection shape: {0}")]
    UnsupportedShape(String),

    #[error("Invalid user record at {location}: {reason}")]
    InvalidRecord { location: String, reason: String },
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    pub(crate) fn invalid_record(location: impl Into<String>, reason: impl Into<String>) -> Self {
        UserError::InvalidRecord {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
