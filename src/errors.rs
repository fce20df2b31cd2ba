use thiserror::Error;

/// Closed error taxonomy for the core. Nothing here maps to a status code —
/// there is no HTTP surface in this crate. Most variants are caught and
/// logged at the call site that produced them; only `AppError::Db` and
/// `AppError::SchedulerError` are allowed to abort a job outright.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Db(sqlx::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("rate limited by external provider")]
    RateLimited,

    #[error("external error: {0}")]
    External(String),

    #[error("scheduler error: {0}")]
    SchedulerError(String),

    #[error("deadline exceeded")]
    Deadline,
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
