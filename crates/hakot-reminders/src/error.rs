use thiserror::Error;

use hakot_db::DbError;

use crate::notify::NotifyError;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("notification backend error: {0}")]
    Notify(#[from] NotifyError),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("invalid snooze: {0}")]
    InvalidSnooze(String),
}

pub type ReminderResult<T> = Result<T, ReminderError>;
