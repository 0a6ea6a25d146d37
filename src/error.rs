use thiserror::Error;

/// Failures of the relational store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("user with platform id {0} already exists")]
    DuplicateUser(i64),

    #[error("stored row {id} is invalid: {reason}")]
    InvalidRow { id: i64, reason: String },

    #[error("user {user_id} has a transaction with an unreadable date")]
    UnreadableDate { user_id: i64 },
}

/// Transport and shape failures talking to the extraction service.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gemini api error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("gemini returned no text candidate")]
    EmptyResponse,

    #[error("malformed json reply: {0}")]
    Json(#[from] serde_json::Error),
}

/// Transport failures talking to the chat platform.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("telegram reply missing {0}")]
    MissingField(&'static str),
}
