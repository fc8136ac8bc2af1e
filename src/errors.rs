// errors.rs
use astra::Response;
use thiserror::Error;

/// Errors originating from either the serving logic
/// (routing, missing resources, etc.) or downstream layers (DB, filesystem).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Serialization Error: {0}")]
    Serialize(String),
    #[error("Internal Server Error")]
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            _ => 500,
        }
    }
}
