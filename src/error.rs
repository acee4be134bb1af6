use media_gallery::{IngestError, QueryError, StoreError};
use serde::Serialize;
use std::fmt;

/// Central error types for the photo share service
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Configuration could not be loaded
    Config(String),
    /// Upload could not be processed
    Upload(IngestError),
    /// Listing failed
    Listing(QueryError),
    /// Random selection failed
    Random(QueryError),
    /// Directory reconciliation failed
    Reconcile(IngestError),
    /// Malformed request (e.g. a non-numeric page)
    BadRequest(String),
}

/// Structured error body returned to callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub title: String,
    pub description: String,
    pub code: u32,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Upload(e) => write!(f, "Upload error: {}", e),
            AppError::Listing(e) => write!(f, "Listing error: {}", e),
            AppError::Random(e) => write!(f, "Random media error: {}", e),
            AppError::Reconcile(e) => write!(f, "Reconcile error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => AppError::Database(e),
            other => AppError::Config(format!("Could not open media store: {}", other)),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl AppError {
    pub fn code(&self) -> u32 {
        match self {
            AppError::Upload(_) => 0,
            AppError::Random(_) => 1,
            AppError::Listing(_) => 2,
            AppError::BadRequest(_) => 3,
            AppError::Reconcile(_) => 4,
            AppError::Config(_) | AppError::Database(_) | AppError::Filesystem(_) => 5,
        }
    }

    /// Title/description/code triple for the response body
    pub fn to_response(&self) -> ErrorResponse {
        let (title, description) = match self {
            AppError::Upload(_) => ("Error Upload", "Didn't Upload".to_string()),
            AppError::Random(QueryError::Store(StoreError::Empty)) => {
                ("Error random Image", "no image stored yet".to_string())
            }
            AppError::Random(_) => (
                "Error random Image",
                "error while retrieve a random image".to_string(),
            ),
            AppError::Listing(_) => ("Error listing", "error while retrieve images".to_string()),
            AppError::BadRequest(msg) => ("Bad request", msg.clone()),
            AppError::Reconcile(_) => ("Error update", "error while importing images".to_string()),
            AppError::Config(msg) => ("Configuration", msg.clone()),
            AppError::Database(_) => ("Database", "a database error occurred".to_string()),
            AppError::Filesystem(_) => ("Filesystem", "error accessing files".to_string()),
        };

        ErrorResponse {
            title: title.to_string(),
            description,
            code: self.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_triple() {
        let err = AppError::Random(QueryError::Store(StoreError::Empty));
        let body = serde_json::to_value(err.to_response()).unwrap();

        assert_eq!(body["title"], "Error random Image");
        assert_eq!(body["code"], 1);
        assert!(body["description"].is_string());
    }

    #[test]
    fn test_bad_page_is_caller_error() {
        let err = AppError::BadRequest("Invalid page: abc".into());
        assert_eq!(err.code(), 3);
        assert_eq!(err.to_response().description, "Invalid page: abc");
    }
}
