use std::path::PathBuf;

/// Error type for decoding and re-encoding images
#[derive(Debug)]
pub enum CodecError {
    /// Unreadable or unrecognized bytes
    Decode(String),
    /// The image could not be written in the requested format
    Encode(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Decode(msg) => write!(f, "Decode error: {}", msg),
            CodecError::Encode(msg) => write!(f, "Encode error: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

/// Which bound a payload size violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRejection {
    TooSmall,
    TooLarge,
}

/// Policy violations raised by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    TypeRejected(String),
    SizeRejected { kind: SizeRejection, size: u64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::TypeRejected(tag) => write!(f, "Filetype {} not allowed", tag),
            ValidationError::SizeRejected {
                kind: SizeRejection::TooSmall,
                size,
            } => write!(f, "File is too small ({} bytes)", size),
            ValidationError::SizeRejected {
                kind: SizeRejection::TooLarge,
                size,
            } => write!(f, "File is too big ({} bytes)", size),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from the storage writer
#[derive(Debug)]
pub enum StorageError {
    /// The original could not be fully written
    Io { path: PathBuf, source: std::io::Error },
    /// The original landed on disk but the thumbnail did not
    PartialWrite {
        written: PathBuf,
        failed: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io { path, source } => {
                write!(f, "IO error writing {}: {}", path.display(), source)
            }
            StorageError::PartialWrite {
                written,
                failed,
                source,
            } => write!(
                f,
                "Partial write: {} stored but {} failed: {}",
                written.display(),
                failed.display(),
                source
            ),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io { source, .. } | StorageError::PartialWrite { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Errors from a metadata store backend
#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    /// A record with this name already exists
    Duplicate(String),
    /// Random selection on a store without records
    Empty,
    /// Another thread panicked while holding the store
    Poisoned,
    Other(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Duplicate(name) => write!(f, "Media {} already exists", name),
            StoreError::Empty => write!(f, "No media stored"),
            StoreError::Poisoned => write!(f, "Store lock poisoned"),
            StoreError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Failure of one file inside an ingestion run
#[derive(Debug)]
pub enum IngestError {
    Codec(CodecError),
    Validation(ValidationError),
    Storage(StorageError),
    Store(StoreError),
    Io(std::io::Error),
    Other(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Codec(e) => write!(f, "{}", e),
            IngestError::Validation(e) => write!(f, "Validation error: {}", e),
            IngestError::Storage(e) => write!(f, "Storage error: {}", e),
            IngestError::Store(e) => write!(f, "Store error: {}", e),
            IngestError::Io(e) => write!(f, "IO error: {}", e),
            IngestError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<CodecError> for IngestError {
    fn from(err: CodecError) -> Self {
        IngestError::Codec(err)
    }
}

impl From<ValidationError> for IngestError {
    fn from(err: ValidationError) -> Self {
        IngestError::Validation(err)
    }
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        IngestError::Storage(err)
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        IngestError::Store(err)
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err)
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::Other(format!("Task join error: {}", err))
    }
}

/// Errors from the read side
#[derive(Debug)]
pub enum QueryError {
    /// The page token is not a number; a caller error
    InvalidPage(String),
    Store(StoreError),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidPage(token) => write!(f, "Invalid page: {}", token),
            QueryError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        QueryError::Store(err)
    }
}

impl From<tokio::task::JoinError> for QueryError {
    fn from(err: tokio::task::JoinError) -> Self {
        QueryError::Store(StoreError::Other(format!("Task join error: {}", err)))
    }
}
