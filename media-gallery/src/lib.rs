//! # Media Gallery
//!
//! Image ingestion and retrieval library.
//!
//! This crate provides the media pipeline of the photo share service:
//! - Decoding and re-encoding of uploaded images (JPEG, PNG, GIF)
//! - Type and size validation
//! - Thumbnail generation (Lanczos3, width-bounded)
//! - Append-only dual writes of original and thumbnail
//! - Media records kept in a pluggable metadata store (SQLite or in-memory)
//! - Paged listing, random sampling and directory reconciliation
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use media_gallery::{GalleryConfig, IngestService, MediaQuery, SqliteMediaStore, UploadPart};
//!
//! let config = GalleryConfig::default();
//! let store = Arc::new(SqliteMediaStore::open("./data/photoshare.db")?);
//!
//! let ingest = IngestService::new(config.clone(), store.clone())?;
//! let report = ingest.ingest_upload(vec![UploadPart::new("file", "cat.png", bytes)]).await;
//!
//! let query = MediaQuery::new(store, "https://127.0.0.1:8080", config.page_size);
//! let page = query.list_page(0).await?;
//! ```

pub mod codec;
pub mod error;
pub mod ingest;
pub mod models;
pub mod query;
pub mod schema;
pub mod storage;
pub mod store;
pub mod thumbnail;
pub mod validation;

pub use codec::{decode, encode, DecodedImage, FormatTag};
pub use error::{
    CodecError, IngestError, QueryError, SizeRejection, StorageError, StoreError, ValidationError,
};
pub use ingest::{IngestFailure, IngestReport, IngestService, ReconcileReport, UploadPart};
pub use models::{GalleryConfig, MediaFilter, MediaRecord, MediaResponse};
pub use query::{MediaQuery, MediaRequest};
pub use schema::init_media_schema;
pub use storage::{StorageWriter, StoredPair};
pub use store::{InsertOutcome, MediaStore, MemoryMediaStore, SqliteMediaStore};
pub use thumbnail::create_thumbnail;
pub use validation::Validator;
