//! Ingestion of uploaded files and reconciliation of the storage directory.
//!
//! Uploads run size check, decode, type check, thumbnail, encode, dual write
//! and record creation per file. Each file fails on its own; the rest of the
//! batch continues. Reconciliation imports files already present under the
//! storage root without touching their bytes.

use crate::codec::{decode, encode_to_vec, FormatTag};
use crate::error::{IngestError, StoreError};
use crate::models::{GalleryConfig, MediaFilter, MediaRecord};
use crate::storage::StorageWriter;
use crate::store::MediaStore;
use crate::thumbnail::create_thumbnail;
use crate::validation::Validator;
use image::ImageFormat;
use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// One file part of a multipart upload, already read from the request
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub form_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadPart {
    pub fn new(form_name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            form_name: form_name.into(),
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// A file that could not be ingested
#[derive(Debug)]
pub struct IngestFailure {
    pub file_name: String,
    pub error: IngestError,
}

/// Outcome of an upload batch
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<MediaRecord>,
    pub failures: Vec<IngestFailure>,
}

/// Outcome of a directory reconciliation run
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<IngestFailure>,
}

/// Ingestion orchestrator
pub struct IngestService {
    config: GalleryConfig,
    validator: Validator,
    writer: StorageWriter,
    store: Arc<dyn MediaStore>,
}

impl IngestService {
    pub fn new(config: GalleryConfig, store: Arc<dyn MediaStore>) -> Result<Self, regex::Error> {
        let validator = Validator::from_config(&config)?;
        let writer = StorageWriter::new(&config.storage_root, config.thumbnail_dir.clone());
        Ok(Self {
            config,
            validator,
            writer,
            store,
        })
    }

    /// Ingests every file part of an upload.
    ///
    /// Parts without a form name or file name are ignored. Failures are
    /// collected per file and never abort the batch.
    pub async fn ingest_upload(&self, parts: Vec<UploadPart>) -> IngestReport {
        let mut report = IngestReport::default();
        let mut taken = HashSet::new();
        let mut processed = Vec::new();

        for part in parts {
            if part.form_name.is_empty() || part.file_name.is_empty() {
                log::debug!("Skipping non-file part {:?}", part.form_name);
                continue;
            }

            let file_name = decode_file_name(&part.file_name);
            let result = match sanitize_file_name(&file_name) {
                Some(base) => {
                    let name = ingest_name(chrono::Utc::now(), &base, &mut taken);
                    self.process(name, part.bytes).await
                }
                None => Err(IngestError::Other(format!("Invalid file name {:?}", file_name))),
            };

            match result {
                Ok(record) => processed.push(record),
                Err(error) => {
                    log::warn!("Error handling file {}: {}", file_name, error);
                    report.failures.push(IngestFailure { file_name, error });
                }
            }
        }

        if processed.is_empty() {
            return report;
        }

        let store = self.store.clone();
        let records = processed.clone();
        let outcomes = match tokio::task::spawn_blocking(move || store.insert(&records)).await {
            Ok(outcomes) => outcomes,
            Err(e) => processed
                .iter()
                .map(|_| Err(StoreError::Other(format!("Task join error: {}", e))))
                .collect(),
        };

        for (record, outcome) in processed.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    log::info!("Ingested {} ({:?})", record.name, record.mime_type);
                    report.ingested.push(record);
                }
                Err(e) => {
                    log::error!(
                        "{} is stored under {} but no record was created: {}",
                        record.name,
                        record.storage_path,
                        e
                    );
                    report.failures.push(IngestFailure {
                        file_name: record.name,
                        error: IngestError::Store(e),
                    });
                }
            }
        }

        report
    }

    /// Ingests a single file and records it
    pub async fn ingest_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaRecord, IngestError> {
        let mut report = self
            .ingest_upload(vec![UploadPart::new("file", file_name, bytes)])
            .await;

        if let Some(failure) = report.failures.pop() {
            return Err(failure.error);
        }
        report
            .ingested
            .pop()
            .ok_or_else(|| IngestError::Other(format!("Nothing ingested for {}", file_name)))
    }

    /// Runs the CPU-bound stages and both writes off the async runtime
    async fn process(&self, name: String, bytes: Vec<u8>) -> Result<MediaRecord, IngestError> {
        let validator = self.validator.clone();
        let writer = self.writer.clone();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            process_upload(&validator, &writer, &config, name, &bytes)
        })
        .await?
    }

    /// Imports files found directly under the storage root.
    ///
    /// Files already known by name are skipped, so repeated runs over an
    /// unchanged directory insert nothing. Thumbnails are assumed to exist.
    pub async fn reconcile_directory(&self) -> Result<ReconcileReport, IngestError> {
        let store = self.store.clone();
        let validator = self.validator.clone();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || reconcile(store.as_ref(), &validator, &config)).await?
    }
}

fn process_upload(
    validator: &Validator,
    writer: &StorageWriter,
    config: &GalleryConfig,
    name: String,
    bytes: &[u8],
) -> Result<MediaRecord, IngestError> {
    log::debug!("Processing {} ({} bytes)", name, bytes.len());

    // Oversized payloads are rejected before decoding
    let size = bytes.len() as u64;
    validator.validate_size(size)?;
    let decoded = decode(bytes)?;
    validator.validate_type(decoded.format.as_str())?;

    let thumbnail = create_thumbnail(
        &decoded.image,
        config.thumbnail_max_width,
        config.thumbnail_max_height,
    );

    // Encode both before touching the disk
    let original_bytes = encode_to_vec(&decoded.image, &decoded.format)?;
    let thumbnail_bytes = encode_to_vec(&thumbnail, &decoded.format)?;

    let pair = writer.write_pair(&original_bytes, &thumbnail_bytes, &name)?;
    log::debug!("Stored {:?} and {:?}", pair.original, pair.thumbnail);

    Ok(MediaRecord::new(name, config)
        .with_mime_type(decoded.format.as_str())
        .with_size(size))
}

fn reconcile(
    store: &dyn MediaStore,
    validator: &Validator,
    config: &GalleryConfig,
) -> Result<ReconcileReport, IngestError> {
    let mut report = ReconcileReport::default();
    let root = Path::new(&config.storage_root);

    if !root.exists() {
        log::info!("Storage root {:?} does not exist, nothing to reconcile", root);
        return Ok(report);
    }

    let mut entries: Vec<_> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                let file_name = raw.to_string_lossy().to_string();
                log::warn!("Skipping non UTF-8 file name {}", file_name);
                report.failures.push(IngestFailure {
                    error: IngestError::Other("File name is not valid UTF-8".to_string()),
                    file_name,
                });
                continue;
            }
        };

        match store.find_one(&MediaFilter::Name(name.clone())) {
            Ok(Some(_)) => {
                log::debug!("{} already imported", name);
                report.skipped.push(name);
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Lookup of {} failed: {}", name, e);
                report.failures.push(IngestFailure {
                    file_name: name,
                    error: IngestError::Store(e),
                });
                continue;
            }
        }

        let record = existing_record(validator, config, &entry, name.clone());

        match store.insert_one(&record) {
            Ok(()) => {
                log::debug!("Imported {}", name);
                report.inserted.push(name);
            }
            // Lost a race against a concurrent run
            Err(StoreError::Duplicate(_)) => report.skipped.push(name),
            Err(e) => {
                log::warn!("Could not import {}: {}", name, e);
                report.failures.push(IngestFailure {
                    file_name: name,
                    error: IngestError::Store(e),
                });
            }
        }
    }

    log::info!(
        "Reconciled {:?}: {} inserted, {} skipped, {} failed",
        root,
        report.inserted.len(),
        report.skipped.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Record for a file already on disk; type and size are kept only when they pass the validator
fn existing_record(
    validator: &Validator,
    config: &GalleryConfig,
    entry: &std::fs::DirEntry,
    name: String,
) -> MediaRecord {
    let mut record = MediaRecord::new(name, config);

    if let Ok(format) = ImageFormat::from_path(entry.path()) {
        let tag = FormatTag::from_format(format);
        match validator.validate_type(tag.as_str()) {
            Ok(()) => record = record.with_mime_type(tag.as_str()),
            Err(e) => log::warn!("{}: {}", record.name, e),
        }
    }
    if let Ok(metadata) = entry.metadata() {
        match validator.validate_size(metadata.len()) {
            Ok(()) => record = record.with_size(metadata.len()),
            Err(e) => log::warn!("{}: {}", record.name, e),
        }
    }

    record
}

/// Percent-decodes an uploaded file name ('+' is a space), keeping the raw name if it is not UTF-8
fn decode_file_name(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match percent_decode_str(&plus_decoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Final path component of a client-supplied name
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(|c| c == '/' || c == '\\').next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        None
    } else {
        Some(base.to_string())
    }
}

/// `<timestamp>_<file_name>`, bumping the timestamp until it is unused in this batch
fn ingest_name(
    now: chrono::DateTime<chrono::Utc>,
    file_name: &str,
    taken: &mut HashSet<String>,
) -> String {
    let mut stamp = now.timestamp() as i128 * 1_000_000_000 + now.timestamp_subsec_nanos() as i128;
    loop {
        let name = format!("{}_{}", stamp, file_name);
        if taken.insert(name.clone()) {
            return name;
        }
        stamp += 1;
    }
}
