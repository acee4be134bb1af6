use crate::config::AppConfig;
use crate::error::AppError;
use media_gallery::{
    IngestError, IngestService, MediaQuery, MediaRequest, MediaResponse, MediaStore, UploadPart,
};
use serde::Serialize;
use std::sync::Arc;

/// A file of an upload batch that was not ingested
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectedFile {
    pub file: String,
    pub description: String,
}

/// Response body of an upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub media: Vec<MediaResponse>,
    pub rejected: Vec<RejectedFile>,
}

/// Response body of a directory refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub response: String,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Response body of a listing request: a page or a single random media
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MediaPayload {
    Page(Vec<MediaResponse>),
    Single(MediaResponse),
}

/// Media endpoints wired against one store and one configuration
pub struct MediaService {
    ingest: IngestService,
    query: MediaQuery,
}

impl MediaService {
    pub fn new(config: &AppConfig, store: Arc<dyn MediaStore>) -> Result<Self, AppError> {
        let ingest = IngestService::new(config.gallery.clone(), store.clone())
            .map_err(|e| AppError::Config(format!("Invalid accepted_types pattern: {}", e)))?;
        let query = MediaQuery::new(
            store,
            config.server.external_base(),
            config.gallery.page_size,
        );
        Ok(Self { ingest, query })
    }

    /// Ingests the file parts of an upload
    pub async fn upload(&self, parts: Vec<UploadPart>) -> Result<UploadResponse, AppError> {
        if parts.is_empty() {
            return Err(AppError::Upload(IngestError::Other(
                "No file in upload".to_string(),
            )));
        }

        let report = self.ingest.ingest_upload(parts).await;
        let base = self.query.external_base();

        Ok(UploadResponse {
            media: report
                .ingested
                .iter()
                .map(|record| record.to_response(base))
                .collect(),
            rejected: report
                .failures
                .iter()
                .map(|failure| RejectedFile {
                    file: failure.file_name.clone(),
                    description: failure.error.to_string(),
                })
                .collect(),
        })
    }

    /// Serves the listing path segment: a page number, `random`, or nothing for page 0
    pub async fn get_media(&self, segment: Option<&str>) -> Result<MediaPayload, AppError> {
        let request =
            MediaRequest::parse(segment).map_err(|e| AppError::BadRequest(e.to_string()))?;

        match request {
            MediaRequest::Page(page) => self
                .query
                .list_page(page)
                .await
                .map(MediaPayload::Page)
                .map_err(AppError::Listing),
            MediaRequest::Random => self
                .query
                .random_media()
                .await
                .map(MediaPayload::Single)
                .map_err(AppError::Random),
        }
    }

    /// Imports files already present in the storage directory
    pub async fn refresh(&self) -> Result<RefreshResponse, AppError> {
        let report = self
            .ingest
            .reconcile_directory()
            .await
            .map_err(AppError::Reconcile)?;

        Ok(RefreshResponse {
            response: "Ok".to_string(),
            inserted: report.inserted.len(),
            skipped: report.skipped.len(),
            failed: report.failures.len(),
        })
    }
}

/// Renders a result as a JSON body; errors become the title/description/code triple
pub fn render<T: Serialize>(result: Result<T, AppError>) -> String {
    let body = match result {
        Ok(payload) => serde_json::to_string_pretty(&payload),
        Err(e) => {
            log::warn!("{}", e);
            serde_json::to_string_pretty(&e.to_response())
        }
    };

    body.unwrap_or_else(|e| {
        log::error!("Could not serialize response: {}", e);
        r#"{"title":"Error","description":"could not serialize response","code":5}"#.to_string()
    })
}
