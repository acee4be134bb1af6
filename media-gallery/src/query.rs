use crate::error::QueryError;
use crate::models::{MediaFilter, MediaResponse};
use crate::store::MediaStore;
use std::sync::Arc;

/// Read request derived from the listing path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRequest {
    Page(u32),
    Random,
}

impl MediaRequest {
    /// Parses an optional path segment: absent or empty is page 0,
    /// `random` selects one record, anything else must be a page number.
    pub fn parse(segment: Option<&str>) -> Result<Self, QueryError> {
        match segment.map(str::trim) {
            None | Some("") => Ok(MediaRequest::Page(0)),
            Some("random") => Ok(MediaRequest::Random),
            Some(token) => token
                .parse::<u32>()
                .map(MediaRequest::Page)
                .map_err(|_| QueryError::InvalidPage(token.to_string())),
        }
    }
}

/// Read side of the media pipeline; rewrites relative URLs against `external_base`
pub struct MediaQuery {
    store: Arc<dyn MediaStore>,
    external_base: String,
    page_size: u32,
}

impl MediaQuery {
    pub fn new(
        store: Arc<dyn MediaStore>,
        external_base: impl Into<String>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            external_base: external_base.into().trim_end_matches('/').to_string(),
            page_size,
        }
    }

    pub fn external_base(&self) -> &str {
        &self.external_base
    }

    /// Returns page `page_index` (at most `page_size` records)
    pub async fn list_page(&self, page_index: u32) -> Result<Vec<MediaResponse>, QueryError> {
        let store = self.store.clone();
        let limit = self.page_size;
        let offset = page_index as u64 * limit as u64;

        let records = tokio::task::spawn_blocking(move || {
            store.find_page(&MediaFilter::All, limit, offset)
        })
        .await??;

        log::debug!("Page {} returned {} media", page_index, records.len());
        Ok(records
            .iter()
            .map(|record| record.to_response(&self.external_base))
            .collect())
    }

    /// Returns one record picked at random
    pub async fn random_media(&self) -> Result<MediaResponse, QueryError> {
        let store = self.store.clone();
        let record = tokio::task::spawn_blocking(move || store.random_one()).await??;
        Ok(record.to_response(&self.external_base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{GalleryConfig, MediaRecord};
    use crate::store::{MemoryMediaStore, SqliteMediaStore};
    use std::collections::HashSet;

    const BASE: &str = "https://127.0.0.1:8080";

    fn seeded(count: usize) -> Arc<SqliteMediaStore> {
        let store = Arc::new(SqliteMediaStore::open_in_memory().unwrap());
        let config = GalleryConfig::default();
        let records: Vec<_> = (0..count)
            .map(|i| MediaRecord::new(format!("{:03}.png", i), &config).with_mime_type("png"))
            .collect();
        assert!(store.insert(&records).iter().all(|o| o.is_ok()));
        store
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(MediaRequest::parse(None).unwrap(), MediaRequest::Page(0));
        assert_eq!(MediaRequest::parse(Some("")).unwrap(), MediaRequest::Page(0));
        assert_eq!(MediaRequest::parse(Some("3")).unwrap(), MediaRequest::Page(3));
        assert_eq!(
            MediaRequest::parse(Some("random")).unwrap(),
            MediaRequest::Random
        );
        assert!(matches!(
            MediaRequest::parse(Some("abc")),
            Err(QueryError::InvalidPage(t)) if t == "abc"
        ));
        assert!(MediaRequest::parse(Some("-1")).is_err());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let store = seeded(50);
        let query = MediaQuery::new(store, BASE, 40);

        let first = query.list_page(0).await.unwrap();
        let second = query.list_page(1).await.unwrap();
        let third = query.list_page(2).await.unwrap();

        assert_eq!(first.len(), 40);
        assert_eq!(second.len(), 10);
        assert!(third.is_empty());

        let names: HashSet<_> = first.iter().chain(second.iter()).map(|m| &m.name).collect();
        assert_eq!(names.len(), 50);

        for media in first.iter().chain(second.iter()) {
            assert!(media.url.starts_with(BASE));
            assert!(media.thumbnail_url.starts_with(BASE));
        }
        assert_eq!(first[0].url, format!("{}/images/000.png", BASE));
    }

    #[tokio::test]
    async fn test_rewrite_does_not_touch_store() {
        let store = seeded(1);
        let query = MediaQuery::new(store.clone(), format!("{}/", BASE), 40);

        let page = query.list_page(0).await.unwrap();
        assert_eq!(page[0].thumbnail_url, format!("{}/images/thumbnail/000.png", BASE));

        let stored = store.find_page(&MediaFilter::All, 1, 0).unwrap();
        assert_eq!(stored[0].url, "/images/000.png");
    }

    #[tokio::test]
    async fn test_random_media() {
        let query = MediaQuery::new(seeded(3), BASE, 40);
        let media = query.random_media().await.unwrap();
        assert!(media.url.starts_with(BASE));
    }

    #[tokio::test]
    async fn test_random_on_empty_store_is_an_error() {
        let query = MediaQuery::new(Arc::new(MemoryMediaStore::new()), BASE, 40);
        let result = query.random_media().await;
        assert!(matches!(result, Err(QueryError::Store(StoreError::Empty))));
    }
}
