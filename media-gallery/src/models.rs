use serde::{Deserialize, Serialize};

/// Metadata describing one stored asset
///
/// `storage_path` and `thumbnail_path` are directories, not file paths.
/// `url` and `thumbnail_url` are relative to the external base and are only
/// made absolute in [`MediaResponse`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRecord {
    pub name: String,
    pub storage_path: String,
    pub thumbnail_path: String,
    pub mime_type: Option<String>,
    pub url: String,
    pub thumbnail_url: String,
    pub size_bytes: Option<u64>,
}

impl MediaRecord {
    /// Builds a record for `name` using the directory and URL conventions of `config`
    pub fn new(name: impl Into<String>, config: &GalleryConfig) -> Self {
        let name = name.into();
        let url_base = config.url_base.trim_end_matches('/');
        let storage_root = config.storage_root.trim_end_matches('/');
        Self {
            storage_path: storage_root.to_string(),
            thumbnail_path: format!("{}/{}", storage_root, config.thumbnail_dir),
            mime_type: None,
            url: format!("{}/{}", url_base, name),
            thumbnail_url: format!("{}/{}/{}", url_base, config.thumbnail_dir, name),
            size_bytes: None,
            name,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Copy for the response boundary with URLs prefixed by `external_base`
    pub fn to_response(&self, external_base: &str) -> MediaResponse {
        MediaResponse {
            name: self.name.clone(),
            mimetype: self.mime_type.clone(),
            size: self.size_bytes,
            url: format!("{}{}", external_base, self.url),
            thumbnail_url: format!("{}{}", external_base, self.thumbnail_url),
        }
    }
}

/// Externally visible shape of a media record; storage paths are never exposed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaResponse {
    pub name: String,
    pub mimetype: Option<String>,
    pub size: Option<u64>,
    pub url: String,
    #[serde(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}

/// Filter understood by every metadata store backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFilter {
    All,
    Name(String),
}

impl MediaFilter {
    pub fn matches(&self, record: &MediaRecord) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Name(name) => &record.name == name,
        }
    }
}

/// Configuration of the media pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    /// Directory holding originals; thumbnails live in `thumbnail_dir` below it
    pub storage_root: String,
    /// Relative URL under which `storage_root` is served
    pub url_base: String,
    pub thumbnail_dir: String,
    pub thumbnail_max_width: u32,
    /// 0 keeps the aspect ratio
    pub thumbnail_max_height: u32,
    pub min_bytes: u64,
    pub max_bytes: u64,
    /// Regex matched against the detected format tag
    pub accepted_types: String,
    pub page_size: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            storage_root: "./static/images".to_string(),
            url_base: "/images".to_string(),
            thumbnail_dir: "thumbnail".to_string(),
            thumbnail_max_width: 200,
            thumbnail_max_height: 0,
            min_bytes: 1,
            max_bytes: 244_999_000,
            accepted_types: "^(gif|p?jpeg|(x-)?png)$".to_string(),
            page_size: 40,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_uses_conventions() {
        let record = MediaRecord::new("1700000000_cat.png", &GalleryConfig::default());
        assert_eq!(record.storage_path, "./static/images");
        assert_eq!(record.thumbnail_path, "./static/images/thumbnail");
        assert_eq!(record.url, "/images/1700000000_cat.png");
        assert_eq!(record.thumbnail_url, "/images/thumbnail/1700000000_cat.png");
        assert_eq!(record.mime_type, None);
    }

    #[test]
    fn test_response_hides_paths_and_prefixes_urls() {
        let record = MediaRecord::new("a.gif", &GalleryConfig::default())
            .with_mime_type("gif")
            .with_size(42);
        let response = record.to_response("https://127.0.0.1:8080");

        assert_eq!(response.url, "https://127.0.0.1:8080/images/a.gif");
        assert_eq!(
            response.thumbnail_url,
            "https://127.0.0.1:8080/images/thumbnail/a.gif"
        );
        // Source record stays relative
        assert_eq!(record.url, "/images/a.gif");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["mimetype"], "gif");
        assert_eq!(json["size"], 42);
        assert!(json.get("thumbnailUrl").is_some());
        assert!(json.get("storage_path").is_none());
    }

    #[test]
    fn test_filter_matches_name() {
        let record = MediaRecord::new("x.png", &GalleryConfig::default());
        assert!(MediaFilter::All.matches(&record));
        assert!(MediaFilter::Name("x.png".into()).matches(&record));
        assert!(!MediaFilter::Name("y.png".into()).matches(&record));
    }
}
