//! Document loading from files, directories, and URLs.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use ragkit_core::{Error, Result};

use crate::document::Document;

/// Where an ingestion request points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    File,
    Directory,
    Url,
}

/// File extensions the loader reads as plain text.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "py", "js", "rs", "html", "json", "csv"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reads raw text plus source metadata from files, directories, or URLs.
///
/// Every loaded document gets a fresh UUID id and `source` /
/// `source_type` metadata; file sources also get `file_name`.
pub struct DocumentLoader {
    http: reqwest::Client,
}

impl DocumentLoader {
    /// Create a loader whose HTTP fetches use the given timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Load documents from the given location.
    pub async fn load(&self, location: &str, source_type: SourceType) -> Result<Vec<Document>> {
        match source_type {
            SourceType::File => Ok(vec![self.load_file(Path::new(location)).await?]),
            SourceType::Directory => self.load_directory(Path::new(location)).await,
            SourceType::Url => Ok(vec![self.load_url(location).await?]),
        }
    }

    async fn load_file(&self, path: &Path) -> Result<Document> {
        if !is_supported(path) {
            return Err(Error::Configuration(format!(
                "unsupported file type: '{}'",
                path.display()
            )));
        }

        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found("file", path.display().to_string())
            } else {
                Error::retrieval(format!("failed to read '{}'", path.display()), e)
            }
        })?;

        let file_name =
            path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let metadata = HashMap::from([
            ("source".to_string(), path.display().to_string()),
            ("source_type".to_string(), "file".to_string()),
            ("file_name".to_string(), file_name),
        ]);

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            text,
            metadata,
            source_uri: Some(path.display().to_string()),
        })
    }

    async fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        if !dir.is_dir() {
            return Err(Error::not_found("directory", dir.display().to_string()));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_supported(entry.path()) {
                continue;
            }
            // One unreadable file does not abort the batch.
            match self.load_file(entry.path()).await {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "skipping file");
                }
            }
        }

        info!(directory = %dir.display(), count = documents.len(), "loaded directory");
        Ok(documents)
    }

    async fn load_url(&self, url: &str) -> Result<Document> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("failed to fetch '{url}'"), e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found("url", url));
        }
        if !status.is_success() {
            return Err(Error::Retrieval {
                message: format!("fetching '{url}' returned {status}"),
                source: None,
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));

        let body = response
            .text()
            .await
            .map_err(|e| Error::retrieval(format!("failed to read body of '{url}'"), e))?;
        let text = if is_html || body.trim_start().starts_with("<!DOCTYPE")
            || body.trim_start().starts_with("<html")
        {
            html_text(&body)
        } else {
            body
        };

        let metadata = HashMap::from([
            ("source".to_string(), url.to_string()),
            ("source_type".to_string(), "url".to_string()),
        ]);

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            text,
            metadata,
            source_uri: Some(url.to_string()),
        })
    }
}

/// Collapse an HTML page to its visible text.
fn html_text(html: &str) -> String {
    let page = Html::parse_document(html);
    let words: Vec<&str> =
        page.root_element().text().flat_map(|node| node.split_whitespace()).collect();
    words.join(" ")
}
