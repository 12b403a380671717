//! # Video Metadata Module
//!
//! Lettura di `metadata.json` accanto al video.
//!
//! ## Formato:
//! ```json
//! {
//!   "title": "Robot che impara a camminare",
//!   "description": "…",
//!   "tags": ["ai", "ml", "robotics"]
//! }
//! ```
//!
//! Tutti i campi sono opzionali: `title` ricade sul nome del file video,
//! `description` su stringa vuota, `tags` su lista vuota. L'ordine dei tag
//! è significativo perché decide quali tag sopravvivono al budget.

use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Name of the metadata file expected in every video folder
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Metadata of one video, defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Parse metadata JSON; `video` provides the fallback title
    pub fn from_json(content: &str, video: &Path) -> Result<Self, UploadError> {
        let raw: RawMetadata = serde_json::from_str(content)?;
        let title = raw
            .title
            .unwrap_or_else(|| video.file_stem().unwrap_or_default().to_string_lossy().to_string());

        Ok(Self {
            title,
            description: raw.description.unwrap_or_default(),
            tags: raw.tags,
        })
    }

    pub async fn load(path: &Path, video: &Path) -> Result<Self, UploadError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content, video)
    }
}
