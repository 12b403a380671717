//! # Upload Request Body
//!
//! Corpo JSON inviato con `videos.insert` (`part=snippet,status`).
//!
//! ## Regole:
//! - `privacyStatus = "public"` quando la pubblicazione è immediata
//! - altrimenti `"private"` con `publishAt` in UTC (`2024-03-01T09:00:00Z`)
//! - `selfDeclaredMadeForKids` sempre `false`
//! - tag già ridotti al budget cumulativo

use crate::config::Config;
use crate::metadata::VideoMetadata;
use crate::schedule::PublishSlot;
use crate::tags::trim_tags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub default_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub privacy_status: String,
    pub self_declared_made_for_kids: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<String>,
}

/// Request body of a resumable `videos.insert`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequestBody {
    pub snippet: Snippet,
    pub status: Status,
}

impl UploadRequestBody {
    pub fn build(metadata: &VideoMetadata, slot: &PublishSlot, config: &Config) -> Self {
        let privacy_status = if slot.is_immediate() { "public" } else { "private" };

        Self {
            snippet: Snippet {
                title: metadata.title.clone(),
                description: metadata.description.clone(),
                tags: trim_tags(&metadata.tags, config.tag_budget),
                category_id: config.category_id.clone(),
                default_language: config.default_language.clone(),
            },
            status: Status {
                privacy_status: privacy_status.to_string(),
                self_declared_made_for_kids: false,
                publish_at: slot.publish_at(),
            },
        }
    }
}
