//! # Publisher Module
//!
//! Modulo che separa le responsabilità della pubblicazione in sottomoduli:
//! - `batch_publisher`: Orchestratore del batch, una cartella alla volta
//! - `folder_task`: Upload di una singola cartella
//! - `progress_tracker`: Gestione progress unificata (barra o JSON)

pub mod batch_publisher;
pub mod folder_task;
pub mod progress_tracker;

pub use batch_publisher::BatchPublisher;
pub use folder_task::{FolderTask, TransportFactory, YouTubeTransportFactory};
pub use progress_tracker::ProgressTracker;

use crate::schedule::PublishSlot;
use std::path::PathBuf;

/// Terminal result of one folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Published { video_id: String },
    Failed { error: String },
}

impl UploadOutcome {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            UploadOutcome::Published { video_id } => Some(video_id),
            UploadOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadOutcome::Published { .. } => None,
            UploadOutcome::Failed { error } => Some(error),
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, UploadOutcome::Published { .. })
    }
}

/// What happened to one folder of the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: String,
    pub slot: PublishSlot,
    pub outcome: UploadOutcome,
    /// Set when the folder was moved to the archive directory
    pub archived_to: Option<PathBuf>,
}
