//! # Progress Tracking Module
//!
//! Unifica progress bar e output JSON in un singolo tracker per il batch.
//! L'esecuzione è sequenziale: nessuna sincronizzazione necessaria.

use crate::{
    json_output::JsonMessage,
    progress::{ProgressManager, PublishStats},
    publisher::{FolderReport, UploadOutcome},
    schedule::PublishSlot,
};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Tracks one batch, folder after folder
pub struct ProgressTracker {
    json_output: bool,
    total_folders: usize,
    stats: PublishStats,
    current: Option<(String, ProgressManager)>,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total_folders: usize, json_output: bool) -> Self {
        Self {
            json_output,
            total_folders,
            stats: PublishStats::new(),
            current: None,
            started: Instant::now(),
        }
    }

    pub fn start_batch(&self, root: &Path, mode: &str) {
        if self.json_output {
            JsonMessage::Start {
                root: root.to_path_buf(),
                total_folders: self.total_folders,
                mode: mode.to_string(),
            }
            .emit();
        }
    }

    /// Open the bar of the folder about to be uploaded
    pub fn start_folder(&mut self, folder: &str, index: usize, slot: &PublishSlot) {
        info!("Uploading {} ({}/{}, scheduled: {})", folder, index, self.total_folders, slot);

        let bar = if self.json_output {
            JsonMessage::FolderStart {
                folder: folder.to_string(),
                index,
                total: self.total_folders,
                publish_at: slot.publish_at(),
            }
            .emit();
            ProgressManager::hidden()
        } else {
            ProgressManager::new(folder)
        };
        self.current = Some((folder.to_string(), bar));
    }

    /// Gated progress of the current upload
    pub fn on_progress(&mut self, fraction: f64) {
        if let Some((folder, bar)) = &self.current {
            bar.set_fraction(fraction);
            if self.json_output {
                JsonMessage::Progress {
                    folder: folder.clone(),
                    fraction,
                }
                .emit();
            }
        }
    }

    /// Close the current folder with its report
    pub fn complete_folder(&mut self, report: &FolderReport, video_size: u64) {
        let bar = self.current.take().map(|(_, bar)| bar);

        match &report.outcome {
            UploadOutcome::Published { video_id } => {
                self.stats.add_published(video_size);
                if report.archived_to.is_some() {
                    self.stats.add_archived();
                }
                info!("✅ Upload finished: https://youtu.be/{}", video_id);
                if let Some(bar) = bar {
                    bar.finish(&format!("✅ {} → https://youtu.be/{}", report.folder, video_id));
                }
            }
            UploadOutcome::Failed { error: message } => {
                self.stats.add_failed();
                error!("✖ Failed {}: {}", report.folder, message);
                if let Some(bar) = bar {
                    bar.abandon(&format!("✖ {}: {}", report.folder, message));
                }
            }
        }

        if self.json_output {
            JsonMessage::FolderComplete {
                folder: report.folder.clone(),
                video_id: report.outcome.video_id().map(str::to_string),
                archived_to: report.archived_to.clone(),
                error: report.outcome.error().map(str::to_string),
            }
            .emit();
        }
    }

    /// Final summary; returns the batch statistics
    pub fn finish(self) -> PublishStats {
        if self.json_output {
            JsonMessage::complete(&self.stats, self.started.elapsed().as_secs_f64()).emit();
        } else {
            info!("{}", self.stats.format_summary());
        }
        self.stats
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }
}
