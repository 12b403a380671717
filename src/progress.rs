//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di pubblicazione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per l'upload in corso
//! - Tracking statistiche del batch (cartelle pubblicate, fallite, archiviate)
//! - Report finale con statistiche aggregate
//!
//! ## Componenti principali:
//! - `ProgressManager`: Barra percentuale di un singolo upload
//! - `PublishStats`: Traccia statistiche cumulative del batch
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [████████████████████░░░░░░░░░░░░░░░░░░░░] 50% robot-walk
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let progress = ProgressManager::new("robot-walk");
//! progress.set_fraction(0.25);
//! progress.finish("✅ https://youtu.be/abc123");
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Resolution of the upload bar
const BAR_LENGTH: u64 = 1000;

/// Manages the progress bar of one upload
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress bar for one upload
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(BAR_LENGTH);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A bar that draws nothing, for JSON mode
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Move the bar to `fraction` of the file
    pub fn set_fraction(&self, fraction: f64) {
        self.bar.set_position((fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64);
    }

    /// Set a custom message
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Fill the bar and finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.set_position(BAR_LENGTH);
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop the bar where it is
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Statistics tracker for a publishing batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishStats {
    pub folders_processed: usize,
    pub published: usize,
    pub failed: usize,
    pub archived: usize,
    pub bytes_uploaded: u64,
}

impl PublishStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_published(&mut self, video_size: u64) {
        self.folders_processed += 1;
        self.published += 1;
        self.bytes_uploaded += video_size;
    }

    pub fn add_archived(&mut self) {
        self.archived += 1;
    }

    pub fn add_failed(&mut self) {
        self.folders_processed += 1;
        self.failed += 1;
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} folders | Published: {} | Failed: {} | Archived: {} | Uploaded: {}",
            self.folders_processed,
            self.published,
            self.failed,
            self.archived,
            crate::file_manager::FileManager::format_size(self.bytes_uploaded),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summary() {
        let mut stats = PublishStats::new();
        stats.add_published(2048);
        stats.add_archived();
        stats.add_failed();

        assert_eq!(stats.folders_processed, 2);
        assert_eq!(
            stats.format_summary(),
            "Processed: 2 folders | Published: 1 | Failed: 1 | Archived: 1 | Uploaded: 2.00 KB"
        );
    }

    #[test]
    fn test_hidden_bar_tracks_fraction() {
        let progress = ProgressManager::hidden();
        progress.set_fraction(0.25);
        assert_eq!(progress.position(), 250);
        progress.set_fraction(1.5);
        assert_eq!(progress.position(), BAR_LENGTH);
    }
}
