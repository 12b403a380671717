//! # Batch Publisher
//!
//! Orchestratore del batch: una cartella alla volta, nell'ordine di selezione.
//!
//! ## Regole:
//! - Uno slot di pubblicazione per cartella, già calcolato dal planner
//! - Un errore su una cartella non ferma il batch: la cartella resta al suo posto
//! - Fanno eccezione gli errori fatali (`UploadError::is_batch_fatal`)
//! - Solo le cartelle pubblicate vengono archiviate
//! - Un errore di archiviazione viene loggato, il video resta pubblicato

use crate::{
    config::Config,
    error::UploadError,
    file_manager::{Archiver, FolderCandidate},
    progress::PublishStats,
    publisher::{
        folder_task::{FolderTask, TransportFactory},
        progress_tracker::ProgressTracker,
        FolderReport, UploadOutcome,
    },
    schedule::{PublishSlot, ScheduleMode},
};
use std::path::Path;
use tracing::{error, warn};

/// Uploads a selection of folders and archives the published ones
pub struct BatchPublisher<F, A> {
    config: Config,
    factory: F,
    archiver: A,
}

impl<F: TransportFactory, A: Archiver> BatchPublisher<F, A> {
    pub fn new(config: Config, factory: F, archiver: A) -> Self {
        Self {
            config,
            factory,
            archiver,
        }
    }

    /// Publish `candidates[i]` at `slots[i]`, in order
    pub async fn publish(
        &self,
        root: &Path,
        candidates: &[FolderCandidate],
        slots: &[PublishSlot],
        mode: &ScheduleMode,
    ) -> Result<(Vec<FolderReport>, PublishStats), UploadError> {
        if candidates.len() != slots.len() {
            return Err(UploadError::InvalidScheduleInput(format!(
                "{} folders but {} publish slots",
                candidates.len(),
                slots.len()
            )));
        }

        let mut tracker = ProgressTracker::new(candidates.len(), self.config.json_output);
        tracker.start_batch(root, mode.description());

        let mut reports = Vec::with_capacity(candidates.len());
        for (index, (candidate, slot)) in candidates.iter().zip(slots).enumerate() {
            tracker.start_folder(&candidate.name, index + 1, slot);

            let task = FolderTask::new(candidate, *slot);
            let result = {
                let mut observer = |fraction: f64| tracker.on_progress(fraction);
                task.run(&self.config, &self.factory, &mut observer).await
            };

            let (report, video_size) = match result {
                Ok(video_id) => {
                    let video_size = tokio::fs::metadata(&candidate.video)
                        .await
                        .map(|m| m.len())
                        .unwrap_or(0);
                    let archived_to = match self.archiver.archive(&candidate.path).await {
                        Ok(target) => Some(target),
                        Err(e) => {
                            warn!("Published {} but could not archive it: {}", candidate.name, e);
                            None
                        }
                    };
                    let report = FolderReport {
                        folder: candidate.name.clone(),
                        slot: *slot,
                        outcome: UploadOutcome::Published { video_id },
                        archived_to,
                    };
                    (report, video_size)
                }
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => {
                    error!("{} left in place: {}", candidate.name, e);
                    let report = FolderReport {
                        folder: candidate.name.clone(),
                        slot: *slot,
                        outcome: UploadOutcome::Failed { error: e.to_string() },
                        archived_to: None,
                    };
                    (report, 0)
                }
            };

            tracker.complete_folder(&report, video_size);
            reports.push(report);
        }

        Ok((reports, tracker.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_manager::{DirectoryArchiver, FileManager};
    use crate::schedule::SchedulePlanner;
    use crate::upload::{ChunkStatus, ChunkTransport, UploadRequestBody};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Europe::Paris;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone)]
    enum Step {
        Pending(f64),
        Done(&'static str),
        Fail(&'static str),
    }

    struct ScriptedTransport {
        steps: VecDeque<Step>,
    }

    #[async_trait]
    impl ChunkTransport for ScriptedTransport {
        async fn next_chunk(&mut self) -> Result<ChunkStatus, UploadError> {
            match self.steps.pop_front() {
                Some(Step::Pending(p)) => Ok(ChunkStatus::Pending(Some(p))),
                Some(Step::Done(id)) => Ok(ChunkStatus::Complete { video_id: id.to_string() }),
                Some(Step::Fail(msg)) => Err(UploadError::Transfer(msg.to_string())),
                None => Err(UploadError::Transfer("script exhausted".to_string())),
            }
        }
    }

    /// Hands out one script per upload and records every request body
    #[derive(Clone)]
    struct ScriptedFactory {
        scripts: Arc<Mutex<VecDeque<Vec<Step>>>>,
        bodies: Arc<Mutex<Vec<(PathBuf, UploadRequestBody)>>>,
    }

    impl ScriptedFactory {
        fn new(scripts: Vec<Vec<Step>>) -> Self {
            Self {
                scripts: Arc::new(Mutex::new(scripts.into())),
                bodies: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn bodies(&self) -> Vec<(PathBuf, UploadRequestBody)> {
            self.bodies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TransportFactory for ScriptedFactory {
        type Transport = ScriptedTransport;

        async fn create(&self, video: &Path, body: UploadRequestBody) -> Result<ScriptedTransport, UploadError> {
            self.bodies.lock().unwrap().push((video.to_path_buf(), body));
            let steps = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Ok(ScriptedTransport { steps: steps.into() })
        }
    }

    #[derive(Default, Clone)]
    struct RecordingArchiver {
        archived: Arc<Mutex<Vec<PathBuf>>>,
    }

    #[async_trait]
    impl Archiver for RecordingArchiver {
        async fn archive(&self, folder: &Path) -> Result<PathBuf, UploadError> {
            self.archived.lock().unwrap().push(folder.to_path_buf());
            Ok(folder.join("archived"))
        }
    }

    fn make_folder(root: &Path, name: &str, metadata: &str) -> FolderCandidate {
        let folder = root.join(name);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(format!("{}.mp4", name)), vec![0u8; 1024]).unwrap();
        fs::write(folder.join("metadata.json"), metadata).unwrap();
        FileManager::find_video_meta(&folder).unwrap()
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let temp_dir = TempDir::new().unwrap();
        let first = make_folder(temp_dir.path(), "first", r#"{"title": "First"}"#);
        let second = make_folder(temp_dir.path(), "second", r#"{"title": "Second"}"#);

        let factory = ScriptedFactory::new(vec![
            vec![Step::Pending(0.5), Step::Fail("HTTP 500: backend error")],
            vec![Step::Pending(0.5), Step::Done("abc123")],
        ]);
        let archiver = RecordingArchiver::default();
        let publisher = BatchPublisher::new(Config::default(), factory.clone(), archiver.clone());

        let slots = vec![PublishSlot::Immediate, PublishSlot::Immediate];
        let (reports, stats) = publisher
            .publish(temp_dir.path(), &[first.clone(), second.clone()], &slots, &ScheduleMode::Immediate)
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome.error(), Some("Transfer error: HTTP 500: backend error"));
        assert_eq!(reports[0].archived_to, None);
        assert_eq!(reports[1].outcome.video_id(), Some("abc123"));
        assert_eq!(reports[1].archived_to, Some(second.path.join("archived")));

        assert_eq!(*archiver.archived.lock().unwrap(), vec![second.path.clone()]);
        assert_eq!(stats.folders_processed, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.bytes_uploaded, 1024);
    }

    #[tokio::test]
    async fn test_missing_asset_fails_only_that_folder() {
        let temp_dir = TempDir::new().unwrap();
        let broken = make_folder(temp_dir.path(), "broken", "{}");
        let fine = make_folder(temp_dir.path(), "fine", "{}");
        fs::remove_file(&broken.video).unwrap();

        let factory = ScriptedFactory::new(vec![vec![Step::Done("xyz")]]);
        let archiver = RecordingArchiver::default();
        let publisher = BatchPublisher::new(Config::default(), factory.clone(), archiver.clone());

        let slots = vec![PublishSlot::Immediate, PublishSlot::Immediate];
        let (reports, stats) = publisher
            .publish(temp_dir.path(), &[broken, fine], &slots, &ScheduleMode::Immediate)
            .await
            .unwrap();

        assert!(!reports[0].outcome.is_published());
        assert!(reports[0].outcome.error().unwrap().contains("Missing asset"));
        assert_eq!(reports[1].outcome.video_id(), Some("xyz"));
        // No transport was created for the broken folder
        assert_eq!(factory.bodies().len(), 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.published, 1);
    }

    #[tokio::test]
    async fn test_daily_plan_reaches_request_bodies() {
        let temp_dir = TempDir::new().unwrap();
        let a = make_folder(temp_dir.path(), "a", r#"{"title": "A", "tags": ["robot"]}"#);
        let b = make_folder(temp_dir.path(), "b", r#"{"title": "B"}"#);

        let planner = SchedulePlanner::new(Paris, 10, Duration::minutes(20)).unwrap();
        let now = Paris.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let slots = planner.plan(2, &ScheduleMode::Daily, now).unwrap();

        let factory = ScriptedFactory::new(vec![vec![Step::Done("id-a")], vec![Step::Done("id-b")]]);
        let archiver = RecordingArchiver::default();
        let publisher = BatchPublisher::new(Config::default(), factory.clone(), archiver.clone());
        publisher
            .publish(temp_dir.path(), &[a, b], &slots, &ScheduleMode::Daily)
            .await
            .unwrap();

        let bodies = factory.bodies();
        assert_eq!(bodies[0].1.snippet.title, "A");
        assert_eq!(bodies[0].1.snippet.tags, vec!["robot"]);
        assert_eq!(bodies[0].1.status.privacy_status, "private");
        assert_eq!(bodies[0].1.status.publish_at.as_deref(), Some("2024-03-01T09:00:00Z"));
        assert_eq!(bodies[1].1.status.publish_at.as_deref(), Some("2024-03-02T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_slot_count_mismatch_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let a = make_folder(temp_dir.path(), "a", "{}");

        let factory = ScriptedFactory::new(vec![]);
        let archiver = RecordingArchiver::default();
        let publisher = BatchPublisher::new(Config::default(), factory.clone(), archiver.clone());

        let err = publisher
            .publish(temp_dir.path(), &[a], &[], &ScheduleMode::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidScheduleInput(_)));
        assert!(factory.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_published_folder_moves_into_done_dir() {
        let temp_dir = TempDir::new().unwrap();
        let a = make_folder(temp_dir.path(), "a", "{}");
        let done_dir = temp_dir.path().join("0.DONE");

        let factory = ScriptedFactory::new(vec![vec![Step::Done("id-a")]]);
        let publisher = BatchPublisher::new(Config::default(), factory.clone(), DirectoryArchiver::new(&done_dir));
        let (reports, _) = publisher
            .publish(temp_dir.path(), &[a.clone()], &[PublishSlot::Immediate], &ScheduleMode::Immediate)
            .await
            .unwrap();

        assert_eq!(reports[0].archived_to, Some(done_dir.join("a")));
        assert!(!a.path.exists());
        assert!(done_dir.join("a").join("a.mp4").exists());
    }
}
