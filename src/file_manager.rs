//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file: discovery delle
//! cartelle video e archiviazione dopo l'upload.
//!
//! ## Responsabilità:
//! - Elenca le sottocartelle della root in ordine alfabetico
//! - Determina se una cartella è completa (un video + `metadata.json`)
//! - Sposta le cartelle pubblicate nella cartella di archivio
//! - Formattazione human-readable delle dimensioni
//!
//! ## Formati video supportati:
//! MP4, MOV, MKV, AVI, FLV, WebM (estensione case-insensitive)
//!
//! ## Regole di eleggibilità:
//! - Una cartella senza video o senza `metadata.json` non è un errore:
//!   viene semplicemente esclusa dalla lista
//! - La cartella di archivio stessa non viene mai proposta
//!
//! ## Esempio:
//! ```rust,ignore
//! let candidates = FileManager::find_candidates(&root, "0.DONE")?;
//! for candidate in candidates {
//!     println!("{}", candidate.name);
//! }
//! ```

use crate::error::UploadError;
use crate::metadata::METADATA_FILE;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// A folder holding one video and its metadata file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderCandidate {
    pub name: String,
    pub path: PathBuf,
    pub video: PathBuf,
    pub metadata: PathBuf,
}

/// Manages folder discovery and file helpers
pub struct FileManager;

impl FileManager {
    /// Check if a file is a video
    pub fn is_video(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            matches!(ext_lower.as_str(), "mp4" | "mov" | "mkv" | "avi" | "flv" | "webm")
        } else {
            false
        }
    }

    /// MIME type announced to the upload endpoint
    pub fn video_mime_type(path: &Path) -> &'static str {
        let ext_lower = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext_lower.as_str() {
            "mp4" => "video/mp4",
            "mov" => "video/quicktime",
            "mkv" => "video/x-matroska",
            "avi" => "video/x-msvideo",
            "flv" => "video/x-flv",
            "webm" => "video/webm",
            _ => "application/octet-stream",
        }
    }

    /// Resolve the video and metadata file of a folder
    pub fn find_video_meta(folder: &Path) -> Result<FolderCandidate, UploadError> {
        let mut videos: Vec<PathBuf> = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| Self::is_video(p))
            .collect();
        videos.sort();

        let video = videos
            .into_iter()
            .next()
            .ok_or_else(|| UploadError::MissingAsset(format!("no video file in {}", folder.display())))?;

        let metadata = folder.join(METADATA_FILE);
        if !metadata.is_file() {
            return Err(UploadError::MissingAsset(format!(
                "{} missing in {}",
                METADATA_FILE,
                folder.display()
            )));
        }

        Ok(FolderCandidate {
            name: folder.file_name().unwrap_or_default().to_string_lossy().to_string(),
            path: folder.to_path_buf(),
            video,
            metadata,
        })
    }

    /// Sorted list of eligible folders directly under `root`
    pub fn find_candidates(root: &Path, done_dir: &str) -> Result<Vec<FolderCandidate>, UploadError> {
        let mut folders = Vec::new();

        for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| UploadError::Io(e.into()))?;
            if !entry.file_type().is_dir() || entry.file_name() == done_dir {
                continue;
            }

            match Self::find_video_meta(entry.path()) {
                Ok(candidate) => folders.push(candidate),
                Err(e) => debug!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        Ok(folders)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Moves a published folder out of the working set
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, folder: &Path) -> Result<PathBuf, UploadError>;
}

/// Archives folders by renaming them into a directory
pub struct DirectoryArchiver {
    done_dir: PathBuf,
}

impl DirectoryArchiver {
    pub fn new(done_dir: impl Into<PathBuf>) -> Self {
        Self { done_dir: done_dir.into() }
    }

    pub fn done_dir(&self) -> &Path {
        &self.done_dir
    }
}

#[async_trait]
impl Archiver for DirectoryArchiver {
    async fn archive(&self, folder: &Path) -> Result<PathBuf, UploadError> {
        let name = folder
            .file_name()
            .ok_or_else(|| UploadError::Io(std::io::Error::other(format!("no folder name in {}", folder.display()))))?;

        fs::create_dir_all(&self.done_dir).await?;

        let target = self.done_dir.join(name);
        if fs::try_exists(&target).await? {
            return Err(UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            )));
        }

        fs::rename(folder, &target).await?;
        info!("Archived folder in {}", target.display());
        Ok(target)
    }
}
