//! # Video Batch Publisher Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tassonomia degli errori (per cartella / fatali per il batch)
//! - `file_manager`: Discovery delle cartelle e archiviazione in `0.DONE/`
//! - `metadata`: Lettura di `metadata.json` con i default
//! - `tags`: Riduzione dei tag al budget cumulativo
//! - `schedule`: Calcolo delle date di pubblicazione
//! - `credentials`: Token OAuth (cache, refresh, consenso manuale)
//! - `upload`: Sessione resumable e trasporto YouTube
//! - `publisher`: Orchestratore del batch
//! - `prompt`: Selezione interattiva di cartelle e modalità
//! - `progress` / `json_output`: Feedback visivo e output strutturato
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use video_batch_publisher::{BatchPublisher, Config, DirectoryArchiver, SchedulePlanner};
//!
//! let planner = SchedulePlanner::from_config(&config)?;
//! let slots = planner.plan(selected.len(), &mode, planner.now())?;
//! let publisher = BatchPublisher::new(config, factory, DirectoryArchiver::new(done_dir));
//! let (reports, stats) = publisher.publish(&root, &selected, &slots, &mode).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod file_manager;
pub mod json_output;
pub mod metadata;
pub mod progress;
pub mod prompt;
pub mod publisher;
pub mod schedule;
pub mod tags;
pub mod upload;

pub use config::Config;
pub use credentials::CredentialProvider;
pub use error::UploadError;
pub use file_manager::{Archiver, DirectoryArchiver, FileManager, FolderCandidate};
pub use metadata::VideoMetadata;
pub use progress::PublishStats;
pub use publisher::{BatchPublisher, FolderReport, UploadOutcome, YouTubeTransportFactory};
pub use schedule::{PublishSlot, ScheduleMode, SchedulePlanner};
pub use tags::trim_tags;
