//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di pubblicazione
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `publish_hour`: Ora di pubblicazione nel fuso configurato (0-23, default: 10)
//! - `time_zone`: Fuso orario IANA (default: "Europe/Paris")
//! - `min_margin_minutes`: Anticipo minimo di `publishAt` rispetto ad adesso (default: 20)
//! - `tag_budget`: Budget cumulativo dei tag (default: 500)
//! - `progress_step`: Passo minimo tra due notifiche di progresso (default: 0.05)
//! - `chunk_size`: Dimensione chunk upload, multiplo di 256 KiB (default: 16 MiB)
//! - `category_id` / `default_language`: Default dello snippet ("28", "fr")
//! - `done_dir`: Cartella di archivio sotto la root (default: "0.DONE")
//! - `max_selection`: Numero massimo di cartelle per batch (default: 6)
//! - `client_secret_path` / `token_path`: File credenziali OAuth
//! - `json_output`: Eventi JSON su stdout invece della progress bar
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     publish_hour: 18,
//!     time_zone: "America/New_York".to_string(),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resumable chunks must be a multiple of this many bytes
pub const CHUNK_GRANULARITY: usize = 256 * 1024;

/// Configuration for batch publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hour of day (local to `time_zone`) at which scheduled videos go public
    pub publish_hour: u32,
    /// IANA time zone name used for every date computation
    pub time_zone: String,
    /// Minimum lead time between now and any scheduled instant
    pub min_margin_minutes: i64,
    /// Cumulative tag budget (characters plus one separator per tag)
    pub tag_budget: usize,
    /// Minimum progress advance between two observer notifications
    pub progress_step: f64,
    /// Bytes sent per chunk request
    pub chunk_size: usize,
    /// YouTube category id (28 = Science & Technology)
    pub category_id: String,
    /// Default snippet language
    pub default_language: String,
    /// Archive directory name, created under the root directory
    pub done_dir: String,
    /// Maximum number of folders in one batch
    pub max_selection: usize,
    /// OAuth desktop client secret downloaded from Google Cloud Console
    pub client_secret_path: PathBuf,
    /// Cached OAuth token
    pub token_path: PathBuf,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            publish_hour: 10,
            time_zone: "Europe/Paris".to_string(),
            min_margin_minutes: 20,
            tag_budget: 500,
            progress_step: 0.05,
            chunk_size: 64 * CHUNK_GRANULARITY,
            category_id: "28".to_string(),
            default_language: "fr".to_string(),
            done_dir: "0.DONE".to_string(),
            max_selection: 6,
            client_secret_path: PathBuf::from("client_secret.json"),
            token_path: PathBuf::from("token.json"),
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.publish_hour > 23 {
            return Err(anyhow::anyhow!("Publish hour must be between 0 and 23"));
        }

        self.tz()?;

        if self.min_margin_minutes < 0 {
            return Err(anyhow::anyhow!("Minimum margin cannot be negative"));
        }

        if self.tag_budget == 0 {
            return Err(anyhow::anyhow!("Tag budget must be greater than 0"));
        }

        if self.progress_step <= 0.0 || self.progress_step > 1.0 {
            return Err(anyhow::anyhow!("Progress step must be between 0.0 (excluded) and 1.0"));
        }

        if self.chunk_size == 0 || self.chunk_size % CHUNK_GRANULARITY != 0 {
            return Err(anyhow::anyhow!(
                "Chunk size must be a positive multiple of {} bytes",
                CHUNK_GRANULARITY
            ));
        }

        if self.max_selection == 0 {
            return Err(anyhow::anyhow!("Maximum selection must be greater than 0"));
        }

        if self.done_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Archive directory name cannot be empty"));
        }

        Ok(())
    }

    /// Parsed time zone
    pub fn tz(&self) -> Result<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown time zone '{}': {}", self.time_zone, e))
    }

    pub fn min_margin(&self) -> Duration {
        Duration::minutes(self.min_margin_minutes)
    }

    /// Archive directory for a given root
    pub fn done_dir_in(&self, root: &Path) -> PathBuf {
        root.join(&self.done_dir)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
