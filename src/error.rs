//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `UploadError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori per-cartella (il batch continua) da errori fatali per il batch
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `MissingAsset`: Cartella senza video o senza `metadata.json` (per-cartella)
//! - `InvalidScheduleInput`: Data manuale, modalità o selezione non valida (fatale per il batch)
//! - `Transfer`: Errore durante l'upload a chunk (per-cartella)
//! - `Credential`: Credenziali OAuth mancanti o non valide (fatale per il run)
//! - `Io` / `Json` / `Http`: Conversioni automatiche da errori standard
//! - `Config`: Parametri di configurazione non validi
//!
//! ## Esempio:
//! ```rust,ignore
//! if videos.is_empty() {
//!     return Err(UploadError::MissingAsset("no video file".to_string()));
//! }
//! ```

/// Custom error types for the publishing pipeline
#[derive(thiserror::Error, Debug)]
pub enum UploadError {
    #[error("Missing asset: {0}")]
    MissingAsset(String),

    #[error("Invalid schedule input: {0}")]
    InvalidScheduleInput(String),

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl UploadError {
    /// Whether this error must stop the whole batch rather than a single folder
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            UploadError::InvalidScheduleInput(_) | UploadError::Credential(_) | UploadError::Config(_)
        )
    }
}
