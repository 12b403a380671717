//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico.
//!
//! ## Responsabilità:
//! - Emette un messaggio JSON per riga su stdout per ogni evento del batch
//! - Sostituisce la progress bar quando `json_output` è attivo
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch (cartelle, modalità)
//! - `folder_start`: Inizio upload di una cartella
//! - `progress`: Avanzamento dell'upload in corso (già filtrato dal passo)
//! - `folder_complete`: Esito di una cartella (id video o errore)
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore fatale

use crate::progress::PublishStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        root: PathBuf,
        total_folders: usize,
        mode: String,
    },

    FolderStart {
        folder: String,
        index: usize,
        total: usize,
        publish_at: Option<String>,
    },

    Progress {
        folder: String,
        fraction: f64,
    },

    FolderComplete {
        folder: String,
        video_id: Option<String>,
        archived_to: Option<PathBuf>,
        error: Option<String>,
    },

    Complete {
        folders_processed: usize,
        published: usize,
        failed: usize,
        archived: usize,
        bytes_uploaded: u64,
        duration_seconds: f64,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn complete(stats: &PublishStats, duration_seconds: f64) -> Self {
        Self::Complete {
            folders_processed: stats.folders_processed,
            published: stats.published,
            failed: stats.failed,
            archived: stats.archived,
            bytes_uploaded: stats.bytes_uploaded,
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tagged_serialization() {
        let message = JsonMessage::FolderStart {
            folder: "robot".to_string(),
            index: 1,
            total: 2,
            publish_at: Some("2024-03-02T09:00:00Z".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "folder_start",
                "folder": "robot",
                "index": 1,
                "total": 2,
                "publish_at": "2024-03-02T09:00:00Z"
            })
        );
    }

    #[test]
    fn test_complete_from_stats() {
        let mut stats = PublishStats::new();
        stats.add_published(10);
        let value = serde_json::to_value(JsonMessage::complete(&stats, 1.5)).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["published"], 1);
        assert_eq!(value["bytes_uploaded"], 10);
    }
}
