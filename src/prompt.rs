//! # Interactive Prompt Module
//!
//! Gestisce l'interazione con l'utente sul terminale.
//!
//! ## Responsabilità:
//! - Mostra le cartelle eleggibili numerate e legge la selezione (max 6)
//! - Legge la modalità di programmazione (1-4)
//! - In modalità manuale legge una data `YYYY-MM-DD` per ogni video
//! - Legge il codice di autorizzazione OAuth
//!
//! ## Validazione:
//! Qualunque input non valido (indice inesistente, duplicato, troppe
//! cartelle, modalità sconosciuta, data malformata) produce
//! `UploadError::InvalidScheduleInput` e ferma il batch prima degli upload.
//!
//! Le funzioni `parse_*` sono pure; `Prompt` è generico su reader/writer
//! così da poter essere testato senza terminale.

use crate::credentials::CredentialProvider;
use crate::error::UploadError;
use crate::file_manager::{FileManager, FolderCandidate};
use crate::schedule::{parse_manual_date, PublishSlot, ScheduleMode, SchedulePlanner};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// Parse a comma separated list of 1-based indices into 0-based ones
pub fn parse_selection(input: &str, available: usize, max: usize) -> Result<Vec<usize>, UploadError> {
    let entries: Vec<&str> = input.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

    if entries.is_empty() {
        return Err(UploadError::InvalidScheduleInput("empty selection".to_string()));
    }
    if entries.len() > max {
        return Err(UploadError::InvalidScheduleInput(format!(
            "{} folders selected, at most {} allowed",
            entries.len(),
            max
        )));
    }

    let mut seen = HashSet::new();
    let mut indices = Vec::with_capacity(entries.len());
    for entry in entries {
        let index: usize = entry
            .parse()
            .map_err(|_| UploadError::InvalidScheduleInput(format!("'{}' is not a folder number", entry)))?;
        if index == 0 || index > available {
            return Err(UploadError::InvalidScheduleInput(format!("no folder number {}", index)));
        }
        if !seen.insert(index) {
            return Err(UploadError::InvalidScheduleInput(format!("folder {} selected twice", index)));
        }
        indices.push(index - 1);
    }

    Ok(indices)
}

/// Mode choices without their manual dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    Daily,
    EveryThreeDays,
    Immediate,
    Manual,
}

pub fn parse_mode_choice(input: &str) -> Result<ModeChoice, UploadError> {
    match input.trim() {
        "1" => Ok(ModeChoice::Daily),
        "2" => Ok(ModeChoice::EveryThreeDays),
        "3" => Ok(ModeChoice::Immediate),
        "4" => Ok(ModeChoice::Manual),
        other => Err(UploadError::InvalidScheduleInput(format!("unknown mode '{}'", other))),
    }
}

/// Line-oriented prompt over any reader and writer
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print `question` and read one line
    pub fn ask(&mut self, question: &str) -> Result<String, UploadError> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err(UploadError::InvalidScheduleInput("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    /// List `names` and return the selected 0-based indices
    pub fn select_folders(&mut self, names: &[String], max: usize) -> Result<Vec<usize>, UploadError> {
        for (i, name) in names.iter().enumerate() {
            writeln!(self.writer, "  {}. {}", i + 1, name)?;
        }
        let answer = self.ask(&format!("Folders to upload (max {}, comma separated): ", max))?;
        parse_selection(&answer, names.len(), max)
    }

    /// Read the schedule mode, and the dates when manual
    pub fn select_mode(&mut self, count: usize) -> Result<ScheduleMode, UploadError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "Mode: 1 daily  2 every 3 days  3 immediate  4 manual")?;
        let choice = parse_mode_choice(&self.ask("Choice [1-4]: ")?)?;

        Ok(match choice {
            ModeChoice::Daily => ScheduleMode::Daily,
            ModeChoice::EveryThreeDays => ScheduleMode::EveryThreeDays,
            ModeChoice::Immediate => ScheduleMode::Immediate,
            ModeChoice::Manual => {
                let mut dates = Vec::with_capacity(count);
                for k in 0..count {
                    let answer = self.ask(&format!("Date YYYY-MM-DD for video {}: ", k + 1))?;
                    dates.push(parse_manual_date(&answer)?);
                }
                ScheduleMode::Manual(dates)
            }
        })
    }

    /// Show the consent URL and read back the code or redirect URL
    pub fn ask_authorization(&mut self, url: &str) -> Result<String, UploadError> {
        writeln!(self.writer, "Open this URL in a browser and authorize the upload:")?;
        writeln!(self.writer, "  {}", url)?;
        self.ask("Paste the code (or the full redirect URL): ")
    }

    /// Authorize first, then read the mode and plan `count` slots. The
    /// plan's `now` is taken after any consent wait.
    pub async fn authorize_and_plan(
        &mut self,
        credentials: &CredentialProvider,
        planner: &SchedulePlanner,
        count: usize,
    ) -> Result<(ScheduleMode, Vec<PublishSlot>), UploadError> {
        credentials
            .access_token(|url| self.ask_authorization(url.as_str()))
            .await?;

        let mode = self.select_mode(count)?;
        let slots = planner.plan(count, &mode, planner.now())?;
        Ok((mode, slots))
    }
}

/// Names shown in the folder list
pub fn describe_candidates(candidates: &[FolderCandidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| {
            let size = std::fs::metadata(&c.video).map(|m| m.len()).unwrap_or(0);
            format!("{} ({})", c.name, FileManager::format_size(size))
        })
        .collect()
}
