//! # Schedule Planning Module
//!
//! Questo modulo risolve la data di pubblicazione di ogni video del batch.
//!
//! ## Responsabilità:
//! - Definisce le 4 modalità di programmazione (`ScheduleMode`)
//! - Calcola un `PublishSlot` per ogni video, nel fuso orario configurato
//! - Garantisce che ogni istante sia almeno `now + margin` nel futuro
//! - Formatta `publishAt` in UTC con suffisso `Z` e precisione al secondo
//!
//! ## Modalità:
//! - `Daily`: oggi all'ora di pubblicazione + i giorni, ognuno corretto dal margine
//! - `EveryThreeDays`: domani all'ora di pubblicazione (corretto una volta), poi +3 giorni
//! - `Immediate`: pubblicazione immediata, nessun calcolo
//! - `Manual`: una data per video, ora di pubblicazione aggiunta, poi corretta
//!
//! I passi di `Daily` e `EveryThreeDays` sono in tempo assoluto (24h / 72h):
//! attraverso un cambio d'ora l'ora locale si sposta. Solo `Manual` localizza
//! ogni data e mantiene l'ora di pubblicazione.
//!
//! ## Correzione del margine:
//! Un istante troppo vicino non viene rifiutato né accettato: viene spostato
//! esattamente a `now + margin`.
//!
//! ## Esempio:
//! ```rust,ignore
//! let planner = SchedulePlanner::from_config(&config)?;
//! let now = planner.now();
//! let plan = planner.plan(3, &ScheduleMode::Daily, now)?;
//! ```

use crate::config::Config;
use crate::error::UploadError;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing::debug;

/// Scheduling policy chosen for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleMode {
    Daily,
    EveryThreeDays,
    Immediate,
    /// One calendar date per video, in selection order
    Manual(Vec<NaiveDate>),
}

impl ScheduleMode {
    pub fn description(&self) -> &'static str {
        match self {
            ScheduleMode::Daily => "daily",
            ScheduleMode::EveryThreeDays => "every three days",
            ScheduleMode::Immediate => "immediate",
            ScheduleMode::Manual(_) => "manual",
        }
    }
}

/// Resolved publish time of one video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishSlot {
    /// Publish as public as soon as processing ends
    Immediate,
    /// Upload as private and let the platform publish at this instant
    At(DateTime<Tz>),
}

impl PublishSlot {
    pub fn is_immediate(&self) -> bool {
        matches!(self, PublishSlot::Immediate)
    }

    /// Wire form of `publishAt`, `None` for immediate publication
    pub fn publish_at(&self) -> Option<String> {
        match self {
            PublishSlot::Immediate => None,
            PublishSlot::At(instant) => Some(format_publish_at(instant)),
        }
    }
}

impl fmt::Display for PublishSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishSlot::Immediate => write!(f, "immediate"),
            PublishSlot::At(instant) => write!(f, "{}", instant.format("%Y-%m-%d %H:%M %Z")),
        }
    }
}

/// ISO-8601 UTC, second precision, literal `Z`
pub fn format_publish_at<T: TimeZone>(instant: &DateTime<T>) -> String {
    instant.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse a manual `YYYY-MM-DD` date
pub fn parse_manual_date(input: &str) -> Result<NaiveDate, UploadError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| UploadError::InvalidScheduleInput(format!("'{}' is not a YYYY-MM-DD date: {}", trimmed, e)))
}

/// Resolves publish slots for a batch
#[derive(Debug, Clone)]
pub struct SchedulePlanner {
    tz: Tz,
    publish_hour: u32,
    min_margin: Duration,
}

impl SchedulePlanner {
    pub fn new(tz: Tz, publish_hour: u32, min_margin: Duration) -> Result<Self, UploadError> {
        if publish_hour > 23 {
            return Err(UploadError::Config(format!("invalid publish hour {}", publish_hour)));
        }
        Ok(Self { tz, publish_hour, min_margin })
    }

    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        let tz = config.tz().map_err(|e| UploadError::Config(e.to_string()))?;
        Self::new(tz, config.publish_hour, config.min_margin())
    }

    /// Current instant in the planner's time zone
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// One slot per item, in order
    pub fn plan(&self, count: usize, mode: &ScheduleMode, now: DateTime<Tz>) -> Result<Vec<PublishSlot>, UploadError> {
        let now = now.with_timezone(&self.tz);
        let base_today = self.at_publish_hour(now.date_naive());

        let slots = match mode {
            ScheduleMode::Immediate => vec![PublishSlot::Immediate; count],
            ScheduleMode::Daily => (0..count)
                .map(|i| Ok(PublishSlot::At(self.clamp(add_days(base_today, i as i64)?, now))))
                .collect::<Result<Vec<_>, UploadError>>()?,
            ScheduleMode::EveryThreeDays => {
                let start = self.clamp(add_days(base_today, 1)?, now);
                (0..count)
                    .map(|i| Ok(PublishSlot::At(add_days(start, 3 * i as i64)?)))
                    .collect::<Result<Vec<_>, UploadError>>()?
            }
            ScheduleMode::Manual(dates) => {
                if dates.len() != count {
                    return Err(UploadError::InvalidScheduleInput(format!(
                        "expected {} manual dates, got {}",
                        count,
                        dates.len()
                    )));
                }
                dates
                    .iter()
                    .map(|date| PublishSlot::At(self.clamp(self.at_publish_hour(*date), now)))
                    .collect()
            }
        };

        Ok(slots)
    }

    /// `date` at the publish hour, local to the planner's zone
    fn at_publish_hour(&self, date: NaiveDate) -> DateTime<Tz> {
        // publish_hour <= 23 is checked in new()
        let naive = date.and_hms_opt(self.publish_hour, 0, 0).unwrap_or_default();
        localize(&self.tz, naive)
    }

    fn clamp(&self, candidate: DateTime<Tz>, now: DateTime<Tz>) -> DateTime<Tz> {
        let earliest = now + self.min_margin;
        if candidate >= earliest {
            candidate
        } else {
            debug!("Moving {} forward to {} (minimum margin)", candidate, earliest);
            earliest
        }
    }
}

/// Attach a zone to a wall-clock time; ambiguous times take the earlier
/// offset, times inside a DST gap move one hour later.
fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}

/// Whole days of absolute time: a step across a DST change keeps its
/// 24h length and moves the wall-clock hour instead
fn add_days(instant: DateTime<Tz>, days: i64) -> Result<DateTime<Tz>, UploadError> {
    instant
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| UploadError::InvalidScheduleInput(format!("{} + {} days is out of range", instant, days)))
}
