use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use henkan_core::dict::{SuppressionList, WordList};
use henkan_core::prediction::Predictor;
use henkan_core::request::ConversionRequest;
use henkan_core::segments::{RequestType, Segments};
use henkan_core::user_history::{decode, Entry, EntryType, FileStorage, HistoryError, HistoryStorage, UserHistoryPredictor};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no history file at {}", .0.display())]
    Missing(PathBuf),
    #[error("no entry {key}\t{value}")]
    NotFound { key: String, value: String },
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Records of a history file, most recently used first.
pub fn read_entries(path: &Path) -> Result<Vec<Entry>, CliError> {
    let bytes = FileStorage::new(path)
        .load()?
        .ok_or_else(|| CliError::Missing(path.to_path_buf()))?;
    let mut entries = decode(&bytes)?;
    entries.reverse();
    Ok(entries)
}

/// Predictor over an existing, readable history file.
fn open_predictor(path: &Path) -> Result<UserHistoryPredictor, CliError> {
    let count = read_entries(path)?.len();
    tracing::info!(path = %path.display(), count, "opening history");
    let predictor = UserHistoryPredictor::new(
        Arc::new(WordList::new()),
        Arc::new(SuppressionList::new()),
        Arc::new(FileStorage::new(path)),
    );
    predictor.wait();
    Ok(predictor)
}

fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok())
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

#[derive(Serialize)]
struct EntryView<'a> {
    key: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    entry_type: EntryType,
    last_access: String,
    suggestion_freq: u32,
    conversion_freq: u32,
    removed: bool,
    next_entries: usize,
}

impl<'a> From<&'a Entry> for EntryView<'a> {
    fn from(e: &'a Entry) -> Self {
        Self {
            key: &e.key,
            value: &e.value,
            description: &e.description,
            entry_type: e.entry_type,
            last_access: format_time(e.last_access_time),
            suggestion_freq: e.suggestion_freq,
            conversion_freq: e.conversion_freq,
            removed: e.removed,
            next_entries: e.next_entries.len(),
        }
    }
}

/// Print every record. Returns how many were printed.
pub fn dump(path: &Path, json: bool, out: &mut impl Write) -> Result<usize, CliError> {
    let entries = read_entries(path)?;
    if json {
        let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();
        serde_json::to_writer_pretty(&mut *out, &views)?;
        writeln!(out)?;
        return Ok(entries.len());
    }
    for e in &entries {
        match e.entry_type {
            EntryType::Default => {
                let removed = if e.removed { "\t(removed)" } else { "" };
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}{removed}",
                    e.key,
                    e.value,
                    e.suggestion_freq,
                    e.conversion_freq,
                    format_time(e.last_access_time),
                )?;
            }
            event => writeln!(out, "[{event:?}]\t{}", format_time(e.last_access_time))?,
        }
    }
    Ok(entries.len())
}

/// Print what the history would predict for `prefix`.
pub fn lookup(path: &Path, prefix: &str, limit: usize, out: &mut impl Write) -> Result<usize, CliError> {
    let predictor = open_predictor(path)?;
    let mut segments = Segments::new();
    segments.set_request_type(RequestType::Prediction);
    segments.set_max_prediction_candidates_size(limit);
    segments.add_segment().set_key(prefix);

    if !predictor.predict_for_request(&ConversionRequest::new(), &mut segments) {
        writeln!(out, "(no predictions)")?;
        return Ok(0);
    }
    let candidates = segments
        .conversion_segment(0)
        .map(|s| s.candidates())
        .unwrap_or_default();
    for c in candidates {
        writeln!(out, "{}\t{}", c.key, c.value)?;
    }
    Ok(candidates.len())
}

/// Tombstone one (key, value) record and save.
pub fn delete(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let predictor = open_predictor(path)?;
    if !predictor.clear_history_entry(key, value) {
        return Err(CliError::NotFound {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    predictor.save()?;
    Ok(())
}

pub fn clear_all(path: &Path) -> Result<(), CliError> {
    let predictor = open_predictor(path)?;
    predictor.clear_all_history();
    predictor.wait();
    predictor.save()?;
    Ok(())
}

pub fn clear_unused(path: &Path) -> Result<(), CliError> {
    let predictor = open_predictor(path)?;
    predictor.clear_unused_history();
    predictor.wait();
    predictor.save()?;
    Ok(())
}

/// Summary of a history file.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub entries: usize,
    pub removed: usize,
    pub events: usize,
    pub links: usize,
    pub suggestion_freq: u64,
    pub conversion_freq: u64,
    pub oldest: Option<u64>,
    pub newest: Option<u64>,
}

pub fn stats(path: &Path) -> Result<Stats, CliError> {
    let mut stats = Stats::default();
    for e in read_entries(path)? {
        if e.entry_type != EntryType::Default {
            stats.events += 1;
            continue;
        }
        stats.entries += 1;
        if e.removed {
            stats.removed += 1;
        }
        stats.links += e.next_entries.len();
        stats.suggestion_freq += u64::from(e.suggestion_freq);
        stats.conversion_freq += u64::from(e.conversion_freq);
        stats.oldest = Some(stats.oldest.map_or(e.last_access_time, |t| t.min(e.last_access_time)));
        stats.newest = Some(stats.newest.map_or(e.last_access_time, |t| t.max(e.last_access_time)));
    }
    Ok(stats)
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entries:         {}", self.entries)?;
        writeln!(f, "removed:         {}", self.removed)?;
        writeln!(f, "events:          {}", self.events)?;
        writeln!(f, "links:           {}", self.links)?;
        writeln!(f, "suggestion_freq: {}", self.suggestion_freq)?;
        writeln!(f, "conversion_freq: {}", self.conversion_freq)?;
        if let (Some(oldest), Some(newest)) = (self.oldest, self.newest) {
            writeln!(f, "oldest:          {}", format_time(oldest))?;
            write!(f, "newest:          {}", format_time(newest))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
