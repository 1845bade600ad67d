//! # Chat History Store
//!
//! One pretty-printed JSON file per saved conversation, named
//! `{title}_{YYYYMMDD_HHMMSS}.json`. Saves never overwrite an existing file:
//! a numeric suffix is added on collision. Saves and deletes are serialized
//! through an exclusive advisory lock on a lock file in the store directory;
//! reads take no lock.

use crate::{
    chat::message::ChatMessage,
    constants::{DEFAULT_HISTORY_TITLE, HISTORY_LOCK_FILE, HISTORY_TIMESTAMP_FORMAT},
    errors::HistoryError,
    prompts::PromptTemplate,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MAX_TITLE_CHARS: usize = 80;

/// The on-disk shape of one saved conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub selected_prompt: Option<PromptTemplate>,
}

/// A listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub filename: String,
    pub title: String,
    pub timestamp: String,
    pub message_count: usize,
}

struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> Result<StoreLock, HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(HISTORY_LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(StoreLock { file })
    }

    /// Saves a conversation and returns the chosen filename.
    pub fn save(
        &self,
        title: &str,
        messages: Vec<ChatMessage>,
        selected_prompt: Option<PromptTemplate>,
    ) -> Result<String, HistoryError> {
        let timestamp = chrono::Local::now()
            .format(HISTORY_TIMESTAMP_FORMAT)
            .to_string();
        let record = HistoryRecord {
            title: title.to_string(),
            timestamp: timestamp.clone(),
            messages,
            selected_prompt,
        };
        let body = serde_json::to_string_pretty(&record)?;
        let stem = format!("{}_{timestamp}", sanitize_title(title));

        let _lock = self.lock()?;
        let (filename, mut file) = self.create_unique(&stem)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;

        info!(filename = %filename, messages = record.messages.len(), "Saved chat history.");
        Ok(filename)
    }

    fn create_unique(&self, stem: &str) -> Result<(String, File), HistoryError> {
        let mut attempt = 0u32;
        loop {
            let filename = match attempt {
                0 => format!("{stem}.json"),
                n => format!("{stem}_{n}.json"),
            };
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&filename))
            {
                Ok(file) => return Ok((filename, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(filename = %filename, "History filename taken; trying next suffix.");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Lists saved conversations, newest timestamp first with ties broken by
    /// filename, also descending. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<HistorySummary>, HistoryError> {
        let filenames: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json") && !name.starts_with('.'))
            .collect();

        let mut summaries = Vec::with_capacity(filenames.len());
        for filename in filenames {
            match self.read_record(&filename) {
                Ok(record) => summaries.push(HistorySummary {
                    title: if record.title.is_empty() {
                        DEFAULT_HISTORY_TITLE.to_string()
                    } else {
                        record.title
                    },
                    timestamp: record.timestamp,
                    message_count: record.messages.len(),
                    filename,
                }),
                Err(e) => warn!(filename = %filename, "Skipping unreadable chat history: {e}"),
            }
        }
        summaries.sort_unstable_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(summaries)
    }

    /// Reads one saved conversation.
    pub fn read(&self, filename: &str) -> Result<HistoryRecord, HistoryError> {
        validate_filename(filename)?;
        self.read_record(filename)
    }

    fn read_record(&self, filename: &str) -> Result<HistoryRecord, HistoryError> {
        let content = match std::fs::read_to_string(self.dir.join(filename)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(HistoryError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Deletes one saved conversation.
    pub fn delete(&self, filename: &str) -> Result<(), HistoryError> {
        validate_filename(filename)?;
        let _lock = self.lock()?;
        match std::fs::remove_file(self.dir.join(filename)) {
            Ok(()) => {
                info!(filename, "Deleted chat history.");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(HistoryError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Makes a title safe to use as a filename stem.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_TITLE_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.').trim().to_string();
    if cleaned.is_empty() {
        DEFAULT_HISTORY_TITLE.to_string()
    } else {
        cleaned
    }
}

fn validate_filename(filename: &str) -> Result<(), HistoryError> {
    let valid = filename.ends_with(".json")
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && !filename.contains("..");
    if valid {
        Ok(())
    } else {
        Err(HistoryError::InvalidName(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Q3 plan"), "Q3 plan");
        assert_eq!(sanitize_title("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_title("../../etc"), "_.._etc");
        assert_eq!(sanitize_title("   "), DEFAULT_HISTORY_TITLE);
        assert_eq!(sanitize_title("営業会議"), "営業会議");
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("plan_20240101_120000.json").is_ok());
        assert!(validate_filename("../secret.json").is_err());
        assert!(validate_filename("nested/file.json").is_err());
        assert!(validate_filename(".history.lock").is_err());
        assert!(validate_filename("notes.txt").is_err());
    }
}
