//! Durable text library
//!
//! Maps short text identifiers to reading-session records. The whole map is
//! rewritten as one pretty-printed JSON document on every mutation; the store
//! is small and writes are infrequent, so wholesale rewrite is acceptable.
//! Persistence is best-effort: a failed load starts an empty store and a
//! failed save degrades to in-memory operation, neither fails the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use swiftread_common::{text, Error, Result};
use tracing::{debug, warn};

use crate::playback::session::DEFAULT_WPM;

/// Minimum word count accepted when saving a text
pub const MIN_SAVE_WORDS: usize = 5;

fn default_wpm() -> u32 {
    DEFAULT_WPM
}

/// One saved text with its reading state.
///
/// `words` is the whitespace tokenization of `text`; the raw text is kept
/// so entries can be re-tokenized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub position: usize,
    #[serde(default = "default_wpm")]
    pub wpm: u32,
}

impl Default for LibraryEntry {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            words: Vec::new(),
            position: 0,
            wpm: DEFAULT_WPM,
        }
    }
}

/// Listing row exposed to clients.
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySummary {
    pub id: String,
    pub title: String,
    pub word_count: usize,
    pub position: usize,
    pub wpm: u32,
}

/// Result of a persistence attempt.
///
/// `Degraded` means the in-memory mutation succeeded but the file write did
/// not; it is surfaced in diagnostics only, never to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    Degraded,
}

/// The library store. Sole owner and writer of the backing file.
pub struct LibraryStore {
    path: PathBuf,
    entries: HashMap<String, LibraryEntry>,
}

impl LibraryStore {
    /// Load the store from `path`.
    ///
    /// A missing or malformed file yields an empty store; the existing file
    /// is neither deleted nor repaired.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, LibraryEntry>>(&contents) {
                Ok(entries) => {
                    debug!("loaded {} library entries from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("could not parse library file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("could not read library file {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    /// Serialize the full mapping back to the library file.
    pub fn save(&self) -> PersistOutcome {
        match self.try_save() {
            Ok(()) => PersistOutcome::Persisted,
            Err(e) => {
                warn!("could not save library to {}: {}", self.path.display(), e);
                PersistOutcome::Degraded
            }
        }
    }

    fn try_save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, text_id: &str) -> Option<&LibraryEntry> {
        self.entries.get(text_id)
    }

    pub fn get_mut(&mut self, text_id: &str) -> Option<&mut LibraryEntry> {
        self.entries.get_mut(text_id)
    }

    /// Return the existing entry or insert a default-valued one.
    pub fn get_or_create(&mut self, text_id: &str) -> &mut LibraryEntry {
        self.entries.entry(text_id.to_string()).or_default()
    }

    /// Tokenize `raw_text`, assign a fresh short identifier and persist.
    ///
    /// Fails with a validation error when fewer than `MIN_SAVE_WORDS`
    /// words result.
    pub fn upsert_from_text(&mut self, title: &str, raw_text: &str, wpm: u32) -> Result<String> {
        let words = text::tokenize(raw_text);
        if words.len() < MIN_SAVE_WORDS {
            return Err(Error::Validation("text too short".to_string()));
        }

        let text_id = text::short_id();
        self.entries.insert(
            text_id.clone(),
            LibraryEntry {
                title: title.to_string(),
                text: raw_text.to_string(),
                words,
                position: 0,
                wpm,
            },
        );
        self.save();
        Ok(text_id)
    }

    /// Remove an entry and persist. Removing an absent id is a no-op.
    pub fn delete(&mut self, text_id: &str) -> bool {
        let removed = self.entries.remove(text_id).is_some();
        if removed {
            self.save();
        }
        removed
    }

    /// All entries sorted by case-insensitive title, the only ordering
    /// guarantee exposed to callers.
    pub fn list_sorted(&self) -> Vec<LibrarySummary> {
        let mut items: Vec<LibrarySummary> = self
            .entries
            .iter()
            .map(|(id, entry)| LibrarySummary {
                id: id.clone(),
                title: entry.title.clone(),
                word_count: entry.words.len(),
                position: entry.position,
                wpm: entry.wpm,
            })
            .collect();
        items.sort_by_key(|item| item.title.to_lowercase());
        items
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
