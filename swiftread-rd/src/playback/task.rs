//! Session scheduler task
//!
//! The task alternates between two waits: when playback is running it races
//! the command queue against the per-word delay, otherwise it blocks on the
//! queue alone. A pause arriving mid-delay is handled at once; the word
//! delay is recomputed every iteration so WPM changes land on the next word.

use serde::Serialize;
use serde_json::Value;
use swiftread_common::{text, Error, Result, Signals};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::import::ImportedText;
use crate::library::{LibraryStore, LibrarySummary, PersistOutcome};
use crate::sse::SignalBroadcaster;

use super::orp;
use super::session::{ReadingSession, SessionSnapshot};

/// Command queue depth; senders briefly back-pressure when full
const COMMAND_BUFFER: usize = 64;

/// Commands accepted by the session task.
///
/// Query-style commands carry a oneshot reply channel; fire-and-forget
/// controls report through the signal stream instead.
pub enum ReaderCommand {
    Start,
    Pause,
    /// Keyboard toggle: pauses when running, otherwise does nothing
    Toggle,
    Reset,
    Faster,
    Slower,
    SetWpm(u32),
    Load {
        text_id: String,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Save {
        title: Option<String>,
        text: Option<String>,
        reply: oneshot::Sender<Result<SavedText>>,
    },
    Delete {
        text_id: String,
        reply: oneshot::Sender<Vec<LibrarySummary>>,
    },
    List {
        reply: oneshot::Sender<Vec<LibrarySummary>>,
    },
    Import {
        imported: ImportedText,
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Result of saving the active text to the library.
#[derive(Debug, Clone, Serialize)]
pub struct SavedText {
    pub text_id: String,
    pub title: String,
    pub total_words: usize,
    pub library: Vec<LibrarySummary>,
}

/// The scheduler task owning session and store.
pub struct SessionTask {
    session: ReadingSession,
    store: LibraryStore,
    broadcaster: SignalBroadcaster,
    rx: mpsc::Receiver<ReaderCommand>,
    /// When the next word is due; survives commands arriving mid-word
    next_word_due: Option<Instant>,
}

impl SessionTask {
    /// Spawn the task, returning its command queue handle.
    pub fn spawn(store: LibraryStore, broadcaster: SignalBroadcaster) -> mpsc::Sender<ReaderCommand> {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let task = Self {
            session: ReadingSession::new(),
            store,
            broadcaster,
            rx,
            next_word_due: None,
        };
        tokio::spawn(task.run());
        tx
    }

    async fn run(mut self) {
        loop {
            if self.session.running {
                // The deadline is fixed when the word is emitted; a command
                // arriving mid-word re-arms only the remaining delay.
                let due = *self
                    .next_word_due
                    .get_or_insert_with(|| Instant::now() + self.session.word_delay());
                tokio::select! {
                    cmd = self.rx.recv() => match cmd {
                        Some(cmd) => self.handle(cmd),
                        None => break,
                    },
                    _ = sleep_until(due) => {
                        self.next_word_due = None;
                        self.tick();
                    }
                }
            } else {
                self.next_word_due = None;
                match self.rx.recv().await {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                }
            }
        }
        debug!("session task stopped");
    }

    fn handle(&mut self, cmd: ReaderCommand) {
        match cmd {
            ReaderCommand::Start => self.start(),
            ReaderCommand::Pause => self.pause(),
            ReaderCommand::Toggle => {
                if self.session.running {
                    self.pause();
                }
            }
            ReaderCommand::Reset => self.reset(),
            ReaderCommand::Faster => {
                self.session.faster();
                self.broadcast_wpm();
            }
            ReaderCommand::Slower => {
                self.session.slower();
                self.broadcast_wpm();
            }
            ReaderCommand::SetWpm(wpm) => {
                self.session.set_wpm(wpm);
                self.broadcast_wpm();
            }
            ReaderCommand::Load { text_id, reply } => {
                let _ = reply.send(self.load(&text_id));
            }
            ReaderCommand::Save { title, text, reply } => {
                let _ = reply.send(self.save(title, text));
            }
            ReaderCommand::Delete { text_id, reply } => {
                let _ = reply.send(self.delete(&text_id));
            }
            ReaderCommand::List { reply } => {
                let _ = reply.send(self.store.list_sorted());
            }
            ReaderCommand::Import { imported, reply } => {
                let _ = reply.send(self.import(imported));
            }
            ReaderCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Start or resume playback. Emits the current word immediately; the
    /// run loop schedules the rest. A start while already playing is
    /// ignored (single-flight).
    fn start(&mut self) {
        if self.session.words.is_empty() {
            self.broadcaster
                .broadcast_lossy(Signals::new().set("running", false));
            return;
        }
        if self.session.running {
            debug!("start ignored, playback already running");
            return;
        }

        info!(
            "playback started at word {}/{} ({} wpm)",
            self.session.position + 1,
            self.session.total_words(),
            self.session.wpm
        );
        self.session.running = true;
        self.tick();
    }

    /// Emit one word-reveal signal and advance, or finish the text.
    fn tick(&mut self) {
        if self.broadcaster.client_count() == 0 {
            debug!("no connected clients, stopping playback");
            self.session.running = false;
            return;
        }

        let total = self.session.total_words();
        if self.session.position >= total {
            self.session.running = false;
            self.broadcaster.broadcast_lossy(
                Signals::new()
                    .set("running", false)
                    .set("progress", 1.0)
                    .set("completed", true)
                    .set("word", ""),
            );
            info!("playback completed ({} words)", total);
            return;
        }

        let word = self.session.words[self.session.position].clone();
        let split = orp::split(&word);
        let current = self.session.position + 1;

        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("before", split.before)
                .set("orp", split.pivot)
                .set("after", split.after)
                .set("word", word)
                .set("wpm", self.session.wpm)
                .set("progress", current as f64 / total as f64)
                .set("current_word", current as u64)
                .set("total_words", total as u64)
                .set("running", true),
        );

        self.session.position = current;
    }

    /// Stop the loop and persist position and speed for the active text.
    /// Pausing an already-paused session repeats the same effects.
    fn pause(&mut self) {
        self.session.running = false;
        self.persist_progress(true);
        self.broadcaster
            .broadcast_lossy(Signals::new().set("running", false));
    }

    /// Back to the start of the current text.
    fn reset(&mut self) {
        self.session.running = false;
        self.session.position = 0;
        self.persist_progress(false);

        let total = self.session.total_words();
        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("word", "")
                .set("before", "")
                .set("orp", "")
                .set("after", "")
                .set("progress", 0.0)
                .set("running", false)
                .set("current_word", 0u64)
                .set("total_words", total as u64)
                .set("completed", false),
        );
    }

    fn broadcast_wpm(&self) {
        self.broadcaster
            .broadcast_lossy(Signals::new().set("wpm", self.session.wpm));
    }

    /// Write position (and optionally wpm) back into the active text's
    /// library entry. Persistence failures degrade silently.
    fn persist_progress(&mut self, include_wpm: bool) {
        let Some(text_id) = self.session.text_id.clone() else {
            return;
        };
        let position = self.session.position;
        let wpm = self.session.wpm;
        let Some(entry) = self.store.get_mut(&text_id) else {
            return;
        };
        entry.position = position;
        if include_wpm {
            entry.wpm = wpm;
        }
        if self.store.save() == PersistOutcome::Degraded {
            warn!("progress for {} kept in memory only", text_id);
        }
    }

    /// Refresh the session from a library entry.
    fn load(&mut self, text_id: &str) -> Result<SessionSnapshot> {
        let Some(entry) = self.store.get_mut(text_id) else {
            return Err(Error::Validation("text not found".to_string()));
        };

        // Older entries may carry raw text without a token list
        let retokenized = entry.words.is_empty() && !entry.text.trim().is_empty();
        if retokenized {
            entry.words = text::tokenize(&entry.text);
        }
        let entry = entry.clone();
        if retokenized {
            self.store.save();
        }

        self.session.text_id = Some(text_id.to_string());
        self.session.words = entry.words;
        self.session.position = entry.position.min(self.session.words.len());
        self.session.set_wpm(entry.wpm);
        self.session.running = false;
        self.session.pending_title = None;

        let total = self.session.total_words();
        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("text_id", text_id)
                .set("title", entry.title.clone())
                .set("wpm", self.session.wpm)
                .set("total_words", total as u64)
                .set("current_word", self.session.position as u64)
                .set("progress", self.session.progress())
                .set("running", false)
                .set("completed", false)
                .set("word", "")
                .set("before", "")
                .set("orp", "")
                .set("after", ""),
        );

        info!("loaded text {} ({} words)", text_id, total);
        Ok(self.snapshot())
    }

    /// Save the active (or submitted) text to the library and make it the
    /// active entry.
    fn save(&mut self, title: Option<String>, text: Option<String>) -> Result<SavedText> {
        let title = title
            .filter(|t| !t.trim().is_empty())
            .map(|t| t.trim().to_string())
            .or_else(|| self.session.pending_title.clone())
            .unwrap_or_else(|| "Untitled".to_string());

        let (raw_text, words) = match text.filter(|t| !t.trim().is_empty()) {
            Some(t) => {
                let words = swiftread_common::text::tokenize(&t);
                (t, words)
            }
            None => (self.session.words.join(" "), self.session.words.clone()),
        };

        let text_id = self
            .store
            .upsert_from_text(&title, &raw_text, self.session.wpm)?;

        self.session.text_id = Some(text_id.clone());
        self.session.words = words;
        self.session.position = 0;
        self.session.running = false;
        self.session.pending_title = None;

        let library = self.store.list_sorted();
        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("text_id", text_id.as_str())
                .set("title", title.as_str())
                .set("total_words", self.session.total_words() as u64)
                .set("current_word", 0u64)
                .set("progress", 0.0)
                .set_json("library", &library),
        );

        info!("saved text {} as {:?}", text_id, title);
        Ok(SavedText {
            text_id,
            title,
            total_words: self.session.total_words(),
            library,
        })
    }

    /// Remove a text; deleting the active text clears the session.
    fn delete(&mut self, text_id: &str) -> Vec<LibrarySummary> {
        let removed = self.store.delete(text_id);
        if removed && self.session.text_id.as_deref() == Some(text_id) {
            self.session.text_id = None;
            self.session.words.clear();
            self.session.position = 0;
            self.session.running = false;
        }

        let library = self.store.list_sorted();
        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("text_id", self.session.text_id.clone().map(Value::from).unwrap_or(Value::Null))
                .set("total_words", self.session.total_words() as u64)
                .set("running", false)
                .set_json("library", &library),
        );
        library
    }

    /// Replace the session with freshly imported words. The text stays
    /// outside the library until an explicit save.
    fn import(&mut self, imported: ImportedText) -> SessionSnapshot {
        info!(
            "imported {:?} ({} words)",
            imported.title,
            imported.words.len()
        );

        self.session.words = imported.words;
        self.session.position = 0;
        self.session.text_id = None;
        self.session.running = false;
        self.session.pending_title = Some(imported.title.clone());

        self.broadcaster.broadcast_lossy(
            Signals::new()
                .set("title", imported.title)
                .set("total_words", self.session.total_words() as u64)
                .set("current_word", 0u64)
                .set("progress", 0.0)
                .set("running", false)
                .set("completed", false),
        );

        self.snapshot()
    }

    fn snapshot(&self) -> SessionSnapshot {
        let title = self.session.pending_title.clone().or_else(|| {
            self.session
                .text_id
                .as_deref()
                .and_then(|id| self.store.get(id))
                .map(|entry| entry.title.clone())
        });

        SessionSnapshot {
            text_id: self.session.text_id.clone(),
            title,
            total_words: self.session.total_words(),
            position: self.session.position,
            wpm: self.session.wpm,
            running: self.session.running,
            phase: self.session.phase(),
            progress: self.session.progress(),
        }
    }
}
