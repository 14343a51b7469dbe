//! Reading session state
//!
//! One session exists for the lifetime of the process. It is owned by the
//! scheduler task; everything else observes it through snapshots.

use serde::Serialize;
use std::time::Duration;

/// Lowest accepted reading speed
pub const MIN_WPM: u32 = 50;
/// Highest accepted reading speed
pub const MAX_WPM: u32 = 2000;
/// Step applied by faster/slower commands
pub const WPM_STEP: u32 = 50;
/// Reading speed for fresh sessions and new library entries
pub const DEFAULT_WPM: u32 = 300;

/// Playback phase derived from session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// No words loaded
    Idle,
    /// Words loaded, positioned at the start
    Ready,
    /// The timed loop is emitting
    Playing,
    /// Stopped mid-text, position preserved
    Paused,
    /// Position has reached the end of the word list
    Completed,
}

/// Process-wide reading session.
///
/// Invariants: `position <= words.len()`, `MIN_WPM <= wpm <= MAX_WPM`.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    /// Library identifier of the active text; `None` while an import is unsaved
    pub text_id: Option<String>,
    /// Tokenized content, replaced wholesale by load/import/reset
    pub words: Vec<String>,
    /// Index of the next word to emit
    pub position: usize,
    pub wpm: u32,
    /// True only while the timed loop is emitting
    pub running: bool,
    /// Title of an imported-but-unsaved text
    pub pending_title: Option<String>,
}

impl ReadingSession {
    pub fn new() -> Self {
        Self {
            text_id: None,
            words: Vec::new(),
            position: 0,
            wpm: DEFAULT_WPM,
            running: false,
            pending_title: None,
        }
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.words.is_empty() {
            PlaybackPhase::Idle
        } else if self.running {
            PlaybackPhase::Playing
        } else if self.position >= self.words.len() {
            PlaybackPhase::Completed
        } else if self.position == 0 {
            PlaybackPhase::Ready
        } else {
            PlaybackPhase::Paused
        }
    }

    /// Fraction of the text already emitted, in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        let total = self.words.len();
        if total == 0 {
            0.0
        } else {
            self.position as f64 / total as f64
        }
    }

    pub fn clamp_wpm(wpm: u32) -> u32 {
        wpm.clamp(MIN_WPM, MAX_WPM)
    }

    pub fn set_wpm(&mut self, wpm: u32) {
        self.wpm = Self::clamp_wpm(wpm);
    }

    pub fn faster(&mut self) {
        self.set_wpm(self.wpm.saturating_add(WPM_STEP));
    }

    pub fn slower(&mut self) {
        self.set_wpm(self.wpm.saturating_sub(WPM_STEP));
    }

    /// Delay before the next word, recomputed every iteration so a
    /// mid-flight WPM change takes effect on the next word.
    pub fn word_delay(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.wpm.max(1) as f64)
    }
}

impl Default for ReadingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the session returned to status queries.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub text_id: Option<String>,
    pub title: Option<String>,
    pub total_words: usize,
    pub position: usize,
    pub wpm: u32,
    pub running: bool,
    pub phase: PlaybackPhase,
    pub progress: f64,
}
