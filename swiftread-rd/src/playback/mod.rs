//! Playback engine
//!
//! A single scheduler task owns the reading session and the library store.
//! Control surfaces submit `ReaderCommand`s over a queue; timed word-reveal
//! signals go out through the broadcaster. Single ownership means two
//! concurrent start requests cannot double-drive the word index.

pub mod orp;
pub mod session;
pub mod task;

pub use session::{PlaybackPhase, ReadingSession, SessionSnapshot};
pub use task::{ReaderCommand, SavedText, SessionTask};
