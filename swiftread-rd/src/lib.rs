//! # SwiftRead Reader Service (swiftread-rd)
//!
//! Speed-reading playback engine with a durable text library.
//!
//! **Purpose:** Stream words to clients at a WPM-derived rate, persist
//! reading sessions across restarts, and import EPUB archives or web
//! articles into clean word lists.
//!
//! **Architecture:** A single scheduler task owns the reading session;
//! HTTP handlers submit commands over a queue and clients receive timed
//! word-reveal signals over SSE.

pub mod api;
pub mod config;
pub mod import;
pub mod library;
pub mod playback;
pub mod sse;
