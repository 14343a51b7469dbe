//! # SwiftRead Common Library
//!
//! Shared code for the SwiftRead reader service:
//! - Error taxonomy (`Error` enum)
//! - Signal bundle type pushed over the client channel
//! - Text utilities (tokenization, whitespace handling, short identifiers)

pub mod error;
pub mod signals;
pub mod text;

pub use error::{Error, Result};
pub use signals::Signals;
