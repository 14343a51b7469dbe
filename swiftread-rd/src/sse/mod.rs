//! Push channel to connected clients

pub mod broadcaster;

pub use broadcaster::SignalBroadcaster;
