//! Realtime channel adapters.

pub mod in_process_hub;

pub use in_process_hub::InProcessChannelHub;
