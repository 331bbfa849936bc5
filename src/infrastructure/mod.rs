//! Infrastructure layer module
//!
//! Process-level concerns around the core:
//! - Configuration management (figment)
//! - Logging (tracing-subscriber, tracing-appender)
//! - Project setup (`.teamspace/` directory and database bootstrap)

pub mod config;
pub mod logging;
pub mod setup;
