//! CLI command implementations.

pub mod config;
pub mod init;
pub mod problem;
pub mod profile;
pub mod similarity;
pub mod team;
pub mod tree;
pub mod vote;
pub mod workspace;
