//! CLI command implementations.

pub mod command;
pub mod config;
pub mod send;
pub mod simulate;
