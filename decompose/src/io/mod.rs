//! I/O helpers for CLI commands.

pub mod config;
