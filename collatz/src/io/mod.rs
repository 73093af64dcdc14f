//! I/O helpers for the driver commands.

pub mod config;
