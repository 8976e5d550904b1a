//! Maintenance of persisted conversion history files.

pub mod commands;
pub mod trace_init;
