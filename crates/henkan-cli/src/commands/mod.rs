pub mod history_ops;

pub use history_ops::{clear_all, clear_unused, delete, dump, lookup, read_entries, stats, CliError, Stats};
