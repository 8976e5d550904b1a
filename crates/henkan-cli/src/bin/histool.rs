use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use henkan_cli::commands;
use henkan_cli::trace_init::init_tracing;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Parser)]
#[command(name = "histool", about = "Inspect and maintain conversion history files")]
struct Cli {
    /// Log to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every record, most recently used first
    Dump {
        /// Path to the history file
        file: PathBuf,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show what the history predicts for a reading prefix
    Lookup {
        /// Path to the history file
        file: PathBuf,
        /// Reading prefix
        prefix: String,
        /// Maximum number of predictions
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Delete one learned word
    Delete {
        /// Path to the history file
        file: PathBuf,
        /// Reading
        key: String,
        /// Surface
        value: String,
    },

    /// Delete everything
    ClearAll {
        /// Path to the history file
        file: PathBuf,
    },

    /// Delete words never picked from a suggestion
    ClearUnused {
        /// Path to the history file
        file: PathBuf,
    },

    /// Print a summary
    Stats {
        /// Path to the history file
        file: PathBuf,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if cli.verbose {
        init_tracing(cli.log_json);
    }

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Dump { file, json } => {
            die!(commands::dump(&file, json, &mut out), "Error dumping history: {}");
        }
        Command::Lookup {
            file,
            prefix,
            limit,
        } => {
            die!(
                commands::lookup(&file, &prefix, limit, &mut out),
                "Error looking up history: {}"
            );
        }
        Command::Delete { file, key, value } => {
            die!(commands::delete(&file, &key, &value), "Error deleting entry: {}");
            println!("Deleted: {key} → {value}");
        }
        Command::ClearAll { file } => {
            die!(commands::clear_all(&file), "Error clearing history: {}");
            println!("Cleared all history");
        }
        Command::ClearUnused { file } => {
            die!(commands::clear_unused(&file), "Error clearing history: {}");
            println!("Cleared unused history");
        }
        Command::Stats { file, json } => {
            let stats = die!(commands::stats(&file), "Error reading history: {}");
            if json {
                let text = die!(serde_json::to_string_pretty(&stats), "Error encoding stats: {}");
                println!("{text}");
            } else {
                println!("{stats}");
            }
        }
    }
}
