use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about = "Kanban task board in the terminal")]
pub struct Cli {
    /// Directory holding the saved board and the log file
    #[arg(long, env = "TASKBOARD_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Keep the board in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Erase the saved board and exit
    Reset,
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub in_memory: bool,
    pub debug: bool,
}

impl Config {
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("taskboard.log")
    }

    /// `RUST_LOG`-style filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> &'static str {
        if self.debug {
            "taskboard=debug"
        } else {
            "taskboard=info"
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            in_memory: cli.in_memory,
            debug: cli.debug,
        }
    }
}
