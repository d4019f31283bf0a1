//! Command-line surface: wrapping a shell by default, or fetching a past
//! snapshot from a running session with `get`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "betterhist")]
#[command(about = "Wraps your shell and keeps a searchable, indexed history of what ran")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the markdown-formatted user/command view for one history entry
    Get {
        /// Entry index; negative counts back from the most recent (-1 is the last one)
        index: i64,
    },
}
