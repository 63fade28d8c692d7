use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mdkanban", about = "Kanban boards stored as markdown checkbox lists")]
pub struct Cli {
    /// Path to the board file [default: board.file from config, else ./board.md]
    #[arg(long, env = "MDKANBAN_FILE", global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new board file
    Init {
        /// Lane to create (repeatable) [default: board.default_lanes from config]
        #[arg(long = "lane")]
        lanes: Vec<String>,
    },

    /// Print the board
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Include lane and card ids
        #[arg(long)]
        ids: bool,
    },

    /// Rewrite the file in canonical form
    Fmt {
        /// Exit non-zero if the file is not canonical, without writing
        #[arg(long)]
        check: bool,
    },

    /// Mark a card complete
    Done {
        /// Card id or exact title
        card: String,
    },

    /// Mark a card incomplete
    Reopen {
        /// Card id or exact title
        card: String,
    },

    /// Move a card to another lane
    Mv {
        /// Card id or exact title
        card: String,
        /// Lane id or exact title
        lane: String,
        /// Position among the lane's top-level cards [default: end]
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Move completed top-level cards to the archive
    Archive,

    /// Launch interactive board, reloading on external edits
    Watch {
        /// Poll interval in milliseconds [default: watch.poll_interval from config, else 250]
        #[arg(long)]
        poll_interval: Option<u64>,
    },

    /// Block until the board file changes
    Wait,
}
