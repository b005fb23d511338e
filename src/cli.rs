//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `retrofs`.
#[derive(Debug, Parser)]
#[command(name = "retrofs", version, about = "Inspect and edit the retro desktop's virtual filesystem")]
pub struct Cli {
    /// Base URL of the game API; overrides RETROFS_REMOTE_URL.
    #[arg(long, global = true, value_name = "URL")]
    pub remote: Option<String>,
    /// Directory for local snapshot files; overrides RETROFS_DATA_DIR.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Keep everything in memory; nothing is loaded or saved.
    #[arg(long, global = true)]
    pub ephemeral: bool,
    /// Skip fetching the authoritative snapshot before running the command.
    #[arg(long, global = true)]
    pub offline: bool,
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a directory.
    Ls {
        /// Directory to list.
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a file.
    Cat {
        /// File to print.
        path: String,
    },
    /// Replace a file's content.
    Write {
        /// File to write.
        path: String,
        /// New content.
        content: String,
        /// Create the file and its parent directories if missing.
        #[arg(long)]
        create: bool,
    },
    /// Create a directory.
    Mkdir {
        /// Directory to create.
        path: String,
        /// Create missing parent directories too.
        #[arg(short, long)]
        parents: bool,
    },
    /// Create an empty file.
    Touch {
        /// File to create.
        path: String,
    },
    /// Delete a file or directory permanently.
    Rm {
        /// Path to delete.
        path: String,
    },
    /// Move or rename a file or directory.
    Mv {
        /// Existing path.
        from: String,
        /// New path.
        to: String,
    },
    /// Create the missing parent directories of a path.
    Ensure {
        /// Path whose ancestors should exist.
        path: String,
    },
    /// Count files by extension.
    Count {
        /// Extension suffix, e.g. `.log`.
        ext: String,
        /// Only count files inside this directory.
        #[arg(long)]
        base: Option<String>,
    },
    /// Print a directory tree.
    Tree {
        /// Directory to render.
        #[arg(default_value = "/")]
        path: String,
    },
    /// Verify the snapshot's structural invariants.
    Check,
    /// Work with the recycle bin.
    Recycle {
        /// Recycle bin action.
        #[command(subcommand)]
        action: RecycleAction,
    },
}

/// Recycle bin subcommands.
#[derive(Debug, Subcommand)]
pub enum RecycleAction {
    /// List recycled items.
    List,
    /// Move a path into the recycle bin.
    Delete {
        /// Path to recycle.
        path: String,
    },
    /// Put a recycled item back where it was.
    Restore {
        /// Recycle path of the item.
        recycle_path: String,
        /// Replace whatever now occupies the original path.
        #[arg(long)]
        force: bool,
    },
    /// Delete one recycled item for good.
    Purge {
        /// Recycle path of the item.
        recycle_path: String,
    },
    /// Delete every recycled item for good.
    Empty,
}
