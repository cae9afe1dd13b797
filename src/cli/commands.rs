use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lk", about = concat!("listkeep v", env!("CARGO_PKG_VERSION"), " - a list that remembers"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all items
    List,
    /// Show one item
    Show(ShowArgs),
    /// Append an item to the end of the list
    Add(AddArgs),
    /// Change an item's title or description
    Edit(EditArgs),
    /// Delete an item
    Delete(DeleteArgs),
    /// Show entries from the recovery log
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Item number (1-based, as shown by `lk list`)
    pub index: usize,
}

#[derive(Args)]
pub struct AddArgs {
    /// Item title (default: "Item N")
    pub title: Option<String>,
    /// Item description
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Item number (1-based)
    pub index: usize,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description (pass "" to clear)
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Item number (1-based)
    pub index: usize,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}
