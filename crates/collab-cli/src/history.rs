//! `history` subcommands over the recent-search list.

use clap::Subcommand;
use collab_core::{extract_domain, HistoryEntry};
use collab_store::Stores;

/// Sub-commands available under `history`.
#[derive(Debug, Subcommand)]
pub enum HistoryCommands {
    /// Show recent searches, newest first
    List,
    /// Remove one domain from the history
    Remove {
        /// Domain or URL to remove
        domain: String,
    },
    /// Forget every recent search
    Clear,
}

pub(crate) fn run_history(stores: &Stores, command: &HistoryCommands) -> anyhow::Result<()> {
    match command {
        HistoryCommands::List => print_entries(&stores.history.list()?),
        HistoryCommands::Remove { domain } => {
            let domain = extract_domain(domain);
            let remaining = stores.history.remove(&domain)?;
            println!("Removed {domain}");
            print_entries(&remaining);
        }
        HistoryCommands::Clear => {
            stores.history.clear()?;
            println!("Search history cleared");
        }
    }
    Ok(())
}

fn print_entries(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No recent searches");
        return;
    }
    for entry in entries {
        println!(
            "{:<32} {}",
            entry.domain,
            entry.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
}
