use clap::Subcommand;

use super::{inspect, open_session};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List finished sessions, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one entry by its position in the list
    Remove {
        index: usize,
    },
    /// Remove every entry
    Clear {
        /// Confirm clearing the whole history
        #[arg(long)]
        yes: bool,
    },
    /// Totals per mode
    Stats,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        HistoryAction::List { json } => {
            let saved = inspect()?;
            let entries = saved.history.all();
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else if entries.is_empty() {
                println!("No History");
            } else {
                println!("History");
                for (index, entry) in entries.iter().enumerate() {
                    println!("{index:>3}  {}", entry.describe());
                }
            }
        }
        HistoryAction::Remove { index } => {
            let event = open_session()?.remove_history(index)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        HistoryAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear history without --yes".into());
            }
            let event = open_session()?.clear_history();
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        HistoryAction::Stats => {
            let stats = inspect()?.history.stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
