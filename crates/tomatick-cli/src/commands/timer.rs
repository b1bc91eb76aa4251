use clap::Subcommand;

use super::{inspect, open_session};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Finish the current interval now and move to the next mode
    Skip,
    /// Refill the current interval without changing mode
    Reset,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let event = match action {
        TimerAction::Status => inspect()?.engine.snapshot(),
        TimerAction::Skip => open_session()?.skip(),
        TimerAction::Reset => open_session()?.reset(),
    };
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}
