use clap::Subcommand;
use tomatick_core::ModeId;

use super::{inspect, open_session};

#[derive(Subcommand)]
pub enum ModesAction {
    /// Print all mode definitions as JSON
    List,
    /// Change a mode's duration
    SetDuration {
        /// pomodoro, shortBreak or longBreak
        mode: String,
        seconds: u64,
    },
    /// Change a mode's display label
    SetLabel {
        /// pomodoro, shortBreak or longBreak
        mode: String,
        label: String,
    },
}

pub fn run(action: ModesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ModesAction::List => {
            let settings = inspect()?.engine.catalog().settings();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ModesAction::SetDuration { mode, seconds } => {
            let id: ModeId = mode.parse()?;
            open_session()?.update_catalog(|catalog| catalog.set_duration(id, seconds))?;
            println!("ok");
        }
        ModesAction::SetLabel { mode, label } => {
            let id: ModeId = mode.parse()?;
            open_session()?.update_catalog(|catalog| {
                catalog.set_label(id, label);
                Ok(())
            })?;
            println!("ok");
        }
    }
    Ok(())
}
