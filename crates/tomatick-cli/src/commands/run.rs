//! Interactive session: a real 1 Hz countdown driven by a current-thread
//! tokio runtime, with line-based keyboard input on stdin.
//!
//! Ticks and input lines are handled by the same loop, one at a time.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tomatick_core::storage::SoundConfig;
use tomatick_core::{
    AudioCue, AudioSink, Config, FocusSession, HistoryEntry, Input, ModeDefinition, RenderSink,
    SqliteStore, TimerView, TokioScheduler,
};

const HELP: &str = "\
keys: <enter>/space start-pause   t toggle   s skip   h history
      r <n> remove entry   c clear history   q quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Input(Input),
    AskClear,
    ShowHistory,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == "space" {
        return Command::Input(Input::SpacePressed);
    }
    let mut parts = trimmed.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("t"), None) => Command::Input(Input::ToggleClicked),
        (Some("s"), None) => Command::Input(Input::SkipClicked),
        (Some("h"), None) => Command::ShowHistory,
        (Some("c"), None) => Command::AskClear,
        (Some("q"), None) => Command::Quit,
        (Some("?"), None) => Command::Help,
        (Some("r"), Some(index)) => match index.parse() {
            Ok(index) => Command::Input(Input::RemoveHistory(index)),
            Err(_) => Command::Unknown(trimmed.to_string()),
        },
        _ => Command::Unknown(trimmed.to_string()),
    }
}

/// `#RRGGBB` to a 24-bit ANSI foreground escape.
fn ansi_fg(hex: &str) -> Option<String> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some(format!(
        "\x1b[38;2;{};{};{}m",
        channel(0..2)?,
        channel(2..4)?,
        channel(4..6)?
    ))
}

const RESET: &str = "\x1b[0m";

#[derive(Default)]
struct TerminalRenderer {
    accent: String,
}

impl RenderSink for TerminalRenderer {
    fn render_timer(&mut self, view: &TimerView) {
        let filled = ((100.0 - view.remaining_pct) / 5.0).round() as usize;
        let bar = format!("{}{}", "#".repeat(filled.min(20)), ".".repeat(20 - filled.min(20)));
        let mut out = std::io::stdout();
        let _ = write!(
            out,
            "\r{}{:<12}{} {} [{}] {:>5.1}%  ({})   ",
            self.accent,
            view.label,
            RESET,
            view.clock,
            bar,
            view.remaining_pct,
            view.toggle_label()
        );
        let _ = out.flush();
    }

    fn render_mode(&mut self, mode: &ModeDefinition) {
        self.accent = ansi_fg(&mode.theme.accent).unwrap_or_default();
        println!("\n{}== {} =={}", self.accent, mode.label, RESET);
    }

    fn render_history(&mut self, entries: &[HistoryEntry]) {
        print_history(entries);
    }
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("\nNo History");
        return;
    }
    println!("\nHistory");
    for (index, entry) in entries.iter().enumerate() {
        println!("{index:>3}  {}", entry.describe());
    }
}

/// Terminal bell in place of audio playback.
struct TerminalBell {
    enabled: bool,
    click: bool,
}

impl TerminalBell {
    fn new(config: &SoundConfig) -> Self {
        Self {
            enabled: config.enabled,
            click: config.click,
        }
    }
}

impl AudioSink for TerminalBell {
    fn play(&mut self, cue: AudioCue) {
        tracing::debug!(?cue, "audio cue");
        let ring = match cue {
            AudioCue::Alarm => self.enabled,
            AudioCue::Click => self.enabled && self.click,
        };
        if ring {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop(config))
}

async fn event_loop(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let (scheduler, mut ticks) = TokioScheduler::new();
    let mut session = FocusSession::open(store, scheduler, config.session_options())
        .with_render_sink(TerminalRenderer::default())
        .with_audio_sink(TerminalBell::new(&config.sound));

    println!("{HELP}");
    session.render();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_clear = false;
    loop {
        tokio::select! {
            Some(task) = ticks.recv() => {
                session.on_tick(task);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if pending_clear {
                    pending_clear = false;
                    let confirmed = line.trim().eq_ignore_ascii_case("y");
                    session.handle_input(Input::ClearHistory { confirmed })?;
                    continue;
                }
                match parse_command(&line) {
                    Command::Input(input) => {
                        if let Err(e) = session.handle_input(input) {
                            eprintln!("\nerror: {e}");
                        }
                    }
                    Command::AskClear => {
                        print!("\nClear all history? [y/N] ");
                        std::io::stdout().flush()?;
                        pending_clear = true;
                    }
                    Command::ShowHistory => print_history(session.history().all()),
                    Command::Help => println!("\n{HELP}"),
                    Command::Quit => break,
                    Command::Unknown(text) => eprintln!("\nunknown command: {text} (? for help)"),
                }
            }
        }
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_space_and_enter_as_shortcut() {
        assert_eq!(parse_command(""), Command::Input(Input::SpacePressed));
        assert_eq!(parse_command(" "), Command::Input(Input::SpacePressed));
        assert_eq!(parse_command("space"), Command::Input(Input::SpacePressed));
    }

    #[test]
    fn parse_letter_commands() {
        assert_eq!(parse_command("t"), Command::Input(Input::ToggleClicked));
        assert_eq!(parse_command("s\n"), Command::Input(Input::SkipClicked));
        assert_eq!(parse_command("r 2"), Command::Input(Input::RemoveHistory(2)));
        assert_eq!(parse_command("c"), Command::AskClear);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("r x"), Command::Unknown("r x".into()));
        assert_eq!(parse_command("dance"), Command::Unknown("dance".into()));
    }

    #[test]
    fn accent_hex_to_ansi() {
        assert_eq!(ansi_fg("#E85D60").as_deref(), Some("\x1b[38;2;232;93;96m"));
        assert_eq!(ansi_fg("E85D60"), None);
        assert_eq!(ansi_fg("#E85"), None);
        assert_eq!(ansi_fg("#GG0000"), None);
    }
}
