//! Line-oriented commands and rendering for the terminal front end.

use crate::mood::Mood;
use crate::session::{
    BreathingSettings, CircleVisual, SessionSnapshot, SessionStatus, DURATION_OPTIONS,
    ROUND_OPTIONS,
};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    Toggle,
    Reset,
    Settings { phase_duration_seconds: u32, total_rounds: u32 },
    Sound(bool),
    Haptic(bool),
    Mood(Mood),
    Again,
    Home,
    Latest,
    ClearHistory,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        // Bare enter toggles, like tapping the circle.
        return Ok(ConsoleCommand::Toggle);
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "s" | "start" | "pause" | "toggle" => ConsoleCommand::Toggle,
        "r" | "reset" => ConsoleCommand::Reset,
        "settings" | "set" => {
            let duration = parse_number(parts.next(), "phase duration")?;
            let rounds = parse_number(parts.next(), "rounds")?;
            ConsoleCommand::Settings {
                phase_duration_seconds: duration,
                total_rounds: rounds,
            }
        }
        "sound" => ConsoleCommand::Sound(parse_switch(parts.next())?),
        "haptic" | "haptics" => ConsoleCommand::Haptic(parse_switch(parts.next())?),
        "mood" => {
            let label = parts.next().ok_or("usage: mood <amazing|good|okay|down|stressed>")?;
            ConsoleCommand::Mood(label.parse().map_err(|e| format!("{}", e))?)
        }
        "again" => ConsoleCommand::Again,
        "home" => ConsoleCommand::Home,
        "latest" => ConsoleCommand::Latest,
        "clear-history" => ConsoleCommand::ClearHistory,
        "h" | "help" | "?" => ConsoleCommand::Help,
        "q" | "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };

    if parts.next().is_some() {
        return Err(format!("too many arguments for '{}'", head));
    }
    Ok(command)
}

fn parse_number(value: Option<&str>, what: &str) -> Result<u32, String> {
    let value = value.ok_or_else(|| format!("missing {}", what))?;
    value
        .parse::<u32>()
        .map_err(|_| format!("invalid {}: {}", what, value))
}

fn parse_switch(value: Option<&str>) -> Result<bool, String> {
    match value.map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        _ => Err("expected 'on' or 'off'".to_string()),
    }
}

/// Applies a settings-changing command on top of `current`.
pub fn settings_for(command: ConsoleCommand, current: BreathingSettings) -> Option<BreathingSettings> {
    match command {
        ConsoleCommand::Settings {
            phase_duration_seconds,
            total_rounds,
        } => Some(BreathingSettings {
            phase_duration_seconds,
            total_rounds,
            ..current
        }),
        ConsoleCommand::Sound(enabled) => Some(BreathingSettings {
            sound_enabled: enabled,
            ..current
        }),
        ConsoleCommand::Haptic(enabled) => Some(BreathingSettings {
            haptic_enabled: enabled,
            ..current
        }),
        _ => None,
    }
}

pub fn render_line(snapshot: &SessionSnapshot) -> String {
    if snapshot.status == SessionStatus::Completed {
        return format!(
            "Session Complete! {} rounds finished",
            snapshot.total_rounds
        );
    }

    let visual = CircleVisual::from_snapshot(snapshot);
    let rounds = snapshot.rounds();
    let filled = ((snapshot.progress_percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let state = match snapshot.status {
        SessionStatus::Running => "",
        _ => " (paused)",
    };

    format!(
        "Round {} of {} | {:<11} [{}{}] {:>3.0}% x{:.2}{}",
        rounds.current_round,
        rounds.total_rounds,
        visual.instruction,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        snapshot.progress_percent,
        visual.scale,
        state
    )
}

pub fn help_text() -> String {
    let durations: Vec<String> = DURATION_OPTIONS.iter().map(|d| d.to_string()).collect();
    let rounds: Vec<String> = ROUND_OPTIONS.iter().map(|r| r.to_string()).collect();
    let moods: Vec<String> = Mood::ALL.iter().map(|m| m.to_string()).collect();

    format!(
        "Commands:\n  \
         <enter> | start | pause   toggle the session\n  \
         reset                     back to round 1\n  \
         settings <secs> <rounds>  secs: {} rounds: {}\n  \
         sound on|off, haptic on|off\n  \
         mood <name>               after completion: {}\n  \
         again | home              start again or leave\n  \
         latest                    show the last logged mood\n  \
         clear-history             forget recorded sessions\n  \
         quit",
        durations.join("/"),
        rounds.join("/"),
        moods.join(", ")
    )
}
