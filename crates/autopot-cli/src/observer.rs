//! Console rendering of worker events.

use std::collections::VecDeque;

use autopot_core::{StatusEvent, StatusKind, format_hp_status};
use chrono::{DateTime, Local};
use crossbeam_channel::Receiver;
use owo_colors::OwoColorize;

/// Number of potion uses kept for the summary.
pub const MAX_POTION_LOGS: usize = 5;

/// Turns worker events into console lines.
///
/// HP and threshold arrive every poll; a line is only printed when the
/// rendered text changes.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    current: Option<f32>,
    max: Option<f32>,
    threshold: Option<f32>,
    last_hp_line: Option<String>,
    potion_logs: VecDeque<String>,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print events until the worker drops its end of the channel.
    pub fn run(&mut self, events: &Receiver<StatusEvent>) {
        while let Ok(event) = events.recv() {
            if let Some(line) = self.handle(event, Local::now()) {
                println!("{}", line);
            }
        }
    }

    /// Update state from one event; returns the line to print, if any.
    pub fn handle(&mut self, event: StatusEvent, now: DateTime<Local>) -> Option<String> {
        let time = now.format("%H:%M:%S").to_string();
        match event {
            StatusEvent::StatusChanged { text, kind } => {
                if kind != StatusKind::On {
                    self.last_hp_line = None;
                }
                Some(format!("[{}] {}", time.dimmed(), colorize(&text, kind)))
            }
            StatusEvent::HpChanged { current, max } => {
                self.current = Some(current);
                self.max = max;
                None
            }
            // Always follows HpChanged, so the pair is complete here
            StatusEvent::ThresholdChanged { value } => {
                self.threshold = value;
                let current = self.current?;
                let line = format_hp_status(current, self.max, self.threshold);
                if self.last_hp_line.as_deref() == Some(line.as_str()) {
                    return None;
                }
                self.last_hp_line = Some(line.clone());
                Some(format!("[{}] {}", time.dimmed(), line))
            }
            StatusEvent::PotionLogged { value, max } => {
                let entry = format_potion_entry(&time, value, max);
                self.potion_logs.push_front(entry.clone());
                self.potion_logs.truncate(MAX_POTION_LOGS);
                Some(format!("{} {}", "Potion".magenta().bold(), entry))
            }
        }
    }

    /// Most recent potion uses, newest first.
    pub fn potion_logs(&self) -> impl Iterator<Item = &str> {
        self.potion_logs.iter().map(String::as_str)
    }

    pub fn print_summary(&self) {
        if self.potion_logs.is_empty() {
            return;
        }
        println!("Recent potions:");
        for entry in self.potion_logs() {
            println!("  {}", entry);
        }
    }
}

/// `HH:MM:SS   <hp>   <pct>%`, or without the percentage when max is unknown.
pub fn format_potion_entry(time: &str, value: f32, max: Option<f32>) -> String {
    match max {
        Some(max) if max > 0.0 => format!(
            "{}   {:>5}   {:5.1}%",
            time,
            value as i64,
            value / max * 100.0
        ),
        _ => format!("{}   {:>5}", time, value as i64),
    }
}

fn colorize(text: &str, kind: StatusKind) -> String {
    match kind {
        StatusKind::Off | StatusKind::Error => text.red().to_string(),
        StatusKind::On => text.green().to_string(),
        StatusKind::Waiting => text.yellow().to_string(),
        StatusKind::Paused => text.blue().to_string(),
    }
}
