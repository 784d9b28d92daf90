//! Terminal rendering of merge progress.
//!
//! [`ProgressBar`] draws a [`MergeProgress`] state on one terminal line.
//! [`follow`] drives a bar from a progress receiver until the merge ends.
//!
//! # Examples
//!
//! ```
//! use pdfcollate::merge::MergeProgress;
//! use pdfcollate::output::progress::{ProgressBar, ProgressStyle};
//!
//! let mut bar = ProgressBar::new(ProgressStyle::Bar);
//! bar.apply(&MergeProgress::processing("Copied page 1 of 4", 22));
//! bar.apply(&MergeProgress::complete("Merged 4 page(s)"));
//! ```

use std::io::{self, IsTerminal, Write};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::merge::MergeProgress;

/// Style of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Classic progress bar: [=====>    ]
    Bar,
    /// Spinner with the current message.
    Spinner,
}

/// Single-line progress display.
#[derive(Debug)]
pub struct ProgressBar {
    style: ProgressStyle,
    percent: u8,
    message: Option<String>,
    start_time: Instant,
    last_update: Instant,
    update_interval: Duration,
    enabled: bool,
    spinner_frame: usize,
}

impl ProgressBar {
    /// Create a progress bar, enabled only when stdout is a terminal.
    pub fn new(style: ProgressStyle) -> Self {
        Self {
            style,
            percent: 0,
            message: None,
            start_time: Instant::now(),
            last_update: Instant::now(),
            update_interval: Duration::from_millis(100),
            enabled: io::stdout().is_terminal(),
            spinner_frame: 0,
        }
    }

    /// Create a disabled progress bar (no output).
    pub fn disabled() -> Self {
        let mut bar = Self::new(ProgressStyle::Bar);
        bar.enabled = false;
        bar
    }

    /// Reflect a progress state.
    ///
    /// Intermediate states are rate limited; terminal states always render
    /// and end the line.
    pub fn apply(&mut self, state: &MergeProgress) {
        if let Some(percent) = state.percent() {
            self.percent = percent;
        }
        self.message = state.message().map(str::to_string);

        if state.is_terminal() || matches!(state, MergeProgress::Idle) {
            self.finish();
            return;
        }

        if self.last_update.elapsed() < self.update_interval {
            return;
        }
        self.last_update = Instant::now();
        self.render();
    }

    /// Draw the final state and end the line.
    pub fn finish(&mut self) {
        if self.enabled {
            self.render();
            println!();
        }
    }

    /// Current percent.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Current message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn render(&mut self) {
        if !self.enabled {
            return;
        }
        let line = match self.style {
            ProgressStyle::Bar => self.render_bar(),
            ProgressStyle::Spinner => self.render_spinner(),
        };
        print!("\r\x1b[K{line}");
        io::stdout().flush().ok();
    }

    fn render_bar(&self) -> String {
        const WIDTH: usize = 40;
        let filled = WIDTH * usize::from(self.percent) / 100;
        let arrow = if filled > 0 && filled < WIDTH { ">" } else { "" };
        let bar = format!(
            "[{}{}{}]",
            "=".repeat(filled.saturating_sub(arrow.len())),
            arrow,
            " ".repeat(WIDTH - filled)
        );

        let mut parts = vec![
            bar,
            format!("{:>3}%", self.percent),
            format_duration(self.start_time.elapsed()),
        ];
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        parts.join(" ")
    }

    fn render_spinner(&mut self) -> String {
        const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let frame = FRAMES[self.spinner_frame % FRAMES.len()];
        self.spinner_frame += 1;

        match &self.message {
            Some(message) => format!("{frame} {message}"),
            None => frame.to_string(),
        }
    }
}

/// Render every update from `progress` on `bar` until the merge completes,
/// fails or is cancelled.
pub async fn follow(mut progress: watch::Receiver<MergeProgress>, mut bar: ProgressBar) {
    while progress.changed().await.is_ok() {
        let state = progress.borrow_and_update().clone();
        bar.apply(&state);
        if state.is_terminal() || matches!(state, MergeProgress::Idle) {
            break;
        }
    }
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
