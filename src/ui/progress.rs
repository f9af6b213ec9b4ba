//! Progress observers used by the `download` command

use std::io::{self, Stdout};

use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Style},
    Terminal, TerminalOptions, Viewport,
};
use tracing::{info, warn};

use super::widgets::TileProgressBar;
use crate::cache::{DownloadProgress, ProgressObserver};

/// Draws a one-line progress bar below the cursor
///
/// Redraws only when the whole percentage changes, so very large regions do
/// not spend their time repainting the terminal.
pub struct TerminalProgress {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    title: String,
    last_percent: Option<u64>,
    /// Set after a failed draw; further updates are ignored
    broken: bool,
}

impl TerminalProgress {
    pub fn new(title: impl Into<String>) -> io::Result<Self> {
        let terminal = Terminal::with_options(
            CrosstermBackend::new(io::stdout()),
            TerminalOptions {
                viewport: Viewport::Inline(1),
            },
        )?;
        Ok(Self {
            terminal,
            title: title.into(),
            last_percent: None,
            broken: false,
        })
    }

    fn draw(&mut self, progress: DownloadProgress) -> io::Result<()> {
        let style = if progress.downloaded == progress.total {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let title = &self.title;
        self.terminal.draw(|frame| {
            frame.render_widget(TileProgressBar::new(title, progress).style(style), frame.area())
        })?;
        Ok(())
    }

    /// Restores the cursor and moves past the progress line
    pub fn finish(mut self) -> io::Result<()> {
        self.terminal.show_cursor()?;
        println!();
        Ok(())
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&mut self, progress: DownloadProgress) {
        if self.broken {
            return;
        }
        let percent = (progress.ratio() * 100.0) as u64;
        if self.last_percent == Some(percent) && progress.downloaded != progress.total {
            return;
        }
        self.last_percent = Some(percent);

        if let Err(e) = self.draw(progress) {
            warn!(error = %e, "Failed to draw progress bar");
            self.broken = true;
        }
    }
}

/// Logs progress through tracing every `step_percent` percent
#[derive(Debug, Clone)]
pub struct LogProgress {
    step_percent: u64,
    next_percent: u64,
}

impl LogProgress {
    pub fn new(step_percent: u64) -> Self {
        let step_percent = step_percent.clamp(1, 100);
        Self {
            step_percent,
            next_percent: step_percent,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, progress: DownloadProgress) {
        let percent = (progress.ratio() * 100.0) as u64;
        if percent < self.next_percent {
            return;
        }
        info!(
            downloaded = progress.downloaded,
            total = progress.total,
            fetched = progress.fetched,
            skipped = progress.skipped,
            "Download {}% complete",
            percent
        );
        self.next_percent = (percent / self.step_percent + 1) * self.step_percent;
    }
}
