//! Tile download progress bar widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::cache::DownloadProgress;

/// Partial block characters for eighths of a cell
const EIGHTHS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Fully filled cell
const FULL: char = '█';

/// Narrowest bar drawn before the label takes the whole line
const MIN_BAR_WIDTH: u16 = 10;

/// A one-line bar showing how far a region download has got
pub struct TileProgressBar<'a> {
    progress: DownloadProgress,
    /// Region name shown before the bar
    title: &'a str,
    /// Style for the filled part of the bar
    style: Style,
    /// Style for the counts label
    label_style: Style,
}

impl<'a> TileProgressBar<'a> {
    pub fn new(title: &'a str, progress: DownloadProgress) -> Self {
        Self {
            progress,
            title,
            style: Style::default().fg(Color::Cyan),
            label_style: Style::default().fg(Color::Gray),
        }
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Text drawn to the right of the bar
    fn label(&self) -> String {
        let p = &self.progress;
        format!(
            " {}/{} tiles ({:.0}%) fetched {}, cached {}",
            p.downloaded,
            p.total,
            p.ratio() * 100.0,
            p.fetched,
            p.skipped
        )
    }

    /// Characters filling a bar of `width` cells
    fn bar_chars(&self, width: u16) -> Vec<char> {
        let eighths = (self.progress.ratio() * width as f64 * 8.0).floor() as usize;
        let full = (eighths / 8).min(width as usize);

        let mut chars = vec![FULL; full];
        if full < width as usize {
            chars.push(EIGHTHS[eighths % 8]);
        }
        chars.resize(width as usize, ' ');
        chars
    }
}

impl<'a> Widget for TileProgressBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let title = format!("{} ", self.title);
        let label = self.label();
        let text_width = (title.chars().count() + label.chars().count()) as u16;
        let (x, y) = (area.x, area.y);

        if area.width < text_width + MIN_BAR_WIDTH {
            buf.set_stringn(x, y, title + &label, area.width as usize, self.label_style);
            return;
        }

        let bar_width = area.width - text_width;
        let (bar_x, _) = buf.set_stringn(x, y, &title, title.chars().count(), self.label_style);

        for (i, ch) in self.bar_chars(bar_width).into_iter().enumerate() {
            if let Some(cell) = buf.cell_mut((bar_x + i as u16, y)) {
                cell.set_char(ch).set_style(self.style);
            }
        }

        buf.set_stringn(
            bar_x + bar_width,
            y,
            &label,
            label.chars().count(),
            self.label_style,
        );
    }
}
