use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::sync::SyncStatus;

use super::theme::Palette;

pub struct Header<'a> {
    pub title: &'a str,
    pub status: &'a SyncStatus,
    pub connected: bool,
    pub palette: Palette,
}

impl<'a> Widget for Header<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = Style::default().bg(self.palette.bar_bg);
        let name = Span::styled(
            " blockdoc ",
            bg.fg(self.palette.bar_text).add_modifier(Modifier::BOLD),
        );

        let title = if self.title.is_empty() {
            "Untitled"
        } else {
            self.title
        };
        let title = Span::styled(
            format!(" [{}] ", title),
            bg.fg(self.palette.accent),
        );

        let status_color = match self.status {
            SyncStatus::Saved => Color::Green,
            SyncStatus::Pending => Color::Yellow,
            SyncStatus::Failed(_) => Color::Red,
        };
        let status = Span::styled(
            format!("{} ", self.status.label()),
            bg.fg(status_color),
        );
        let live = Span::styled(
            if self.connected { "● live " } else { "" },
            bg.fg(self.palette.presence),
        );

        let used = name.width() + title.width() + status.width() + live.width();
        let spacer_len = (area.width as usize).saturating_sub(used);
        let spacer = Span::styled(" ".repeat(spacer_len), bg);

        let line = Line::from(vec![name, title, spacer, live, status]);
        line.render(area, buf);
    }
}
