use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use super::theme::Palette;

pub struct StatusBar<'a> {
    pub hints: &'a [(String, &'static str)],
    pub message: Option<&'a str>,
    /// Type name of the focused block.
    pub block_kind: Option<&'a str>,
    pub palette: Palette,
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        if let Some(kind) = self.block_kind {
            spans.push(Span::styled(
                format!(" {} ", kind),
                Style::default()
                    .fg(self.palette.on_accent)
                    .bg(self.palette.accent),
            ));
        }

        if let Some(msg) = self.message {
            spans.push(Span::styled(
                format!(" {} ", msg),
                Style::default().fg(Color::Yellow),
            ));
            Line::from(spans).render(area, buf);
            return;
        }

        spans.push(Span::raw(" "));
        for (i, (key, action)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Style::default().fg(self.palette.muted)));
            }
            spans.push(Span::styled(
                format!("[{}]", key),
                Style::default().fg(self.palette.accent),
            ));
            spans.push(Span::styled(
                action.to_string(),
                Style::default()
                    .fg(self.palette.muted)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans);
        line.render(area, buf);
    }
}
