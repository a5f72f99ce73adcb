use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::app::VisibleBlock;
use crate::block::{get_block_text_content, Block, BlockContent};
use crate::edit_buffer::EditBuffer;
use crate::editor::presence::Presence;

use super::theme::Palette;

pub struct DocumentView<'a> {
    pub blocks: &'a [VisibleBlock<'a>],
    pub focused: Option<&'a str>,
    pub buffer: &'a EditBuffer,
    pub presence: &'a Presence,
    pub palette: Palette,
}

/// Marker drawn before each text line of a block.
fn line_markers(block: &Block, line_count: usize) -> Vec<String> {
    (0..line_count.max(1))
        .map(|i| match &block.content {
            BlockContent::Heading1 { .. } if i == 0 => "# ".to_string(),
            BlockContent::Heading2 { .. } if i == 0 => "## ".to_string(),
            BlockContent::Heading3 { .. } if i == 0 => "### ".to_string(),
            BlockContent::BulletedList { .. } => "• ".to_string(),
            BlockContent::NumberedList { start, .. } => format!("{}. ", *start as usize + i),
            BlockContent::Checklist { items } => {
                let checked = items.get(i).and_then(|item| item.checked).unwrap_or(false);
                (if checked { "[x] " } else { "[ ] " }).to_string()
            }
            BlockContent::Toggle { is_open: true, .. } if i == 0 => "▾ ".to_string(),
            BlockContent::Toggle { is_open: false, .. } if i == 0 => "▸ ".to_string(),
            BlockContent::Code { .. } => "┃ ".to_string(),
            BlockContent::Quote { .. } => "│ ".to_string(),
            _ => String::new(),
        })
        .collect()
}

/// Single-line stand-in for blocks without editable text.
fn describe(block: &Block) -> Option<String> {
    let text = match &block.content {
        BlockContent::Divider => "─".repeat(24),
        BlockContent::Image { url, .. } => format!("[image] {}", url),
        BlockContent::Bookmark { url, title, .. } => {
            format!("[bookmark] {}", title.as_deref().unwrap_or(url))
        }
        BlockContent::Embed { url, .. } => format!("[embed] {}", url),
        BlockContent::File { name, url, .. } => {
            format!("[file] {}", if name.is_empty() { url } else { name })
        }
        BlockContent::Page { page_id, title } => {
            format!("→ {}", title.as_deref().unwrap_or(page_id))
        }
        BlockContent::Table { rows, .. } => {
            let cols = rows.first().map_or(0, Vec::len);
            format!("[table {}x{}]", rows.len(), cols)
        }
        _ => return None,
    };
    Some(text)
}

fn block_style(block: &Block, palette: &Palette) -> Style {
    match &block.content {
        BlockContent::Heading1 { .. } => Style::default()
            .fg(palette.strong)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        BlockContent::Heading2 { .. } | BlockContent::Heading3 { .. } => Style::default()
            .fg(palette.strong)
            .add_modifier(Modifier::BOLD),
        BlockContent::Code { .. } => Style::default().fg(palette.code),
        BlockContent::Quote { .. } => Style::default()
            .fg(palette.text)
            .add_modifier(Modifier::ITALIC),
        BlockContent::Divider => Style::default().fg(palette.muted),
        BlockContent::Image { .. }
        | BlockContent::Bookmark { .. }
        | BlockContent::Embed { .. }
        | BlockContent::File { .. }
        | BlockContent::Page { .. }
        | BlockContent::Table { .. } => Style::default().fg(palette.accent),
        _ => Style::default().fg(palette.text),
    }
}

impl<'a> DocumentView<'a> {
    /// Appends the rows of one block. Returns the cursor row when focused.
    fn block_rows(
        &self,
        visible: &VisibleBlock<'_>,
        rows: &mut Vec<Line<'static>>,
    ) -> Option<usize> {
        let block = visible.block;
        let indent = "  ".repeat(visible.depth + 1);
        let is_focused = self.focused == Some(block.id.as_str());
        let base = block_style(block, &self.palette);
        let style = if is_focused {
            base.bg(self.palette.focus_bg)
        } else {
            base
        };

        if let Some(text) = describe(block) {
            let row = rows.len();
            rows.push(Line::from(vec![
                Span::styled(indent, style),
                Span::styled(text, style),
            ]));
            return is_focused.then_some(row);
        }

        let text = if is_focused {
            self.buffer.text()
        } else {
            get_block_text_content(block)
        };
        let lines: Vec<&str> = text.split('\n').collect();
        let markers = line_markers(block, lines.len());
        let cursor = is_focused.then(|| self.buffer.line_column());
        let checked = |i: usize| match &block.content {
            BlockContent::Checklist { items } => {
                items.get(i).and_then(|item| item.checked).unwrap_or(false)
            }
            _ => false,
        };

        let start_row = rows.len();
        for (i, line) in lines.iter().enumerate() {
            let marker = markers.get(i).cloned().unwrap_or_default();
            let pad = if marker.is_empty() && i > 0 {
                " ".repeat(markers[0].chars().count())
            } else {
                marker
            };
            let line_style = if checked(i) {
                style.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
            } else {
                style
            };
            let mut spans = vec![Span::styled(format!("{}{}", indent, pad), style)];

            match cursor {
                Some((cursor_line, col)) if cursor_line == i => {
                    let chars: Vec<char> = line.chars().collect();
                    let before: String = chars[..col].iter().collect();
                    let at = chars.get(col).copied().unwrap_or(' ');
                    let after: String = chars.iter().skip(col + 1).collect();
                    spans.push(Span::styled(before, line_style));
                    spans.push(Span::styled(
                        at.to_string(),
                        Style::default()
                            .fg(self.palette.cursor_fg)
                            .bg(self.palette.cursor_bg),
                    ));
                    if !after.is_empty() {
                        spans.push(Span::styled(after, line_style));
                    }
                }
                _ => spans.push(Span::styled(line.to_string(), line_style)),
            }

            if i == 0 {
                for collaborator in self.presence.cursors_in(&block.id) {
                    spans.push(Span::styled(
                        format!(" ‹{}›", collaborator.user_name),
                        Style::default().fg(self.palette.presence),
                    ));
                }
            }
            rows.push(Line::from(spans));
        }

        cursor.map(|(line, _)| start_row + line)
    }
}

impl<'a> Widget for DocumentView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.blocks.is_empty() {
            if area.height > 0 {
                let line = Line::styled(" Empty document", Style::default().fg(self.palette.muted));
                let y = area.y + area.height / 2;
                line.render(Rect::new(area.x, y, area.width, 1), buf);
            }
            return;
        }

        let mut rows: Vec<Line<'static>> = Vec::new();
        let mut selected_row = 0;
        for visible in self.blocks {
            if let Some(row) = self.block_rows(visible, &mut rows) {
                selected_row = row;
            }
        }

        // half-page centering on the cursor row
        let viewport_height = area.height as usize;
        let half = viewport_height / 2;
        let scroll_offset = if selected_row > half {
            (selected_row - half).min(rows.len().saturating_sub(viewport_height))
        } else {
            0
        };

        for (i, row) in rows.into_iter().skip(scroll_offset).enumerate() {
            if i >= viewport_height {
                break;
            }
            let y = area.y + i as u16;
            row.render(Rect::new(area.x, y, area.width, 1), buf);
        }
    }
}
