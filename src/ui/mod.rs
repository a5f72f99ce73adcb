pub mod document;
pub mod header;
pub mod status_bar;
pub mod theme;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block as WidgetBlock, BorderType, Borders, Clear};
use ratatui::Frame;

use crate::app::AppState;
use crate::block::block_type_name;
use crate::error::ErrorNotice;
use crate::slash::SlashMenuState;

use document::DocumentView;
use header::Header;
use status_bar::StatusBar;
use theme::Palette;

pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let palette = Palette::for_theme(state.theme);
    let editor = state.editor();
    let header = Header {
        title: editor.title(),
        status: state.session.status(),
        connected: state.session.is_connected(),
        palette,
    };
    frame.render_widget(header, chunks[0]);

    let visible = state.visible_blocks();
    let document = DocumentView {
        blocks: &visible,
        focused: editor.focused_block_id(),
        buffer: &state.buffer,
        presence: editor.presence(),
        palette,
    };
    frame.render_widget(document, chunks[1]);

    if let Some(menu) = &state.slash {
        render_slash_popup(frame, menu, chunks[1], &palette);
    }

    if let Some(err) = &state.error_popup {
        render_error_popup(frame, err, chunks[1], &palette);
    }

    let status = StatusBar {
        hints: &state.hints,
        message: state.status_message.as_deref(),
        block_kind: state
            .focused_block()
            .map(|block| block_type_name(block.block_type())),
        palette,
    };
    frame.render_widget(status, chunks[2]);
}

fn render_slash_popup(frame: &mut Frame, menu: &SlashMenuState, area: Rect, palette: &Palette) {
    let max_items = if menu.commands.is_empty() {
        1 // room for "No matching blocks"
    } else {
        10.min(menu.commands.len())
    };
    let popup_height = (max_items + 2) as u16; // +2 for borders
    let popup_width = (area.width * 60 / 100).max(30).min(area.width);
    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.y + area.height / 2).min(area.y + area.height.saturating_sub(popup_height));

    let popup_area = Rect::new(x, y, popup_width, popup_height);
    frame.render_widget(Clear, popup_area);

    let title = if menu.query.is_empty() {
        " Turn into ".to_string()
    } else {
        format!(" /{} ", menu.query)
    };

    let block = WidgetBlock::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.accent))
        .title(title);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    if menu.commands.is_empty() {
        let style = Style::default().fg(palette.muted);
        let line = Line::from(vec![Span::styled("No matching blocks", style)]);
        frame.render_widget(line, Rect::new(inner.x, inner.y, inner.width, 1));
        return;
    }

    let scroll_offset = if menu.selected >= max_items {
        menu.selected - max_items + 1
    } else {
        0
    };

    for (i, command) in menu
        .commands
        .iter()
        .skip(scroll_offset)
        .take(max_items)
        .enumerate()
    {
        if i as u16 >= inner.height {
            break;
        }
        let is_selected = (i + scroll_offset) == menu.selected;
        let (style, muted) = if is_selected {
            (
                Style::default().fg(palette.strong).bg(palette.focus_bg),
                Style::default().fg(palette.text).bg(palette.focus_bg),
            )
        } else {
            (
                Style::default().fg(palette.text),
                Style::default().fg(palette.muted),
            )
        };

        let max_text_width = inner.width as usize;
        let label = format!("{:>3} {}", command.icon, command.name);
        let description = format!("  {}", command.description);
        let room = max_text_width.saturating_sub(label.chars().count());
        let description: String = description.chars().take(room).collect();
        let padding = room.saturating_sub(description.chars().count());

        let line = Line::from(vec![
            Span::styled(label, style),
            Span::styled(description, muted),
            Span::styled(" ".repeat(padding), style),
        ]);
        let line_area = Rect::new(inner.x, inner.y + i as u16, inner.width, 1);
        frame.render_widget(line, line_area);
    }
}

fn render_error_popup(frame: &mut Frame, popup: &ErrorNotice, area: Rect, palette: &Palette) {
    let popup_width = (area.width * 50 / 100).max(30).min(area.width);
    let inner_width = popup_width.saturating_sub(2) as usize; // -2 for borders

    let msg_lines = wrap_text(&popup.message, inner_width);
    // blank + message + blank + hint + blank + footer
    let content_height = 1 + msg_lines.len() + 1 + 1 + 1 + 1;
    let popup_height = (content_height + 2).min(area.height as usize) as u16; // +2 borders

    let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(x, y, popup_width, popup_height);
    frame.render_widget(Clear, popup_area);

    let title = format!(" ! {} ", popup.title);
    let block = WidgetBlock::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Red))
        .title(title);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let mut row: u16 = 1;

    for line_text in &msg_lines {
        if row >= inner.height.saturating_sub(1) {
            break;
        }
        let line = Line::from(Span::styled(
            line_text.clone(),
            Style::default().fg(palette.strong),
        ));
        frame.render_widget(line, Rect::new(inner.x, inner.y + row, inner.width, 1));
        row += 1;
    }

    row += 1;

    if row < inner.height.saturating_sub(1) {
        let hint = Line::from(Span::styled(
            popup.hint.clone(),
            Style::default().fg(palette.muted),
        ));
        frame.render_widget(hint, Rect::new(inner.x, inner.y + row, inner.width, 1));
        row += 1;
    }

    row += 1;

    if row < inner.height {
        let footer = Line::styled(
            "Press any key to close",
            Style::default().fg(palette.muted),
        );
        frame.render_widget(footer, Rect::new(inner.x, inner.y + row, inner.width, 1));
    }
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
