use ratatui::style::Color;

use crate::config::Theme;

/// Colours shared by every widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub strong: Color,
    pub muted: Color,
    pub accent: Color,
    /// Foreground on an `accent` background.
    pub on_accent: Color,
    pub bar_bg: Color,
    pub bar_text: Color,
    pub focus_bg: Color,
    pub cursor_fg: Color,
    pub cursor_bg: Color,
    pub code: Color,
    pub presence: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                text: Color::Gray,
                strong: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                on_accent: Color::Black,
                bar_bg: Color::DarkGray,
                bar_text: Color::White,
                focus_bg: Color::DarkGray,
                cursor_fg: Color::Black,
                cursor_bg: Color::White,
                code: Color::Yellow,
                presence: Color::Magenta,
            },
            Theme::Light => Self {
                text: Color::Black,
                strong: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                on_accent: Color::White,
                bar_bg: Color::Rgb(215, 215, 215),
                bar_text: Color::Black,
                focus_bg: Color::Rgb(232, 232, 232),
                cursor_fg: Color::White,
                cursor_bg: Color::Black,
                code: Color::Rgb(150, 90, 0),
                presence: Color::Magenta,
            },
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}
