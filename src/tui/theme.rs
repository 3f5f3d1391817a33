//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

use crate::config::Theme;

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Score cell colors
    pub point: Color,
    pub elapsed: Color,
    pub penalty: Color,
    pub doubled: Color,
    pub missing: Color,

    // Table colors
    pub row_alt_bg: Color,
    pub index_color: Color,
    pub handle_color: Color,
    pub top_rank: [Color; 3],

    // Styles
    pub title_style: Style,
    pub header_style: Style,
    pub row_selected: Style,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Tab colors
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Countdown gauge
    pub gauge_fill: Color,
    pub gauge_overdue: Color,
    pub gauge_empty: Color,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,
}

impl ThemeColors {
    /// Dark theme palette
    pub fn dark() -> Self {
        Self {
            point: Color::Green,
            elapsed: Color::Gray,
            penalty: Color::Red,
            doubled: Color::Magenta,
            missing: Color::DarkGray,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            handle_color: Color::Blue,
            top_rank: [Color::Yellow, Color::White, Color::Rgb(205, 127, 50)],
            title_style: Style::new().bold(),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            tab_active_style: Style::new().fg(Color::Cyan).bold(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            gauge_fill: Color::Cyan,
            gauge_overdue: Color::Yellow,
            gauge_empty: Color::Indexed(238),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
        }
    }

    /// Light theme palette: darker foregrounds, pale backgrounds
    pub fn light() -> Self {
        Self {
            point: Color::Rgb(0, 120, 0),
            elapsed: Color::Indexed(241),
            penalty: Color::Rgb(180, 0, 0),
            doubled: Color::Rgb(140, 0, 140),
            missing: Color::Indexed(248),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(244),
            handle_color: Color::Rgb(0, 70, 170),
            top_rank: [
                Color::Rgb(175, 130, 0),
                Color::Indexed(244),
                Color::Rgb(150, 90, 30),
            ],
            title_style: Style::new().bold(),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Indexed(242),
            title_color: Color::Rgb(0, 110, 140),
            tab_active_style: Style::new().fg(Color::Rgb(0, 110, 140)).bold(),
            tab_inactive_style: Style::new().fg(Color::Indexed(246)),
            gauge_fill: Color::Rgb(0, 110, 140),
            gauge_overdue: Color::Rgb(190, 120, 0),
            gauge_empty: Color::Indexed(252),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Rgb(0, 110, 140),
            flash_success: Color::Rgb(0, 120, 0),
            flash_error: Color::Rgb(180, 0, 0),
            popup_border: Color::Rgb(0, 110, 140),
            popup_title: Style::new().fg(Color::Rgb(0, 110, 140)).bold(),
            popup_bg: Color::Indexed(255),
        }
    }

    /// Color of the rank number: podium places stand out
    pub fn rank_color(&self, rank: usize) -> Color {
        match rank {
            1..=3 => self.top_rank[rank - 1],
            _ => self.index_color,
        }
    }
}

/// Terminal background luma above which the light palette is used
const LIGHT_BACKGROUND_LUMA: f32 = 0.6;

/// Pick the palette for a configured theme. `Auto` asks the terminal for its
/// background color and falls back to dark when it does not answer.
pub fn resolve_theme(theme: Theme) -> ThemeColors {
    match theme {
        Theme::Dark => ThemeColors::dark(),
        Theme::Light => ThemeColors::light(),
        Theme::Auto => match terminal_light::luma() {
            Ok(luma) if luma > LIGHT_BACKGROUND_LUMA => ThemeColors::light(),
            _ => ThemeColors::dark(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_themes() {
        assert_eq!(resolve_theme(Theme::Dark).point, Color::Green);
        assert_eq!(resolve_theme(Theme::Light).point, Color::Rgb(0, 120, 0));
    }

    #[test]
    fn test_rank_color() {
        let theme = ThemeColors::dark();
        assert_eq!(theme.rank_color(1), Color::Yellow);
        assert_eq!(theme.rank_color(3), Color::Rgb(205, 127, 50));
        assert_eq!(theme.rank_color(4), theme.index_color);
        assert_eq!(theme.rank_color(0), theme.index_color);
    }
}
