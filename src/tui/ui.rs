use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Table, Tabs};

use crate::output::truncate_title;
use crate::standings::{task_cell, team_score_cell, ColumnKind, RankedStanding, ScoreCell};
use crate::timing::{format_age, format_local_time};
use crate::tui::app::{App, FlashKind, InputMode};
use crate::tui::theme::ThemeColors;

/// Widest the name column gets
const NAME_WIDTH: u16 = 28;
/// Width of the total column
const SCORE_WIDTH: u16 = 9;
/// Narrowest a task column gets
const TASK_WIDTH: u16 = 7;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 8 || area.width < 30 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Tabs(1) + Countdown(1) + Table(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1), // Title bar
        Constraint::Length(1), // Board tabs
        Constraint::Length(1), // Countdown gauge
        Constraint::Fill(1),   // Standings table
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    render_countdown(frame, chunks[2], app);
    render_table(frame, chunks[3], app);
    render_status_bar(frame, chunks[4], app);

    match app.input_mode {
        InputMode::ContestPicker => render_contest_picker(frame, app),
        InputMode::Help => render_help_popup(frame, &app.theme),
        InputMode::Normal => {}
    }

    if app.is_loading() {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let left = format!("Live Standings  {}", app.context().contest);
    let mut spans = vec![
        Span::styled("Live Standings", Style::default().fg(theme.title_color).bold()),
        Span::raw("  "),
        Span::styled(app.context().contest.clone(), theme.title_style),
    ];

    let updated = match app.state.last_updated {
        Some(ts) => format!(
            "Last update: {} ({})",
            format_local_time(ts),
            format_age(ts, Utc::now())
        ),
        None => "Last update: -".to_string(),
    };
    let padding_len =
        (area.width as usize).saturating_sub(left.chars().count() + updated.chars().count());
    spans.push(Span::raw(" ".repeat(padding_len)));
    spans.push(Span::styled(updated, Style::default().fg(theme.muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<&str> = app.config.boards.iter().map(|b| b.name.as_str()).collect();

    let tabs = Tabs::new(titles)
        .select(app.board_index)
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style.reversed())
        .divider(" | ");

    frame.render_widget(tabs, area);
}

fn render_countdown(frame: &mut Frame, area: Rect, app: &App) {
    let countdown = app.countdown(Utc::now());
    let overdue = countdown.percent == 0 && app.state.last_updated.is_some();
    let fill = if overdue {
        app.theme.gauge_overdue
    } else {
        app.theme.gauge_fill
    };

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(fill).bg(app.theme.gauge_empty))
        .percent(countdown.percent)
        .label(format!("Next update in {}", countdown.label));

    frame.render_widget(gauge, area);
}

/// Name on the first line, AtCoder handle below it
fn name_cell(standing: &RankedStanding, theme: &ThemeColors) -> Text<'static> {
    let name = truncate_title(&standing.name, NAME_WIDTH as usize);
    let mut lines = vec![Line::from(Span::styled(name, Style::default().bold()))];
    if !standing.atcoder.is_empty() {
        lines.push(Line::from(Span::styled(
            truncate_title(&standing.atcoder, NAME_WIDTH as usize),
            Style::default().fg(theme.handle_color),
        )));
    }
    Text::from(lines)
}

/// Points and penalty badge on the first line, elapsed time below
fn score_cell(cell: ScoreCell, theme: &ThemeColors) -> Text<'static> {
    let mut first = Vec::new();
    match cell.point {
        Some(point) if point == "-" => {
            first.push(Span::styled(point, Style::default().fg(theme.missing)));
        }
        Some(point) => first.push(Span::styled(point, Style::default().fg(theme.point).bold())),
        None => {}
    }
    if let Some(badge) = cell.badge {
        let color = if badge.starts_with('+') {
            theme.penalty
        } else {
            theme.doubled
        };
        if !first.is_empty() {
            first.push(Span::raw(" "));
        }
        first.push(Span::styled(badge, Style::default().fg(color)));
    }

    let mut lines = vec![Line::from(first)];
    if let Some(elapsed) = cell.elapsed {
        lines.push(Line::from(Span::styled(
            elapsed,
            Style::default().fg(theme.elapsed),
        )));
    }
    Text::from(lines)
}

fn render_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let theme = &app.theme;
    let state = &app.state;

    if state.standings.is_empty() {
        let msg = if state.context.contest == crate::board::NO_CONTEST {
            "No contest selected. Press c to pick one."
        } else {
            "No standings available"
        };
        let empty_msg = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.muted))
            .block(Block::default());
        frame.render_widget(empty_msg, area);
        return;
    }

    let mut header = vec![Cell::from("#")];
    let mut widths = vec![Constraint::Length(4)];
    for column in &state.columns {
        header.push(Cell::from(column.title.clone()));
        widths.push(match column.kind {
            ColumnKind::Name => Constraint::Length(NAME_WIDTH),
            ColumnKind::Score => Constraint::Length(SCORE_WIDTH),
            ColumnKind::Task { .. } => Constraint::Min(TASK_WIDTH),
        });
    }

    let rows: Vec<Row> = state
        .standings
        .iter()
        .enumerate()
        .map(|(idx, standing)| {
            let rank = idx + 1;
            let mut cells = vec![Cell::from(format!("{}.", rank))
                .style(Style::default().fg(theme.rank_color(rank)))];
            for column in &state.columns {
                let text = match &column.kind {
                    ColumnKind::Name => name_cell(standing, theme),
                    ColumnKind::Score => {
                        let cell = match &standing.score {
                            Some(score) => team_score_cell(score),
                            None => ScoreCell::missing(),
                        };
                        score_cell(cell, theme)
                    }
                    ColumnKind::Task { data_index } => {
                        score_cell(task_cell(standing.task_score(data_index)), theme)
                    }
                };
                cells.push(Cell::from(text));
            }

            // Alternating row background (odd rows get subtle background)
            let row_style = if idx % 2 == 1 {
                Style::default().bg(theme.row_alt_bg)
            } else {
                Style::default()
            };
            Row::new(cells).height(2).style(row_style)
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(theme.header_style).bottom_margin(1))
        .row_highlight_style(theme.row_selected);

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let text = if let Some((ref msg, kind, _)) = app.flash_message {
        let msg_color = match kind {
            FlashKind::Error => theme.flash_error,
            FlashKind::Success => theme.flash_success,
            FlashKind::Info => theme.status_key_color,
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let count = format!("{} teams", app.standings().len());
        let source = if app.live { "live" } else { "cached" };

        // Build hints with colored shortcut keys
        let hints = [
            ("j/k", ":nav "),
            ("Enter", ":profile "),
            ("c", ":contest "),
            ("Tab", ":board "),
            ("r", ":reconnect "),
            ("?", ":help "),
            ("q", ":quit"),
        ];
        let mut spans = vec![
            Span::styled(count, Style::default().fg(theme.muted)),
            Span::raw(" "),
        ];
        if app.state.has_standings {
            spans.push(Span::styled(source, Style::default().fg(theme.muted)));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(" "));
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(theme.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(theme.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    // Clamp dimensions to area bounds
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Render the contest picker popup
fn render_contest_picker(frame: &mut Frame, app: &mut App) {
    let theme = &app.theme;
    let height = (app.contests.len() as u16).saturating_add(2).min(16);
    let popup_area = centered_rect_fixed(40, height, frame.area());

    frame.render_widget(Clear, popup_area);

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .contests
        .contests
        .iter()
        .map(|(id, ts)| {
            let marker = if *id == app.state.context.contest { "* " } else { "  " };
            let age = ts.map(|ts| format_age(ts, now)).unwrap_or_else(|| "-".to_string());
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::raw(id.clone()),
                Span::raw("  "),
                Span::styled(age, Style::default().fg(theme.muted)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::bordered()
                .title(Span::styled(" Contests ", theme.popup_title))
                .border_style(Style::default().fg(theme.popup_border))
                .style(Style::default().bg(theme.popup_bg)),
        )
        .highlight_style(theme.row_selected);

    frame.render_stateful_widget(list, popup_area, &mut app.picker_state);
}

/// Render the help overlay popup
fn render_help_popup(frame: &mut Frame, theme: &ThemeColors) {
    let popup_area = centered_rect_fixed(50, 14, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", theme.popup_title))
        .border_style(Style::default().fg(theme.popup_border))
        .style(Style::default().bg(theme.popup_bg));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let key_style = Style::default().fg(theme.status_key_color).bold();
    let shortcuts = [
        ("j / Down      ", "Move down"),
        ("k / Up        ", "Move up"),
        ("Enter / o     ", "Open AtCoder profile"),
        ("c             ", "Pick contest"),
        ("Tab / S-Tab   ", "Next / previous board"),
        ("r             ", "Reconnect"),
        ("?             ", "Show/hide this help"),
        ("q / Ctrl-c    ", "Quit"),
    ];
    let mut help_lines: Vec<Line> = shortcuts
        .iter()
        .map(|(key, action)| Line::from(vec![Span::styled(*key, key_style), Span::raw(*action)]))
        .collect();
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(theme.muted),
    )));

    frame.render_widget(Paragraph::new(help_lines), inner);
}

/// Render the loading spinner overlay
fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());

    frame.render_widget(Clear, popup_area);

    let block = Block::bordered().border_style(Style::default().fg(app.theme.popup_border));
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let loading_text = Paragraph::new(format!("{} Loading standings...", spinner))
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));

    frame.render_widget(loading_text, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::json;

    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(100, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_centered_rect_is_clamped() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(40, 4, area);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.y, 3);
    }

    #[test]
    fn test_score_cell_lines() {
        let theme = ThemeColors::dark();
        let text = score_cell(
            ScoreCell {
                point: Some("300".to_string()),
                elapsed: Some("1:40".to_string()),
                badge: Some("x2".to_string()),
            },
            &theme,
        );
        assert_eq!(text.lines.len(), 2);
        assert_eq!(text.lines[0].to_string(), "300 x2");
        assert_eq!(text.lines[1].to_string(), "1:40");
    }

    #[test]
    fn test_draw_standings() {
        let mut app = App::new(Config::default(), 0, "abc300", true, ThemeColors::dark());
        app.state.apply(
            crate::board::Feed::Standings,
            Some(&json!([
                {"name": "alice", "atcoder": "alice_ac", "t1": {"point": 100, "elapsed": 30, "penalty": 0}}
            ])),
        );
        let screen = render(&mut app);
        assert!(screen.contains("abc300"));
        assert!(screen.contains("no-spons"));
        assert!(screen.contains("alice_ac"));
        assert!(screen.contains("Next update in -"));
        assert!(!screen.contains("Loading standings"));
    }

    #[test]
    fn test_draw_loading() {
        let mut app = App::new(Config::default(), 0, "abc300", true, ThemeColors::dark());
        let screen = render(&mut app);
        assert!(screen.contains("Loading standings"));
    }

    #[test]
    fn test_draw_tiny_terminal() {
        let mut app = App::new(Config::default(), 0, "abc300", true, ThemeColors::dark());
        let backend = TestBackend::new(20, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, &mut app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("small"));
    }
}
