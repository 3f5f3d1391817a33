use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::board::{BoardState, ContestList};
use crate::standings::{task_cell, team_score_cell, Column, ColumnKind, RankedStanding, ScoreCell};
use crate::timing::{format_age, format_local_time};

/// Widest the name column gets on a terminal
const MAX_NAME_WIDTH: usize = 32;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
pub fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

fn pad_left(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", " ".repeat(width - len), text)
    }
}

/// Name column text: "name (atcoder)", or just the name without a handle
fn name_label(standing: &RankedStanding) -> String {
    if standing.atcoder.is_empty() {
        standing.name.clone()
    } else {
        format!("{} ({})", standing.name, standing.atcoder)
    }
}

fn total_cell(standing: &RankedStanding) -> ScoreCell {
    match &standing.score {
        Some(score) => team_score_cell(score),
        None => ScoreCell::missing(),
    }
}

/// Cells of one row, one per column after the name column
fn row_cells(standing: &RankedStanding, columns: &[Column]) -> Vec<String> {
    columns
        .iter()
        .filter_map(|column| match &column.kind {
            ColumnKind::Name => None,
            ColumnKind::Score => Some(total_cell(standing).to_inline()),
            ColumnKind::Task { data_index } => {
                Some(task_cell(standing.task_score(data_index)).to_inline())
            }
        })
        .collect()
}

/// One-line summary above the table
pub fn format_header(state: &BoardState, now: DateTime<Utc>, use_colors: bool) -> String {
    let contest = &state.context.contest;
    let board = &state.context.board.name;
    let updated = match state.last_updated {
        Some(ts) => format!("{} ({})", format_local_time(ts), format_age(ts, now)),
        None => "-".to_string(),
    };
    if use_colors {
        format!(
            "{} {}  {} {}",
            contest.bold(),
            format!("[{}]", board).dimmed(),
            "Last update:".dimmed(),
            updated
        )
    } else {
        format!("{} [{}]  Last update: {}", contest, board, updated)
    }
}

/// Format standings as an aligned table: rank, name, total, then one cell
/// per task
pub fn format_table(state: &BoardState, use_colors: bool) -> String {
    if state.standings.is_empty() {
        return "No standings available.".to_string();
    }

    let titles: Vec<&str> = state
        .columns
        .iter()
        .filter(|c| c.kind != ColumnKind::Name)
        .map(|c| c.title.as_str())
        .collect();
    let rows: Vec<(String, Vec<String>)> = state
        .standings
        .iter()
        .map(|s| (name_label(s), row_cells(s, &state.columns)))
        .collect();

    let index_width = state.standings.len().to_string().len() + 1;
    let longest_name = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Name".len());
    let mut cell_widths: Vec<usize> = titles.iter().map(|t| t.chars().count()).collect();
    for (_, cells) in &rows {
        for (width, cell) in cell_widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let cells_width: usize = cell_widths.iter().map(|w| w + 2).sum();

    // Names give way first when the terminal is narrow
    let name_width = match get_terminal_width() {
        Some(width) => {
            let fixed = index_width + 1 + cells_width;
            longest_name
                .min(MAX_NAME_WIDTH)
                .min(width.saturating_sub(fixed).max(10))
        }
        None => longest_name,
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header = format!("{} {}", " ".repeat(index_width), pad("Name", name_width));
    for (title, width) in titles.iter().zip(&cell_widths) {
        header.push_str("  ");
        header.push_str(&pad_left(title, *width));
    }
    if use_colors {
        lines.push(header.bold().to_string());
    } else {
        lines.push(header);
    }

    for (idx, (name, cells)) in rows.iter().enumerate() {
        let index_str = pad_left(&format!("{}.", idx + 1), index_width);
        let name = pad(&truncate_title(name, name_width), name_width);
        let mut line = if use_colors {
            format!("{} {}", index_str.dimmed(), name.bold())
        } else {
            format!("{} {}", index_str, name)
        };
        for (i, (cell, width)) in cells.iter().zip(&cell_widths).enumerate() {
            line.push_str("  ");
            let cell = pad_left(cell, *width);
            if use_colors && i == 0 {
                line.push_str(&cell.cyan().to_string());
            } else {
                line.push_str(&cell);
            }
        }
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Format standings as tab-separated values for scripting
/// Columns: rank, name, atcoder, point, penalty, elapsed, then one cell per
/// task (no headers, no colors)
pub fn format_tsv(state: &BoardState) -> String {
    state
        .standings
        .iter()
        .enumerate()
        .map(|(idx, standing)| {
            let mut fields = vec![
                (idx + 1).to_string(),
                standing.name.clone(),
                standing.atcoder.clone(),
            ];
            match &standing.score {
                Some(score) => {
                    fields.push(score.point.to_string());
                    fields.push(score.penalty.to_string());
                    fields.push(score.elapsed.to_string());
                }
                None => fields.extend([String::new(), String::new(), String::new()]),
            }
            for column in &state.columns {
                if let ColumnKind::Task { data_index } = &column.kind {
                    fields.push(task_cell(standing.task_score(data_index)).to_inline());
                }
            }
            fields.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct JsonBoard<'a> {
    board: &'a str,
    contest: &'a str,
    last_updated: Option<f64>,
    columns: &'a [Column],
    standings: &'a [RankedStanding],
}

/// Format the board as pretty-printed JSON
pub fn format_json(state: &BoardState) -> Result<String> {
    let doc = JsonBoard {
        board: &state.context.board.name,
        contest: &state.context.contest,
        last_updated: state.last_updated,
        columns: &state.columns,
        standings: &state.standings,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Format the contest list, marking the contest that would open by default
pub fn format_contests(
    contests: &ContestList,
    current: Option<&str>,
    now: DateTime<Utc>,
    use_colors: bool,
) -> String {
    if contests.is_empty() {
        return "No contests found.".to_string();
    }

    let id_width = contests
        .contests
        .iter()
        .map(|(id, _)| id.chars().count())
        .max()
        .unwrap_or(0);

    contests
        .contests
        .iter()
        .map(|(id, ts)| {
            let marker = if current == Some(id.as_str()) { "*" } else { " " };
            let updated = match ts {
                Some(ts) => format!("{}  {}", format_local_time(*ts), format_age(*ts, now)),
                None => "-".to_string(),
            };
            let id = pad(id, id_width);
            if use_colors {
                format!("{} {}  {}", marker.green(), id.bold(), updated.dimmed())
            } else {
                format!("{} {}  {}", marker, id, updated)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
