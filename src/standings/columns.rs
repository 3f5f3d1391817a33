use serde::Serialize;

use super::types::{Penalty, Score, Task, TeamScore};

/// What a column shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ColumnKind {
    Name,
    Score,
    Task {
        #[serde(rename = "dataIndex")]
        data_index: String,
    },
}

/// A table column: two fixed ones, then one per task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub title: String,
    #[serde(flatten)]
    pub kind: ColumnKind,
    pub fixed: bool,
}

/// The columns shown before any task list has arrived
pub fn default_columns() -> Vec<Column> {
    vec![
        Column {
            title: "Name".to_string(),
            kind: ColumnKind::Name,
            fixed: true,
        },
        Column {
            title: "Score".to_string(),
            kind: ColumnKind::Score,
            fixed: true,
        },
    ]
}

/// Fixed columns followed by one column per task
pub fn build_columns(tasks: &[Task]) -> Vec<Column> {
    let mut columns = default_columns();
    columns.extend(tasks.iter().map(|task| Column {
        title: task.title.clone(),
        kind: ColumnKind::Task {
            data_index: task.data_index.clone(),
        },
        fixed: false,
    }));
    columns
}

/// A score cell split into the parts a renderer lays out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCell {
    /// Points, or None when nothing was scored
    pub point: Option<String>,
    /// Elapsed time line, only present alongside points
    pub elapsed: Option<String>,
    /// Penalty badge, hidden when zero
    pub badge: Option<String>,
}

impl ScoreCell {
    /// Cell for a team with no entry at all
    pub fn missing() -> Self {
        Self {
            point: Some("-".to_string()),
            elapsed: None,
            badge: None,
        }
    }

    /// Single-line text form: "350 +3 (2:15)"
    pub fn to_inline(&self) -> String {
        let mut parts = Vec::new();
        if let Some(point) = &self.point {
            parts.push(point.clone());
        }
        if let Some(badge) = &self.badge {
            parts.push(badge.clone());
        }
        if let Some(elapsed) = &self.elapsed {
            parts.push(format!("({})", elapsed));
        }
        parts.join(" ")
    }
}

/// Elapsed seconds as m:ss, or "-" for none
pub fn format_elapsed(elapsed: u64) -> String {
    if elapsed == 0 {
        "-".to_string()
    } else {
        format!("{}:{:02}", elapsed / 60, elapsed % 60)
    }
}

fn format_badge(penalty: &Penalty) -> Option<String> {
    match penalty {
        Penalty::Count(0) => None,
        Penalty::Count(n) => Some(format!("+{}", n)),
        Penalty::Doubled => Some(penalty.to_string()),
    }
}

/// Lay out a total or task score for display
pub fn team_score_cell(score: &TeamScore) -> ScoreCell {
    let badge = format_badge(&score.penalty);
    if score.point == 0 {
        return ScoreCell {
            point: None,
            elapsed: None,
            badge,
        };
    }
    ScoreCell {
        point: Some(score.point.to_string()),
        elapsed: Some(format_elapsed(score.elapsed)),
        badge,
    }
}

/// Lay out a task score cell, "-" when the team has no entry for the task
pub fn task_cell(score: Option<&Score>) -> ScoreCell {
    match score {
        Some(score) => team_score_cell(&TeamScore::from(*score)),
        None => ScoreCell::missing(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let columns = default_columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].kind, ColumnKind::Name);
        assert_eq!(columns[1].kind, ColumnKind::Score);
        assert!(columns.iter().all(|c| c.fixed));
    }

    #[test]
    fn test_build_columns_appends_tasks_in_order() {
        let tasks = vec![
            Task {
                title: "A".to_string(),
                data_index: "abc300_a".to_string(),
            },
            Task {
                title: "B".to_string(),
                data_index: "abc300_b".to_string(),
            },
        ];
        let columns = build_columns(&tasks);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2].title, "A");
        assert_eq!(
            columns[3].kind,
            ColumnKind::Task {
                data_index: "abc300_b".to_string()
            }
        );
        assert!(!columns[3].fixed);
    }

    #[test]
    fn test_column_json_shape() {
        let columns = build_columns(&[Task {
            title: "A".to_string(),
            data_index: "abc300_a".to_string(),
        }]);
        let json = serde_json::to_value(&columns[2]).unwrap();
        assert_eq!(json["kind"], "task");
        assert_eq!(json["dataIndex"], "abc300_a");
        assert_eq!(json["title"], "A");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "-");
        assert_eq!(format_elapsed(30), "0:30");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(125), "2:05");
        assert_eq!(format_elapsed(3600), "60:00");
    }

    #[test]
    fn test_solved_cell() {
        let cell = task_cell(Some(&Score::new(100, 125, 2)));
        assert_eq!(cell.point.as_deref(), Some("100"));
        assert_eq!(cell.elapsed.as_deref(), Some("2:05"));
        assert_eq!(cell.badge.as_deref(), Some("+2"));
        assert_eq!(cell.to_inline(), "100 +2 (2:05)");
    }

    #[test]
    fn test_unsolved_cell_shows_only_penalty() {
        let cell = task_cell(Some(&Score::new(0, 0, 3)));
        assert_eq!(cell.point, None);
        assert_eq!(cell.elapsed, None);
        assert_eq!(cell.to_inline(), "+3");

        let empty = task_cell(Some(&Score::new(0, 0, 0)));
        assert_eq!(empty.to_inline(), "");
    }

    #[test]
    fn test_missing_cell() {
        assert_eq!(task_cell(None).to_inline(), "-");
    }

    #[test]
    fn test_doubled_badge() {
        let score = TeamScore {
            point: 300,
            elapsed: 0,
            penalty: Penalty::Doubled,
        };
        let cell = team_score_cell(&score);
        assert_eq!(cell.badge.as_deref(), Some("x2"));
        assert_eq!(cell.elapsed.as_deref(), Some("-"));
    }
}
