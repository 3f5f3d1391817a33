pub mod aggregate;
pub mod columns;
pub mod parse;
pub mod types;

pub use aggregate::{aggregate, passthrough_standings, rank_standings};
pub use columns::{build_columns, default_columns, task_cell, team_score_cell, Column, ColumnKind, ScoreCell};
pub use parse::{parse_contests, parse_standings, parse_tasks, parse_timestamp};
pub use types::{Penalty, RankedStanding, RawStanding, Score, Task, TeamScore};
