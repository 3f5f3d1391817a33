//! State of one board for one contest, built from the documents the store
//! pushes.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{BoardConfig, BoardMode};
use crate::standings::{
    build_columns, default_columns, parse_contests, parse_standings, parse_tasks,
    parse_timestamp, passthrough_standings, rank_standings, Column, RankedStanding,
};
use crate::store::join_path;

/// Placeholder contest id used when nothing better is known
pub const NO_CONTEST: &str = "-";

/// A board and the contest it shows. Every update is tagged with one so
/// stale updates can be told apart from current ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardContext {
    pub board: BoardConfig,
    pub contest: String,
}

impl BoardContext {
    pub fn new(board: BoardConfig, contest: &str) -> Self {
        Self {
            board,
            contest: contest.to_string(),
        }
    }

    pub fn tasks_path(&self) -> String {
        join_path(&[&self.board.root, "tasks", &self.contest])
    }

    pub fn standings_path(&self) -> String {
        join_path(&[&self.board.root, "standings", &self.contest])
    }

    pub fn last_updated_path(&self) -> String {
        join_path(&[&self.board.root, "last_updated", &self.contest])
    }

    /// Path of the feed within this context
    pub fn path(&self, feed: Feed) -> String {
        match feed {
            Feed::Tasks => self.tasks_path(),
            Feed::Standings => self.standings_path(),
            Feed::LastUpdated => self.last_updated_path(),
        }
    }
}

/// Path of a board's contest index
pub fn contests_path(board: &BoardConfig) -> String {
    join_path(&[&board.root, "last_updated"])
}

/// The per-contest documents a board is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Tasks,
    Standings,
    LastUpdated,
}

/// Columns, standings and last update of a board context
#[derive(Debug, Clone)]
pub struct BoardState {
    pub context: BoardContext,
    pub columns: Vec<Column>,
    pub standings: Vec<RankedStanding>,
    pub last_updated: Option<f64>,
    /// Whether any standings document has been applied yet
    pub has_standings: bool,
}

impl BoardState {
    pub fn new(context: BoardContext) -> Self {
        Self {
            context,
            columns: default_columns(),
            standings: Vec::new(),
            last_updated: None,
            has_standings: false,
        }
    }

    /// Apply a pushed document. A path with no data leaves the state as it
    /// was. Returns whether anything changed.
    pub fn apply(&mut self, feed: Feed, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            warn!(path = %self.context.path(feed), "No data available");
            return false;
        };

        match feed {
            Feed::Tasks => {
                self.columns = build_columns(&parse_tasks(value));
                debug!(columns = self.columns.len(), "Columns updated");
            }
            Feed::Standings => {
                let raw = parse_standings(value);
                self.standings = match self.context.board.mode {
                    BoardMode::Ranked => rank_standings(&raw),
                    BoardMode::Raw => passthrough_standings(&raw),
                };
                self.has_standings = true;
                debug!(teams = self.standings.len(), "Standings updated");
            }
            Feed::LastUpdated => match parse_timestamp(value) {
                Some(ts) => self.last_updated = Some(ts),
                None => {
                    warn!(path = %self.context.path(feed), "Last update is not a timestamp");
                    return false;
                }
            },
        }
        true
    }
}

/// Known contests of a board, in store key order, with their last update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestList {
    pub contests: Vec<(String, Option<f64>)>,
}

impl ContestList {
    /// Replace the list from the board's `last_updated` document. No data
    /// keeps the previous list.
    pub fn apply(&mut self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            warn!("No contest list available");
            return false;
        };
        self.contests = parse_contests(value).into_iter().collect();
        true
    }

    /// The contest updated most recently
    pub fn latest(&self) -> Option<&str> {
        self.contests
            .iter()
            .filter_map(|(id, ts)| ts.map(|ts| (id, ts)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.as_str())
    }

    pub fn position(&self, contest: &str) -> Option<usize> {
        self.contests.iter().position(|(id, _)| id == contest)
    }

    pub fn len(&self) -> usize {
        self.contests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }
}

/// Pick the contest to open: an explicit choice, else the configured one,
/// else the most recently updated, else the placeholder
pub fn default_contest(
    flag: Option<&str>,
    configured: Option<&str>,
    contests: &ContestList,
) -> String {
    flag.or(configured)
        .or_else(|| contests.latest())
        .unwrap_or(NO_CONTEST)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::{ColumnKind, Penalty};
    use serde_json::json;

    fn ranked_board() -> BoardConfig {
        BoardConfig {
            name: "no-spons".to_string(),
            root: "atcoder/no-spons".to_string(),
            mode: BoardMode::Ranked,
        }
    }

    fn raw_board() -> BoardConfig {
        BoardConfig {
            name: "all".to_string(),
            root: "atcoder".to_string(),
            mode: BoardMode::Raw,
        }
    }

    #[test]
    fn test_context_paths() {
        let ctx = BoardContext::new(ranked_board(), "abc300");
        assert_eq!(ctx.tasks_path(), "atcoder/no-spons/tasks/abc300");
        assert_eq!(ctx.standings_path(), "atcoder/no-spons/standings/abc300");
        assert_eq!(ctx.last_updated_path(), "atcoder/no-spons/last_updated/abc300");
        assert_eq!(contests_path(&ctx.board), "atcoder/no-spons/last_updated");
    }

    #[test]
    fn test_new_state_has_default_columns() {
        let state = BoardState::new(BoardContext::new(ranked_board(), "abc300"));
        assert_eq!(state.columns.len(), 2);
        assert!(state.standings.is_empty());
        assert_eq!(state.last_updated, None);
        assert!(!state.has_standings);
    }

    #[test]
    fn test_apply_tasks_builds_columns() {
        let mut state = BoardState::new(BoardContext::new(ranked_board(), "abc300"));
        let changed = state.apply(
            Feed::Tasks,
            Some(&json!([
                {"title": "A", "dataIndex": "abc300_a"},
                {"title": "B", "dataIndex": "abc300_b"}
            ])),
        );
        assert!(changed);
        assert_eq!(state.columns.len(), 4);
        assert_eq!(
            state.columns[2].kind,
            ColumnKind::Task {
                data_index: "abc300_a".to_string()
            }
        );
    }

    #[test]
    fn test_ranked_board_aggregates_and_sorts() {
        let mut state = BoardState::new(BoardContext::new(ranked_board(), "abc300"));
        state.apply(
            Feed::Standings,
            Some(&json!([
                {"name": "alice", "atcoder": "a", "t1": {"point": 100, "elapsed": 30, "penalty": 0}},
                {"name": "sanct", "atcoder": "s",
                 "t1": {"point": 200, "elapsed": 100, "penalty": 1},
                 "t2": {"point": 100, "elapsed": 50, "penalty": 0}}
            ])),
        );
        assert_eq!(state.standings[0].name, "sanct");
        let top = state.standings[0].score.unwrap();
        assert_eq!(top.point, 300);
        assert_eq!(top.penalty, Penalty::Doubled);
        assert_eq!(state.standings[1].key, "alice");
    }

    #[test]
    fn test_raw_board_keeps_store_order() {
        let mut state = BoardState::new(BoardContext::new(raw_board(), "abc300"));
        state.apply(
            Feed::Standings,
            Some(&json!([
                {"name": "low", "score": {"point": 100, "elapsed": 10, "penalty": 0}},
                {"name": "high", "score": {"point": 900, "elapsed": 5, "penalty": 0}}
            ])),
        );
        assert_eq!(state.standings[0].name, "low");
        assert_eq!(state.standings[0].score.unwrap().point, 100);
        assert_eq!(state.standings[1].name, "high");
    }

    #[test]
    fn test_no_data_keeps_prior_state() {
        let mut state = BoardState::new(BoardContext::new(ranked_board(), "abc300"));
        state.apply(
            Feed::Standings,
            Some(&json!([{"name": "alice", "t1": {"point": 100}}])),
        );
        state.apply(Feed::LastUpdated, Some(&json!(1700000000)));

        assert!(!state.apply(Feed::Standings, None));
        assert!(!state.apply(Feed::LastUpdated, None));
        assert!(!state.apply(Feed::Tasks, None));
        assert_eq!(state.standings.len(), 1);
        assert_eq!(state.last_updated, Some(1700000000.0));
        assert_eq!(state.columns.len(), 2);
    }

    #[test]
    fn test_non_numeric_timestamp_is_ignored() {
        let mut state = BoardState::new(BoardContext::new(ranked_board(), "abc300"));
        state.apply(Feed::LastUpdated, Some(&json!(1700000000.5)));
        assert!(!state.apply(Feed::LastUpdated, Some(&json!("yesterday"))));
        assert_eq!(state.last_updated, Some(1700000000.5));
    }

    #[test]
    fn test_contest_list_latest() {
        let mut contests = ContestList::default();
        assert!(contests.apply(Some(&json!({
            "abc300": 1700000000,
            "abc302": 1700000200,
            "abc301": 1700000100,
            "broken": "x"
        }))));
        assert_eq!(contests.len(), 4);
        assert_eq!(contests.latest(), Some("abc302"));
        assert_eq!(contests.position("abc301"), Some(1));
        assert!(!contests.apply(None));
        assert_eq!(contests.len(), 4);
    }

    #[test]
    fn test_default_contest_order() {
        let mut contests = ContestList::default();
        assert_eq!(default_contest(None, None, &contests), "-");

        contests.apply(Some(&json!({"abc300": 1, "abc301": 2})));
        assert_eq!(default_contest(None, None, &contests), "abc301");
        assert_eq!(default_contest(None, Some("abc299"), &contests), "abc299");
        assert_eq!(default_contest(Some("abc298"), Some("abc299"), &contests), "abc298");
    }
}
