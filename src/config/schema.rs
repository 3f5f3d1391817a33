use serde::{Deserialize, Serialize};

/// Database the public leaderboards are published to
pub const DEFAULT_DATABASE_URL: &str =
    "https://za-nhalq-dev-default-rtdb.asia-southeast1.firebasedatabase.app";

/// Seconds between scraper runs that refresh the database
pub const DEFAULT_UPDATE_INTERVAL: u64 = 100;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Contest shown at startup; the most recently updated one when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contest: Option<String>,
    #[serde(default = "default_boards")]
    pub boards: Vec<BoardConfig>,
    #[serde(default = "default_update_interval")]
    pub update_interval: u64, // seconds
    #[serde(default)]
    pub theme: Theme,
}

/// One leaderboard: where its documents live and how to rank them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoardConfig {
    pub name: String,
    pub root: String,
    #[serde(default)]
    pub mode: BoardMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardMode {
    /// Aggregate the best tasks per team and sort
    #[default]
    Ranked,
    /// Show records as stored, in store order
    Raw,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_update_interval() -> u64 {
    DEFAULT_UPDATE_INTERVAL
}

/// The two public boards: everyone as published, and the ranked board
/// without sponsored teams
pub fn default_boards() -> Vec<BoardConfig> {
    vec![
        BoardConfig {
            name: "no-spons".to_string(),
            root: "atcoder/no-spons".to_string(),
            mode: BoardMode::Ranked,
        },
        BoardConfig {
            name: "all".to_string(),
            root: "atcoder".to_string(),
            mode: BoardMode::Raw,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            contest: None,
            boards: default_boards(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Find a board by name, or the first board when no name is given
    pub fn board(&self, name: Option<&str>) -> Option<&BoardConfig> {
        match name {
            Some(name) => self.boards.iter().find(|b| b.name == name),
            None => self.boards.first(),
        }
    }

    pub fn board_index(&self, name: &str) -> Option<usize> {
        self.boards.iter().position(|b| b.name == name)
    }
}
