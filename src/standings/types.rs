use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Tag shown instead of a penalty count for teams playing with doubled penalties
pub const DOUBLED_PENALTY_TAG: &str = "x2";

/// One team's result on one task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub point: u64,
    pub elapsed: u64, // seconds
    pub penalty: u64,
}

impl Score {
    pub fn new(point: u64, elapsed: u64, penalty: u64) -> Self {
        Self {
            point,
            elapsed,
            penalty,
        }
    }

    /// A score counts towards the total only when it earned points
    pub fn is_countable(&self) -> bool {
        self.point != 0
    }
}

/// Penalty of an aggregate score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    Count(u64),
    Doubled,
}

impl Penalty {
    /// Whether the penalty badge has anything to show
    pub fn is_visible(&self) -> bool {
        !matches!(self, Penalty::Count(0))
    }
}

impl Default for Penalty {
    fn default() -> Self {
        Penalty::Count(0)
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::Count(n) => write!(f, "{}", n),
            Penalty::Doubled => f.write_str(DOUBLED_PENALTY_TAG),
        }
    }
}

impl Serialize for Penalty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Penalty::Count(n) => serializer.serialize_u64(*n),
            Penalty::Doubled => serializer.serialize_str(DOUBLED_PENALTY_TAG),
        }
    }
}

/// Score shown in the Score column: the aggregate of a team's best tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    pub point: u64,
    pub elapsed: u64,
    pub penalty: Penalty,
}

impl From<Score> for TeamScore {
    fn from(score: Score) -> Self {
        Self {
            point: score.point,
            elapsed: score.elapsed,
            penalty: Penalty::Count(score.penalty),
        }
    }
}

/// A team record exactly as published: identity plus one score per task key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStanding {
    pub name: String,
    pub atcoder: String,
    pub scores: Vec<(String, Score)>, // store order
}

impl RawStanding {
    /// Look up the score stored under a task key
    pub fn score_for(&self, task: &str) -> Option<&Score> {
        self.scores
            .iter()
            .find(|(key, _)| key == task)
            .map(|(_, score)| score)
    }
}

/// A team record ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedStanding {
    pub key: String,
    pub name: String,
    pub atcoder: String,
    /// Total shown in the Score column (None when the record has none to show)
    pub score: Option<TeamScore>,
    #[serde(skip)]
    pub tasks: Vec<(String, Score)>,
}

impl RankedStanding {
    pub fn task_score(&self, task: &str) -> Option<&Score> {
        self.tasks
            .iter()
            .find(|(key, _)| key == task)
            .map(|(_, score)| score)
    }

    /// AtCoder profile page of the team
    pub fn profile_url(&self) -> String {
        format!("https://atcoder.jp/users/{}", self.atcoder)
    }
}

/// A task published for a contest, used as a table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(rename = "dataIndex")]
    pub data_index: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_display() {
        assert_eq!(Penalty::Count(3).to_string(), "3");
        assert_eq!(Penalty::Doubled.to_string(), "x2");
    }

    #[test]
    fn test_penalty_serializes_as_number_or_tag() {
        let count = serde_json::to_value(Penalty::Count(4)).unwrap();
        assert_eq!(count, serde_json::json!(4));

        let doubled = serde_json::to_value(Penalty::Doubled).unwrap();
        assert_eq!(doubled, serde_json::json!("x2"));
    }

    #[test]
    fn test_penalty_visibility() {
        assert!(!Penalty::Count(0).is_visible());
        assert!(Penalty::Count(1).is_visible());
        assert!(Penalty::Doubled.is_visible());
    }

    #[test]
    fn test_score_for_looks_up_task_key() {
        let standing = RawStanding {
            name: "alice".to_string(),
            atcoder: "alice_ac".to_string(),
            scores: vec![
                ("abc300_a".to_string(), Score::new(100, 30, 0)),
                ("abc300_b".to_string(), Score::new(200, 90, 1)),
            ],
        };
        assert_eq!(standing.score_for("abc300_b"), Some(&Score::new(200, 90, 1)));
        assert_eq!(standing.score_for("abc300_c"), None);
    }

    #[test]
    fn test_task_uses_data_index_key() {
        let task: Task =
            serde_json::from_value(serde_json::json!({"title": "A", "dataIndex": "abc300_a"}))
                .unwrap();
        assert_eq!(task.data_index, "abc300_a");
    }
}
