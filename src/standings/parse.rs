//! Validation of store documents into typed standings.
//!
//! Documents come from a schemaless store and are only trusted as far as
//! these functions check them. Malformed numeric fields read as zero,
//! malformed records are skipped with a warning.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use super::types::{RawStanding, Score, Task};

const NAME_KEY: &str = "name";
const ATCODER_KEY: &str = "atcoder";
const KEY_KEY: &str = "key";

/// Flatten a list document. The store returns lists as arrays, but sparse
/// lists come back as objects keyed by index, and deleted entries as nulls.
fn list_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).collect(),
        Value::Object(map) => {
            let mut indexed: Vec<(Option<u64>, &String, &Value)> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.parse::<u64>().ok(), k, v))
                .collect();
            // Numeric keys in numeric order, anything else after them
            indexed.sort_by(|a, b| match (a.0, b.0) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.1.cmp(b.1),
            });
            indexed.into_iter().map(|(_, _, v)| v).collect()
        }
        _ => Vec::new(),
    }
}

/// Read a non-negative count. Anything that is not a usable number is 0.
fn read_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
                .unwrap_or(0)
        }),
        _ => 0,
    }
}

/// Parse a score object. Missing fields are zero.
pub fn parse_score(value: &Value) -> Option<Score> {
    let obj = value.as_object()?;
    Some(Score {
        point: read_count(obj.get("point")),
        elapsed: read_count(obj.get("elapsed")),
        penalty: read_count(obj.get("penalty")),
    })
}

fn parse_standing(obj: &Map<String, Value>) -> Option<RawStanding> {
    let name = obj.get(NAME_KEY)?.as_str()?.to_string();
    let atcoder = obj
        .get(ATCODER_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let scores = obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), NAME_KEY | ATCODER_KEY | KEY_KEY))
        .filter_map(|(k, v)| parse_score(v).map(|score| (k.clone(), score)))
        .collect();

    Some(RawStanding {
        name,
        atcoder,
        scores,
    })
}

/// Parse a standings document into team records, in store order
pub fn parse_standings(value: &Value) -> Vec<RawStanding> {
    let mut standings = Vec::new();
    let mut seen = HashSet::new();

    for (idx, item) in list_items(value).into_iter().enumerate() {
        let parsed = item.as_object().and_then(parse_standing);
        match parsed {
            Some(standing) => {
                if !seen.insert(standing.name.clone()) {
                    warn!(team = %standing.name, "Duplicate team name in standings");
                }
                standings.push(standing);
            }
            None => warn!(index = idx, "Skipping standing without a team name"),
        }
    }

    standings
}

/// Parse a task list document into table columns
pub fn parse_tasks(value: &Value) -> Vec<Task> {
    list_items(value)
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let obj = item.as_object();
            let data_index = obj
                .and_then(|o| o.get("dataIndex"))
                .and_then(Value::as_str);
            match data_index {
                Some(data_index) => {
                    let title = obj
                        .and_then(|o| o.get("title"))
                        .and_then(Value::as_str)
                        .unwrap_or(data_index);
                    Some(Task {
                        title: title.to_string(),
                        data_index: data_index.to_string(),
                    })
                }
                None => {
                    warn!(index = idx, "Skipping task without dataIndex");
                    None
                }
            }
        })
        .collect()
}

/// Parse a last-update timestamp (UNIX seconds)
pub fn parse_timestamp(value: &Value) -> Option<f64> {
    value.as_f64().filter(|t| t.is_finite())
}

/// Parse the contest index: contest id to its last update timestamp
pub fn parse_contests(value: &Value) -> BTreeMap<String, Option<f64>> {
    match value.as_object() {
        Some(map) => map
            .iter()
            .map(|(id, ts)| (id.clone(), parse_timestamp(ts)))
            .collect(),
        None => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_score() {
        let score = parse_score(&json!({"point": 100, "elapsed": 30, "penalty": 1})).unwrap();
        assert_eq!(score, Score::new(100, 30, 1));
    }

    #[test]
    fn test_missing_score_fields_are_zero() {
        let score = parse_score(&json!({"point": 100})).unwrap();
        assert_eq!(score, Score::new(100, 0, 0));
    }

    #[test]
    fn test_malformed_score_fields_are_zero() {
        let score =
            parse_score(&json!({"point": "100", "elapsed": -5, "penalty": null})).unwrap();
        assert_eq!(score, Score::new(0, 0, 0));
    }

    #[test]
    fn test_float_fields_are_truncated() {
        let score = parse_score(&json!({"point": 100.0, "elapsed": 30.9, "penalty": 2})).unwrap();
        assert_eq!(score, Score::new(100, 30, 2));
    }

    #[test]
    fn test_non_object_is_not_a_score() {
        assert!(parse_score(&json!("alice")).is_none());
        assert!(parse_score(&json!(3)).is_none());
    }

    #[test]
    fn test_parse_standings_array() {
        let doc = json!([
            {
                "name": "alice",
                "atcoder": "alice_ac",
                "task1": {"point": 100, "elapsed": 30, "penalty": 0},
                "task2": {"point": 0, "elapsed": 0, "penalty": 0}
            },
            {"name": "bob", "atcoder": "bob_ac"}
        ]);
        let standings = parse_standings(&doc);
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].name, "alice");
        assert_eq!(standings[0].atcoder, "alice_ac");
        assert_eq!(standings[0].scores.len(), 2);
        assert_eq!(standings[0].score_for("task1"), Some(&Score::new(100, 30, 0)));
        assert!(standings[1].scores.is_empty());
    }

    #[test]
    fn test_identity_fields_are_not_scores() {
        let doc = json!([{"name": "alice", "atcoder": "a", "key": "alice"}]);
        let standings = parse_standings(&doc);
        assert!(standings[0].scores.is_empty());
    }

    #[test]
    fn test_sparse_list_as_object() {
        let doc = json!({
            "10": {"name": "third"},
            "2": {"name": "second"},
            "0": {"name": "first"}
        });
        let names: Vec<String> = parse_standings(&doc).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_array_holes_are_skipped() {
        let doc = json!([null, {"name": "alice"}, null, {"name": "bob"}]);
        assert_eq!(parse_standings(&doc).len(), 2);
    }

    #[test]
    fn test_standing_without_name_is_skipped() {
        let doc = json!([{"atcoder": "ghost"}, {"name": 5}, {"name": "real"}, "junk"]);
        let standings = parse_standings(&doc);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].name, "real");
    }

    #[test]
    fn test_missing_atcoder_is_empty() {
        let standings = parse_standings(&json!([{"name": "alice"}]));
        assert_eq!(standings[0].atcoder, "");
    }

    #[test]
    fn test_duplicate_names_are_kept() {
        let doc = json!([{"name": "twin"}, {"name": "twin"}]);
        assert_eq!(parse_standings(&doc).len(), 2);
    }

    #[test]
    fn test_parse_tasks() {
        let doc = json!([
            {"title": "A - Hello", "dataIndex": "abc300_a"},
            {"dataIndex": "abc300_b"},
            {"title": "broken"}
        ]);
        let tasks = parse_tasks(&doc);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "A - Hello");
        assert_eq!(tasks[1].title, "abc300_b");
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp(&json!(1700000000)), Some(1_700_000_000.0));
        assert_eq!(parse_timestamp(&json!(1700000000.5)), Some(1_700_000_000.5));
        assert_eq!(parse_timestamp(&json!("soon")), None);
    }

    #[test]
    fn test_parse_contests() {
        let contests = parse_contests(&json!({"abc300": 1700000000, "abc301": true}));
        assert_eq!(contests.len(), 2);
        assert_eq!(contests["abc300"], Some(1_700_000_000.0));
        assert_eq!(contests["abc301"], None);
    }

    #[test]
    fn test_non_list_documents_are_empty() {
        assert!(parse_standings(&json!(42)).is_empty());
        assert!(parse_tasks(&json!("tasks")).is_empty());
        assert!(parse_contests(&json!([1, 2])).is_empty());
    }
}
