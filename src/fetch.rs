use anyhow::{Context, Result};
use tracing::debug;

use crate::board::{contests_path, default_contest, BoardContext, BoardState, ContestList, Feed};
use crate::config::BoardConfig;
use crate::store::DocumentSource;

/// Read a board's contest index once
pub async fn load_contests<S: DocumentSource>(source: &S, board: &BoardConfig) -> Result<ContestList> {
    let path = contests_path(board);
    let value = source
        .get(&path)
        .await
        .with_context(|| format!("Failed to read contest list at {}", path))?;

    let mut contests = ContestList::default();
    contests.apply(value.as_ref());
    Ok(contests)
}

/// Decide which contest to show. The contest index is only read when neither
/// the command line nor the config names one.
pub async fn resolve_contest<S: DocumentSource>(
    source: &S,
    board: &BoardConfig,
    flag: Option<&str>,
    configured: Option<&str>,
) -> Result<String> {
    if let Some(contest) = flag.or(configured) {
        return Ok(contest.to_string());
    }
    let contests = load_contests(source, board).await?;
    let contest = default_contest(None, None, &contests);
    debug!(contest = %contest, "Picked most recently updated contest");
    Ok(contest)
}

/// Read every document of a board context once and build its state.
///
/// This is the non-interactive counterpart of a watch: the same documents,
/// read in parallel instead of followed.
pub async fn load_board<S: DocumentSource>(source: &S, context: BoardContext) -> Result<BoardState> {
    let tasks_path = context.tasks_path();
    let standings_path = context.standings_path();
    let last_updated_path = context.last_updated_path();

    let (tasks, standings, last_updated) = tokio::try_join!(
        async {
            source
                .get(&tasks_path)
                .await
                .with_context(|| format!("Failed to read tasks at {}", tasks_path))
        },
        async {
            source
                .get(&standings_path)
                .await
                .with_context(|| format!("Failed to read standings at {}", standings_path))
        },
        async {
            source
                .get(&last_updated_path)
                .await
                .with_context(|| format!("Failed to read last update at {}", last_updated_path))
        },
    )?;

    let mut state = BoardState::new(context);
    state.apply(Feed::Tasks, tasks.as_ref());
    state.apply(Feed::Standings, standings.as_ref());
    state.apply(Feed::LastUpdated, last_updated.as_ref());
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardMode;
    use crate::store::MemorySource;
    use serde_json::json;

    fn board() -> BoardConfig {
        BoardConfig {
            name: "no-spons".to_string(),
            root: "atcoder/no-spons".to_string(),
            mode: BoardMode::Ranked,
        }
    }

    fn seeded() -> MemorySource {
        let source = MemorySource::new();
        source.set(
            "atcoder/no-spons/last_updated",
            json!({"abc300": 1700000000, "abc301": 1700000500}),
        );
        source.set(
            "atcoder/no-spons/tasks/abc301",
            json!([{"title": "A", "dataIndex": "abc301_a"}]),
        );
        source.set(
            "atcoder/no-spons/standings/abc301",
            json!([
                {"name": "alice", "atcoder": "alice_ac", "abc301_a": {"point": 100, "elapsed": 60, "penalty": 1}},
                {"name": "bob", "atcoder": "bob_ac", "abc301_a": {"point": 200, "elapsed": 90, "penalty": 0}}
            ]),
        );
        source
    }

    #[tokio::test]
    async fn test_load_board() {
        let source = seeded();
        // last_updated/abc301 was written through the index above
        let state = load_board(&source, BoardContext::new(board(), "abc301"))
            .await
            .unwrap();

        assert_eq!(state.columns.len(), 3);
        assert_eq!(state.standings[0].name, "bob");
        assert_eq!(state.standings[1].score.unwrap().point, 100);
        assert_eq!(state.last_updated, Some(1700000500.0));
    }

    #[tokio::test]
    async fn test_load_board_without_data() {
        let source = MemorySource::new();
        let state = load_board(&source, BoardContext::new(board(), "-"))
            .await
            .unwrap();
        assert_eq!(state.columns.len(), 2);
        assert!(state.standings.is_empty());
        assert!(!state.has_standings);
    }

    #[tokio::test]
    async fn test_resolve_contest_prefers_flag_then_config() {
        let source = seeded();
        let b = board();
        assert_eq!(
            resolve_contest(&source, &b, Some("abc299"), Some("abc298")).await.unwrap(),
            "abc299"
        );
        assert_eq!(
            resolve_contest(&source, &b, None, Some("abc298")).await.unwrap(),
            "abc298"
        );
        assert_eq!(resolve_contest(&source, &b, None, None).await.unwrap(), "abc301");
    }

    #[tokio::test]
    async fn test_resolve_contest_without_index() {
        let source = MemorySource::new();
        assert_eq!(resolve_contest(&source, &board(), None, None).await.unwrap(), "-");
    }

    #[tokio::test]
    async fn test_load_contests() {
        let contests = load_contests(&seeded(), &board()).await.unwrap();
        assert_eq!(contests.len(), 2);
        assert_eq!(contests.contests[0].0, "abc300");
    }
}
