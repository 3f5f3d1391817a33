use std::cmp::Ordering;

use super::types::{Penalty, RankedStanding, RawStanding, Score, TeamScore};

/// Number of best task scores that make up a team's total
pub const COUNTED_TASKS: usize = 2;

/// Team whose penalty is always shown as doubled
pub const DOUBLED_PENALTY_TEAM: &str = "sanct";

/// Field holding a precomputed total on raw boards
pub const RAW_TOTAL_KEY: &str = "score";

/// Best-first order: point descending, then elapsed ascending
fn best_first(a_point: u64, a_elapsed: u64, b_point: u64, b_elapsed: u64) -> Ordering {
    b_point.cmp(&a_point).then(a_elapsed.cmp(&b_elapsed))
}

/// Fold step: a score's penalty only counts when that score earned points
fn combine(acc: Score, next: &Score) -> Score {
    Score {
        point: acc.point.saturating_add(next.point),
        elapsed: acc.elapsed.saturating_add(next.elapsed),
        penalty: acc
            .penalty
            .saturating_add(if next.point != 0 { next.penalty } else { 0 }),
    }
}

/// Reduce a team's task scores to the total shown in the Score column.
///
/// Only scores with points are considered. They are ordered best first
/// (stable, so equal scores keep store order) and the first
/// [`COUNTED_TASKS`] of them are summed.
pub fn aggregate(standing: &RawStanding) -> TeamScore {
    let mut countable: Vec<&Score> = standing
        .scores
        .iter()
        .map(|(_, score)| score)
        .filter(|score| score.is_countable())
        .collect();

    countable.sort_by(|a, b| best_first(a.point, a.elapsed, b.point, b.elapsed));

    let total = countable
        .into_iter()
        .take(COUNTED_TASKS)
        .fold(Score::default(), combine);

    let mut team_score = TeamScore::from(total);
    if standing.name == DOUBLED_PENALTY_TEAM {
        team_score.penalty = Penalty::Doubled;
    }
    team_score
}

/// Sort standings best first by their total. Exact ties keep snapshot order.
pub fn sort_ranked(standings: &mut [RankedStanding]) {
    standings.sort_by(|a, b| {
        let a_score = a.score.unwrap_or_default();
        let b_score = b.score.unwrap_or_default();
        best_first(a_score.point, a_score.elapsed, b_score.point, b_score.elapsed)
    });
}

/// Aggregate every team of a snapshot and rank the result
pub fn rank_standings(raw: &[RawStanding]) -> Vec<RankedStanding> {
    let mut ranked: Vec<RankedStanding> = raw
        .iter()
        .map(|standing| RankedStanding {
            key: standing.name.clone(),
            name: standing.name.clone(),
            atcoder: standing.atcoder.clone(),
            score: Some(aggregate(standing)),
            tasks: standing.scores.clone(),
        })
        .collect();

    sort_ranked(&mut ranked);
    ranked
}

/// Pass a snapshot through unchanged, showing any precomputed total as stored
pub fn passthrough_standings(raw: &[RawStanding]) -> Vec<RankedStanding> {
    raw.iter()
        .map(|standing| RankedStanding {
            key: standing.name.clone(),
            name: standing.name.clone(),
            atcoder: standing.atcoder.clone(),
            score: standing.score_for(RAW_TOTAL_KEY).copied().map(TeamScore::from),
            tasks: standing.scores.clone(),
        })
        .collect()
}
