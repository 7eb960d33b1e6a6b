use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

use rayon::prelude::*;

use crate::fixtures::LookaheadDifficulty;
use crate::historical::GwPlayerRow;
use crate::scoring::{self, ScoredPlayer, StrategyProfile};
use crate::selection::{self, SquadRules};
use crate::state::{AvailabilityStatus, PlayerSnapshot};

#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub strategy: &'static str,
    pub total_points: i64,
    pub points_per_gameweek: Vec<(u32, i64)>,
    /// Gameweeks where the greedy pass could not fill every quota.
    pub shortfall_gameweeks: usize,
}

/// Replay one strategy over stored gameweeks: score the gameweek's player
/// rows, assemble a constrained squad, bank its points. Pure function of
/// the dataset, so profile runs can go in parallel.
pub fn simulate_profile(
    rows_by_gw: &BTreeMap<u32, Vec<GwPlayerRow>>,
    gameweeks: RangeInclusive<u32>,
    profile: &'static StrategyProfile,
    rules: &SquadRules,
) -> BacktestOutcome {
    let mut total_points = 0i64;
    let mut points_per_gameweek = Vec::new();
    let mut shortfall_gameweeks = 0usize;

    for gameweek in gameweeks {
        let Some(rows) = rows_by_gw.get(&gameweek) else {
            continue;
        };
        let mut ranked = rank_gameweek(rows, profile);
        scoring::sort_ranked(&mut ranked);
        let selection = selection::select_squad(&ranked, rules);
        if !selection.is_complete() {
            shortfall_gameweeks += 1;
        }
        let points = i64::from(selection.squad.total_points());
        total_points += points;
        points_per_gameweek.push((gameweek, points));
    }

    BacktestOutcome {
        strategy: profile.name,
        total_points,
        points_per_gameweek,
        shortfall_gameweeks,
    }
}

/// Run every built-in profile over the same dataset, in parallel. Profiles
/// share no mutable state; output order matches the profile list, so the
/// comparison table is stable.
pub fn compare_profiles(
    rows_by_gw: &BTreeMap<u32, Vec<GwPlayerRow>>,
    gameweeks: RangeInclusive<u32>,
    rules: &SquadRules,
) -> Vec<BacktestOutcome> {
    scoring::builtin_profiles()
        .par_iter()
        .map(|profile| simulate_profile(rows_by_gw, gameweeks.clone(), profile, rules))
        .collect()
}

/// Score one gameweek's rows. The stored opponent difficulty stands in for
/// the fixture lookahead: one fixture slot per row.
fn rank_gameweek(rows: &[GwPlayerRow], profile: &StrategyProfile) -> Vec<ScoredPlayer> {
    let mut club_ids: HashMap<&str, u32> = HashMap::new();
    rows.iter()
        .filter(|row| match profile.max_ownership_percent {
            Some(cap) => row.ownership <= cap,
            None => true,
        })
        .map(|row| {
            let next_id = club_ids.len() as u32 + 1;
            let club = *club_ids.entry(row.club.as_str()).or_insert(next_id);
            let snapshot = PlayerSnapshot {
                id: row.player_id,
                name: row.name.clone(),
                club,
                club_name: row.club.clone(),
                position: row.position,
                form: row.form.max(0.0),
                total_points: row.total_points.max(0) as u32,
                cost: row.cost,
                ownership_percent: row.ownership,
                status: AvailabilityStatus::Available,
            };
            let window = LookaheadDifficulty {
                total: f64::from(row.opponent_difficulty),
                slots: 1,
                fixtures: 1,
                blanks: 0,
                doubles: 0,
            };
            scoring::score_with_window(snapshot, profile, window)
        })
        .collect()
}
