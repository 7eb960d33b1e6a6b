use crate::fixtures::{ClubFixtureCalendar, LookaheadDifficulty, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::state::PlayerSnapshot;

/// Named weighting scheme for the composite player score. Weights are
/// conventionally chosen to sum to 1.0 but that is not enforced.
#[derive(Debug, Clone)]
pub struct StrategyProfile {
    pub name: &'static str,
    pub form_weight: f64,
    pub fixture_weight: f64,
    pub value_weight: f64,
    /// When set, players owned by more than this percentage of managers are
    /// excluded from the candidate set entirely (differential hunting).
    pub max_ownership_percent: Option<f64>,
}

const BUILTIN_PROFILES: [StrategyProfile; 5] = [
    StrategyProfile {
        name: "Form-Based",
        form_weight: 0.6,
        fixture_weight: 0.2,
        value_weight: 0.2,
        max_ownership_percent: None,
    },
    StrategyProfile {
        name: "Fixture-Based",
        form_weight: 0.2,
        fixture_weight: 0.6,
        value_weight: 0.2,
        max_ownership_percent: None,
    },
    StrategyProfile {
        name: "Value-Based",
        form_weight: 0.2,
        fixture_weight: 0.2,
        value_weight: 0.6,
        max_ownership_percent: None,
    },
    StrategyProfile {
        name: "Differential",
        form_weight: 0.4,
        fixture_weight: 0.3,
        value_weight: 0.3,
        max_ownership_percent: Some(10.0),
    },
    StrategyProfile {
        name: "Balanced",
        form_weight: 0.4,
        fixture_weight: 0.3,
        value_weight: 0.3,
        max_ownership_percent: None,
    },
];

pub fn builtin_profiles() -> &'static [StrategyProfile] {
    &BUILTIN_PROFILES
}

pub fn profile_by_name(name: &str) -> Option<&'static StrategyProfile> {
    BUILTIN_PROFILES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// A player together with its computed score for one strategy pass.
#[derive(Debug, Clone)]
pub struct ScoredPlayer {
    pub snapshot: PlayerSnapshot,
    pub score: f64,
    /// Summed lookahead difficulty (blanks counted at the default).
    pub fdr_total: f64,
    /// Per-match average difficulty in [1,5]; this is what the score uses.
    pub fdr_per_fixture: f64,
}

/// Composite score for one player.
///
/// `fdr_per_fixture` is the per-match average difficulty over the lookahead
/// window, normalized to [1,5] (see [`LookaheadDifficulty::per_fixture`]).
/// Passing a per-match average rather than a raw sum keeps scores comparable
/// between clubs with blank and double gameweeks.
pub fn score_player(player: &PlayerSnapshot, profile: &StrategyProfile, fdr_per_fixture: f64) -> f64 {
    let fixture_ease = MAX_DIFFICULTY + 1.0 - fdr_per_fixture.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    // cost == 0 means the price column was missing upstream; the value term
    // is worth nothing then, it is not an error.
    let value = if player.cost > 0.0 {
        f64::from(player.total_points) / player.cost
    } else {
        0.0
    };
    player.form * profile.form_weight
        + fixture_ease * profile.fixture_weight
        + value * profile.value_weight
}

/// Score and rank the candidate universe for one strategy.
///
/// Output is ordered by descending score; ties break by descending
/// total_points, then ascending cost, so equal inputs always produce the
/// same table.
pub fn rank_players(
    players: &[PlayerSnapshot],
    calendar: &ClubFixtureCalendar,
    profile: &StrategyProfile,
    current_gameweek: u32,
    lookahead: u32,
) -> Vec<ScoredPlayer> {
    let mut out: Vec<ScoredPlayer> = players
        .iter()
        .filter(|player| match profile.max_ownership_percent {
            Some(cap) => player.ownership_percent <= cap,
            None => true,
        })
        .map(|player| {
            let window = calendar.lookahead(player.club, current_gameweek, lookahead);
            scored(player.clone(), profile, window)
        })
        .collect();
    sort_ranked(&mut out);
    out
}

/// Scoring entry point for callers that already hold a difficulty window
/// (the backtester replays stored per-gameweek opponent difficulty).
pub fn score_with_window(
    player: PlayerSnapshot,
    profile: &StrategyProfile,
    window: LookaheadDifficulty,
) -> ScoredPlayer {
    scored(player, profile, window)
}

pub fn sort_ranked(players: &mut [ScoredPlayer]) {
    players.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.snapshot.total_points.cmp(&a.snapshot.total_points))
            .then_with(|| a.snapshot.cost.total_cmp(&b.snapshot.cost))
    });
}

fn scored(
    snapshot: PlayerSnapshot,
    profile: &StrategyProfile,
    window: LookaheadDifficulty,
) -> ScoredPlayer {
    let fdr_per_fixture = window.per_fixture();
    let score = score_player(&snapshot, profile, fdr_per_fixture);
    ScoredPlayer {
        snapshot,
        score,
        fdr_total: window.total,
        fdr_per_fixture,
    }
}
