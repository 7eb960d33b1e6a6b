use std::collections::HashSet;

use crate::fixtures::{self, ClubFixtureCalendar, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::scoring::{self, ScoredPlayer, StrategyProfile};
use crate::selection::{self, CaptaincyPick, SquadRules, SquadSelection, captain_score};
use crate::state::{PlayerId, PlayerSnapshot, Position, UniverseSnapshot};

/// Players below this recent scoring rate are transfer-out candidates.
pub const MIN_FORM_CUTOFF: f64 = 2.0;
/// Summed lookahead difficulty strictly above `lookahead * 3` flags a player.
pub const TRANSFER_DIFFICULTY_FACTOR: f64 = 3.0;
/// Replacement suggestions per outgoing player.
const REPLACEMENTS_PER_PLAYER: usize = 3;
/// Last gameweek of the first half of the season.
const HALF_SEASON_GW: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferReason {
    PoorForm,
    Unavailable,
    HardFixtures,
}

impl TransferReason {
    pub fn label(self) -> &'static str {
        match self {
            TransferReason::PoorForm => "poor form",
            TransferReason::Unavailable => "unavailable",
            TransferReason::HardFixtures => "hard fixtures",
        }
    }
}

/// One row of the ranked best-players table, flattened for display/export.
#[derive(Debug, Clone)]
pub struct RankedPlayerRow {
    pub id: PlayerId,
    pub name: String,
    pub club_name: String,
    pub position: Position,
    pub form: f64,
    pub total_points: u32,
    pub cost: f64,
    pub ownership_percent: f64,
    pub fdr_total: f64,
    pub fdr_per_fixture: f64,
    pub score: f64,
}

impl RankedPlayerRow {
    fn from_scored(scored: &ScoredPlayer) -> Self {
        let p = &scored.snapshot;
        Self {
            id: p.id,
            name: p.name.clone(),
            club_name: p.club_name.clone(),
            position: p.position,
            form: p.form,
            total_points: p.total_points,
            cost: p.cost,
            ownership_percent: p.ownership_percent,
            fdr_total: scored.fdr_total,
            fdr_per_fixture: scored.fdr_per_fixture,
            score: scored.score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferOutRow {
    pub snapshot: PlayerSnapshot,
    pub fdr_total: f64,
    pub reasons: Vec<TransferReason>,
}

#[derive(Debug, Clone)]
pub struct ReplacementSuggestion {
    pub out_player: PlayerId,
    pub out_name: String,
    pub candidates: Vec<RankedPlayerRow>,
}

#[derive(Debug, Clone, Copy)]
pub struct ChipTiming {
    pub gameweek: u32,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FreeHitTiming {
    pub gameweek: u32,
    /// Clubs with zero or two-plus fixtures in that gameweek.
    pub anomalies: usize,
}

/// Chip-usage timing suggestions over the lookahead window. Any field can be
/// None when the inputs give no sensible signal (no roster, no anomalies,
/// wildcard window already passed).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChipPlan {
    pub bench_boost: Option<ChipTiming>,
    pub triple_captain: Option<ChipTiming>,
    pub wildcard: Option<u32>,
    pub free_hit: Option<FreeHitTiming>,
}

#[derive(Debug, Clone)]
pub struct Recommendations {
    pub strategy: &'static str,
    pub current_gameweek: u32,
    pub lookahead: u32,
    pub best_players: Vec<RankedPlayerRow>,
    pub transfers_out: Vec<TransferOutRow>,
    pub captaincy: Option<CaptaincyPick>,
    pub chips: ChipPlan,
    pub suggested_squad: SquadSelection,
    pub replacements: Vec<ReplacementSuggestion>,
}

/// One full recommendation run over an immutable snapshot. Pure: no I/O, no
/// shared state, so independent strategy runs can go side by side.
pub fn build_recommendations(
    universe: &UniverseSnapshot,
    profile: &StrategyProfile,
    rules: &SquadRules,
    lookahead: u32,
) -> Recommendations {
    let calendar = fixtures::aggregate(&universe.fixtures);
    let gameweek = universe.current_gameweek;

    let ranked = scoring::rank_players(&universe.players, &calendar, profile, gameweek, lookahead);
    let best_players: Vec<RankedPlayerRow> =
        ranked.iter().map(RankedPlayerRow::from_scored).collect();
    let suggested_squad = selection::select_squad(&ranked, rules);

    let roster_players = resolve_roster(universe);
    let roster_ids: HashSet<PlayerId> = roster_players.iter().map(|p| p.id).collect();

    let transfers_out = transfer_out_candidates(&roster_players, &calendar, gameweek, lookahead);
    let captaincy = selection::pick_captaincy(&roster_players, &calendar, gameweek, lookahead);
    let replacements = replacement_suggestions(&transfers_out, &best_players, &roster_ids);
    let chips = plan_chips(universe, &calendar, gameweek, lookahead);

    Recommendations {
        strategy: profile.name,
        current_gameweek: gameweek,
        lookahead,
        best_players,
        transfers_out,
        captaincy,
        chips,
        suggested_squad,
        replacements,
    }
}

/// Roster slots resolved against the player universe. Slots referencing an
/// unknown player id are skipped; that is a data gap, not an error.
fn resolve_roster(universe: &UniverseSnapshot) -> Vec<PlayerSnapshot> {
    let Some(roster) = universe.roster.as_ref() else {
        return Vec::new();
    };
    roster
        .iter()
        .filter_map(|slot| {
            universe
                .players
                .iter()
                .find(|p| p.id == slot.player_id)
                .cloned()
        })
        .collect()
}

/// Players failing the form/availability/fixture thresholds. The fixture
/// test is a strict greater-than: a window that averages exactly 3 per
/// gameweek is acceptable.
pub fn transfer_out_candidates(
    roster: &[PlayerSnapshot],
    calendar: &ClubFixtureCalendar,
    current_gameweek: u32,
    lookahead: u32,
) -> Vec<TransferOutRow> {
    let difficulty_cutoff = f64::from(lookahead) * TRANSFER_DIFFICULTY_FACTOR;
    roster
        .iter()
        .filter_map(|player| {
            let fdr_total = calendar.lookahead_difficulty(player.club, current_gameweek, lookahead);
            let mut reasons = Vec::new();
            if player.form < MIN_FORM_CUTOFF {
                reasons.push(TransferReason::PoorForm);
            }
            if !player.status.is_available() {
                reasons.push(TransferReason::Unavailable);
            }
            if fdr_total > difficulty_cutoff {
                reasons.push(TransferReason::HardFixtures);
            }
            if reasons.is_empty() {
                None
            } else {
                Some(TransferOutRow {
                    snapshot: player.clone(),
                    fdr_total,
                    reasons,
                })
            }
        })
        .collect()
}

/// Same-position, affordable, not-already-owned substitutes for each
/// transfer-out candidate, best score first.
fn replacement_suggestions(
    transfers_out: &[TransferOutRow],
    best_players: &[RankedPlayerRow],
    roster_ids: &HashSet<PlayerId>,
) -> Vec<ReplacementSuggestion> {
    transfers_out
        .iter()
        .map(|out| {
            let candidates: Vec<RankedPlayerRow> = best_players
                .iter()
                .filter(|row| {
                    row.position == out.snapshot.position
                        && row.cost <= out.snapshot.cost
                        && !roster_ids.contains(&row.id)
                })
                .take(REPLACEMENTS_PER_PLAYER)
                .cloned()
                .collect();
            ReplacementSuggestion {
                out_player: out.snapshot.id,
                out_name: out.snapshot.name.clone(),
                candidates,
            }
        })
        .collect()
}

fn plan_chips(
    universe: &UniverseSnapshot,
    calendar: &ClubFixtureCalendar,
    current_gameweek: u32,
    lookahead: u32,
) -> ChipPlan {
    let roster_players = resolve_roster(universe);
    let bench: Vec<&PlayerSnapshot> = universe
        .roster
        .as_ref()
        .map(|slots| {
            slots
                .iter()
                .filter(|slot| slot.is_bench())
                .filter_map(|slot| roster_players.iter().find(|p| p.id == slot.player_id))
                .collect()
        })
        .unwrap_or_default();

    let bench_boost = best_gameweek_for(&bench, calendar, current_gameweek, lookahead, |p, fdr| {
        let ease = MAX_DIFFICULTY + 1.0 - fdr.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        p.form * 0.5 + ease * 0.5
    });

    let available: Vec<&PlayerSnapshot> = roster_players
        .iter()
        .filter(|p| p.status.is_available())
        .collect();
    let triple_captain = best_gameweek_max(
        &available,
        calendar,
        current_gameweek,
        lookahead,
        captain_score,
    );

    // Fixed half-season heuristic: play the wildcard at the start of the
    // second half; once past it there is no canonical window left.
    let wildcard = if current_gameweek <= HALF_SEASON_GW {
        Some(HALF_SEASON_GW + 1)
    } else {
        None
    };

    let free_hit = calendar
        .anomaly_gameweeks(current_gameweek, lookahead)
        .into_iter()
        .max_by_key(|(_, anomalies)| *anomalies)
        .map(|(gameweek, anomalies)| FreeHitTiming {
            gameweek,
            anomalies,
        });

    ChipPlan {
        bench_boost,
        triple_captain,
        wildcard,
        free_hit,
    }
}

/// Gameweek in the window maximizing the summed per-player score. The score
/// closure receives that gameweek's per-fixture difficulty; blank gameweeks
/// rate the default (hard) difficulty, so they naturally lose.
fn best_gameweek_for(
    players: &[&PlayerSnapshot],
    calendar: &ClubFixtureCalendar,
    current_gameweek: u32,
    lookahead: u32,
    score: impl Fn(&PlayerSnapshot, f64) -> f64,
) -> Option<ChipTiming> {
    if players.is_empty() {
        return None;
    }
    let mut best: Option<ChipTiming> = None;
    for gameweek in current_gameweek..current_gameweek.saturating_add(lookahead) {
        let total: f64 = players
            .iter()
            .map(|player| {
                let fdr = calendar.lookahead(player.club, gameweek, 1).per_fixture();
                score(player, fdr)
            })
            .sum();
        if best.map(|b| total > b.score).unwrap_or(true) {
            best = Some(ChipTiming {
                gameweek,
                score: total,
            });
        }
    }
    best
}

/// Gameweek in the window where the single best player peaks (triple
/// captain wants one monster score, not a squad-wide one).
fn best_gameweek_max(
    players: &[&PlayerSnapshot],
    calendar: &ClubFixtureCalendar,
    current_gameweek: u32,
    lookahead: u32,
    score: impl Fn(&PlayerSnapshot, f64) -> f64,
) -> Option<ChipTiming> {
    if players.is_empty() {
        return None;
    }
    let mut best: Option<ChipTiming> = None;
    for gameweek in current_gameweek..current_gameweek.saturating_add(lookahead) {
        for player in players {
            let fdr = calendar.lookahead(player.club, gameweek, 1).per_fixture();
            let value = score(player, fdr);
            if best.map(|b| value > b.score).unwrap_or(true) {
                best = Some(ChipTiming {
                    gameweek,
                    score: value,
                });
            }
        }
    }
    best
}
