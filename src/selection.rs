use std::collections::HashMap;

use crate::fixtures::{ClubFixtureCalendar, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::scoring::ScoredPlayer;
use crate::state::{ClubId, PlayerSnapshot, Position};

/// FPL reference ruleset: 100.0 budget, 2 GK / 5 DEF / 5 MID / 3 FWD,
/// at most 3 players from one club.
#[derive(Debug, Clone)]
pub struct SquadRules {
    pub budget: f64,
    pub quotas: [(Position, usize); 4],
    pub max_per_club: usize,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            budget: 100.0,
            quotas: [
                (Position::Goalkeeper, 2),
                (Position::Defender, 5),
                (Position::Midfielder, 5),
                (Position::Forward, 3),
            ],
            max_per_club: 3,
        }
    }
}

impl SquadRules {
    pub fn squad_size(&self) -> usize {
        self.quotas.iter().map(|(_, n)| n).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Squad {
    pub players: Vec<ScoredPlayer>,
    pub total_cost: f64,
}

impl Squad {
    pub fn total_points(&self) -> u32 {
        self.players.iter().map(|p| p.snapshot.total_points).sum()
    }
}

/// A quota the greedy pass could not fill within budget/club constraints.
/// Reported to the caller, never treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaShortfall {
    pub position: Position,
    pub missing: usize,
}

#[derive(Debug, Clone)]
pub struct SquadSelection {
    pub squad: Squad,
    pub shortfalls: Vec<QuotaShortfall>,
}

impl SquadSelection {
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

/// Greedy squad assembly: for each position in fixed order (GK, DEF, MID,
/// FWD) walk the ranked candidates and admit one whenever budget and the
/// per-club cap allow, until the quota fills or candidates run out.
///
/// Deliberately not a combinatorial optimizer: the returned squad is a fast
/// approximation whose hard guarantees are the constraints (never over
/// budget, never over the club cap, never over quota), not optimality.
pub fn select_squad(candidates: &[ScoredPlayer], rules: &SquadRules) -> SquadSelection {
    let mut players: Vec<ScoredPlayer> = Vec::with_capacity(rules.squad_size());
    let mut spent = 0.0_f64;
    let mut club_counts: HashMap<ClubId, usize> = HashMap::new();
    let mut shortfalls = Vec::new();

    for (position, quota) in rules.quotas {
        let mut filled = 0usize;
        for candidate in candidates
            .iter()
            .filter(|c| c.snapshot.position == position)
        {
            if filled == quota {
                break;
            }
            if spent + candidate.snapshot.cost > rules.budget {
                continue;
            }
            let club_count = club_counts.entry(candidate.snapshot.club).or_insert(0);
            if *club_count >= rules.max_per_club {
                continue;
            }
            *club_count += 1;
            spent += candidate.snapshot.cost;
            players.push(candidate.clone());
            filled += 1;
        }
        if filled < quota {
            shortfalls.push(QuotaShortfall {
                position,
                missing: quota - filled,
            });
        }
    }

    SquadSelection {
        squad: Squad {
            players,
            total_cost: spent,
        },
        shortfalls,
    }
}

const CAPTAIN_FORM_WEIGHT: f64 = 0.4;
const CAPTAIN_POINTS_WEIGHT: f64 = 0.3;
const CAPTAIN_FIXTURE_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct CaptainCandidate {
    pub snapshot: PlayerSnapshot,
    pub score: f64,
    pub fdr_per_fixture: f64,
}

#[derive(Debug, Clone)]
pub struct CaptaincyPick {
    pub captain: CaptainCandidate,
    pub vice: CaptainCandidate,
}

/// Captain/vice-captain over the user's existing roster. Returns None when
/// fewer than two eligible players exist ("insufficient data"), never
/// panics on short rosters.
pub fn pick_captaincy(
    roster: &[PlayerSnapshot],
    calendar: &ClubFixtureCalendar,
    current_gameweek: u32,
    lookahead: u32,
) -> Option<CaptaincyPick> {
    let mut candidates: Vec<CaptainCandidate> = roster
        .iter()
        .filter(|player| player.status.is_available())
        .map(|player| {
            let fdr = calendar
                .lookahead(player.club, current_gameweek, lookahead)
                .per_fixture();
            CaptainCandidate {
                score: captain_score(player, fdr),
                fdr_per_fixture: fdr,
                snapshot: player.clone(),
            }
        })
        .collect();
    if candidates.len() < 2 {
        return None;
    }
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.snapshot.total_points.cmp(&a.snapshot.total_points))
            .then_with(|| a.snapshot.cost.total_cmp(&b.snapshot.cost))
    });
    let mut iter = candidates.into_iter();
    let captain = iter.next()?;
    let vice = iter.next()?;
    Some(CaptaincyPick { captain, vice })
}

pub fn captain_score(player: &PlayerSnapshot, fdr_per_fixture: f64) -> f64 {
    let fixture_ease = MAX_DIFFICULTY + 1.0 - fdr_per_fixture.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    player.form * CAPTAIN_FORM_WEIGHT
        + f64::from(player.total_points) * CAPTAIN_POINTS_WEIGHT
        + fixture_ease * CAPTAIN_FIXTURE_WEIGHT
}
