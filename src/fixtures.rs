use std::collections::{BTreeMap, HashMap};

use crate::state::{ClubId, FixtureRecord};

/// Difficulty assumed for a gameweek with no recorded fixture for a club.
/// Blank gameweeks are treated as "unknown/hard" on purpose: a missing match
/// should never make a club look like an easy pick.
pub const DEFAULT_DIFFICULTY: f64 = 5.0;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 5.0;

/// Per-club, per-gameweek difficulty buckets derived from the fixture list.
/// A club normally has one entry per gameweek, but double gameweeks produce
/// two and blank gameweeks none; both cases are first-class here. Built once
/// per run, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ClubFixtureCalendar {
    by_club: HashMap<ClubId, BTreeMap<u32, Vec<f64>>>,
}

/// Difficulty over a lookahead window. `total` is the summed difficulty of
/// every slot in the window; `slots` counts one per recorded fixture plus one
/// per blank gameweek (each blank contributing [`DEFAULT_DIFFICULTY`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookaheadDifficulty {
    pub total: f64,
    pub slots: usize,
    pub fixtures: usize,
    pub blanks: usize,
    pub doubles: usize,
}

impl LookaheadDifficulty {
    /// Average difficulty per upcoming match, normalized to [1,5] so scores
    /// stay comparable across clubs with blank/double gameweeks.
    pub fn per_fixture(&self) -> f64 {
        if self.slots == 0 {
            DEFAULT_DIFFICULTY
        } else {
            (self.total / self.slots as f64).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
        }
    }
}

/// Build the calendar from raw fixture records. Finished fixtures and
/// fixtures without a scheduled gameweek are ignored; each remaining fixture
/// records the home club's difficulty and the away club's difficulty under
/// that gameweek's bucket.
pub fn aggregate(fixtures: &[FixtureRecord]) -> ClubFixtureCalendar {
    let mut by_club: HashMap<ClubId, BTreeMap<u32, Vec<f64>>> = HashMap::new();
    for fixture in fixtures {
        if fixture.finished {
            continue;
        }
        let Some(gameweek) = fixture.gameweek else {
            continue;
        };
        by_club
            .entry(fixture.home)
            .or_default()
            .entry(gameweek)
            .or_default()
            .push(clamp_difficulty(fixture.home_difficulty));
        by_club
            .entry(fixture.away)
            .or_default()
            .entry(gameweek)
            .or_default()
            .push(clamp_difficulty(fixture.away_difficulty));
    }
    ClubFixtureCalendar { by_club }
}

impl ClubFixtureCalendar {
    /// Summed difficulty of one gameweek's fixtures for a club, or None for
    /// a blank gameweek. Double gameweeks sum both fixtures: the club plays
    /// twice, so the load is the sum, not the average.
    pub fn gameweek_difficulty(&self, club: ClubId, gameweek: u32) -> Option<f64> {
        let bucket = self.by_club.get(&club)?.get(&gameweek)?;
        if bucket.is_empty() {
            return None;
        }
        Some(bucket.iter().sum())
    }

    pub fn fixture_count(&self, club: ClubId, gameweek: u32) -> usize {
        self.by_club
            .get(&club)
            .and_then(|gws| gws.get(&gameweek))
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }

    /// Summed difficulty over the `n` gameweeks starting at `start_gw`.
    /// Blank gameweeks contribute [`DEFAULT_DIFFICULTY`] each.
    pub fn lookahead_difficulty(&self, club: ClubId, start_gw: u32, n: u32) -> f64 {
        self.lookahead(club, start_gw, n).total
    }

    pub fn lookahead(&self, club: ClubId, start_gw: u32, n: u32) -> LookaheadDifficulty {
        let mut out = LookaheadDifficulty {
            total: 0.0,
            slots: 0,
            fixtures: 0,
            blanks: 0,
            doubles: 0,
        };
        for gameweek in start_gw..start_gw.saturating_add(n) {
            match self.gameweek_difficulty(club, gameweek) {
                Some(sum) => {
                    let count = self.fixture_count(club, gameweek);
                    out.total += sum;
                    out.slots += count;
                    out.fixtures += count;
                    if count > 1 {
                        out.doubles += 1;
                    }
                }
                None => {
                    out.total += DEFAULT_DIFFICULTY;
                    out.slots += 1;
                    out.blanks += 1;
                }
            }
        }
        out
    }

    /// Gameweeks in `[start_gw, start_gw + n)` where any club has zero or
    /// two-plus fixtures, with the anomaly count per gameweek. Used by the
    /// free-hit chip heuristic.
    pub fn anomaly_gameweeks(&self, start_gw: u32, n: u32) -> Vec<(u32, usize)> {
        let mut out = Vec::new();
        for gameweek in start_gw..start_gw.saturating_add(n) {
            let mut anomalies = 0usize;
            for gws in self.by_club.values() {
                let count = gws.get(&gameweek).map(|b| b.len()).unwrap_or(0);
                if count != 1 {
                    anomalies += 1;
                }
            }
            if anomalies > 0 {
                out.push((gameweek, anomalies));
            }
        }
        out
    }

    pub fn clubs(&self) -> impl Iterator<Item = ClubId> + '_ {
        self.by_club.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_club.is_empty()
    }
}

fn clamp_difficulty(raw: u8) -> f64 {
    f64::from(raw).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}
