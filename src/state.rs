use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::recommend::Recommendations;
use crate::scoring::{self, StrategyProfile};
use crate::selection::SquadRules;

pub type PlayerId = u32;
pub type ClubId = u32;

/// Default number of upcoming gameweeks considered when judging fixtures.
pub const FIXTURE_LOOKAHEAD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Rankings,
    Squad,
    Chips,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// FPL bootstrap `element_type` codes: 1 GK, 2 DEF, 3 MID, 4 FWD.
    pub fn from_element_type(code: u64) -> Option<Self> {
        match code {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Available,
    Doubtful,
    Injured,
    Suspended,
}

impl AvailabilityStatus {
    /// FPL status codes: a(vailable), d(oubtful), i(njured), s(uspended).
    /// Unrecognized codes (u, n, ...) map to Doubtful rather than being
    /// dropped, so the transfer-out filter still sees the player.
    pub fn from_code(code: &str) -> Self {
        match code {
            "a" => AvailabilityStatus::Available,
            "d" => AvailabilityStatus::Doubtful,
            "i" => AvailabilityStatus::Injured,
            "s" => AvailabilityStatus::Suspended,
            _ => AvailabilityStatus::Doubtful,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "Available",
            AvailabilityStatus::Doubtful => "Doubtful",
            AvailabilityStatus::Injured => "Injured",
            AvailabilityStatus::Suspended => "Suspended",
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

/// One player's state as of a given gameweek. Constructed fresh per run from
/// the fetch/replay layer; immutable afterwards. Missing numeric data is
/// defaulted to zero at parse time, never carried as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub club: ClubId,
    pub club_name: String,
    pub position: Position,
    pub form: f64,
    pub total_points: u32,
    /// Price in budget units (the API serves tenths).
    pub cost: f64,
    pub ownership_percent: f64,
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub short_name: String,
}

/// One scheduled match. Difficulty values are clamped to [1,5] at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// None for fixtures the league has not yet scheduled into a gameweek.
    pub gameweek: Option<u32>,
    pub home: ClubId,
    pub away: ClubId,
    pub home_difficulty: u8,
    pub away_difficulty: u8,
    pub finished: bool,
}

/// One slot of the user's existing 15-man roster. Slots 1-11 start, 12-15
/// are the bench.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RosterSlot {
    pub player_id: PlayerId,
    pub slot: u8,
}

impl RosterSlot {
    pub fn is_bench(&self) -> bool {
        self.slot >= 12
    }
}

/// Everything the core needs for one recommendation run, fully materialized
/// before any scoring happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub clubs: Vec<Club>,
    pub fixtures: Vec<FixtureRecord>,
    pub roster: Option<Vec<RosterSlot>>,
    pub current_gameweek: u32,
    pub next_deadline: Option<String>,
    #[serde(default)]
    pub fetched_at_unix: Option<u64>,
}

#[derive(Debug)]
pub enum Delta {
    Snapshot(Box<UniverseSnapshot>),
    Roster(Vec<RosterSlot>),
    Log(String),
    ExportUpdate(String),
    ExportDone { files: usize, errors: usize },
}

#[derive(Debug, Clone, Copy)]
pub enum ProviderCommand {
    RefreshAll,
    RefreshRoster,
}

#[derive(Debug)]
pub struct ExportState {
    pub running: bool,
    pub message: String,
    pub finished_at: Option<Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            running: false,
            message: String::new(),
            finished_at: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        if let Some(done) = self.finished_at {
            if now.duration_since(done).as_secs() >= keep_secs {
                self.message.clear();
                self.finished_at = None;
            }
        }
    }
}

const MAX_LOG_LINES: usize = 200;

pub struct AppState {
    pub screen: Screen,
    pub universe: Option<UniverseSnapshot>,
    pub recommendations: Option<Recommendations>,
    pub strategy_idx: usize,
    pub position_filter: Option<Position>,
    pub lookahead: u32,
    pub rules: SquadRules,
    pub rankings_selected: usize,
    pub squad_selected: usize,
    pub logs: Vec<String>,
    pub help_overlay: bool,
    pub export: ExportState,
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Rankings,
            universe: None,
            recommendations: None,
            strategy_idx: 0,
            position_filter: None,
            lookahead: FIXTURE_LOOKAHEAD,
            rules: SquadRules::default(),
            rankings_selected: 0,
            squad_selected: 0,
            logs: Vec::new(),
            help_overlay: false,
            export: ExportState::new(),
            loading: true,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push(msg.into());
        if self.logs.len() > MAX_LOG_LINES {
            let drop = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..drop);
        }
    }

    pub fn profile(&self) -> &'static StrategyProfile {
        let profiles = scoring::builtin_profiles();
        &profiles[self.strategy_idx % profiles.len()]
    }

    pub fn cycle_strategy(&mut self) {
        self.strategy_idx = (self.strategy_idx + 1) % scoring::builtin_profiles().len();
        self.rankings_selected = 0;
        self.rebuild_recommendations();
    }

    pub fn cycle_position_filter(&mut self) {
        self.position_filter = match self.position_filter {
            None => Some(Position::Goalkeeper),
            Some(Position::Goalkeeper) => Some(Position::Defender),
            Some(Position::Defender) => Some(Position::Midfielder),
            Some(Position::Midfielder) => Some(Position::Forward),
            Some(Position::Forward) => None,
        };
        self.rankings_selected = 0;
    }

    pub fn rebuild_recommendations(&mut self) {
        let Some(universe) = self.universe.as_ref() else {
            self.recommendations = None;
            return;
        };
        let recs = crate::recommend::build_recommendations(
            universe,
            self.profile(),
            &self.rules,
            self.lookahead,
        );
        self.recommendations = Some(recs);
        self.clamp_selections();
    }

    pub fn visible_rankings_len(&self) -> usize {
        let Some(recs) = self.recommendations.as_ref() else {
            return 0;
        };
        match self.position_filter {
            None => recs.best_players.len(),
            Some(pos) => recs
                .best_players
                .iter()
                .filter(|row| row.position == pos)
                .count(),
        }
    }

    pub fn roster_len(&self) -> usize {
        self.universe
            .as_ref()
            .and_then(|u| u.roster.as_ref())
            .map(|r| r.len())
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Rankings => {
                let len = self.visible_rankings_len();
                if len > 0 {
                    self.rankings_selected = (self.rankings_selected + 1).min(len - 1);
                }
            }
            Screen::Squad => {
                let len = self.roster_len();
                if len > 0 {
                    self.squad_selected = (self.squad_selected + 1).min(len - 1);
                }
            }
            Screen::Chips => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Rankings => {
                self.rankings_selected = self.rankings_selected.saturating_sub(1);
            }
            Screen::Squad => {
                self.squad_selected = self.squad_selected.saturating_sub(1);
            }
            Screen::Chips => {}
        }
    }

    pub fn clamp_selections(&mut self) {
        let rankings_len = self.visible_rankings_len();
        if rankings_len == 0 {
            self.rankings_selected = 0;
        } else if self.rankings_selected >= rankings_len {
            self.rankings_selected = rankings_len - 1;
        }
        let roster_len = self.roster_len();
        if roster_len == 0 {
            self.squad_selected = 0;
        } else if self.squad_selected >= roster_len {
            self.squad_selected = roster_len - 1;
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Snapshot(universe) => {
            state.universe = Some(*universe);
            state.loading = false;
            state.rebuild_recommendations();
        }
        Delta::Roster(roster) => {
            if let Some(universe) = state.universe.as_mut() {
                universe.roster = Some(roster);
                state.rebuild_recommendations();
            }
        }
        Delta::Log(msg) => state.push_log(msg),
        Delta::ExportUpdate(msg) => {
            state.export.running = true;
            state.export.message = msg;
        }
        Delta::ExportDone { files, errors } => {
            state.export.running = false;
            state.export.finished_at = Some(Instant::now());
            state.export.message = if errors == 0 {
                format!("Export finished: {files} file(s)")
            } else {
                format!("Export finished: {files} file(s), {errors} error(s)")
            };
            let message = state.export.message.clone();
            state.push_log(message);
        }
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Rankings => "RANKINGS",
        Screen::Squad => "SQUAD",
        Screen::Chips => "CHIPS",
    }
}
