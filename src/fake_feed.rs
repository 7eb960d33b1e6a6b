use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::rngs::ThreadRng;

use crate::state::{
    AvailabilityStatus, Club, Delta, FixtureRecord, PlayerSnapshot, Position, ProviderCommand,
    RosterSlot, UniverseSnapshot,
};

const DEMO_GAMEWEEK: u32 = 10;
const DEMO_WINDOW: u32 = 6;

/// Offline provider: a synthetic league with enough texture to exercise the
/// whole pipeline (a double gameweek, a blank gameweek, injured players, a
/// 15-man roster). Jitters form/ownership on a timer so the UI visibly
/// updates.
pub fn spawn_fake_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        let mut universe = seed_universe(&mut rng);
        let _ = tx.send(Delta::Log("[INFO] Demo feed active (no network)".to_string()));
        let _ = tx.send(Delta::Snapshot(Box::new(universe.clone())));

        let jitter_interval = Duration::from_secs(5);
        let mut last_jitter = Instant::now();
        loop {
            thread::sleep(Duration::from_millis(900));

            let mut refresh = false;
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::RefreshAll | ProviderCommand::RefreshRoster => refresh = true,
                }
            }

            if refresh || last_jitter.elapsed() >= jitter_interval {
                jitter_universe(&mut universe, &mut rng);
                let _ = tx.send(Delta::Snapshot(Box::new(universe.clone())));
                last_jitter = Instant::now();
            }
        }
    });
}

pub fn seed_universe(rng: &mut ThreadRng) -> UniverseSnapshot {
    let club_names = [
        "Arsenal", "Aston Villa", "Bournemouth", "Brentford", "Brighton", "Chelsea",
        "Crystal Palace", "Everton", "Fulham", "Ipswich", "Leicester", "Liverpool",
        "Man City", "Man Utd", "Newcastle", "Nottm Forest", "Southampton", "Spurs",
        "West Ham", "Wolves",
    ];
    let clubs: Vec<Club> = club_names
        .iter()
        .enumerate()
        .map(|(idx, name)| Club {
            id: idx as u32 + 1,
            name: name.to_string(),
            short_name: name[..3.min(name.len())].to_uppercase(),
        })
        .collect();

    let mut players = Vec::new();
    let mut next_id = 1u32;
    for club in &clubs {
        let slots = [
            (Position::Goalkeeper, 1),
            (Position::Defender, 2),
            (Position::Midfielder, 2),
            (Position::Forward, 1),
        ];
        for (position, count) in slots {
            for n in 0..count {
                players.push(seed_player(rng, next_id, club, position, n));
                next_id += 1;
            }
        }
    }

    let fixtures = seed_fixtures(clubs.len() as u32);
    let roster = seed_roster(&players);

    UniverseSnapshot {
        players,
        clubs,
        fixtures,
        roster: Some(roster),
        current_gameweek: DEMO_GAMEWEEK,
        next_deadline: None,
        fetched_at_unix: None,
    }
}

fn seed_player(
    rng: &mut ThreadRng,
    id: u32,
    club: &Club,
    position: Position,
    ordinal: usize,
) -> PlayerSnapshot {
    let status = match rng.gen_range(0..20) {
        0 => AvailabilityStatus::Injured,
        1 => AvailabilityStatus::Doubtful,
        _ => AvailabilityStatus::Available,
    };
    let base_cost = match position {
        Position::Goalkeeper => 4.5,
        Position::Defender => 4.8,
        Position::Midfielder => 6.0,
        Position::Forward => 6.8,
    };
    let form = (rng.gen_range(0.0..8.0_f64) * 10.0).round() / 10.0;
    PlayerSnapshot {
        id,
        name: format!("{} {} {}", club.short_name, position.short(), ordinal + 1),
        club: club.id,
        club_name: club.name.clone(),
        position,
        form,
        total_points: rng.gen_range(5..120),
        cost: base_cost + rng.gen_range(0.0..4.0_f64),
        ownership_percent: rng.gen_range(0.1..60.0_f64),
        status,
    }
}

/// Round-robin-ish future fixtures over the demo window, with club 1 given
/// a double gameweek and club 3 a blank so the calendar paths all run.
fn seed_fixtures(club_count: u32) -> Vec<FixtureRecord> {
    let mut fixtures = Vec::new();
    for offset in 0..DEMO_WINDOW {
        let gameweek = DEMO_GAMEWEEK + offset;
        for pair in 0..(club_count / 2) {
            let home = (pair * 2 + offset) % club_count + 1;
            let away = (pair * 2 + 1 + offset) % club_count + 1;
            if home == away {
                continue;
            }
            // Club 3 sits out one gameweek entirely.
            if offset == 2 && (home == 3 || away == 3) {
                continue;
            }
            fixtures.push(FixtureRecord {
                gameweek: Some(gameweek),
                home,
                away,
                home_difficulty: ((home + away + offset) % 5 + 1) as u8,
                away_difficulty: ((home + away * 2 + offset) % 5 + 1) as u8,
                finished: false,
            });
        }
        // Club 1 gets a rearranged extra match in the second window week.
        if offset == 1 {
            fixtures.push(FixtureRecord {
                gameweek: Some(gameweek),
                home: 1,
                away: 4,
                home_difficulty: 2,
                away_difficulty: 4,
                finished: false,
            });
        }
    }
    fixtures
}

/// A legal 15-man roster (2 GK / 5 DEF / 5 MID / 3 FWD) drawn from distinct
/// clubs where possible.
fn seed_roster(players: &[PlayerSnapshot]) -> Vec<RosterSlot> {
    let mut roster = Vec::new();
    let mut slot = 1u8;
    for (position, quota) in [
        (Position::Goalkeeper, 2usize),
        (Position::Defender, 5),
        (Position::Midfielder, 5),
        (Position::Forward, 3),
    ] {
        let mut taken = 0usize;
        for player in players.iter().filter(|p| p.position == position) {
            if taken == quota {
                break;
            }
            roster.push(RosterSlot {
                player_id: player.id,
                slot,
            });
            slot += 1;
            taken += 1;
        }
    }
    roster
}

fn jitter_universe(universe: &mut UniverseSnapshot, rng: &mut ThreadRng) {
    for _ in 0..8 {
        let idx = rng.gen_range(0..universe.players.len());
        let player = &mut universe.players[idx];
        let delta = rng.gen_range(-0.4..0.4_f64);
        player.form = (player.form + delta).clamp(0.0, 10.0);
        let own_delta = rng.gen_range(-0.8..0.8_f64);
        player.ownership_percent = (player.ownership_percent + own_delta).clamp(0.0, 100.0);
    }
}
