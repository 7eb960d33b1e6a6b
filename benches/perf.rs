use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fpl_assistant::fixtures::{ClubFixtureCalendar, aggregate};
use fpl_assistant::scoring::{self, ScoredPlayer};
use fpl_assistant::selection::{SquadRules, select_squad};
use fpl_assistant::state::{AvailabilityStatus, FixtureRecord, PlayerSnapshot, Position};

const CLUBS: u32 = 20;
const PLAYERS: u32 = 600;
const GAMEWEEKS: u32 = 10;

fn sample_players() -> Vec<PlayerSnapshot> {
    (1..=PLAYERS)
        .map(|id| PlayerSnapshot {
            id,
            name: format!("Player {id}"),
            club: id % CLUBS + 1,
            club_name: format!("Club {}", id % CLUBS + 1),
            position: match id % 15 {
                0 | 1 => Position::Goalkeeper,
                2..=6 => Position::Defender,
                7..=11 => Position::Midfielder,
                _ => Position::Forward,
            },
            form: f64::from(id % 85) / 10.0,
            total_points: (id * 7) % 180,
            cost: 4.0 + f64::from(id % 19) * 0.45,
            ownership_percent: f64::from((id * 11) % 70),
            status: AvailabilityStatus::Available,
        })
        .collect()
}

fn sample_calendar() -> ClubFixtureCalendar {
    let mut fixtures = Vec::new();
    for gw in 1..=GAMEWEEKS {
        for pair in 0..(CLUBS / 2) {
            let home = (pair * 2 + gw) % CLUBS + 1;
            let away = (pair * 2 + 1 + gw) % CLUBS + 1;
            if home == away {
                continue;
            }
            fixtures.push(FixtureRecord {
                gameweek: Some(gw),
                home,
                away,
                home_difficulty: ((home + gw) % 5 + 1) as u8,
                away_difficulty: ((away + gw) % 5 + 1) as u8,
                finished: false,
            });
        }
    }
    aggregate(&fixtures)
}

fn sample_ranked() -> Vec<ScoredPlayer> {
    let players = sample_players();
    let calendar = sample_calendar();
    let profile = scoring::profile_by_name("Balanced").expect("builtin profile");
    scoring::rank_players(&players, &calendar, profile, 1, 5)
}

fn bench_rank_players(c: &mut Criterion) {
    let players = sample_players();
    let calendar = sample_calendar();
    let profile = scoring::profile_by_name("Balanced").expect("builtin profile");
    c.bench_function("rank_players_600", |b| {
        b.iter(|| {
            let ranked = scoring::rank_players(
                black_box(&players),
                black_box(&calendar),
                profile,
                1,
                5,
            );
            black_box(ranked.len());
        })
    });
}

fn bench_select_squad(c: &mut Criterion) {
    let ranked = sample_ranked();
    let rules = SquadRules::default();
    c.bench_function("select_squad_600", |b| {
        b.iter(|| {
            let selection = select_squad(black_box(&ranked), black_box(&rules));
            black_box(selection.squad.players.len());
        })
    });
}

fn bench_calendar_lookahead(c: &mut Criterion) {
    let calendar = sample_calendar();
    c.bench_function("lookahead_all_clubs", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for club in 1..=CLUBS {
                total += calendar.lookahead_difficulty(black_box(club), 1, 5);
            }
            black_box(total);
        })
    });
}

criterion_group!(
    benches,
    bench_rank_players,
    bench_select_squad,
    bench_calendar_lookahead
);
criterion_main!(benches);
