use std::collections::HashMap;

use fpl_assistant::fixtures::aggregate;
use fpl_assistant::scoring::{ScoredPlayer, StrategyProfile, rank_players};
use fpl_assistant::selection::{SquadRules, pick_captaincy, select_squad};
use fpl_assistant::state::{AvailabilityStatus, FixtureRecord, PlayerSnapshot, Position};

fn player(id: u32, club: u32, position: Position, form: f64, points: u32, cost: f64) -> PlayerSnapshot {
    PlayerSnapshot {
        id,
        name: format!("Player {id}"),
        club,
        club_name: format!("Club {club}"),
        position,
        form,
        total_points: points,
        cost,
        ownership_percent: 15.0,
        status: AvailabilityStatus::Available,
    }
}

fn candidate_pool() -> Vec<ScoredPlayer> {
    // 8 clubs x one player per position tier; plenty of depth per position.
    let mut players = Vec::new();
    let mut id = 1u32;
    for club in 1..=8u32 {
        for position in [
            Position::Goalkeeper,
            Position::Defender,
            Position::Defender,
            Position::Midfielder,
            Position::Midfielder,
            Position::Forward,
        ] {
            players.push(player(
                id,
                club,
                position,
                f64::from((id * 7) % 80) / 10.0,
                (id * 13) % 150,
                4.0 + f64::from(id % 17) * 0.5,
            ));
            id += 1;
        }
    }
    let fixtures: Vec<FixtureRecord> = (1..=8u32)
        .map(|club| FixtureRecord {
            gameweek: Some(1),
            home: club,
            away: 100 + club,
            home_difficulty: (club % 5 + 1) as u8,
            away_difficulty: 3,
            finished: false,
        })
        .collect();
    let calendar = aggregate(&fixtures);
    let profile = StrategyProfile {
        name: "test",
        form_weight: 0.4,
        fixture_weight: 0.3,
        value_weight: 0.3,
        max_ownership_percent: None,
    };
    rank_players(&players, &calendar, &profile, 1, 1)
}

#[test]
fn squad_respects_budget_quotas_and_club_cap() {
    let candidates = candidate_pool();
    let rules = SquadRules::default();
    let selection = select_squad(&candidates, &rules);
    let squad = &selection.squad;

    assert!(squad.players.len() <= rules.squad_size());
    assert!(squad.total_cost <= rules.budget + 1e-9);

    let mut by_position: HashMap<Position, usize> = HashMap::new();
    let mut by_club: HashMap<u32, usize> = HashMap::new();
    for p in &squad.players {
        *by_position.entry(p.snapshot.position).or_insert(0) += 1;
        *by_club.entry(p.snapshot.club).or_insert(0) += 1;
    }
    for (position, quota) in rules.quotas {
        assert!(by_position.get(&position).copied().unwrap_or(0) <= quota);
    }
    for count in by_club.values() {
        assert!(*count <= rules.max_per_club);
    }
}

#[test]
fn tight_budget_reports_shortfall_instead_of_failing() {
    let candidates = candidate_pool();
    let rules = SquadRules {
        budget: 20.0,
        ..SquadRules::default()
    };
    let selection = select_squad(&candidates, &rules);

    assert!(!selection.is_complete());
    assert!(selection.squad.total_cost <= rules.budget + 1e-9);
    let missing: usize = selection.shortfalls.iter().map(|s| s.missing).sum();
    assert_eq!(
        selection.squad.players.len() + missing,
        rules.squad_size()
    );
}

#[test]
fn club_cap_forces_spread_across_clubs() {
    // Every good candidate is from club 1; cap 2 means at most 2 admitted.
    let players: Vec<PlayerSnapshot> = (1..=6)
        .map(|id| player(id, 1, Position::Midfielder, 8.0, 100, 5.0))
        .collect();
    let calendar = aggregate(&[FixtureRecord {
        gameweek: Some(1),
        home: 1,
        away: 2,
        home_difficulty: 2,
        away_difficulty: 3,
        finished: false,
    }]);
    let profile = StrategyProfile {
        name: "test",
        form_weight: 1.0,
        fixture_weight: 0.0,
        value_weight: 0.0,
        max_ownership_percent: None,
    };
    let ranked = rank_players(&players, &calendar, &profile, 1, 1);
    let rules = SquadRules {
        max_per_club: 2,
        ..SquadRules::default()
    };
    let selection = select_squad(&ranked, &rules);
    assert_eq!(selection.squad.players.len(), 2);
    assert!(selection
        .shortfalls
        .iter()
        .any(|s| s.position == Position::Midfielder && s.missing == 3));
}

#[test]
fn captaincy_uses_composite_and_ranks_top_two() {
    // Easy fixture for club 1 (diff 2), hard for club 2 (diff 5).
    let calendar = aggregate(&[
        FixtureRecord {
            gameweek: Some(1),
            home: 1,
            away: 101,
            home_difficulty: 2,
            away_difficulty: 3,
            finished: false,
        },
        FixtureRecord {
            gameweek: Some(1),
            home: 2,
            away: 102,
            home_difficulty: 5,
            away_difficulty: 3,
            finished: false,
        },
    ]);
    let star = player(1, 1, Position::Forward, 9.0, 120, 12.0);
    let second = player(2, 2, Position::Midfielder, 7.0, 90, 9.0);
    let third = player(3, 2, Position::Defender, 2.0, 30, 4.5);
    let roster = [star.clone(), second.clone(), third];

    let pick = pick_captaincy(&roster, &calendar, 1, 1).expect("two eligible players");
    assert_eq!(pick.captain.snapshot.id, 1);
    assert_eq!(pick.vice.snapshot.id, 2);

    // form*0.4 + points*0.3 + (6-fdr)*0.3
    let expected_captain = 9.0 * 0.4 + 120.0 * 0.3 + (6.0 - 2.0) * 0.3;
    assert!((pick.captain.score - expected_captain).abs() < 1e-9);
}

#[test]
fn captaincy_needs_two_eligible_players() {
    let calendar = aggregate(&[]);
    let fit = player(1, 1, Position::Forward, 6.0, 80, 8.0);
    let mut injured = player(2, 2, Position::Midfielder, 7.0, 90, 9.0);
    injured.status = AvailabilityStatus::Injured;

    assert!(pick_captaincy(&[fit.clone()], &calendar, 1, 1).is_none());
    assert!(pick_captaincy(&[fit, injured], &calendar, 1, 1).is_none());
    assert!(pick_captaincy(&[], &calendar, 1, 1).is_none());
}
