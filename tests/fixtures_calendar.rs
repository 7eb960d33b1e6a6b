use fpl_assistant::fixtures::{DEFAULT_DIFFICULTY, aggregate};
use fpl_assistant::state::FixtureRecord;

fn fixture(gw: Option<u32>, home: u32, away: u32, hd: u8, ad: u8, finished: bool) -> FixtureRecord {
    FixtureRecord {
        gameweek: gw,
        home,
        away,
        home_difficulty: hd,
        away_difficulty: ad,
        finished,
    }
}

#[test]
fn finished_and_unscheduled_fixtures_are_ignored() {
    let calendar = aggregate(&[
        fixture(Some(1), 1, 2, 2, 3, true),
        fixture(None, 1, 2, 2, 3, false),
        fixture(Some(2), 1, 2, 4, 1, false),
    ]);
    assert_eq!(calendar.gameweek_difficulty(1, 1), None);
    assert_eq!(calendar.gameweek_difficulty(1, 2), Some(4.0));
    assert_eq!(calendar.gameweek_difficulty(2, 2), Some(1.0));
}

#[test]
fn blank_gameweek_defaults_to_hard() {
    // Club 1 plays GW1 and GW3; GW2 is blank.
    let calendar = aggregate(&[
        fixture(Some(1), 1, 2, 2, 3, false),
        fixture(Some(3), 1, 3, 1, 2, false),
    ]);
    let total = calendar.lookahead_difficulty(1, 1, 3);
    assert_eq!(total, 2.0 + DEFAULT_DIFFICULTY + 1.0);

    let window = calendar.lookahead(1, 1, 3);
    assert_eq!(window.blanks, 1);
    assert_eq!(window.fixtures, 2);
    assert_eq!(window.slots, 3);
}

#[test]
fn double_gameweek_sums_both_fixtures() {
    // Club 1 plays twice in GW1 (home diff 2, away diff 4).
    let calendar = aggregate(&[
        fixture(Some(1), 1, 2, 2, 3, false),
        fixture(Some(1), 3, 1, 1, 4, false),
    ]);
    assert_eq!(calendar.gameweek_difficulty(1, 1), Some(6.0));
    assert_eq!(calendar.fixture_count(1, 1), 2);
    assert_eq!(calendar.lookahead_difficulty(1, 1, 1), 6.0);

    let window = calendar.lookahead(1, 1, 1);
    assert_eq!(window.doubles, 1);
    assert_eq!(window.slots, 2);
}

#[test]
fn per_fixture_average_counts_blanks_as_one_hard_slot() {
    // GW1 double (2 and 4), GW2 blank: total 11 over 3 slots.
    let calendar = aggregate(&[
        fixture(Some(1), 1, 2, 2, 3, false),
        fixture(Some(1), 3, 1, 1, 4, false),
    ]);
    let window = calendar.lookahead(1, 1, 2);
    assert_eq!(window.total, 11.0);
    assert_eq!(window.slots, 3);
    let avg = window.per_fixture();
    assert!((avg - 11.0 / 3.0).abs() < 1e-9);
    assert!((1.0..=5.0).contains(&avg));
}

#[test]
fn unknown_club_is_all_blanks() {
    let calendar = aggregate(&[fixture(Some(1), 1, 2, 2, 3, false)]);
    assert_eq!(
        calendar.lookahead_difficulty(99, 1, 4),
        4.0 * DEFAULT_DIFFICULTY
    );
    assert_eq!(calendar.lookahead(99, 1, 4).per_fixture(), DEFAULT_DIFFICULTY);
}

#[test]
fn out_of_range_difficulty_is_clamped() {
    let calendar = aggregate(&[fixture(Some(1), 1, 2, 9, 0, false)]);
    assert_eq!(calendar.gameweek_difficulty(1, 1), Some(5.0));
    assert_eq!(calendar.gameweek_difficulty(2, 1), Some(1.0));
}

#[test]
fn anomaly_gameweeks_flags_blanks_and_doubles() {
    // GW1: everyone plays once. GW2: club 1 doubles, club 3 blank.
    let calendar = aggregate(&[
        fixture(Some(1), 1, 2, 2, 2, false),
        fixture(Some(1), 3, 4, 2, 2, false),
        fixture(Some(2), 1, 2, 3, 3, false),
        fixture(Some(2), 4, 1, 2, 3, false),
    ]);
    let anomalies = calendar.anomaly_gameweeks(1, 2);
    assert_eq!(anomalies.len(), 1);
    let (gameweek, count) = anomalies[0];
    assert_eq!(gameweek, 2);
    // Club 1 has two fixtures, club 3 has none.
    assert_eq!(count, 2);
}
