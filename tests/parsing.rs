use std::fs;
use std::path::PathBuf;

use fpl_assistant::fpl_fetch::{parse_bootstrap, parse_fixtures, parse_my_team};
use fpl_assistant::session::{SessionCookies, decrypt_cookie_blob, encrypt_cookie_blob};
use fpl_assistant::state::{AvailabilityStatus, Position};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn bootstrap_parses_players_with_defaults() {
    let data = parse_bootstrap(&read_fixture("bootstrap_sample.json")).expect("bootstrap parses");

    assert_eq!(data.clubs.len(), 2);
    assert_eq!(data.current_gameweek, 8);
    assert_eq!(data.next_deadline.as_deref(), Some("2025-10-25T10:00:00Z"));

    // Row 103 has element_type 9 and must be skipped, with a warning.
    assert_eq!(data.players.len(), 3);
    assert!(data.warnings.iter().any(|w| w.contains("103")));

    let saka = data.players.iter().find(|p| p.id == 101).unwrap();
    assert_eq!(saka.name, "Bukayo Saka");
    assert_eq!(saka.club_name, "Arsenal");
    assert_eq!(saka.position, Position::Midfielder);
    assert!((saka.form - 7.2).abs() < 1e-9);
    assert!((saka.cost - 10.2).abs() < 1e-9);
    assert!((saka.ownership_percent - 45.3).abs() < 1e-9);
    assert_eq!(saka.status, AvailabilityStatus::Available);

    // Row 102: empty names fall back to web_name, negative form/points and
    // a malformed ownership string default to zero, missing cost too.
    let palmer = data.players.iter().find(|p| p.id == 102).unwrap();
    assert_eq!(palmer.name, "Palmer");
    assert_eq!(palmer.form, 0.0);
    assert_eq!(palmer.total_points, 0);
    assert_eq!(palmer.cost, 0.0);
    assert_eq!(palmer.ownership_percent, 0.0);
    assert_eq!(palmer.status, AvailabilityStatus::Injured);

    // Row 104: status "u" is unrecognized -> Doubtful, never dropped.
    let raya = data.players.iter().find(|p| p.id == 104).unwrap();
    assert_eq!(raya.status, AvailabilityStatus::Doubtful);
}

#[test]
fn fixtures_parse_with_null_event_and_clamped_difficulty() {
    let fixtures = parse_fixtures(&read_fixture("fixtures_sample.json")).expect("fixtures parse");
    assert_eq!(fixtures.len(), 4);

    assert_eq!(fixtures[0].gameweek, Some(8));
    assert_eq!(fixtures[1].gameweek, None);
    // Out-of-range difficulties clamp into [1,5].
    assert_eq!(fixtures[2].home_difficulty, 5);
    assert_eq!(fixtures[2].away_difficulty, 1);
    assert!(fixtures[3].finished);
}

#[test]
fn my_team_parses_picks() {
    let raw = r#"{
        "picks": [
            { "element": 101, "position": 1 },
            { "element": 104, "position": 12 },
            { "element": 102 }
        ]
    }"#;
    let roster = parse_my_team(raw).expect("picks parse");
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0].player_id, 101);
    assert!(!roster[0].is_bench());
    assert!(roster[1].is_bench());
    // Missing slot falls back to list order.
    assert_eq!(roster[2].slot, 3);
}

#[test]
fn cookie_blob_round_trips() {
    let plain = r#"{"pl_profile":"abc123","sessionid":"xyz"}"#;
    let iv = [7u8; 16];
    let blob = encrypt_cookie_blob(plain, "hunter2", iv);
    let decrypted = decrypt_cookie_blob(&blob, "hunter2").expect("decrypts");
    assert_eq!(decrypted, plain);

    let cookies = SessionCookies::from_json(&decrypted).expect("cookie json");
    let header = cookies.header_value();
    assert!(header.contains("pl_profile=abc123"));
    assert!(header.contains("sessionid=xyz"));

    assert!(decrypt_cookie_blob(&blob, "wrong-passphrase").is_err());
}
