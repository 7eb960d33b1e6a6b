use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::header::COOKIE;
use serde_json::Value;

use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;
use crate::session::SessionCookies;
use crate::state::{
    AvailabilityStatus, Club, FixtureRecord, PlayerSnapshot, Position, RosterSlot,
    UniverseSnapshot,
};

const BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
const FIXTURES_URL: &str = "https://fantasy.premierleague.com/api/fixtures/";
const MY_TEAM_URL: &str = "https://fantasy.premierleague.com/api/my-team";

/// Serve cached bodies this long before revalidating; FPL data moves on a
/// gameweek cadence.
const DEFAULT_MAX_AGE_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct BootstrapData {
    pub players: Vec<PlayerSnapshot>,
    pub clubs: Vec<Club>,
    pub current_gameweek: u32,
    pub next_deadline: Option<String>,
    /// Rows skipped or defaulted during parsing; logged, never fatal.
    pub warnings: Vec<String>,
}

/// Fetch and materialize the full snapshot the core runs on. The roster is
/// only fetched when both a team id and session cookies are present;
/// anything else still yields a usable universe.
pub fn fetch_universe(
    team_id: Option<u64>,
    cookies: Option<&SessionCookies>,
) -> Result<(UniverseSnapshot, Vec<String>)> {
    let client = http_client()?;
    let bootstrap_raw = fetch_json_cached(client, BOOTSTRAP_URL, DEFAULT_MAX_AGE_SECS)
        .context("bootstrap request failed")?;
    let fixtures_raw = fetch_json_cached(client, FIXTURES_URL, DEFAULT_MAX_AGE_SECS)
        .context("fixtures request failed")?;

    let bootstrap = parse_bootstrap(&bootstrap_raw)?;
    let fixtures = parse_fixtures(&fixtures_raw)?;
    let mut warnings = bootstrap.warnings;

    let roster = match (team_id, cookies) {
        (Some(team_id), Some(cookies)) if !cookies.is_empty() => {
            match fetch_my_team(team_id, cookies) {
                Ok(roster) => Some(roster),
                Err(err) => {
                    warnings.push(format!("roster fetch failed: {err:#}"));
                    None
                }
            }
        }
        _ => None,
    };

    let snapshot = UniverseSnapshot {
        players: bootstrap.players,
        clubs: bootstrap.clubs,
        fixtures,
        roster,
        current_gameweek: bootstrap.current_gameweek,
        next_deadline: bootstrap.next_deadline,
        fetched_at_unix: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs()),
    };
    Ok((snapshot, warnings))
}

/// The authenticated roster endpoint. Bypasses the disk cache on purpose:
/// cookie-scoped bodies do not belong in a shared cache file.
pub fn fetch_my_team(team_id: u64, cookies: &SessionCookies) -> Result<Vec<RosterSlot>> {
    let client = http_client()?;
    let url = format!("{MY_TEAM_URL}/{team_id}/");
    let resp = client
        .get(url.as_str())
        .header(COOKIE, cookies.header_value())
        .send()
        .context("my-team request failed")?;
    let status = resp.status();
    let body = resp.text().context("my-team body read failed")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("my-team http {}: {}", status, body));
    }
    parse_my_team(&body)
}

pub fn parse_bootstrap(raw: &str) -> Result<BootstrapData> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid bootstrap json")?;
    let mut warnings = Vec::new();

    let mut clubs = Vec::new();
    if let Some(arr) = v.get("teams").and_then(|x| x.as_array()) {
        for item in arr {
            if let Some(club) = parse_club(item) {
                clubs.push(club);
            } else {
                warnings.push("skipped club row without id/name".to_string());
            }
        }
    }

    let mut players = Vec::new();
    if let Some(arr) = v.get("elements").and_then(|x| x.as_array()) {
        for item in arr {
            match parse_player(item, &clubs) {
                Some(player) => players.push(player),
                None => warnings.push(format!(
                    "skipped player row {}",
                    item.get("id").and_then(|x| x.as_u64()).unwrap_or(0)
                )),
            }
        }
    }

    let (current_gameweek, next_deadline) = parse_events(&v);

    Ok(BootstrapData {
        players,
        clubs,
        current_gameweek,
        next_deadline,
        warnings,
    })
}

fn parse_club(v: &Value) -> Option<Club> {
    let id = v.get("id")?.as_u64()? as u32;
    let name = v.get("name")?.as_str()?.to_string();
    let short_name = v
        .get("short_name")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();
    Some(Club {
        id,
        name,
        short_name,
    })
}

/// A player row needs an id and a recognizable position; every numeric
/// column defaults to zero when absent or malformed.
fn parse_player(v: &Value, clubs: &[Club]) -> Option<PlayerSnapshot> {
    let id = v.get("id")?.as_u64()? as u32;
    let position = Position::from_element_type(v.get("element_type")?.as_u64()?)?;

    let first = v.get("first_name").and_then(|x| x.as_str()).unwrap_or("");
    let second = v.get("second_name").and_then(|x| x.as_str()).unwrap_or("");
    let name = match (first.is_empty(), second.is_empty()) {
        (false, false) => format!("{first} {second}"),
        _ => v
            .get("web_name")
            .and_then(|x| x.as_str())
            .unwrap_or("Unknown")
            .to_string(),
    };

    let club = v.get("team").and_then(|x| x.as_u64()).unwrap_or(0) as u32;
    let club_name = clubs
        .iter()
        .find(|c| c.id == club)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    // `form` and `selected_by_percent` are decimal strings in the API.
    let form = number_field(v, "form").max(0.0);
    let ownership_percent = number_field(v, "selected_by_percent").clamp(0.0, 100.0);
    let total_points = v
        .get("total_points")
        .and_then(|x| x.as_i64())
        .unwrap_or(0)
        .max(0) as u32;
    // Prices come as tenths of a million.
    let cost = v.get("now_cost").and_then(|x| x.as_f64()).unwrap_or(0.0) / 10.0;
    let status = AvailabilityStatus::from_code(
        v.get("status").and_then(|x| x.as_str()).unwrap_or("a"),
    );

    Some(PlayerSnapshot {
        id,
        name,
        club,
        club_name,
        position,
        form,
        total_points,
        cost,
        ownership_percent,
        status,
    })
}

fn parse_events(v: &Value) -> (u32, Option<String>) {
    let Some(events) = v.get("events").and_then(|x| x.as_array()) else {
        return (1, None);
    };
    let mut current = None;
    let mut next = None;
    let mut next_deadline = None;
    for event in events {
        let Some(id) = event.get("id").and_then(|x| x.as_u64()) else {
            continue;
        };
        if event
            .get("is_current")
            .and_then(|x| x.as_bool())
            .unwrap_or(false)
        {
            current = Some(id as u32);
        }
        if event
            .get("is_next")
            .and_then(|x| x.as_bool())
            .unwrap_or(false)
        {
            next = Some(id as u32);
            next_deadline = event
                .get("deadline_time")
                .and_then(|x| x.as_str())
                .map(|s| s.to_string());
        }
    }
    (current.or(next).unwrap_or(1), next_deadline)
}

pub fn parse_fixtures(raw: &str) -> Result<Vec<FixtureRecord>> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid fixtures json")?;
    let arr = v.as_array().context("fixtures json must be an array")?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        if let Some(fixture) = parse_fixture(item) {
            out.push(fixture);
        }
    }
    Ok(out)
}

fn parse_fixture(v: &Value) -> Option<FixtureRecord> {
    let home = v.get("team_h")?.as_u64()? as u32;
    let away = v.get("team_a")?.as_u64()? as u32;
    // `event` is null for unscheduled fixtures; keep them, the aggregator
    // filters on gameweek presence.
    let gameweek = v.get("event").and_then(|x| x.as_u64()).map(|gw| gw as u32);
    let home_difficulty = difficulty_field(v, "team_h_difficulty");
    let away_difficulty = difficulty_field(v, "team_a_difficulty");
    let finished = v.get("finished").and_then(|x| x.as_bool()).unwrap_or(false);
    Some(FixtureRecord {
        gameweek,
        home,
        away,
        home_difficulty,
        away_difficulty,
        finished,
    })
}

pub fn parse_my_team(raw: &str) -> Result<Vec<RosterSlot>> {
    let v: Value = serde_json::from_str(raw.trim()).context("invalid my-team json")?;
    let picks = v
        .get("picks")
        .and_then(|x| x.as_array())
        .context("my-team json missing picks")?;
    let mut out = Vec::with_capacity(picks.len());
    for (idx, pick) in picks.iter().enumerate() {
        let Some(player_id) = pick.get("element").and_then(|x| x.as_u64()) else {
            continue;
        };
        let slot = pick
            .get("position")
            .and_then(|x| x.as_u64())
            .unwrap_or(idx as u64 + 1) as u8;
        out.push(RosterSlot {
            player_id: player_id as u32,
            slot,
        });
    }
    Ok(out)
}

/// Numeric field that may arrive as a JSON number or a decimal string.
fn number_field(v: &Value, key: &str) -> f64 {
    match v.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn difficulty_field(v: &Value, key: &str) -> u8 {
    let raw = v.get(key).and_then(|x| x.as_u64()).unwrap_or(5);
    raw.clamp(1, 5) as u8
}
