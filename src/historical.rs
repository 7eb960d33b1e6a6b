use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::http_cache::app_cache_dir;
use crate::state::Position;

/// One player's stored line for one historical gameweek. This is the
/// backtester's raw material; fields mirror the public season snapshot
/// archives (per-player gw.csv plus players_raw.csv/teams.csv).
#[derive(Debug, Clone)]
pub struct GwPlayerRow {
    pub player_id: u32,
    pub season: String,
    pub gameweek: u32,
    pub name: String,
    pub club: String,
    pub position: Position,
    pub total_points: i64,
    pub minutes: i64,
    /// Mean points over the previous three gameweeks, computed at ingest.
    pub form: f64,
    pub cost: f64,
    pub ownership: f64,
    pub opponent_difficulty: u8,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub season: String,
    pub players_seen: usize,
    pub rows_upserted: usize,
    pub errors: Vec<String>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("historical_gameweeks.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS player_gameweeks (
            season TEXT NOT NULL,
            gameweek INTEGER NOT NULL,
            player_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            club TEXT NOT NULL,
            position TEXT NOT NULL,
            total_points INTEGER NOT NULL,
            minutes INTEGER NOT NULL,
            form REAL NOT NULL,
            cost REAL NOT NULL,
            ownership REAL NOT NULL,
            opponent_difficulty INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (season, gameweek, player_id)
        );
        CREATE INDEX IF NOT EXISTS idx_pgw_season ON player_gameweeks(season);
        CREATE INDEX IF NOT EXISTS idx_pgw_gameweek ON player_gameweeks(season, gameweek);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            season TEXT NOT NULL,
            players_seen INTEGER NOT NULL,
            rows_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_rows(conn: &mut Connection, rows: &[GwPlayerRow]) -> Result<usize> {
    let tx = conn.transaction().context("begin upsert transaction")?;
    let now = Utc::now().to_rfc3339();
    let mut upserted = 0usize;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO player_gameweeks (
                    season, gameweek, player_id, name, club, position,
                    total_points, minutes, form, cost, ownership,
                    opponent_difficulty, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(season, gameweek, player_id) DO UPDATE SET
                    name = excluded.name,
                    club = excluded.club,
                    position = excluded.position,
                    total_points = excluded.total_points,
                    minutes = excluded.minutes,
                    form = excluded.form,
                    cost = excluded.cost,
                    ownership = excluded.ownership,
                    opponent_difficulty = excluded.opponent_difficulty,
                    updated_at = excluded.updated_at
                "#,
            )
            .context("prepare upsert")?;
        for row in rows {
            stmt.execute(params![
                row.season,
                row.gameweek,
                row.player_id,
                row.name,
                row.club,
                row.position.short(),
                row.total_points,
                row.minutes,
                row.form,
                row.cost,
                row.ownership,
                row.opponent_difficulty,
                now,
            ])
            .context("upsert player gameweek row")?;
            upserted += 1;
        }
    }
    tx.commit().context("commit upsert transaction")?;
    Ok(upserted)
}

pub fn record_ingest_run(conn: &Connection, summary: &IngestSummary) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO ingest_runs (started_at, finished_at, season, players_seen, rows_upserted, errors_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            Utc::now().to_rfc3339(),
            Utc::now().to_rfc3339(),
            summary.season,
            summary.players_seen,
            summary.rows_upserted,
            serde_json::to_string(&summary.errors).unwrap_or_else(|_| "[]".to_string()),
        ],
    )
    .context("record ingest run")?;
    Ok(())
}

pub fn load_season(conn: &Connection, season: &str) -> Result<BTreeMap<u32, Vec<GwPlayerRow>>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT season, gameweek, player_id, name, club, position,
                   total_points, minutes, form, cost, ownership, opponent_difficulty
            FROM player_gameweeks
            WHERE season = ?1
            ORDER BY gameweek, player_id
            "#,
        )
        .context("prepare season query")?;
    let rows = stmt
        .query_map(params![season], row_from_sql)
        .context("query season rows")?;

    let mut out: BTreeMap<u32, Vec<GwPlayerRow>> = BTreeMap::new();
    for row in rows {
        let row = row.context("decode season row")?;
        out.entry(row.gameweek).or_default().push(row);
    }
    Ok(out)
}

pub fn seasons(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT season FROM player_gameweeks ORDER BY season")
        .context("prepare seasons query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query seasons")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode season")?);
    }
    Ok(out)
}

fn row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<GwPlayerRow> {
    let position_label: String = row.get(5)?;
    Ok(GwPlayerRow {
        season: row.get(0)?,
        gameweek: row.get(1)?,
        player_id: row.get(2)?,
        name: row.get(3)?,
        club: row.get(4)?,
        position: position_from_short(&position_label).unwrap_or(Position::Midfielder),
        total_points: row.get(6)?,
        minutes: row.get(7)?,
        form: row.get(8)?,
        cost: row.get(9)?,
        ownership: row.get(10)?,
        opponent_difficulty: row.get::<_, i64>(11)?.clamp(1, 5) as u8,
    })
}

pub fn position_from_short(label: &str) -> Option<Position> {
    match label.trim().to_ascii_uppercase().as_str() {
        "GK" | "GKP" => Some(Position::Goalkeeper),
        "DEF" => Some(Position::Defender),
        "MID" => Some(Position::Midfielder),
        "FWD" => Some(Position::Forward),
        _ => None,
    }
}

/// Ingest one season snapshot directory:
///
/// ```text
/// <dir>/teams.csv            id,name,...,strength
/// <dir>/players_raw.csv      id,first_name,second_name,element_type,now_cost,...
/// <dir>/players/<slug_id>/gw.csv   round,total_points,minutes,value,...
/// ```
///
/// Missing columns default per the data-gap policy (0 for numerics, 3 for
/// unknown opponent strength); a malformed player folder is reported and
/// skipped, never fatal.
pub fn ingest_season_dir(conn: &mut Connection, dir: &Path, season: &str) -> Result<IngestSummary> {
    let teams = load_teams_csv(&dir.join("teams.csv"))?;
    let players_raw = load_players_raw_csv(&dir.join("players_raw.csv"))?;

    let players_dir = dir.join("players");
    let entries = fs::read_dir(&players_dir)
        .with_context(|| format!("read players dir {}", players_dir.display()))?;

    let mut errors = Vec::new();
    let mut rows: Vec<GwPlayerRow> = Vec::new();
    let mut players_seen = 0usize;

    for entry in entries {
        let entry = entry.context("read players dir entry")?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().to_string();
        let Some(player_id) = folder.rsplit('_').next().and_then(|s| s.parse::<u32>().ok())
        else {
            errors.push(format!("could not extract player id from folder {folder}"));
            continue;
        };
        let Some(raw) = players_raw.get(&player_id) else {
            errors.push(format!("player {player_id} missing from players_raw.csv"));
            continue;
        };

        let gw_path = path.join("gw.csv");
        let history = match load_gw_csv(&gw_path) {
            Ok(history) => history,
            Err(err) => {
                errors.push(format!("player {player_id}: {err:#}"));
                continue;
            }
        };
        players_seen += 1;

        for gw in &history {
            let opponent_difficulty = gw
                .opponent_team
                .and_then(|id| teams.get(&id))
                .map(|t| t.strength.clamp(1, 5) as u8)
                .unwrap_or(3);
            let cost = if gw.value > 0.0 {
                gw.value / 10.0
            } else {
                raw.now_cost / 10.0
            };
            rows.push(GwPlayerRow {
                player_id,
                season: season.to_string(),
                gameweek: gw.round,
                name: raw.name.clone(),
                club: gw
                    .team
                    .or(raw.team)
                    .and_then(|id| teams.get(&id))
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                position: raw.position,
                total_points: gw.total_points,
                minutes: gw.minutes,
                form: trailing_form(&history, gw.round),
                cost,
                ownership: gw.ownership,
                opponent_difficulty,
            });
        }
    }

    let rows_upserted = upsert_rows(conn, &rows)?;
    let summary = IngestSummary {
        season: season.to_string(),
        players_seen,
        rows_upserted,
        errors,
    };
    record_ingest_run(conn, &summary)?;
    Ok(summary)
}

/// Mean points over the three gameweeks before `round`; 0.0 with no sample.
fn trailing_form(history: &[GwRow], round: u32) -> f64 {
    let window: Vec<i64> = history
        .iter()
        .filter(|gw| gw.round < round && gw.round + 3 >= round)
        .map(|gw| gw.total_points)
        .collect();
    if window.is_empty() {
        0.0
    } else {
        window.iter().sum::<i64>() as f64 / window.len() as f64
    }
}

#[derive(Debug, Clone)]
struct TeamRow {
    name: String,
    strength: i64,
}

#[derive(Debug, Clone)]
struct PlayerRawRow {
    name: String,
    position: Position,
    now_cost: f64,
    team: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct GwRow {
    round: u32,
    total_points: i64,
    minutes: i64,
    value: f64,
    ownership: f64,
    team: Option<u32>,
    opponent_team: Option<u32>,
}

fn load_teams_csv(path: &Path) -> Result<HashMap<u32, TeamRow>> {
    let table = CsvTable::load(path)?;
    let mut out = HashMap::new();
    for record in &table.records {
        let Some(id) = table.u32_field(record, "id") else {
            continue;
        };
        out.insert(
            id,
            TeamRow {
                name: table
                    .str_field(record, "name")
                    .unwrap_or_else(|| "Unknown".to_string()),
                strength: table.i64_field(record, "strength").unwrap_or(3),
            },
        );
    }
    if out.is_empty() {
        return Err(anyhow!("no team rows in {}", path.display()));
    }
    Ok(out)
}

fn load_players_raw_csv(path: &Path) -> Result<HashMap<u32, PlayerRawRow>> {
    let table = CsvTable::load(path)?;
    let mut out = HashMap::new();
    for record in &table.records {
        let Some(id) = table.u32_field(record, "id") else {
            continue;
        };
        let Some(position) = table
            .i64_field(record, "element_type")
            .and_then(|code| Position::from_element_type(code.max(0) as u64))
        else {
            continue;
        };
        let first = table.str_field(record, "first_name").unwrap_or_default();
        let second = table.str_field(record, "second_name").unwrap_or_default();
        let name = format!("{first} {second}").trim().to_string();
        out.insert(
            id,
            PlayerRawRow {
                name: if name.is_empty() {
                    "Unknown".to_string()
                } else {
                    name
                },
                position,
                now_cost: table.f64_field(record, "now_cost").unwrap_or(0.0),
                team: table.u32_field(record, "team"),
            },
        );
    }
    if out.is_empty() {
        return Err(anyhow!("no player rows in {}", path.display()));
    }
    Ok(out)
}

fn load_gw_csv(path: &Path) -> Result<Vec<GwRow>> {
    let table = CsvTable::load(path)?;
    let mut out = Vec::new();
    for record in &table.records {
        let Some(round) = table.u32_field(record, "round") else {
            continue;
        };
        out.push(GwRow {
            round,
            total_points: table.i64_field(record, "total_points").unwrap_or(0),
            minutes: table.i64_field(record, "minutes").unwrap_or(0),
            value: table.f64_field(record, "value").unwrap_or(0.0),
            ownership: table
                .f64_field(record, "selected_by_percent")
                .unwrap_or(0.0),
            team: table.u32_field(record, "team"),
            opponent_team: table.u32_field(record, "opponent_team"),
        });
    }
    out.sort_by_key(|gw| gw.round);
    Ok(out)
}

/// Minimal CSV reader: header row + records, RFC-style double-quote
/// escaping. Enough for the snapshot archives; not a general CSV parser.
struct CsvTable {
    header: HashMap<String, usize>,
    records: Vec<Vec<String>>,
}

impl CsvTable {
    fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut lines = raw.lines();
        let header_line = lines.next().context("empty csv file")?;
        let header = split_csv_line(header_line)
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        let records = lines
            .filter(|line| !line.trim().is_empty())
            .map(split_csv_line)
            .collect();
        Ok(Self { header, records })
    }

    fn str_field(&self, record: &[String], name: &str) -> Option<String> {
        let idx = *self.header.get(name)?;
        let value = record.get(idx)?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }

    fn i64_field(&self, record: &[String], name: &str) -> Option<i64> {
        self.str_field(record, name)?.parse().ok()
    }

    fn f64_field(&self, record: &[String], name: &str) -> Option<f64> {
        self.str_field(record, name)?.parse().ok()
    }

    fn u32_field(&self, record: &[String], name: &str) -> Option<u32> {
        self.str_field(record, name)?.parse().ok()
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                out.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    out.push(field);
    out
}
