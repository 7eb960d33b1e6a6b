use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};

use fpl_assistant::historical::{self, GwPlayerRow, IngestSummary};

/// Load a season of per-player gameweek history into the local SQLite store.
///
/// Two input shapes:
///   hist_ingest <snapshot-dir> <season>            season snapshot directory
///   hist_ingest --parquet <file> <season>          merged parquet export
///   [--db file.sqlite] applies to both
///
/// The snapshot directory layout is the public season archive one:
/// teams.csv, players_raw.csv, players/<slug_id>/gw.csv.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut positional: Vec<String> = Vec::new();
    let mut parquet_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--parquet" => {
                parquet_path = Some(PathBuf::from(
                    args.next().context("--parquet needs a file path")?,
                ));
            }
            "--db" => {
                db_path = Some(PathBuf::from(args.next().context("--db needs a path")?));
            }
            other => positional.push(other.to_string()),
        }
    }

    let db_path = db_path
        .or_else(historical::default_db_path)
        .context("no db path and no cache dir available")?;
    let mut conn = historical::open_db(&db_path)?;

    let summary = match parquet_path {
        Some(parquet) => {
            let season = positional
                .first()
                .context("usage: hist_ingest --parquet <file> <season>")?;
            ingest_parquet(&mut conn, &parquet, season)?
        }
        None => {
            let dir = positional
                .first()
                .context("usage: hist_ingest <snapshot-dir> <season>")?;
            let season = positional
                .get(1)
                .context("usage: hist_ingest <snapshot-dir> <season>")?;
            historical::ingest_season_dir(&mut conn, Path::new(dir), season)?
        }
    };

    println!(
        "Ingested season {}: {} players, {} rows -> {}",
        summary.season,
        summary.players_seen,
        summary.rows_upserted,
        db_path.display()
    );
    if !summary.errors.is_empty() {
        println!("{} rows skipped:", summary.errors.len());
        for err in summary.errors.iter().take(20) {
            println!("  {err}");
        }
        if summary.errors.len() > 20 {
            println!("  ... and {} more", summary.errors.len() - 20);
        }
    }
    Ok(())
}

/// Merged parquet export with one row per player-gameweek. Columns are
/// matched by name: player_id, gameweek, name, club, position, total_points,
/// minutes, form, cost, ownership, opponent_difficulty.
fn ingest_parquet(
    conn: &mut rusqlite::Connection,
    path: &Path,
    season: &str,
) -> Result<IngestSummary> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader")?;
    let iter = reader.get_row_iter(None).context("iterate parquet rows")?;

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut players = std::collections::HashSet::new();

    for (idx, row) in iter.enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                errors.push(format!("row {idx}: {err}"));
                continue;
            }
        };
        match parse_parquet_row(&row, season) {
            Some(parsed) => {
                players.insert(parsed.player_id);
                rows.push(parsed);
            }
            None => errors.push(format!("row {idx}: missing player_id/gameweek/position")),
        }
    }
    if rows.is_empty() {
        return Err(anyhow!("no usable rows decoded from {}", path.display()));
    }

    let rows_upserted = historical::upsert_rows(conn, &rows)?;
    let summary = IngestSummary {
        season: season.to_string(),
        players_seen: players.len(),
        rows_upserted,
        errors,
    };
    historical::record_ingest_run(conn, &summary)?;
    Ok(summary)
}

fn parse_parquet_row(row: &Row, season: &str) -> Option<GwPlayerRow> {
    let mut player_id = None;
    let mut gameweek = None;
    let mut name = None;
    let mut club = None;
    let mut position = None;
    let mut total_points = 0i64;
    let mut minutes = 0i64;
    let mut form = 0.0f64;
    let mut cost = 0.0f64;
    let mut ownership = 0.0f64;
    let mut opponent_difficulty = 3i64;

    for (column, field) in row.get_column_iter() {
        match column.as_str() {
            "player_id" => player_id = field_i64(field).map(|v| v as u32),
            "gameweek" | "round" => gameweek = field_i64(field).map(|v| v as u32),
            "name" => name = field_str(field),
            "club" | "team" => club = field_str(field),
            "position" => position = field_str(field).and_then(|s| historical::position_from_short(&s)),
            "total_points" => total_points = field_i64(field).unwrap_or(0),
            "minutes" => minutes = field_i64(field).unwrap_or(0),
            "form" => form = field_f64(field).unwrap_or(0.0),
            "cost" | "value" => cost = field_f64(field).unwrap_or(0.0),
            "ownership" | "selected_by_percent" => ownership = field_f64(field).unwrap_or(0.0),
            "opponent_difficulty" => opponent_difficulty = field_i64(field).unwrap_or(3),
            _ => {}
        }
    }

    Some(GwPlayerRow {
        player_id: player_id?,
        season: season.to_string(),
        gameweek: gameweek?,
        name: name.unwrap_or_else(|| "Unknown".to_string()),
        club: club.unwrap_or_else(|| "Unknown".to_string()),
        position: position?,
        total_points,
        minutes,
        form,
        cost,
        ownership,
        opponent_difficulty: opponent_difficulty.clamp(1, 5) as u8,
    })
}

fn field_i64(field: &Field) -> Option<i64> {
    match field {
        Field::Long(v) => Some(*v),
        Field::Int(v) => Some(i64::from(*v)),
        Field::Short(v) => Some(i64::from(*v)),
        Field::Byte(v) => Some(i64::from(*v)),
        Field::Double(v) => Some(*v as i64),
        Field::Float(v) => Some(*v as i64),
        _ => None,
    }
}

fn field_f64(field: &Field) -> Option<f64> {
    match field {
        Field::Double(v) => Some(*v),
        Field::Float(v) => Some(f64::from(*v)),
        Field::Long(v) => Some(*v as f64),
        Field::Int(v) => Some(f64::from(*v)),
        _ => None,
    }
}

fn field_str(field: &Field) -> Option<String> {
    match field {
        Field::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}
