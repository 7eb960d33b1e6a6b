use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use fpl_assistant::backtest;
use fpl_assistant::export;
use fpl_assistant::historical;
use fpl_assistant::selection::SquadRules;

/// Replay every built-in strategy over stored historical gameweeks and rank
/// them by banked points.
///
/// Usage: backtest <season> [first_gw last_gw] [--db file.sqlite] [--no-export]
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut season: Option<String> = None;
    let mut gw_bounds: Vec<u32> = Vec::new();
    let mut db_path: Option<PathBuf> = None;
    let mut do_export = true;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                db_path = Some(PathBuf::from(args.next().context("--db needs a path")?));
            }
            "--no-export" => do_export = false,
            other => {
                if let Ok(gw) = other.parse::<u32>() {
                    gw_bounds.push(gw);
                } else {
                    season = Some(other.to_string());
                }
            }
        }
    }

    let db_path = db_path
        .or_else(historical::default_db_path)
        .context("no db path and no cache dir available")?;
    let conn = historical::open_db(&db_path)?;

    let season = match season {
        Some(season) => season,
        None => {
            let seasons = historical::seasons(&conn)?;
            seasons
                .last()
                .cloned()
                .ok_or_else(|| anyhow!("no seasons ingested; run hist_ingest first"))?
        }
    };

    let rows_by_gw = historical::load_season(&conn, &season)?;
    if rows_by_gw.is_empty() {
        return Err(anyhow!("no rows stored for season {season}"));
    }

    let first = gw_bounds
        .first()
        .copied()
        .or_else(|| rows_by_gw.keys().next().copied())
        .unwrap_or(1);
    let last = gw_bounds
        .get(1)
        .copied()
        .or_else(|| rows_by_gw.keys().next_back().copied())
        .unwrap_or(first);
    if last < first {
        return Err(anyhow!("gameweek range {first}..{last} is empty"));
    }

    println!("Backtesting season {season}, GW{first}..GW{last} ({})", db_path.display());
    let rules = SquadRules::default();
    let mut outcomes = backtest::compare_profiles(&rows_by_gw, first..=last, &rules);
    outcomes.sort_by(|a, b| b.total_points.cmp(&a.total_points));

    println!(
        "\n{:<16} {:>12} {:>10} {:>14}",
        "Strategy", "Total Pts", "GWs", "Shortfall GWs"
    );
    for outcome in &outcomes {
        println!(
            "{:<16} {:>12} {:>10} {:>14}",
            outcome.strategy,
            outcome.total_points,
            outcome.points_per_gameweek.len(),
            outcome.shortfall_gameweeks
        );
    }

    if do_export {
        let dir = env::var("FPL_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));
        let report = export::export_backtest(&dir, &outcomes)?;
        for err in &report.errors {
            eprintln!("export warning: {err}");
        }
        println!();
        for file in &report.files {
            println!("wrote {}", file.display());
        }
    }
    Ok(())
}
