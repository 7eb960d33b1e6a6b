use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use fpl_assistant::recommend::{self, Recommendations};
use fpl_assistant::scoring;
use fpl_assistant::selection::SquadRules;
use fpl_assistant::state::{FIXTURE_LOOKAHEAD, UniverseSnapshot};
use fpl_assistant::{export, fpl_fetch, persist, session};

const TOP_N: usize = 10;

/// One-shot suggestion run: fetch (or replay) a snapshot, print the
/// recommendation tables, export them.
///
/// Usage: suggest [strategy-name] [--snapshot file.json] [--no-export]
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mut strategy_name = "Balanced".to_string();
    let mut snapshot_path: Option<PathBuf> = None;
    let mut do_export = true;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--snapshot" => {
                snapshot_path = Some(PathBuf::from(
                    args.next().context("--snapshot needs a file path")?,
                ));
            }
            "--no-export" => do_export = false,
            other => strategy_name = other.to_string(),
        }
    }

    let profile = scoring::profile_by_name(&strategy_name)
        .with_context(|| format!("unknown strategy '{strategy_name}'"))?;

    let universe = match snapshot_path {
        Some(path) => persist::load_snapshot_from(&path)?,
        None => fetch_live()?,
    };

    let recs = recommend::build_recommendations(
        &universe,
        profile,
        &SquadRules::default(),
        FIXTURE_LOOKAHEAD,
    );
    print_recommendations(&universe, &recs);

    if do_export {
        let dir = env::var("FPL_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));
        let report = export::export_recommendations(&dir, &recs, |_| {})?;
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

fn fetch_live() -> Result<UniverseSnapshot> {
    let team_id = env::var("FPL_TEAM_ID")
        .ok()
        .and_then(|val| val.parse::<u64>().ok());
    let cookie_dir = env::var("FPL_COOKIE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    let cookies = session::load_cookies(&cookie_dir)?;
    let (universe, warnings) = fpl_fetch::fetch_universe(team_id, cookies.as_ref())?;
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
    persist::save_snapshot(&universe);
    Ok(universe)
}

fn print_recommendations(universe: &UniverseSnapshot, recs: &Recommendations) {
    println!(
        "Strategy: {} | GW{} | lookahead {} gameweeks",
        recs.strategy, recs.current_gameweek, recs.lookahead
    );

    println!("\nBest players to pick:");
    println!(
        "{:>3} {:<24} {:<16} {:>3} {:>5} {:>4} {:>6} {:>7} {:>7}",
        "#", "Player", "Club", "Pos", "Form", "Pts", "Cost", "FDR/Fx", "Score"
    );
    for (idx, row) in recs.best_players.iter().take(TOP_N).enumerate() {
        println!(
            "{:>3} {:<24} {:<16} {:>3} {:>5.1} {:>4} {:>6.1} {:>7.2} {:>7.2}",
            idx + 1,
            row.name,
            row.club_name,
            row.position.short(),
            row.form,
            row.total_points,
            row.cost,
            row.fdr_per_fixture,
            row.score
        );
    }

    println!("\nSuggested transfers out:");
    if recs.transfers_out.is_empty() {
        if universe.roster.is_some() {
            println!("  none");
        } else {
            println!("  (no roster loaded; set FPL_TEAM_ID and cookies.json)");
        }
    }
    for row in &recs.transfers_out {
        let reasons = row
            .reasons
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} (form {:.1}, {}, FDR {:.0}): {}",
            row.snapshot.name,
            row.snapshot.form,
            row.snapshot.status.label(),
            row.fdr_total,
            reasons
        );
    }

    println!("\nCaptaincy:");
    match recs.captaincy.as_ref() {
        Some(pick) => {
            println!(
                "  Captain:      {} (score {:.2})",
                pick.captain.snapshot.name, pick.captain.score
            );
            println!(
                "  Vice-captain: {} (score {:.2})",
                pick.vice.snapshot.name, pick.vice.score
            );
        }
        None => println!("  insufficient data"),
    }

    println!("\nChips:");
    let chips = &recs.chips;
    match chips.bench_boost {
        Some(t) => println!("  Bench Boost:    GW{} (bench score {:.2})", t.gameweek, t.score),
        None => println!("  Bench Boost:    -"),
    }
    match chips.triple_captain {
        Some(t) => println!("  Triple Captain: GW{} (score {:.2})", t.gameweek, t.score),
        None => println!("  Triple Captain: -"),
    }
    match chips.wildcard {
        Some(gw) => println!("  Wildcard:       GW{gw}"),
        None => println!("  Wildcard:       - (window passed)"),
    }
    match chips.free_hit {
        Some(t) => println!(
            "  Free Hit:       GW{} ({} fixture anomalies)",
            t.gameweek, t.anomalies
        ),
        None => println!("  Free Hit:       -"),
    }

    let squad = &recs.suggested_squad;
    println!(
        "\nSuggested squad ({} players, {:.1}m):",
        squad.squad.players.len(),
        squad.squad.total_cost
    );
    for player in &squad.squad.players {
        println!(
            "  {:<4} {:<24} {:<16} {:>5.1}m  score {:.2}",
            player.snapshot.position.short(),
            player.snapshot.name,
            player.snapshot.club_name,
            player.snapshot.cost,
            player.score
        );
    }
    for shortfall in &squad.shortfalls {
        println!(
            "  !! {} short by {}",
            shortfall.position.label(),
            shortfall.missing
        );
    }
}
