use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::backtest::BacktestOutcome;
use crate::recommend::{RankedPlayerRow, Recommendations};

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub errors: Vec<String>,
}

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Rows exported to the ranked-players outputs; the full universe is noise
/// in a spreadsheet.
const EXPORT_TOP_N: usize = 50;

/// Write the recommendation tables as timestamped CSVs plus one workbook,
/// mirroring what the terminal shows.
pub fn export_recommendations(
    dir: &Path,
    recs: &Recommendations,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport> {
    fs::create_dir_all(dir).with_context(|| format!("create export dir {}", dir.display()))?;
    let timestamp = Local::now().format("%Y%m%d_%H%M").to_string();
    let mut report = ExportReport {
        files: Vec::new(),
        rows: 0,
        errors: Vec::new(),
    };

    let best_rows = best_player_rows(recs);
    let transfer_rows = transfer_out_rows(recs);
    let captaincy_rows = captaincy_rows(recs);
    let chips_rows = chip_rows(recs);
    let squad_rows = squad_rows(recs);
    let total_steps = 3usize;

    on_progress(ExportProgress {
        current: 0,
        total: total_steps,
        message: "Writing best players CSV".to_string(),
    });
    let best_csv = dir.join(format!("best_players_{timestamp}.csv"));
    match write_csv(&best_csv, &best_rows) {
        Ok(rows) => {
            report.rows += rows;
            report.files.push(best_csv);
        }
        Err(err) => report.errors.push(format!("best players csv: {err:#}")),
    }

    on_progress(ExportProgress {
        current: 1,
        total: total_steps,
        message: "Writing transfers-out CSV".to_string(),
    });
    let transfers_csv = dir.join(format!("transfers_out_{timestamp}.csv"));
    match write_csv(&transfers_csv, &transfer_rows) {
        Ok(rows) => {
            report.rows += rows;
            report.files.push(transfers_csv);
        }
        Err(err) => report.errors.push(format!("transfers csv: {err:#}")),
    }

    on_progress(ExportProgress {
        current: 2,
        total: total_steps,
        message: "Writing workbook".to_string(),
    });
    let xlsx_path = dir.join(format!("fpl_suggestions_{timestamp}.xlsx"));
    let sheets: [(&str, &[Vec<String>]); 5] = [
        ("Best Players", &best_rows),
        ("Transfers Out", &transfer_rows),
        ("Captaincy", &captaincy_rows),
        ("Chips", &chips_rows),
        ("Suggested Squad", &squad_rows),
    ];
    match write_workbook(&xlsx_path, &sheets) {
        Ok(()) => report.files.push(xlsx_path),
        Err(err) => report.errors.push(format!("workbook: {err:#}")),
    }

    on_progress(ExportProgress {
        current: total_steps,
        total: total_steps,
        message: "Export finished".to_string(),
    });
    Ok(report)
}

pub fn export_backtest(dir: &Path, outcomes: &[BacktestOutcome]) -> Result<ExportReport> {
    fs::create_dir_all(dir).with_context(|| format!("create export dir {}", dir.display()))?;
    let timestamp = Local::now().format("%Y%m%d_%H%M").to_string();
    let mut report = ExportReport {
        files: Vec::new(),
        rows: 0,
        errors: Vec::new(),
    };

    let rows = backtest_rows(outcomes);
    let csv_path = dir.join(format!("backtest_results_{timestamp}.csv"));
    match write_csv(&csv_path, &rows) {
        Ok(written) => {
            report.rows += written;
            report.files.push(csv_path);
        }
        Err(err) => report.errors.push(format!("backtest csv: {err:#}")),
    }

    let xlsx_path = dir.join(format!("backtest_results_{timestamp}.xlsx"));
    let sheets: [(&str, &[Vec<String>]); 1] = [("Backtest Results", &rows)];
    match write_workbook(&xlsx_path, &sheets) {
        Ok(()) => report.files.push(xlsx_path),
        Err(err) => report.errors.push(format!("backtest workbook: {err:#}")),
    }
    Ok(report)
}

fn best_player_rows(recs: &Recommendations) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Rank".to_string(),
        "Player".to_string(),
        "Club".to_string(),
        "Pos".to_string(),
        "Form".to_string(),
        "Points".to_string(),
        "Cost".to_string(),
        "Owned %".to_string(),
        "FDR Sum".to_string(),
        "FDR/Fix".to_string(),
        "Score".to_string(),
    ]];
    for (idx, row) in recs.best_players.iter().take(EXPORT_TOP_N).enumerate() {
        rows.push(ranked_row(idx + 1, row));
    }
    rows
}

fn ranked_row(rank: usize, row: &RankedPlayerRow) -> Vec<String> {
    vec![
        rank.to_string(),
        row.name.clone(),
        row.club_name.clone(),
        row.position.short().to_string(),
        format!("{:.1}", row.form),
        row.total_points.to_string(),
        format!("{:.1}", row.cost),
        format!("{:.1}", row.ownership_percent),
        format!("{:.1}", row.fdr_total),
        format!("{:.2}", row.fdr_per_fixture),
        format!("{:.2}", row.score),
    ]
}

fn transfer_out_rows(recs: &Recommendations) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Player".to_string(),
        "Club".to_string(),
        "Form".to_string(),
        "Status".to_string(),
        "Points".to_string(),
        "FDR Sum".to_string(),
        "Reasons".to_string(),
    ]];
    for row in &recs.transfers_out {
        let reasons = row
            .reasons
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ");
        rows.push(vec![
            row.snapshot.name.clone(),
            row.snapshot.club_name.clone(),
            format!("{:.1}", row.snapshot.form),
            row.snapshot.status.label().to_string(),
            row.snapshot.total_points.to_string(),
            format!("{:.1}", row.fdr_total),
            reasons,
        ]);
    }
    rows
}

fn captaincy_rows(recs: &Recommendations) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Role".to_string(),
        "Player".to_string(),
        "Club".to_string(),
        "Score".to_string(),
        "FDR/Fix".to_string(),
    ]];
    match recs.captaincy.as_ref() {
        Some(pick) => {
            for (role, candidate) in [("Captain", &pick.captain), ("Vice-Captain", &pick.vice)] {
                rows.push(vec![
                    role.to_string(),
                    candidate.snapshot.name.clone(),
                    candidate.snapshot.club_name.clone(),
                    format!("{:.2}", candidate.score),
                    format!("{:.2}", candidate.fdr_per_fixture),
                ]);
            }
        }
        None => rows.push(vec![
            "Captain".to_string(),
            "insufficient data".to_string(),
            String::new(),
            String::new(),
            String::new(),
        ]),
    }
    rows
}

fn chip_rows(recs: &Recommendations) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Chip".to_string(),
        "Gameweek".to_string(),
        "Detail".to_string(),
    ]];
    let chips = &recs.chips;
    rows.push(chip_row(
        "Bench Boost",
        chips.bench_boost.map(|t| t.gameweek),
        chips
            .bench_boost
            .map(|t| format!("bench score {:.2}", t.score)),
    ));
    rows.push(chip_row(
        "Triple Captain",
        chips.triple_captain.map(|t| t.gameweek),
        chips
            .triple_captain
            .map(|t| format!("captain score {:.2}", t.score)),
    ));
    rows.push(chip_row("Wildcard", chips.wildcard, None));
    rows.push(chip_row(
        "Free Hit",
        chips.free_hit.map(|t| t.gameweek),
        chips
            .free_hit
            .map(|t| format!("{} fixture anomalies", t.anomalies)),
    ));
    rows
}

fn chip_row(name: &str, gameweek: Option<u32>, detail: Option<String>) -> Vec<String> {
    vec![
        name.to_string(),
        gameweek
            .map(|gw| format!("GW{gw}"))
            .unwrap_or_else(|| "-".to_string()),
        detail.unwrap_or_default(),
    ]
}

fn squad_rows(recs: &Recommendations) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Pos".to_string(),
        "Player".to_string(),
        "Club".to_string(),
        "Cost".to_string(),
        "Score".to_string(),
    ]];
    for player in &recs.suggested_squad.squad.players {
        rows.push(vec![
            player.snapshot.position.short().to_string(),
            player.snapshot.name.clone(),
            player.snapshot.club_name.clone(),
            format!("{:.1}", player.snapshot.cost),
            format!("{:.2}", player.score),
        ]);
    }
    rows.push(vec![
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        format!("{:.1}", recs.suggested_squad.squad.total_cost),
        String::new(),
    ]);
    for shortfall in &recs.suggested_squad.shortfalls {
        rows.push(vec![
            shortfall.position.short().to_string(),
            format!("short by {}", shortfall.missing),
            String::new(),
            String::new(),
            String::new(),
        ]);
    }
    rows
}

fn backtest_rows(outcomes: &[BacktestOutcome]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Strategy".to_string(),
        "Total Points".to_string(),
        "Gameweeks".to_string(),
        "Shortfall GWs".to_string(),
        "Points Per Gameweek".to_string(),
    ]];
    for outcome in outcomes {
        let series = outcome
            .points_per_gameweek
            .iter()
            .map(|(gw, pts)| format!("GW{gw}:{pts}"))
            .collect::<Vec<_>>()
            .join(" ");
        rows.push(vec![
            outcome.strategy.to_string(),
            outcome.total_points.to_string(),
            outcome.points_per_gameweek.len().to_string(),
            outcome.shortfall_gameweeks.to_string(),
            series,
        ]);
    }
    rows
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<usize> {
    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
    Ok(rows.len().saturating_sub(1))
}

fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_workbook(path: &Path, sheets: &[(&str, &[Vec<String>])]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32, col_idx as u16, value)?;
        }
    }
    Ok(())
}
