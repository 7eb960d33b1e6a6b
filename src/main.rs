use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use fpl_assistant::recommend::{RankedPlayerRow, Recommendations, TransferOutRow};
use fpl_assistant::state::{self, AppState, Delta, Position, ProviderCommand, Screen, apply_delta};
use fpl_assistant::{export, fake_feed, feed};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
    delta_tx: mpsc::Sender<Delta>,
    export_dir: PathBuf,
}

impl App {
    fn new(
        cmd_tx: mpsc::Sender<ProviderCommand>,
        delta_tx: mpsc::Sender<Delta>,
    ) -> Self {
        let export_dir = env::var("FPL_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
            delta_tx,
            export_dir,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Rankings,
            KeyCode::Char('2') => self.state.screen = Screen::Squad,
            KeyCode::Char('3') => self.state.screen = Screen::Chips,
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Rankings,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.state.cycle_strategy();
                self.state
                    .push_log(format!("[INFO] Strategy: {}", self.state.profile().name));
            }
            KeyCode::Char('p') | KeyCode::Char('P') => self.state.cycle_position_filter(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if self.cmd_tx.send(ProviderCommand::RefreshAll).is_ok() {
                    self.state.push_log("[INFO] Refresh requested");
                }
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                if self.cmd_tx.send(ProviderCommand::RefreshRoster).is_ok() {
                    self.state.push_log("[INFO] Roster refresh requested");
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') => self.start_export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn start_export(&mut self) {
        if self.state.export.running {
            self.state.push_log("[INFO] Export already running");
            return;
        }
        let Some(recs) = self.state.recommendations.clone() else {
            self.state.push_log("[INFO] Nothing to export yet");
            return;
        };
        let tx = self.delta_tx.clone();
        let dir = self.export_dir.clone();
        self.state.export.running = true;
        self.state.export.message = "Export starting".to_string();
        thread::spawn(move || {
            let result = export::export_recommendations(&dir, &recs, |progress| {
                let _ = tx.send(Delta::ExportUpdate(format!(
                    "[{}/{}] {}",
                    progress.current, progress.total, progress.message
                )));
            });
            match result {
                Ok(report) => {
                    for err in &report.errors {
                        let _ = tx.send(Delta::Log(format!("[WARN] Export: {err}")));
                    }
                    let _ = tx.send(Delta::ExportDone {
                        files: report.files.len(),
                        errors: report.errors.len(),
                    });
                }
                Err(err) => {
                    let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err:#}")));
                    let _ = tx.send(Delta::ExportDone { files: 0, errors: 1 });
                }
            }
        });
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let demo = env::var("FPL_DEMO").map(|v| v == "1").unwrap_or(false);
    if demo {
        fake_feed::spawn_fake_provider(tx.clone(), cmd_rx);
    } else {
        feed::spawn_provider(tx.clone(), cmd_rx);
    }

    let mut app = App::new(cmd_tx, tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.export.clear_if_done_for(Instant::now(), 8);

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Rankings => render_rankings(frame, chunks[1], &app.state),
        Screen::Squad => render_squad(frame, chunks[1], &app.state),
        Screen::Chips => render_chips(frame, chunks[1], &app.state),
    }

    let footer =
        Paragraph::new(footer_text(&app.state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let gw = state
        .universe
        .as_ref()
        .map(|u| format!("GW{}", u.current_gameweek))
        .unwrap_or_else(|| "GW?".to_string());
    let pos = state
        .position_filter
        .map(Position::short)
        .unwrap_or("ALL");
    let status = if state.loading {
        " | loading...".to_string()
    } else if !state.export.message.is_empty() {
        format!(" | {}", state.export.message)
    } else {
        String::new()
    };
    format!(
        "FPL ASSISTANT | {} | {} | {} | Pos: {}{}",
        state::screen_label(state.screen),
        gw,
        state.profile().name,
        pos,
        status
    )
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Rankings => {
            "1/2/3 Screens | j/k Move | s Strategy | p Position | r Refresh | e Export | ? Help | q Quit"
                .to_string()
        }
        Screen::Squad => {
            "1/2/3 Screens | j/k Move | t Roster refresh | e Export | ? Help | q Quit".to_string()
        }
        Screen::Chips => "1/2/3 Screens | e Export | ? Help | q Quit".to_string(),
    }
}

const RANKINGS_VISIBLE: usize = 30;

fn render_rankings(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let header = format!(
        " {:>3} {:<22} {:<15} {:>3} {:>5} {:>4} {:>6} {:>6} {:>7} {:>7}",
        "#", "Player", "Club", "Pos", "Form", "Pts", "Cost", "Own%", "FDR/Fx", "Score"
    );
    frame.render_widget(
        Paragraph::new(header).style(Style::default().add_modifier(Modifier::BOLD)),
        sections[0],
    );

    let Some(recs) = state.recommendations.as_ref() else {
        frame.render_widget(
            Paragraph::new("No data yet").style(Style::default().fg(Color::DarkGray)),
            sections[1],
        );
        return;
    };

    let rows: Vec<&RankedPlayerRow> = match state.position_filter {
        None => recs.best_players.iter().collect(),
        Some(pos) => recs
            .best_players
            .iter()
            .filter(|row| row.position == pos)
            .collect(),
    };
    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new("No players match this filter")
                .style(Style::default().fg(Color::DarkGray)),
            sections[1],
        );
        return;
    }

    let selected = state.rankings_selected.min(rows.len() - 1);
    let start = selected.saturating_sub(RANKINGS_VISIBLE / 2);
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(start)
        .take(RANKINGS_VISIBLE.max(sections[1].height as usize))
        .map(|(idx, row)| {
            let text = format!(
                " {:>3} {:<22} {:<15} {:>3} {:>5.1} {:>4} {:>6.1} {:>6.1} {:>7.2} {:>7.2}",
                idx + 1,
                truncate(&row.name, 22),
                truncate(&row.club_name, 15),
                row.position.short(),
                row.form,
                row.total_points,
                row.cost,
                row.ownership_percent,
                row.fdr_per_fixture,
                row.score
            );
            if idx == selected {
                Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::raw(text)
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), sections[1]);
}

fn render_squad(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_roster_list(frame, cols[0], state);
    render_squad_side(frame, cols[1], state);
}

fn render_roster_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("My Squad").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(universe) = state.universe.as_ref() else {
        frame.render_widget(Paragraph::new("No data yet"), inner);
        return;
    };
    let Some(roster) = universe.roster.as_ref() else {
        frame.render_widget(
            Paragraph::new("No roster loaded.\nSet FPL_TEAM_ID and provide cookies.json\n(or run with FPL_DEMO=1)."),
            inner,
        );
        return;
    };
    let recs = state.recommendations.as_ref();

    let lines: Vec<Line> = roster
        .iter()
        .enumerate()
        .map(|(idx, slot)| {
            let player = universe.players.iter().find(|p| p.id == slot.player_id);
            let text = match player {
                Some(p) => {
                    let marker = roster_marker(recs, p.id);
                    let bench = if slot.is_bench() { "B" } else { " " };
                    format!(
                        " {:>2}{} {:<22} {:<4} {:>5.1} {:>4} {:<10} {}",
                        slot.slot,
                        bench,
                        truncate(&p.name, 22),
                        p.position.short(),
                        p.form,
                        p.total_points,
                        p.status.label(),
                        marker
                    )
                }
                None => format!(" {:>2}  (unknown player {})", slot.slot, slot.player_id),
            };
            if idx == state.squad_selected {
                Line::styled(text, Style::default().add_modifier(Modifier::REVERSED))
            } else {
                Line::raw(text)
            }
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn roster_marker(recs: Option<&Recommendations>, player_id: u32) -> String {
    let Some(recs) = recs else {
        return String::new();
    };
    let mut marks = Vec::new();
    if let Some(pick) = recs.captaincy.as_ref() {
        if pick.captain.snapshot.id == player_id {
            marks.push("C");
        }
        if pick.vice.snapshot.id == player_id {
            marks.push("V");
        }
    }
    if recs
        .transfers_out
        .iter()
        .any(|row| row.snapshot.id == player_id)
    {
        marks.push("OUT");
    }
    marks.join(" ")
}

fn render_squad_side(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let transfers = Block::default().title("Transfers Out").borders(Borders::ALL);
    let transfers_inner = transfers.inner(rows[0]);
    frame.render_widget(transfers, rows[0]);
    frame.render_widget(
        Paragraph::new(transfers_text(state)),
        transfers_inner,
    );

    let replacements = Block::default().title("Replacements").borders(Borders::ALL);
    let replacements_inner = replacements.inner(rows[1]);
    frame.render_widget(replacements, rows[1]);
    frame.render_widget(
        Paragraph::new(replacements_text(state)),
        replacements_inner,
    );
}

fn transfers_text(state: &AppState) -> String {
    let Some(recs) = state.recommendations.as_ref() else {
        return "No data yet".to_string();
    };
    if recs.transfers_out.is_empty() {
        return "No transfer-out candidates".to_string();
    }
    recs.transfers_out
        .iter()
        .map(transfer_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn transfer_line(row: &TransferOutRow) -> String {
    let reasons = row
        .reasons
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{} (form {:.1}, FDR {:.0}): {}",
        row.snapshot.name, row.snapshot.form, row.fdr_total, reasons
    )
}

fn replacements_text(state: &AppState) -> String {
    let Some(recs) = state.recommendations.as_ref() else {
        return "No data yet".to_string();
    };
    if recs.replacements.is_empty() {
        return "Nothing to replace".to_string();
    }
    let mut lines = Vec::new();
    for suggestion in &recs.replacements {
        lines.push(format!("{} ->", suggestion.out_name));
        if suggestion.candidates.is_empty() {
            lines.push("  no affordable candidate".to_string());
        }
        for candidate in &suggestion.candidates {
            lines.push(format!(
                "  {} ({}, {:.1}m, score {:.2})",
                candidate.name,
                candidate.club_name,
                candidate.cost,
                candidate.score
            ));
        }
    }
    lines.join("\n")
}

fn render_chips(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(6)])
        .split(area);

    let chips = Block::default().title("Chip Timing").borders(Borders::ALL);
    let chips_inner = chips.inner(rows[0]);
    frame.render_widget(chips, rows[0]);
    frame.render_widget(Paragraph::new(chips_text(state)), chips_inner);

    let console = Block::default().title("Console").borders(Borders::ALL);
    let console_inner = console.inner(rows[1]);
    frame.render_widget(console, rows[1]);
    frame.render_widget(Paragraph::new(console_text(state)), console_inner);
}

fn chips_text(state: &AppState) -> String {
    let Some(recs) = state.recommendations.as_ref() else {
        return "No data yet".to_string();
    };
    let chips = &recs.chips;
    let mut lines = Vec::new();
    lines.push(match chips.bench_boost {
        Some(t) => format!("Bench Boost    GW{}  (bench score {:.2})", t.gameweek, t.score),
        None => "Bench Boost    -    (needs a loaded roster)".to_string(),
    });
    lines.push(match chips.triple_captain {
        Some(t) => format!("Triple Captain GW{}  (captain score {:.2})", t.gameweek, t.score),
        None => "Triple Captain -    (needs a loaded roster)".to_string(),
    });
    lines.push(match chips.wildcard {
        Some(gw) => format!("Wildcard       GW{gw}  (half-season reset)"),
        None => "Wildcard       -    (window passed)".to_string(),
    });
    lines.push(match chips.free_hit {
        Some(t) => format!(
            "Free Hit       GW{}  ({} clubs with blank/double)",
            t.gameweek, t.anomalies
        ),
        None => "Free Hit       -    (no fixture anomalies ahead)".to_string(),
    });
    if let Some(pick) = recs.captaincy.as_ref() {
        lines.push(String::new());
        lines.push(format!(
            "Captain: {} ({:.2})   Vice: {} ({:.2})",
            pick.captain.snapshot.name,
            pick.captain.score,
            pick.vice.snapshot.name,
            pick.vice.score
        ));
    }
    if !recs.suggested_squad.is_complete() {
        lines.push(String::new());
        for shortfall in &recs.suggested_squad.shortfalls {
            lines.push(format!(
                "Squad shortfall: {} short by {}",
                shortfall.position.label(),
                shortfall.missing
            ));
        }
    }
    lines.join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    let take = 4usize;
    let start = state.logs.len().saturating_sub(take);
    state.logs[start..].join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FPL Assistant - Help",
        "",
        "Global:",
        "  1            Rankings",
        "  2            Squad",
        "  3            Chips",
        "  j/k or ↑/↓   Move",
        "  s            Cycle strategy",
        "  p            Cycle position filter",
        "  r            Refresh snapshot",
        "  t            Refresh roster",
        "  e            Export CSV/XLSX",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}
