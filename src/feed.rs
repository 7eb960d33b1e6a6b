use std::env;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::fpl_fetch;
use crate::persist;
use crate::session::{self, SessionCookies};
use crate::state::{Delta, ProviderCommand};

/// Background provider: owns every network round-trip so the UI thread only
/// ever applies typed deltas. Starts from the persisted snapshot (instant,
/// offline-safe), then refreshes on a timer and on explicit commands.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let poll_interval = Duration::from_secs(
            env::var("FPL_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(900)
                .max(60),
        );
        let team_id = env::var("FPL_TEAM_ID")
            .ok()
            .and_then(|val| val.parse::<u64>().ok());
        let cookies = load_cookies(&tx);

        if let Some(universe) = persist::load_snapshot() {
            let _ = tx.send(Delta::Log("[INFO] Loaded cached snapshot".to_string()));
            let _ = tx.send(Delta::Snapshot(Box::new(universe)));
        }

        fetch_and_publish(&tx, team_id, cookies.as_ref());
        let mut last_fetch = Instant::now();
        loop {
            let mut refresh_all = false;
            let mut refresh_roster = false;
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::RefreshAll => refresh_all = true,
                    ProviderCommand::RefreshRoster => refresh_roster = true,
                }
            }

            if refresh_all || last_fetch.elapsed() >= poll_interval {
                fetch_and_publish(&tx, team_id, cookies.as_ref());
                last_fetch = Instant::now();
            } else if refresh_roster {
                publish_roster(&tx, team_id, cookies.as_ref());
            }

            thread::sleep(Duration::from_millis(900));
        }
    });
}

fn fetch_and_publish(tx: &Sender<Delta>, team_id: Option<u64>, cookies: Option<&SessionCookies>) {
    match fpl_fetch::fetch_universe(team_id, cookies) {
        Ok((universe, warnings)) => {
            for warning in warnings {
                let _ = tx.send(Delta::Log(format!("[WARN] {warning}")));
            }
            let _ = tx.send(Delta::Log(format!(
                "[INFO] Snapshot: {} players, {} fixtures, GW{}",
                universe.players.len(),
                universe.fixtures.len(),
                universe.current_gameweek
            )));
            persist::save_snapshot(&universe);
            let _ = tx.send(Delta::Snapshot(Box::new(universe)));
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Fetch error: {err:#}")));
        }
    }
}

fn publish_roster(tx: &Sender<Delta>, team_id: Option<u64>, cookies: Option<&SessionCookies>) {
    let (Some(team_id), Some(cookies)) = (team_id, cookies) else {
        let _ = tx.send(Delta::Log(
            "[INFO] Roster refresh needs FPL_TEAM_ID and session cookies".to_string(),
        ));
        return;
    };
    match fpl_fetch::fetch_my_team(team_id, cookies) {
        Ok(roster) => {
            let _ = tx.send(Delta::Log(format!(
                "[INFO] Roster refreshed: {} picks",
                roster.len()
            )));
            let _ = tx.send(Delta::Roster(roster));
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Roster fetch error: {err:#}")));
        }
    }
}

fn load_cookies(tx: &Sender<Delta>) -> Option<SessionCookies> {
    let dir = env::var("FPL_COOKIE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    match session::load_cookies(&dir) {
        Ok(Some(cookies)) => {
            let _ = tx.send(Delta::Log("[INFO] Session cookies loaded".to_string()));
            Some(cookies)
        }
        Ok(None) => None,
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Cookie load failed: {err:#}")));
            None
        }
    }
}
