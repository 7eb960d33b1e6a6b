use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::http_cache::app_cache_dir;
use crate::state::UniverseSnapshot;

const CACHE_FILE: &str = "snapshot.json";
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    universe: UniverseSnapshot,
}

/// Last fetched universe, so the app starts with data before the first
/// network round-trip finishes (or entirely offline).
pub fn load_snapshot() -> Option<UniverseSnapshot> {
    let path = snapshot_path()?;
    let raw = fs::read_to_string(&path).ok()?;
    let file = serde_json::from_str::<SnapshotFile>(&raw).ok()?;
    if file.version != CACHE_VERSION {
        return None;
    }
    Some(file.universe)
}

/// Best-effort write; a failed snapshot save never interrupts a run.
pub fn save_snapshot(universe: &UniverseSnapshot) {
    let Some(path) = snapshot_path() else {
        return;
    };
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let file = SnapshotFile {
        version: CACHE_VERSION,
        universe: universe.clone(),
    };
    if let Ok(json) = serde_json::to_string(&file) {
        let tmp = path.with_extension("json.tmp");
        if fs::write(&tmp, json).is_ok() {
            let _ = fs::rename(&tmp, &path);
        }
    }
}

pub fn load_snapshot_from(path: &Path) -> anyhow::Result<UniverseSnapshot> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
    // Accept either the versioned cache file or a bare snapshot (handy for
    // replaying saved fixtures).
    if let Ok(file) = serde_json::from_str::<SnapshotFile>(&raw) {
        return Ok(file.universe);
    }
    serde_json::from_str::<UniverseSnapshot>(&raw)
        .map_err(|e| anyhow::anyhow!("parse {}: {e}", path.display()))
}

fn snapshot_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}
