use crate::error::{Result, SdlcaiError};
use crate::types::ProjectId;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Default state directory name under `$HOME`.
pub const STATE_DIR_NAME: &str = ".sdlcai";

pub const CONFIG_FILE: &str = "config.yaml";
pub const TOKEN_FILE: &str = "token";
pub const SELECTED_PROJECT_FILE: &str = "selected_project";
pub const LOGS_DIR: &str = "logs";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE)
}

pub fn token_path(state_dir: &Path) -> PathBuf {
    state_dir.join(TOKEN_FILE)
}

pub fn selected_project_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SELECTED_PROJECT_FILE)
}

pub fn logs_dir(state_dir: &Path) -> PathBuf {
    state_dir.join(LOGS_DIR)
}

/// Log file for one project: `i-<n>.json` for integer ids and
/// `s-<hex of the UTF-8 bytes>.json` for string ids. The encoding is
/// one-to-one and only ever produces `[a-z0-9-]`, so no id can escape the
/// logs directory or share another id's file.
pub fn project_log_path(state_dir: &Path, project_id: &ProjectId) -> PathBuf {
    let stem = match project_id {
        ProjectId::Int(n) => format!("i-{n}"),
        ProjectId::Text(s) => {
            let hex: String = s.bytes().map(|b| format!("{b:02x}")).collect();
            format!("s-{hex}")
        }
    };
    logs_dir(state_dir).join(format!("{stem}.json"))
}

/// `$HOME/.sdlcai`.
pub fn default_state_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(STATE_DIR_NAME))
        .ok_or(SdlcaiError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
