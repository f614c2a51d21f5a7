use anyhow::Context;
use std::path::{Path, PathBuf};

/// Resolve the state directory.
///
/// Priority:
/// 1. `--state-dir` flag / `SDLCAI_HOME` env var (passed in as `explicit`)
/// 2. `$HOME/.sdlcai`
pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    sdlcai_core::paths::default_state_dir().context("cannot locate the state directory")
}
