pub mod config;
pub mod feed;
pub mod project;
pub mod tool;

use crate::context::{CliStore, Context};
use anyhow::Context as _;
use sdlcai_core::store::StoreState;

/// Refresh the store and return the resulting snapshot.
pub(crate) fn load(ctx: &Context, store: &CliStore) -> anyhow::Result<StoreState> {
    ctx.block_on(store.refresh())
        .context("failed to load projects")?;
    Ok(store.state())
}
