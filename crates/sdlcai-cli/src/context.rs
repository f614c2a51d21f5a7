use anyhow::Context as _;
use sdlcai_core::api::HttpProjectApi;
use sdlcai_core::config::Config;
use sdlcai_core::credentials::Credentials;
use sdlcai_core::log_store::{self, LogStore};
use sdlcai_core::selection::SelectionStore;
use sdlcai_core::store::ProjectStore;
use std::future::Future;
use std::path::PathBuf;

pub const TOKEN_ENV: &str = "SDLCAI_TOKEN";

pub type CliStore = ProjectStore<HttpProjectApi, Box<dyn LogStore>>;

/// Everything a command needs: resolved config, the state directory, and a
/// single-threaded runtime to drive the async store.
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
    runtime: tokio::runtime::Runtime,
}

impl Context {
    pub fn new(
        state_dir: PathBuf,
        base_url: Option<String>,
        api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let config = Config::load(&state_dir)
            .with_context(|| format!("failed to load config from {}", state_dir.display()))?
            .with_overrides(base_url, api_key);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        Ok(Self {
            state_dir,
            config,
            runtime,
        })
    }

    pub fn store(&self) -> anyhow::Result<CliStore> {
        let env_token = std::env::var(TOKEN_ENV).ok();
        let credentials = Credentials::load(
            &self.state_dir,
            env_token.as_deref(),
            self.config.api.api_key.clone(),
        )
        .context("failed to read credentials")?;
        let api = HttpProjectApi::new(&self.config.api, credentials)
            .context("failed to build API client")?;
        let logs = log_store::open(self.config.log_store.strategy, &self.state_dir);
        Ok(ProjectStore::new(
            api,
            logs,
            SelectionStore::new(&self.state_dir),
        ))
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }
}
