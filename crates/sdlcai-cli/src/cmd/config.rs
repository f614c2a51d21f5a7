use crate::context::Context;
use crate::output::print_json;
use anyhow::Context as _;
use clap::Subcommand;
use sdlcai_core::config::WarnLevel;
use sdlcai_core::paths;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration (file, env, and flags merged)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write the effective configuration to the state directory
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(ctx: &Context, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(ctx, json),
        ConfigSubcommand::Validate => validate(ctx, json),
        ConfigSubcommand::Init { force } => init(ctx, force, json),
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let api = &ctx.config.api;
    let masked = api.api_key.as_deref().map(mask);

    if json {
        print_json(&serde_json::json!({
            "state_dir": ctx.state_dir,
            "config_file": paths::config_path(&ctx.state_dir),
            "api": {
                "base_url": api.base_url,
                "api_key": masked,
                "timeout_secs": api.timeout_secs,
            },
            "log_store": ctx.config.log_store,
        }))?;
        return Ok(());
    }

    println!("State dir:    {}", ctx.state_dir.display());
    println!("Config file:  {}", paths::config_path(&ctx.state_dir).display());
    println!("Base URL:     {}", api.base_url);
    println!("API key:      {}", masked.as_deref().unwrap_or("(not set)"));
    println!("Timeout:      {}s", api.timeout_secs);
    println!("Log store:    {}", ctx.config.log_store.strategy);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let warnings = ctx.config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(ctx: &Context, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(&ctx.state_dir);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; re-run with --force to overwrite it",
            path.display()
        );
    }
    ctx.config
        .save(&ctx.state_dir)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "written": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
