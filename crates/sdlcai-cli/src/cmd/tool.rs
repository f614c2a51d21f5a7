use crate::context::Context;
use crate::output::{print_json, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use sdlcai_core::types::ToolId;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ToolSubcommand {
    /// List the available tools
    List,
    /// Run a tool and record the result against the selected project
    Run {
        /// Tool id (see `sdlcai tool list`)
        tool: String,
        /// JSON request body; `-` reads from stdin
        #[arg(long, short = 'i', value_name = "FILE")]
        input: PathBuf,
    },
}

pub fn run(ctx: &Context, subcmd: ToolSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ToolSubcommand::List => list(json),
        ToolSubcommand::Run { tool, input } => run_tool(ctx, &tool, &input),
    }
}

fn list(json: bool) -> anyhow::Result<()> {
    if json {
        let items: Vec<_> = ToolId::all()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.as_str(),
                    "name": t.display_name(),
                    "endpoint": t.endpoint(),
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    let rows = ToolId::all()
        .iter()
        .map(|t| {
            vec![
                t.as_str().to_string(),
                t.display_name().to_string(),
                t.endpoint(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "ENDPOINT"], rows);
    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<Value> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read input from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("tool input is not valid JSON")
}

fn run_tool(ctx: &Context, tool: &str, input: &Path) -> anyhow::Result<()> {
    let tool: ToolId = tool.parse()?;
    let input = read_input(input)?;
    let store = ctx.store()?;

    // Without a project list the selection cannot be restored; the run still
    // goes ahead, unrecorded.
    if let Err(e) = ctx.block_on(store.refresh()) {
        eprintln!("warning: could not load projects ({e}); running in sandbox mode");
    }

    let output = ctx
        .block_on(store.api().run_tool(tool, &input))
        .with_context(|| format!("{} failed", tool.display_name()))?;

    match store
        .log_activity(tool, tool.display_name(), input, output.clone())
        .context("failed to record activity")?
    {
        Some(entry) => eprintln!("Recorded under project {}.", entry.project_name),
        None => eprintln!("Sandbox mode: no project selected, run not recorded."),
    }

    print_json(&output)
}
