use crate::context::Context;
use crate::output::{format_time, preview, print_json, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use sdlcai_core::store::StoreState;
use sdlcai_core::types::ProjectId;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects with activity stats
    List {
        /// Only show projects whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a project
    Create {
        name: String,
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Delete a project and all of its activity logs
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show a project and its activity logs
    Show { id: String },
    /// Select the project that tool runs are recorded against
    Select { id: String },
    /// Clear the selection (sandbox mode: tool runs are not recorded)
    Deselect,
}

pub fn run(ctx: &Context, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::List { search } => list(ctx, search.as_deref(), json),
        ProjectSubcommand::Create { name, description } => {
            create(ctx, &name, description.as_deref(), json)
        }
        ProjectSubcommand::Delete { id, yes } => delete(ctx, &id, yes, json),
        ProjectSubcommand::Show { id } => show(ctx, &id, json),
        ProjectSubcommand::Select { id } => select(ctx, &id, json),
        ProjectSubcommand::Deselect => deselect(ctx, json),
    }
}

/// The loaded project whose displayed id is `arg`, else `arg` parsed as-is.
fn resolve_id(state: &StoreState, arg: &str) -> ProjectId {
    if let Some(project) = state.find_project(arg) {
        return project.id.clone();
    }
    match arg.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(ctx: &Context, search: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let state = super::load(ctx, &store)?;
    let projects = match search {
        Some(term) => state.search_projects(term),
        None => state.projects.iter().collect(),
    };

    if json {
        let items: Vec<_> = projects
            .iter()
            .map(|p| {
                serde_json::json!({
                    "project": p,
                    "stats": state.project_stats(&p.id),
                    "selected": state.is_selected(&p.id),
                })
            })
            .collect();
        print_json(&items)?;
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects. Create one with: sdlcai project create <name>");
        return Ok(());
    }

    let rows = projects
        .iter()
        .map(|p| {
            let stats = state.project_stats(&p.id);
            let (count, tools, active) = match stats {
                Some(s) => (
                    s.activity_count.to_string(),
                    s.unique_tools.to_string(),
                    format!("{} {}", s.last_active_label, format_time(s.last_active)),
                ),
                None => ("0".into(), "0".into(), "-".into()),
            };
            let marker = if state.is_selected(&p.id) { "*" } else { "" };
            vec![
                marker.to_string(),
                p.id.to_string(),
                p.name.clone(),
                count,
                tools,
                active,
            ]
        })
        .collect();
    print_table(&["", "ID", "NAME", "LOGS", "TOOLS", "LAST ACTIVE"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// create / delete
// ---------------------------------------------------------------------------

fn create(ctx: &Context, name: &str, description: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let project = ctx
        .block_on(store.add_project(name, description))
        .context("failed to create project")?;

    if json {
        print_json(&project)?;
    } else {
        println!("Created project {} ({})", project.name, project.id);
    }
    Ok(())
}

fn delete(ctx: &Context, id: &str, yes: bool, json: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("deleting project {id} removes all of its activity logs; re-run with --yes to confirm");
    }
    let store = ctx.store()?;
    // The project list only disambiguates the id; the delete goes ahead
    // without it.
    if let Err(e) = ctx.block_on(store.refresh()) {
        tracing::debug!(error = %e, "project list unavailable before delete");
    }
    let id = resolve_id(&store.state(), id);
    ctx.block_on(store.remove_project(&id))
        .with_context(|| format!("failed to delete project {id}"))?;

    if json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    } else {
        println!("Deleted project {id}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(ctx: &Context, arg: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let state = super::load(ctx, &store)?;
    let project = state
        .find_project(arg)
        .with_context(|| format!("project not found: {}", arg.trim()))?;
    let id = project.id.clone();
    let logs = state.project_logs(&id);

    if json {
        print_json(&serde_json::json!({
            "project": project,
            "stats": state.project_stats(&id),
            "selected": state.is_selected(&id),
            "logs": logs,
        }))?;
        return Ok(());
    }

    println!("Project: {} ({})", project.name, project.id);
    if let Some(desc) = &project.description {
        println!("  {desc}");
    }
    println!("Created: {}", format_time(project.created_at));
    println!("Updated: {}", format_time(project.last_updated()));
    if state.is_selected(&id) {
        println!("Selected: yes");
    }
    println!();

    if logs.is_empty() {
        println!("No activity yet. Select this project and run a tool to record logs here.");
        return Ok(());
    }

    let rows = logs
        .iter()
        .map(|e| {
            vec![
                format_time(Some(e.created_at)),
                e.tool.clone(),
                preview(&e.input, 48),
            ]
        })
        .collect();
    print_table(&["WHEN", "TOOL", "INPUT"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// select / deselect
// ---------------------------------------------------------------------------

fn select(ctx: &Context, arg: &str, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let state = super::load(ctx, &store)?;
    let id = resolve_id(&state, arg);
    let project = store
        .select_project(Some(&id))
        .with_context(|| format!("failed to select project {id}"))?;

    if json {
        print_json(&serde_json::json!({ "selected": project }))?;
    } else if let Some(p) = project {
        println!("Selected project {} ({}). Tool runs will be recorded.", p.name, p.id);
    }
    Ok(())
}

fn deselect(ctx: &Context, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    store
        .select_project(None)
        .context("failed to clear selection")?;

    if json {
        print_json(&serde_json::json!({ "selected": null }))?;
    } else {
        println!("Selection cleared. Tool runs will not be recorded (sandbox mode).");
    }
    Ok(())
}
