use crate::context::Context;
use crate::output::{format_time, preview, print_json, print_table};

pub fn run(ctx: &Context, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let state = super::load(ctx, &store)?;
    let limit = limit.unwrap_or(usize::MAX);
    let entries: Vec<_> = state.activity_feed.iter().take(limit).collect();

    if json {
        print_json(&entries)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No activity recorded yet.");
        return Ok(());
    }

    let rows = entries
        .iter()
        .map(|e| {
            vec![
                format_time(Some(e.created_at)),
                e.project_name.clone(),
                e.tool.clone(),
                preview(&e.input, 40),
            ]
        })
        .collect();
    print_table(&["WHEN", "PROJECT", "TOOL", "INPUT"], rows);

    let total = state.activity_feed.len();
    if entries.len() < total {
        println!("\n{} of {} entries shown.", entries.len(), total);
    }
    Ok(())
}
