//! Board display: `stratflow board`.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use stratflow::board::notify::ConsoleNotifier;
use stratflow::board::{BoardState, Column, HttpBoardClient, MoveReconciler, ReconcilerOptions};
use stratflow::config::StratflowConfig;

/// Connect to the configured board API and load the selected board.
pub async fn open_board(config: &StratflowConfig) -> Result<(Arc<HttpBoardClient>, MoveReconciler)> {
    let board_id = config.require_board()?;
    let client = Arc::new(
        HttpBoardClient::from_config(config).context("Failed to create board API client")?,
    );
    let mut reconciler = MoveReconciler::new(
        board_id.clone(),
        client.clone(),
        Arc::new(ConsoleNotifier),
        ReconcilerOptions::from_config(config),
    );
    reconciler
        .load()
        .await
        .with_context(|| format!("Failed to load board {} from {}", board_id, client.base_url()))?;
    Ok((client, reconciler))
}

pub async fn cmd_board(config: &StratflowConfig) -> Result<()> {
    let (_, reconciler) = open_board(config).await?;
    println!();
    println!("Board {}", style(reconciler.board_id()).bold());
    println!();
    print!("{}", render_board(reconciler.columns(), reconciler.state()));
    Ok(())
}

/// Render columns in position order with their items and WIP usage.
/// Items whose column is not in `columns` are listed last.
pub fn render_board(columns: &[Column], state: &BoardState) -> String {
    let mut out = String::new();

    for column in columns {
        let items = state.items(&column.id);
        let usage = match column.wip_limit {
            Some(limit) => format!("{}/{}", items.len(), limit),
            None => items.len().to_string(),
        };
        let usage = if column.is_at_capacity(items.len()) {
            style(usage).red().to_string()
        } else {
            style(usage).dim().to_string()
        };
        let _ = writeln!(out, "{} ({})", style(&column.name).bold(), usage);
        render_items(&mut out, items);
    }

    for column_id in state.column_ids() {
        if columns.iter().all(|c| c.id != *column_id) {
            let _ = writeln!(out, "{} (unknown column)", column_id);
            render_items(&mut out, state.items(column_id));
        }
    }

    out
}

fn render_items(out: &mut String, items: &[stratflow::board::WorkItem]) {
    if items.is_empty() {
        let _ = writeln!(out, "  (empty)");
    }
    for (index, item) in items.iter().enumerate() {
        match item.issue_type {
            Some(kind) => {
                let _ = writeln!(out, "  {}. {}  {} [{}]", index, item.id, item.title, kind);
            }
            None => {
                let _ = writeln!(out, "  {}. {}  {}", index, item.id, item.title);
            }
        }
    }
    let _ = writeln!(out);
}
