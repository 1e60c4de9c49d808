//! Scripted session against an in-memory board: `stratflow demo`.

use std::sync::Arc;

use anyhow::Result;
use console::style;
use tokio::sync::broadcast;

use stratflow::board::notify::{BroadcastNotifier, Notification};
use stratflow::board::{Gesture, InMemoryBoardApi, MoveReconciler, ReconcilerOptions};

use super::board::render_board;

const DEMO_BOARD: &str = "demo";

pub async fn cmd_demo() -> Result<()> {
    let api = Arc::new(InMemoryBoardApi::sample(DEMO_BOARD));
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut notifications = notifier.subscribe();
    let mut reconciler =
        MoveReconciler::new(DEMO_BOARD, api.clone(), notifier, ReconcilerOptions::default());

    reconciler.load().await?;
    println!();
    println!("{}", style("Initial board").bold().underlined());
    println!();
    print!("{}", render_board(reconciler.columns(), reconciler.state()));

    let steps = [
        ("Reorder SF-1 onto SF-3 within To Do", Gesture::onto_item("SF-1", "SF-3")),
        (
            "Drag SF-6 from Done onto the empty Backlog column",
            Gesture::from_raw("SF-6", "column:backlog"),
        ),
        (
            "Drag SF-2 into In Progress, which is at its WIP limit",
            Gesture::onto_item("SF-2", "SF-4"),
        ),
        ("Release SF-3 outside the board", Gesture::cancelled("SF-3")),
    ];

    for (number, (description, gesture)) in steps.iter().enumerate() {
        let phase = reconciler.drag_end(gesture).await;
        println!(
            "{} {}: {} -> {}",
            style("Step").bold(),
            number + 1,
            description,
            style(phase).cyan()
        );
        drain(&mut notifications);
        println!();
        print!("{}", render_board(reconciler.columns(), reconciler.state()));
    }

    let calls = api.calls();
    println!(
        "Server calls: {} moves, {} board fetches",
        calls.move_issue, calls.fetch_issues
    );
    Ok(())
}

fn drain(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(n) = rx.try_recv() {
        match n.code {
            Some(code) => println!("  notification [{}]: {} ({})", n.level.as_str(), n.message, code),
            None => println!("  notification [{}]: {}", n.level.as_str(), n.message),
        }
    }
}
