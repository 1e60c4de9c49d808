//! Issue commands: `stratflow move` and `stratflow add`.

use anyhow::{Result, bail};
use console::style;

use stratflow::board::{BoardApi, ColumnId, Gesture, GestureOutcome, IssueType, ItemId, MovePhase};
use stratflow::config::StratflowConfig;

use super::board::{open_board, render_board};

/// Build the gesture a drag would produce: onto an item, or onto a column's
/// drop zone.
pub fn gesture_for(item: &str, onto: Option<&str>, column: Option<&str>) -> Result<Gesture> {
    match (onto, column) {
        (Some(target), None) => Ok(Gesture::onto_item(item, target)),
        (None, Some(column)) => Ok(Gesture::onto_column(item, column)),
        _ => bail!("Specify exactly one of --onto <ITEM> or --column <COLUMN>"),
    }
}

pub async fn cmd_move(
    config: &StratflowConfig,
    item: &str,
    onto: Option<&str>,
    column: Option<&str>,
) -> Result<()> {
    let gesture = gesture_for(item, onto, column)?;
    let (client, mut reconciler) = open_board(config).await?;
    reconciler.item(&ItemId::new(item))?;

    let ticket = match reconciler.begin_move(&gesture) {
        GestureOutcome::Aborted(reason) => {
            println!("Nothing to move: {}", reason);
            return Ok(());
        }
        GestureOutcome::Applied(ticket) => ticket,
    };

    println!(
        "Moving {} to {} at index {}...",
        ticket.request.issue_id, ticket.request.to_column_id, ticket.request.to_index
    );
    let result = client.move_issue(&ticket.request).await;
    let phase = reconciler.complete_move(ticket, result).await?;

    println!();
    print!("{}", render_board(reconciler.columns(), reconciler.state()));

    match phase {
        MovePhase::Confirmed => {
            println!("{} {}", style("Moved").green().bold(), item);
            Ok(())
        }
        other => bail!("Move of {} ended as {}", item, other),
    }
}

pub async fn cmd_add(
    config: &StratflowConfig,
    title: &str,
    column: &str,
    issue_type: IssueType,
) -> Result<()> {
    let (_, mut reconciler) = open_board(config).await?;
    let created = reconciler
        .create_issue(&ColumnId::new(column), title, issue_type)
        .await?;

    println!(
        "{} {} \"{}\" in {}",
        style("Created").green().bold(),
        created.id,
        created.title,
        created.column_id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratflow::board::DropTarget;

    #[test]
    fn test_gesture_for_item_target() {
        let gesture = gesture_for("SF-1", Some("SF-3"), None).unwrap();
        assert_eq!(gesture.target, Some(DropTarget::Item(ItemId::new("SF-3"))));
    }

    #[test]
    fn test_gesture_for_column_target() {
        let gesture = gesture_for("SF-1", None, Some("done")).unwrap();
        assert_eq!(gesture.target, Some(DropTarget::Column(ColumnId::new("done"))));
    }

    #[test]
    fn test_gesture_for_requires_one_target() {
        assert!(gesture_for("SF-1", None, None).is_err());
        assert!(gesture_for("SF-1", Some("SF-2"), Some("done")).is_err());
    }
}
