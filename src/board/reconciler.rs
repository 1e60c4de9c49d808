//! Move Reconciler: drives one drag gesture through
//! `Idle → Resolving → (Aborted | OptimisticallyApplied) → (Confirmed | RejectedAndReverted)`.
//!
//! The local move is applied synchronously before any request is sent. Each
//! request is absolute (`issueId`, `toColumnId`, `toIndex`), so responses may
//! settle in any order. A failed move is never inverted locally: the state is
//! rebuilt from the last server snapshot and then refetched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::BoardApi;
use super::gesture::{AbortReason, Gesture, try_resolve};
use super::models::{Column, ColumnId, CreateIssueRequest, IssueType, ItemId, MoveIssueRequest, WorkItem};
use super::notify::{Notification, Notifier};
use super::state::BoardState;
use crate::config::StratflowConfig;
use crate::errors::{ApiError, BoardError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePhase {
    Idle,
    Resolving,
    Aborted,
    OptimisticallyApplied,
    Confirmed,
    RejectedAndReverted,
}

impl MovePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Aborted => "aborted",
            Self::OptimisticallyApplied => "optimistically_applied",
            Self::Confirmed => "confirmed",
            Self::RejectedAndReverted => "rejected_and_reverted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Aborted | Self::Confirmed | Self::RejectedAndReverted)
    }
}

impl fmt::Display for MovePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Refetch the board once a confirmed move leaves nothing in flight.
    pub refetch_on_confirm: bool,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            refetch_on_confirm: true,
        }
    }
}

impl ReconcilerOptions {
    pub fn from_config(config: &StratflowConfig) -> Self {
        Self {
            refetch_on_confirm: config.refetch_on_confirm(),
        }
    }
}

/// An optimistically applied move waiting for the server's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTicket {
    pub request_id: Uuid,
    pub request: MoveIssueRequest,
    pub source_column: ColumnId,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Aborted(AbortReason),
    Applied(MoveTicket),
}

pub struct MoveReconciler {
    board_id: String,
    api: Arc<dyn BoardApi>,
    notifier: Arc<dyn Notifier>,
    options: ReconcilerOptions,
    columns: Vec<Column>,
    state: BoardState,
    /// Items exactly as last fetched from (or confirmed by) the server.
    snapshot: Vec<WorkItem>,
    /// request id → item, one entry per in-flight move.
    pending: HashMap<Uuid, ItemId>,
    phase: MovePhase,
    last_outcome: Option<MovePhase>,
    stale: bool,
}

impl MoveReconciler {
    pub fn new(
        board_id: impl Into<String>,
        api: Arc<dyn BoardApi>,
        notifier: Arc<dyn Notifier>,
        options: ReconcilerOptions,
    ) -> Self {
        Self {
            board_id: board_id.into(),
            api,
            notifier,
            options,
            columns: Vec::new(),
            state: BoardState::default(),
            snapshot: Vec::new(),
            pending: HashMap::new(),
            phase: MovePhase::Idle,
            last_outcome: None,
            stale: true,
        }
    }

    // ── Snapshot loading ──────────────────────────────────────────────

    /// Initial load of the board.
    pub async fn load(&mut self) -> Result<(), BoardError> {
        self.refresh().await
    }

    /// Fetch columns and issues and replace the local state wholesale.
    ///
    /// On failure the current state is kept, the board is marked stale and
    /// the user is told.
    pub async fn refresh(&mut self) -> Result<(), BoardError> {
        match self.fetch_snapshot().await {
            Ok((columns, items)) => {
                self.state = BoardState::rebuild_with_columns(&columns, items.iter().cloned());
                self.snapshot = items;
                self.columns = columns;
                self.stale = false;
                debug!(
                    board = %self.board_id,
                    columns = self.columns.len(),
                    items = self.snapshot.len(),
                    "board snapshot rebuilt"
                );
                Ok(())
            }
            Err(err) => {
                self.stale = true;
                let reason = err.reason();
                warn!(board = %self.board_id, reason = reason.code(), error = %err, "board refetch failed");
                self.notifier.notify(Notification::rejected(
                    format!("Could not load board {}: {}", self.board_id, reason),
                    &reason,
                ));
                Err(err.into())
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<(Vec<Column>, Vec<WorkItem>), ApiError> {
        let columns = self.api.fetch_columns(&self.board_id).await?;
        let items = self.api.fetch_issues(&self.board_id).await?;
        Ok((columns, items))
    }

    /// Show a different board. Local state and in-flight bookkeeping of the
    /// old board are dropped.
    pub async fn switch_board(&mut self, board_id: impl Into<String>) -> Result<(), BoardError> {
        self.board_id = board_id.into();
        self.pending.clear();
        self.columns.clear();
        self.snapshot.clear();
        self.state = BoardState::default();
        self.phase = MovePhase::Idle;
        self.last_outcome = None;
        self.refresh().await
    }

    // ── Gestures ──────────────────────────────────────────────────────

    /// Resolve a gesture and apply it locally. No I/O happens here; the
    /// returned ticket carries the request to send.
    pub fn begin_move(&mut self, gesture: &Gesture) -> GestureOutcome {
        self.phase = MovePhase::Resolving;

        if self.is_pending(&gesture.item_id) {
            return self.abort(gesture, AbortReason::MoveInFlight(gesture.item_id.clone()));
        }

        let resolved = match try_resolve(gesture, &self.state) {
            Ok(resolved) => resolved,
            Err(reason) => return self.abort(gesture, reason),
        };

        let destination = &resolved.destination;
        self.state = self.state.apply_local_move(
            &resolved.item_id,
            &destination.column_id,
            i64::try_from(destination.index).unwrap_or(i64::MAX),
        );

        let ticket = MoveTicket {
            request_id: Uuid::new_v4(),
            request: MoveIssueRequest {
                issue_id: resolved.item_id.clone(),
                to_column_id: destination.column_id.clone(),
                to_index: destination.index,
            },
            source_column: resolved.source_column.clone(),
            issued_at: Utc::now(),
        };
        self.pending.insert(ticket.request_id, resolved.item_id.clone());
        self.phase = MovePhase::OptimisticallyApplied;

        debug!(
            board = %self.board_id,
            issue = %resolved.item_id,
            request_id = %ticket.request_id,
            from_column = %resolved.source_column,
            to_column = %destination.column_id,
            to_index = destination.index,
            "move applied optimistically"
        );

        GestureOutcome::Applied(ticket)
    }

    fn abort(&mut self, gesture: &Gesture, reason: AbortReason) -> GestureOutcome {
        debug!(
            board = %self.board_id,
            issue = %gesture.item_id,
            reason = reason.as_str(),
            "gesture aborted"
        );
        self.finish(MovePhase::Aborted);
        GestureOutcome::Aborted(reason)
    }

    /// Settle a ticket with the server's answer.
    pub async fn complete_move(
        &mut self,
        ticket: MoveTicket,
        result: Result<WorkItem, ApiError>,
    ) -> Result<MovePhase, BoardError> {
        if self.pending.remove(&ticket.request_id).is_none() {
            return Err(BoardError::MoveNotPending(ticket.request_id));
        }
        Ok(self.settle(&ticket, result).await)
    }

    /// Resolve, apply, send and settle one gesture, returning where it ended.
    pub async fn drag_end(&mut self, gesture: &Gesture) -> MovePhase {
        let ticket = match self.begin_move(gesture) {
            GestureOutcome::Aborted(_) => return MovePhase::Aborted,
            GestureOutcome::Applied(ticket) => ticket,
        };
        let result = self.api.move_issue(&ticket.request).await;
        self.pending.remove(&ticket.request_id);
        self.settle(&ticket, result).await
    }

    async fn settle(&mut self, ticket: &MoveTicket, result: Result<WorkItem, ApiError>) -> MovePhase {
        let issue = &ticket.request.issue_id;
        match result {
            Ok(confirmed) => {
                info!(
                    board = %self.board_id,
                    issue = %issue,
                    request_id = %ticket.request_id,
                    to_column = %confirmed.column_id,
                    to_index = ticket.request.to_index,
                    "move confirmed"
                );
                self.finish(MovePhase::Confirmed);
                if self.pending.is_empty() {
                    if self.options.refetch_on_confirm {
                        // A failed refetch is already reported and marks the board stale.
                        let _ = self.refresh().await;
                    } else {
                        self.snapshot = self.state.snapshot_items();
                    }
                }
                MovePhase::Confirmed
            }
            Err(err) => {
                let reason = err.reason();
                warn!(
                    board = %self.board_id,
                    issue = %issue,
                    request_id = %ticket.request_id,
                    reason = reason.code(),
                    error = %err,
                    "move rejected, reverting to server state"
                );
                self.state =
                    BoardState::rebuild_with_columns(&self.columns, self.snapshot.iter().cloned());
                self.finish(MovePhase::RejectedAndReverted);
                self.notifier.notify(
                    Notification::rejected(format!("Could not move {}: {}", issue, reason), &reason)
                        .for_item(issue),
                );
                let _ = self.refresh().await;
                MovePhase::RejectedAndReverted
            }
        }
    }

    /// Record a terminal phase and return to Idle (or stay optimistic while
    /// other moves are in flight).
    fn finish(&mut self, outcome: MovePhase) {
        self.last_outcome = Some(outcome);
        self.phase = if self.pending.is_empty() {
            MovePhase::Idle
        } else {
            MovePhase::OptimisticallyApplied
        };
    }

    // ── Issue creation ────────────────────────────────────────────────

    /// Create an issue at the end of a column, then refetch. The new item's
    /// id and order are never predicted locally.
    pub async fn create_issue(
        &mut self,
        column_id: &ColumnId,
        title: &str,
        issue_type: IssueType,
    ) -> Result<WorkItem, BoardError> {
        let request = CreateIssueRequest {
            column_id: column_id.clone(),
            title: title.to_string(),
            issue_type,
        };

        match self.api.create_issue(&self.board_id, &request).await {
            Ok(created) => {
                info!(board = %self.board_id, issue = %created.id, column = %column_id, "issue created");
                self.notifier
                    .notify(Notification::success(format!("Created {}", created.id)).for_item(&created.id));
                let _ = self.refresh().await;
                Ok(created)
            }
            Err(err) => {
                let reason = err.reason();
                warn!(board = %self.board_id, column = %column_id, reason = reason.code(), "issue creation failed");
                self.notifier.notify(Notification::rejected(
                    format!("Could not create \"{}\": {}", title, reason),
                    &reason,
                ));
                let _ = self.refresh().await;
                Err(err.into())
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == *id)
    }

    /// The last server snapshot the state was built from.
    pub fn snapshot(&self) -> &[WorkItem] {
        &self.snapshot
    }

    pub fn item(&self, id: &ItemId) -> Result<&WorkItem, BoardError> {
        self.state
            .get(id)
            .ok_or_else(|| BoardError::ItemNotFound(id.clone()))
    }

    /// Current state-machine phase: `Idle`, or `OptimisticallyApplied`
    /// while any move is in flight.
    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    /// Terminal phase of the most recent gesture or settled move.
    pub fn last_outcome(&self) -> Option<MovePhase> {
        self.last_outcome
    }

    pub fn pending_moves(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, item_id: &ItemId) -> bool {
        self.pending.values().any(|id| id == item_id)
    }

    /// Whether the last refetch failed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::memory::InMemoryBoardApi;
    use crate::board::notify::{BroadcastNotifier, NotificationLevel};
    use tokio::sync::broadcast;

    struct Harness {
        api: Arc<InMemoryBoardApi>,
        notifications: broadcast::Receiver<Notification>,
        reconciler: MoveReconciler,
    }

    async fn harness_with(options: ReconcilerOptions) -> Harness {
        let api = Arc::new(InMemoryBoardApi::sample("demo"));
        let notifier = Arc::new(BroadcastNotifier::default());
        let notifications = notifier.subscribe();
        let mut reconciler = MoveReconciler::new("demo", api.clone(), notifier, options);
        reconciler.load().await.unwrap();
        Harness {
            api,
            notifications,
            reconciler,
        }
    }

    async fn harness() -> Harness {
        harness_with(ReconcilerOptions::default()).await
    }

    fn ids(reconciler: &MoveReconciler, column: &str) -> Vec<String> {
        reconciler
            .state()
            .items(&ColumnId::new(column))
            .iter()
            .map(|i| i.id.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_load_builds_state_with_empty_columns() {
        let h = harness().await;
        let r = &h.reconciler;
        assert_eq!(r.columns().len(), 4);
        assert!(r.state().column(&ColumnId::new("backlog")).is_some());
        assert_eq!(ids(r, "todo"), vec!["SF-1", "SF-2", "SF-3"]);
        assert_eq!(r.snapshot().len(), 6);
        assert!(!r.is_stale());
        assert_eq!(r.phase(), MovePhase::Idle);
    }

    #[tokio::test]
    async fn test_same_column_reorder_confirms() {
        let mut h = harness().await;
        let phase = h.reconciler.drag_end(&Gesture::onto_item("SF-1", "SF-3")).await;
        assert_eq!(phase, MovePhase::Confirmed);
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-2", "SF-3", "SF-1"]);
        assert_eq!(h.api.column_ids("todo"), vec!["SF-2", "SF-3", "SF-1"]);
        assert_eq!(h.reconciler.phase(), MovePhase::Idle);
        assert_eq!(h.reconciler.last_outcome(), Some(MovePhase::Confirmed));
        // load + refetch after confirm
        assert_eq!(h.api.calls().fetch_issues, 2);
    }

    #[tokio::test]
    async fn test_cross_column_move_confirms() {
        let mut h = harness().await;
        let phase = h.reconciler.drag_end(&Gesture::onto_item("SF-6", "SF-2")).await;
        assert_eq!(phase, MovePhase::Confirmed);
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-1", "SF-6", "SF-2", "SF-3"]);
        assert!(h.reconciler.state().items(&ColumnId::new("done")).is_empty());
        let moved = h.reconciler.item(&ItemId::new("SF-6")).unwrap();
        assert_eq!(moved.column_id, ColumnId::new("todo"));
    }

    #[tokio::test]
    async fn test_drop_on_empty_column() {
        let mut h = harness().await;
        let outcome = h.reconciler.begin_move(&Gesture::onto_column("SF-3", "backlog"));
        let GestureOutcome::Applied(ticket) = outcome else {
            panic!("Expected Applied");
        };
        assert_eq!(ticket.request.to_column_id, ColumnId::new("backlog"));
        assert_eq!(ticket.request.to_index, 0);
        assert_eq!(ids(&h.reconciler, "backlog"), vec!["SF-3"]);

        let result = h.api.move_issue(&ticket.request).await;
        let phase = h.reconciler.complete_move(ticket, result).await.unwrap();
        assert_eq!(phase, MovePhase::Confirmed);
        assert_eq!(h.api.column_ids("backlog"), vec!["SF-3"]);
    }

    #[tokio::test]
    async fn test_optimistic_state_visible_before_request() {
        let mut h = harness().await;
        let outcome = h.reconciler.begin_move(&Gesture::onto_item("SF-6", "SF-1"));
        assert!(matches!(outcome, GestureOutcome::Applied(_)));
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-6", "SF-1", "SF-2", "SF-3"]);
        assert_eq!(h.reconciler.phase(), MovePhase::OptimisticallyApplied);
        assert_eq!(h.reconciler.pending_moves(), 1);
        assert_eq!(h.api.calls().move_issue, 0);
        assert_eq!(h.api.column_ids("done"), vec!["SF-6"]);
    }

    #[tokio::test]
    async fn test_wip_rejection_reverts_and_notifies() {
        let mut h = harness().await;
        let before = h.reconciler.state().clone();

        let phase = h.reconciler.drag_end(&Gesture::onto_column("SF-1", "doing")).await;
        assert_eq!(phase, MovePhase::RejectedAndReverted);
        assert_eq!(h.reconciler.state(), &before);
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-1", "SF-2", "SF-3"]);
        assert_eq!(ids(&h.reconciler, "doing"), vec!["SF-4", "SF-5"]);

        let n = h.notifications.try_recv().unwrap();
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.code.as_deref(), Some("WIP_LIMIT_EXCEEDED"));
        assert_eq!(n.item_id, Some(ItemId::new("SF-1")));
        // refetch after rejection
        assert_eq!(h.api.calls().fetch_issues, 2);
        assert_eq!(h.reconciler.phase(), MovePhase::Idle);
    }

    #[tokio::test]
    async fn test_transport_failure_reverts_and_marks_stale() {
        let mut h = harness().await;
        let before = h.reconciler.state().clone();
        h.api.set_offline(true);

        let phase = h.reconciler.drag_end(&Gesture::onto_item("SF-3", "SF-1")).await;
        assert_eq!(phase, MovePhase::RejectedAndReverted);
        assert_eq!(h.reconciler.state(), &before);
        assert!(h.reconciler.is_stale());

        let n = h.notifications.try_recv().unwrap();
        assert_eq!(n.code.as_deref(), Some("TRANSPORT"));

        h.api.set_offline(false);
        h.reconciler.refresh().await.unwrap();
        assert!(!h.reconciler.is_stale());
    }

    #[tokio::test]
    async fn test_aborted_gestures_change_nothing() {
        let mut h = harness().await;
        let before = h.reconciler.state().clone();

        for gesture in [
            Gesture::cancelled("SF-1"),
            Gesture::from_raw("SF-1", ""),
            Gesture::onto_item("SF-1", "SF-404"),
            Gesture::onto_item("SF-1", "SF-1"),
            Gesture::onto_column("SF-404", "done"),
            Gesture::from_raw("SF-1", "column:archive"),
        ] {
            assert_eq!(h.reconciler.drag_end(&gesture).await, MovePhase::Aborted);
        }

        assert_eq!(h.reconciler.state(), &before);
        assert_eq!(h.api.calls().move_issue, 0);
        assert_eq!(h.reconciler.last_outcome(), Some(MovePhase::Aborted));
        assert_eq!(h.reconciler.phase(), MovePhase::Idle);
        assert!(h.notifications.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_one_in_flight_move_per_item() {
        let mut h = harness().await;
        let first = h.reconciler.begin_move(&Gesture::onto_item("SF-1", "SF-3"));
        assert!(matches!(first, GestureOutcome::Applied(_)));

        let second = h.reconciler.begin_move(&Gesture::onto_column("SF-1", "done"));
        assert_eq!(
            second,
            GestureOutcome::Aborted(AbortReason::MoveInFlight(ItemId::new("SF-1")))
        );
        assert_eq!(h.reconciler.pending_moves(), 1);
        assert_eq!(h.reconciler.phase(), MovePhase::OptimisticallyApplied);
    }

    #[tokio::test]
    async fn test_overlapping_moves_refetch_once_all_settle() {
        let mut h = harness().await;
        let GestureOutcome::Applied(a) = h.reconciler.begin_move(&Gesture::onto_item("SF-1", "SF-3")) else {
            panic!("Expected Applied");
        };
        let GestureOutcome::Applied(b) = h.reconciler.begin_move(&Gesture::onto_column("SF-6", "backlog")) else {
            panic!("Expected Applied");
        };
        assert_eq!(h.reconciler.pending_moves(), 2);

        // Responses settle out of order.
        let result_b = h.api.move_issue(&b.request).await;
        let result_a = h.api.move_issue(&a.request).await;

        h.reconciler.complete_move(b, result_b).await.unwrap();
        assert_eq!(h.api.calls().fetch_issues, 1);
        assert_eq!(h.reconciler.phase(), MovePhase::OptimisticallyApplied);

        h.reconciler.complete_move(a, result_a).await.unwrap();
        assert_eq!(h.api.calls().fetch_issues, 2);
        assert_eq!(h.reconciler.phase(), MovePhase::Idle);
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-2", "SF-3", "SF-1"]);
        assert_eq!(ids(&h.reconciler, "backlog"), vec!["SF-6"]);
    }

    #[tokio::test]
    async fn test_complete_unknown_ticket_fails() {
        let mut h = harness().await;
        let GestureOutcome::Applied(ticket) = h.reconciler.begin_move(&Gesture::onto_item("SF-1", "SF-2")) else {
            panic!("Expected Applied");
        };
        let result = h.api.move_issue(&ticket.request).await;
        let replay = ticket.clone();
        h.reconciler.complete_move(ticket, result).await.unwrap();

        let err = h
            .reconciler
            .complete_move(replay, Err(ApiError::Unavailable("late".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::MoveNotPending(_)));
    }

    #[tokio::test]
    async fn test_confirm_without_refetch_adopts_local_state() {
        let mut h = harness_with(ReconcilerOptions {
            refetch_on_confirm: false,
        })
        .await;

        let phase = h.reconciler.drag_end(&Gesture::onto_item("SF-6", "SF-1")).await;
        assert_eq!(phase, MovePhase::Confirmed);
        assert_eq!(h.api.calls().fetch_issues, 1);

        // A later rejection rebuilds from the adopted snapshot, not the load.
        h.api.fail_next_move(409, "CONFLICT", "board changed");
        let phase = h.reconciler.drag_end(&Gesture::onto_item("SF-2", "SF-6")).await;
        assert_eq!(phase, MovePhase::RejectedAndReverted);
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-6", "SF-1", "SF-2", "SF-3"]);
    }

    #[tokio::test]
    async fn test_move_racing_deletion_resyncs() {
        let mut h = harness().await;
        assert!(h.api.remove_issue("SF-2"));

        let phase = h.reconciler.drag_end(&Gesture::onto_column("SF-2", "done")).await;
        assert_eq!(phase, MovePhase::RejectedAndReverted);
        assert!(h.reconciler.item(&ItemId::new("SF-2")).is_err());
        assert_eq!(ids(&h.reconciler, "todo"), vec!["SF-1", "SF-3"]);
        assert_eq!(h.notifications.try_recv().unwrap().code.as_deref(), Some("NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_create_issue_refetches() {
        let mut h = harness().await;
        let created = h
            .reconciler
            .create_issue(&ColumnId::new("backlog"), "Approval workflow", IssueType::Epic)
            .await
            .unwrap();
        assert_eq!(ids(&h.reconciler, "backlog"), vec![created.id.to_string()]);
        assert_eq!(h.notifications.try_recv().unwrap().level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_create_issue_failure_notifies() {
        let mut h = harness().await;
        let err = h
            .reconciler
            .create_issue(&ColumnId::new("doing"), "Overflow", IssueType::Task)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Api(ApiError::Rejected { .. })));
        let n = h.notifications.try_recv().unwrap();
        assert_eq!(n.code.as_deref(), Some("WIP_LIMIT_EXCEEDED"));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state_and_notifies() {
        let mut h = harness().await;
        let before = h.reconciler.state().clone();
        h.api.set_offline(true);

        assert!(h.reconciler.refresh().await.is_err());
        assert!(h.reconciler.is_stale());
        assert_eq!(h.reconciler.state(), &before);
        assert_eq!(h.notifications.try_recv().unwrap().code.as_deref(), Some("TRANSPORT"));
    }

    #[tokio::test]
    async fn test_switch_board_to_unknown_board() {
        let mut h = harness().await;
        let err = h.reconciler.switch_board("elsewhere").await.unwrap_err();
        assert!(matches!(err, BoardError::Api(_)));
        assert_eq!(h.reconciler.board_id(), "elsewhere");
        assert!(h.reconciler.state().is_empty());
        assert_eq!(h.reconciler.pending_moves(), 0);
    }

    #[test]
    fn test_move_phase_strings() {
        assert_eq!(MovePhase::RejectedAndReverted.to_string(), "rejected_and_reverted");
        assert!(MovePhase::Confirmed.is_terminal());
        assert!(!MovePhase::OptimisticallyApplied.is_terminal());
    }
}
