//! An in-process stand-in for the board server.
//!
//! Holds one board behind a mutex and applies moves the way the server does:
//! absolute positions, WIP limits enforced on entry into a column, orders
//! renumbered after every change. Used by tests and the `demo` command.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::client::BoardApi;
use super::models::{Column, ColumnId, CreateIssueRequest, IssueType, MoveIssueRequest, WorkItem};
use crate::errors::ApiError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_columns: usize,
    pub fetch_issues: usize,
    pub move_issue: usize,
    pub create_issue: usize,
}

struct ScriptedFailure {
    status: u16,
    code: String,
    message: String,
}

struct Inner {
    board_id: String,
    columns: Vec<Column>,
    items: Vec<WorkItem>,
    next_id: u64,
    offline: bool,
    move_failures: VecDeque<ScriptedFailure>,
    calls: CallCounts,
}

pub struct InMemoryBoardApi {
    inner: Mutex<Inner>,
}

impl InMemoryBoardApi {
    pub fn new(board_id: impl Into<String>, mut columns: Vec<Column>, items: Vec<WorkItem>) -> Self {
        columns.sort_by_key(|c| c.position);
        let next_id = items.len() as u64 + 1;
        Self {
            inner: Mutex::new(Inner {
                board_id: board_id.into(),
                columns,
                items,
                next_id,
                offline: false,
                move_failures: VecDeque::new(),
                calls: CallCounts::default(),
            }),
        }
    }

    /// A small board: backlog, todo, doing (WIP limit 2), done.
    pub fn sample(board_id: impl Into<String>) -> Self {
        let columns = vec![
            Column::new("backlog", "Backlog", 0),
            Column::new("todo", "To Do", 1),
            Column::new("doing", "In Progress", 2).with_wip_limit(2),
            Column::new("done", "Done", 3),
        ];
        let mut items = vec![
            WorkItem::new("SF-1", "Draft quote template", "todo", 0),
            WorkItem::new("SF-2", "Tiered discount rules", "todo", 1),
            WorkItem::new("SF-3", "Portal password reset", "todo", 2),
            WorkItem::new("SF-4", "Sprint burndown chart", "doing", 0),
            WorkItem::new("SF-5", "CSV export for quotes", "doing", 1),
            WorkItem::new("SF-6", "Release notes page", "done", 0),
        ];
        items[1].issue_type = Some(IssueType::Story);
        items[2].issue_type = Some(IssueType::Bug);
        Self::new(board_id, columns, items)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, ApiError> {
        self.inner
            .lock()
            .map_err(|_| ApiError::Unavailable("board state lock poisoned".to_string()))
    }

    /// While offline every call fails as if the server were unreachable.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.offline = offline;
        }
    }

    /// Make the next move request fail with the given status and code,
    /// without touching the board.
    pub fn fail_next_move(&self, status: u16, code: &str, message: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.move_failures.push_back(ScriptedFailure {
                status,
                code: code.to_string(),
                message: message.to_string(),
            });
        }
    }

    /// Delete an issue behind the client's back.
    pub fn remove_issue(&self, id: &str) -> bool {
        match self.inner.lock() {
            Ok(mut inner) => {
                let before = inner.items.len();
                inner.items.retain(|item| item.id.as_str() != id);
                inner.items.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn calls(&self) -> CallCounts {
        self.inner.lock().map(|inner| inner.calls).unwrap_or_default()
    }

    /// Item ids of a column in server order.
    pub fn column_ids(&self, column: &str) -> Vec<String> {
        let Ok(inner) = self.inner.lock() else {
            return Vec::new();
        };
        let mut items: Vec<&WorkItem> = inner
            .items
            .iter()
            .filter(|item| item.column_id.as_str() == column)
            .collect();
        items.sort_by(|a, b| a.order.total_cmp(&b.order));
        items.iter().map(|item| item.id.to_string()).collect()
    }
}

impl Inner {
    fn check_reachable(&self) -> Result<(), ApiError> {
        if self.offline {
            return Err(ApiError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_board(&self, board_id: &str) -> Result<(), ApiError> {
        if self.board_id != board_id {
            return Err(ApiError::rejected(
                404,
                "NOT_FOUND",
                format!("Board {} not found", board_id),
            ));
        }
        Ok(())
    }

    fn column(&self, id: &ColumnId) -> Result<&Column, ApiError> {
        self.columns.iter().find(|c| c.id == *id).ok_or_else(|| {
            ApiError::rejected(400, "INVALID_COLUMN", format!("Column {} does not exist", id))
        })
    }

    fn count_in(&self, column: &ColumnId) -> usize {
        self.items.iter().filter(|item| item.column_id == *column).count()
    }

    fn check_capacity(&self, column: &Column) -> Result<(), ApiError> {
        let count = self.count_in(&column.id);
        if column.is_at_capacity(count) {
            return Err(ApiError::rejected(
                422,
                "WIP_LIMIT_EXCEEDED",
                format!(
                    "Column {} is at its WIP limit of {}",
                    column.name,
                    column.wip_limit.unwrap_or_default()
                ),
            ));
        }
        Ok(())
    }

    /// Pull a column's items out of the pool, sorted by order.
    fn take_column(&mut self, column: &ColumnId) -> Vec<WorkItem> {
        let (mut taken, rest): (Vec<WorkItem>, Vec<WorkItem>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.column_id == *column);
        self.items = rest;
        taken.sort_by(|a, b| a.order.total_cmp(&b.order));
        taken
    }

    fn put_column(&mut self, mut seq: Vec<WorkItem>) {
        for (position, item) in seq.iter_mut().enumerate() {
            item.order = position as f64;
        }
        self.items.extend(seq);
    }

    fn move_issue(&mut self, request: &MoveIssueRequest) -> Result<WorkItem, ApiError> {
        let pos = self
            .items
            .iter()
            .position(|item| item.id == request.issue_id)
            .ok_or_else(|| {
                ApiError::rejected(404, "NOT_FOUND", format!("Issue {} not found", request.issue_id))
            })?;
        let dest = self.column(&request.to_column_id)?.clone();
        let source = self.items[pos].column_id.clone();
        if source != dest.id {
            self.check_capacity(&dest)?;
        }

        let mut item = self.items.remove(pos);
        let source_seq = self.take_column(&source);
        self.put_column(source_seq);

        let mut dest_seq = self.take_column(&dest.id);
        let at = request.to_index.min(dest_seq.len());
        item.column_id = dest.id.clone();
        dest_seq.insert(at, item);
        self.put_column(dest_seq);

        self.items
            .iter()
            .find(|item| item.id == request.issue_id)
            .cloned()
            .ok_or_else(|| ApiError::Unavailable("moved issue vanished".to_string()))
    }

    fn create_issue(&mut self, request: &CreateIssueRequest) -> Result<WorkItem, ApiError> {
        let column = self.column(&request.column_id)?.clone();
        self.check_capacity(&column)?;

        let order = self
            .items
            .iter()
            .filter(|item| item.column_id == column.id)
            .map(|item| item.order)
            .max_by(f64::total_cmp)
            .map_or(0.0, |max| max.floor() + 1.0);
        let id = format!("SF-{}", self.next_id);
        self.next_id += 1;

        let mut item = WorkItem::new(id, request.title.clone(), column.id.as_str(), order);
        item.issue_type = Some(request.issue_type);
        self.items.push(item.clone());
        Ok(item)
    }
}

#[async_trait]
impl BoardApi for InMemoryBoardApi {
    async fn fetch_columns(&self, board_id: &str) -> Result<Vec<Column>, ApiError> {
        let mut inner = self.lock()?;
        inner.calls.fetch_columns += 1;
        inner.check_reachable()?;
        inner.check_board(board_id)?;
        Ok(inner.columns.clone())
    }

    async fn fetch_issues(&self, board_id: &str) -> Result<Vec<WorkItem>, ApiError> {
        let mut inner = self.lock()?;
        inner.calls.fetch_issues += 1;
        inner.check_reachable()?;
        inner.check_board(board_id)?;
        Ok(inner.items.clone())
    }

    async fn move_issue(&self, request: &MoveIssueRequest) -> Result<WorkItem, ApiError> {
        let mut inner = self.lock()?;
        inner.calls.move_issue += 1;
        inner.check_reachable()?;
        if let Some(failure) = inner.move_failures.pop_front() {
            return Err(ApiError::rejected(failure.status, &failure.code, failure.message));
        }
        let moved = inner.move_issue(request)?;
        debug!(issue = %moved.id, column = %moved.column_id, order = moved.order, "in-memory move applied");
        Ok(moved)
    }

    async fn create_issue(
        &self,
        board_id: &str,
        request: &CreateIssueRequest,
    ) -> Result<WorkItem, ApiError> {
        let mut inner = self.lock()?;
        inner.calls.create_issue += 1;
        inner.check_reachable()?;
        inner.check_board(board_id)?;
        inner.create_issue(request)
    }
}
