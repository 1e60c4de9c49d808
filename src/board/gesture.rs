//! Drop-target resolution.
//!
//! A drag library reports the end of a gesture as two raw ids: the dragged
//! item and whatever droppable it was released over. [`resolve`] turns that
//! into an absolute `(column, index)` destination using only the gesture and
//! the current [`BoardState`]; nothing is read from ambient drag context.

use std::fmt;

use super::models::{ColumnId, ItemId};
use super::state::BoardState;

/// Prefix that marks a droppable id as a whole-column drop zone.
pub const COLUMN_DROP_PREFIX: &str = "column:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Released over another item: take its slot.
    Item(ItemId),
    /// Released over a column's drop zone: append at the end.
    Column(ColumnId),
}

impl DropTarget {
    /// Parse a raw droppable id. An empty id means the gesture ended outside
    /// any droppable.
    pub fn from_droppable_id(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix(COLUMN_DROP_PREFIX) {
            Some("") => None,
            Some(column) => Some(Self::Column(ColumnId::new(column))),
            None => Some(Self::Item(ItemId::new(raw))),
        }
    }

    pub fn droppable_id(&self) -> String {
        match self {
            Self::Item(id) => id.to_string(),
            Self::Column(id) => format!("{}{}", COLUMN_DROP_PREFIX, id),
        }
    }
}

/// One finished drag: what was dragged, where it was released, and the
/// source column if the drag library knew it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub item_id: ItemId,
    pub target: Option<DropTarget>,
    pub source_column: Option<ColumnId>,
}

impl Gesture {
    pub fn new(item_id: impl Into<String>, target: Option<DropTarget>) -> Self {
        Self {
            item_id: ItemId::new(item_id),
            target,
            source_column: None,
        }
    }

    /// Build a gesture from the raw ids a drag library hands back.
    pub fn from_raw(item_id: &str, droppable_id: &str) -> Self {
        Self::new(item_id, DropTarget::from_droppable_id(droppable_id))
    }

    pub fn onto_item(item_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(item_id, Some(DropTarget::Item(ItemId::new(target))))
    }

    pub fn onto_column(item_id: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(item_id, Some(DropTarget::Column(ColumnId::new(column))))
    }

    /// Released outside every droppable.
    pub fn cancelled(item_id: impl Into<String>) -> Self {
        Self::new(item_id, None)
    }

    pub fn with_source_column(mut self, column: impl Into<String>) -> Self {
        self.source_column = Some(ColumnId::new(column));
        self
    }
}

/// Where a resolved gesture puts the dragged item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub column_id: ColumnId,
    pub index: usize,
}

/// A gesture that resolved to a concrete move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMove {
    pub item_id: ItemId,
    pub source_column: ColumnId,
    pub destination: Destination,
}

impl ResolvedMove {
    pub fn is_cross_column(&self) -> bool {
        self.source_column != self.destination.column_id
    }
}

/// Why a gesture produced no move. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// Released outside any droppable.
    NoTarget,
    /// Released over an item that is no longer on the board.
    StaleTarget(ItemId),
    /// Released over a column zone the board has no lane for.
    UnknownColumn(ColumnId),
    /// The dragged item is not on the board.
    UnknownItem(ItemId),
    /// Released over the dragged item itself.
    DropOnSelf,
    /// The dragged item still has a move request in flight.
    MoveInFlight(ItemId),
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoTarget => "no_target",
            Self::StaleTarget(_) => "stale_target",
            Self::UnknownColumn(_) => "unknown_column",
            Self::UnknownItem(_) => "unknown_item",
            Self::DropOnSelf => "drop_on_self",
            Self::MoveInFlight(_) => "move_in_flight",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTarget => f.write_str("dropped outside the board"),
            Self::StaleTarget(id) => write!(f, "drop target {} is no longer on the board", id),
            Self::UnknownColumn(id) => write!(f, "column {} is not on the board", id),
            Self::UnknownItem(id) => write!(f, "item {} is not on the board", id),
            Self::DropOnSelf => f.write_str("dropped onto itself"),
            Self::MoveInFlight(id) => write!(f, "item {} is already being moved", id),
        }
    }
}

/// Resolve a gesture to a destination, or nothing if it should be dropped.
pub fn resolve(gesture: &Gesture, state: &BoardState) -> Option<Destination> {
    try_resolve(gesture, state).ok().map(|m| m.destination)
}

/// Like [`resolve`], but says why a gesture was discarded.
///
/// The destination index is the effective one: where the item ends up once
/// `apply_local_move` has run. Dropping onto an item takes that item's slot;
/// dropping onto a column appends after the last item that will remain there.
/// For a drop onto the item's own column zone that is `len - 1`, not `len`.
///
/// A column zone only resolves when the state has a lane for it, so build the
/// state with [`BoardState::rebuild_with_columns`] to make empty columns
/// droppable.
pub fn try_resolve(gesture: &Gesture, state: &BoardState) -> Result<ResolvedMove, AbortReason> {
    let target = gesture.target.as_ref().ok_or(AbortReason::NoTarget)?;
    let source_column = source_column(gesture, state)
        .ok_or_else(|| AbortReason::UnknownItem(gesture.item_id.clone()))?;

    let destination = match target {
        DropTarget::Column(column_id) => {
            if state.column(column_id).is_none() {
                return Err(AbortReason::UnknownColumn(column_id.clone()));
            }
            let mut index = state.column_len(column_id);
            if *column_id == source_column {
                index = index.saturating_sub(1);
            }
            Destination {
                column_id: column_id.clone(),
                index,
            }
        }
        DropTarget::Item(target_id) => {
            if *target_id == gesture.item_id {
                return Err(AbortReason::DropOnSelf);
            }
            let (column_id, index) = state
                .locate(target_id)
                .ok_or_else(|| AbortReason::StaleTarget(target_id.clone()))?;
            Destination {
                column_id: column_id.clone(),
                index,
            }
        }
    };

    Ok(ResolvedMove {
        item_id: gesture.item_id.clone(),
        source_column,
        destination,
    })
}

/// The gesture's source column when it agrees with the board, else a scan.
fn source_column(gesture: &Gesture, state: &BoardState) -> Option<ColumnId> {
    if let Some(hint) = &gesture.source_column
        && state.items(hint).iter().any(|item| item.id == gesture.item_id)
    {
        return Some(hint.clone());
    }
    state.locate(&gesture.item_id).map(|(column, _)| column.clone())
}
