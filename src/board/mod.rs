//! StratFlow board core: a per-column cache of work items and the
//! reconciler that moves items around it optimistically.
//!
//! ## Module Map
//!
//! ```text
//!  drag end (item id, droppable id)
//!        │
//!        v
//!  gesture.rs     DropTarget / Gesture ──resolve──> Destination
//!        │
//!        v
//!  reconciler.rs  MoveReconciler
//!        │   ├─ state.rs   BoardState::apply_local_move   (sync, optimistic)
//!        │   ├─ client.rs  BoardApi::move_issue           (async, absolute)
//!        │   └─ notify.rs  Notifier                       (on failure)
//!        │
//!        └── on rejection: BoardState::rebuild(last snapshot), then refetch
//! ```
//!
//! ## Supporting Modules
//!
//! | Module   | Responsibility                                             |
//! |----------|------------------------------------------------------------|
//! | `models` | `WorkItem`, `Column`, id newtypes, wire request bodies     |
//! | `client` | `BoardApi` trait + `HttpBoardClient` (reqwest)             |
//! | `memory` | `InMemoryBoardApi`, a server stand-in enforcing WIP limits |

pub mod client;
pub mod gesture;
pub mod memory;
pub mod models;
pub mod notify;
pub mod reconciler;
pub mod state;

pub use client::{BoardApi, HttpBoardClient};
pub use gesture::{AbortReason, Destination, DropTarget, Gesture, resolve};
pub use memory::InMemoryBoardApi;
pub use models::{Column, ColumnId, IssueType, ItemId, WorkItem};
pub use notify::{Notification, Notifier};
pub use reconciler::{GestureOutcome, MovePhase, MoveReconciler, MoveTicket, ReconcilerOptions};
pub use state::BoardState;
