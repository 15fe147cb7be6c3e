//! Kanban task board: three fixed columns, tasks that move between them,
//! a dark-mode flag, and the whole board saved as one snapshot record.

pub mod config;
pub mod error;
pub mod kanban_board;
pub mod notify;
pub mod persistence;
pub mod snapshot;
pub mod store;
pub mod task;
pub mod ui;

pub use error::{BoardError, PersistenceError, Result};
pub use kanban_board::KanbanBoard;
pub use notify::{Appearance, Notice, NoticeKind, NoticeLog, NotificationSink, SharedTheme};
pub use persistence::{FileGateway, MemoryGateway, PersistenceGateway};
pub use snapshot::{Column, Snapshot, STORAGE_KEY};
pub use store::{BoardStore, BoardView};
pub use task::{NewTask, Priority, Task, TaskUpdate};
