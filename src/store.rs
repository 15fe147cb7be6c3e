//! Board state store: the single writer of the board.
//!
//! Every mutation runs under one async mutex that is held across the save,
//! so overlapping calls are applied one after another instead of
//! interleaving. A mutation whose save fails is rolled back, which keeps
//! the in-memory board equal to the last board that reached storage.

use crate::error::{BoardError, PersistenceError, Result};
use crate::kanban_board::KanbanBoard;
use crate::notify::{Appearance, NoAppearance, NoticeKind, NotificationSink, TracingSink};
use crate::persistence::PersistenceGateway;
use crate::snapshot::{Column, Snapshot};
use crate::task::{NewTask, Task, TaskUpdate};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct StoreState {
    board: KanbanBoard,
    dark_mode: bool,
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        self.board.to_snapshot(self.dark_mode)
    }
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
    pub dark_mode: bool,
    pub error: Option<String>,
    pub progress: u8,
}

/// Outcome of a mutation closure: the value to hand back and whether the
/// board changed and needs saving.
struct Applied<T> {
    value: T,
    changed: bool,
}

impl<T> Applied<T> {
    fn changed(value: T) -> Self {
        Self {
            value,
            changed: true,
        }
    }

    fn unchanged(value: T) -> Self {
        Self {
            value,
            changed: false,
        }
    }
}

/// Sets the loading flag for as long as it lives.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct BoardStore {
    state: Mutex<StoreState>,
    gateway: Arc<dyn PersistenceGateway>,
    sink: Arc<dyn NotificationSink>,
    appearance: Arc<dyn Appearance>,
    loading: AtomicBool,
    error: std::sync::Mutex<Option<String>>,
}

impl BoardStore {
    /// Store with the seeded empty board. Call [`initialize`](Self::initialize)
    /// to pick up what was saved before.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            gateway,
            sink: Arc::new(TracingSink),
            appearance: Arc::new(NoAppearance),
            loading: AtomicBool::new(false),
            error: std::sync::Mutex::new(None),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_appearance(mut self, appearance: Arc<dyn Appearance>) -> Self {
        self.appearance = appearance;
        self
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the saved board, if any. A failed read keeps the default board
    /// and is reported, but does not fail the call.
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;
        let _loading = LoadingGuard::start(&self.loading);
        self.clear_error();

        match self.gateway.try_load().await {
            Ok(Some(snapshot)) => {
                state.board = KanbanBoard::from_snapshot(&snapshot);
                state.dark_mode = snapshot.dark_mode;
                tracing::debug!(tasks = state.board.total_tasks(), dark_mode = state.dark_mode, "board restored");
            }
            Ok(None) => tracing::debug!("no saved board, starting empty"),
            Err(e) => {
                tracing::warn!("failed to load board: {}", e);
                let err = BoardError::from(e);
                self.set_error(err.to_string());
                self.sink
                    .notify(NoticeKind::Error, &format!("Could not load board: {}", err));
            }
        }

        self.appearance.apply_dark_mode(state.dark_mode);
    }

    pub async fn add_task(&self, data: NewTask) -> Result<Task> {
        self.mutate("Task added", "Could not add task", |state| {
            state.board.add_task(data, Utc::now()).map(Applied::changed)
        })
        .await
    }

    pub async fn update_task(&self, task_id: &str, updates: TaskUpdate) -> Result<Task> {
        self.mutate("Task updated", "Could not update task", |state| {
            state
                .board
                .update_task(task_id, &updates)
                .map(Applied::changed)
        })
        .await
    }

    pub async fn move_task(&self, task_id: &str, from_column: &str, to_column: &str) -> Result<Task> {
        self.mutate("Task moved", "Could not move task", |state| {
            state
                .board
                .move_task(task_id, from_column, to_column)
                .map(Applied::changed)
        })
        .await
    }

    /// Remove a task. Unknown ids succeed without touching storage.
    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.mutate("Task deleted", "Could not delete task", |state| {
            Ok(if state.board.delete_task(task_id) {
                Applied::changed(())
            } else {
                Applied::unchanged(())
            })
        })
        .await
    }

    /// Flip dark mode and wait for the flag to be saved. Spawn the returned
    /// future to fire and forget.
    pub async fn toggle_dark_mode(&self) -> Result<bool> {
        self.mutate_then(
            "Theme changed",
            "Could not change theme",
            |state| {
                state.dark_mode = !state.dark_mode;
                Ok(Applied::changed(state.dark_mode))
            },
            |enabled| self.appearance.apply_dark_mode(*enabled),
        )
        .await
    }

    /// Erase the stored board and go back to the seeded empty board.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let _loading = LoadingGuard::start(&self.loading);
        self.clear_error();

        if !self.gateway.clear().await {
            let err = BoardError::from(PersistenceError::unavailable("stored board could not be cleared"));
            return Err(self.fail("Could not reset board", err));
        }
        *state = StoreState::default();
        self.appearance.apply_dark_mode(false);
        self.sink.notify(NoticeKind::Success, "Board reset");
        Ok(())
    }

    async fn mutate<T, F>(&self, success: &str, failure: &str, apply: F) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<Applied<T>>,
    {
        self.mutate_then(success, failure, apply, |_| {}).await
    }

    /// Run one mutation: apply it, save when something changed, roll back
    /// if the save fails, and report the outcome. `commit` runs after a
    /// successful save while the state lock is still held. Nothing is
    /// reported when the mutation changed nothing.
    async fn mutate_then<T, F, C>(&self, success: &str, failure: &str, apply: F, commit: C) -> Result<T>
    where
        F: FnOnce(&mut StoreState) -> Result<Applied<T>>,
        C: FnOnce(&T),
    {
        let mut state = self.state.lock().await;
        let _loading = LoadingGuard::start(&self.loading);
        self.clear_error();

        let before = state.clone();
        let applied = match apply(&mut *state) {
            Ok(applied) => applied,
            Err(e) => {
                *state = before;
                return Err(self.fail(failure, e));
            }
        };

        if !applied.changed {
            return Ok(applied.value);
        }
        if let Err(e) = self.gateway.save(&state.snapshot()).await {
            *state = before;
            return Err(self.fail(failure, e.into()));
        }

        commit(&applied.value);
        self.sink.notify(NoticeKind::Success, success);
        Ok(applied.value)
    }

    fn fail(&self, context: &str, err: BoardError) -> BoardError {
        tracing::error!("{}: {}", context, err);
        self.set_error(err.to_string());
        self.sink
            .notify(NoticeKind::Error, &format!("{}: {}", context, err));
        err
    }

    // =========================================================================
    // Error field
    // =========================================================================

    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn clear_error(&self) {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn columns(&self) -> Vec<Column> {
        self.state.lock().await.board.columns()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.board.tasks().to_vec()
    }

    pub async fn dark_mode(&self) -> bool {
        self.state.lock().await.dark_mode
    }

    pub async fn column_by_id(&self, column_id: &str) -> Option<Column> {
        self.state.lock().await.board.column(column_id)
    }

    pub async fn tasks_by_column(&self, column_id: &str) -> Vec<Task> {
        self.state
            .lock()
            .await
            .board
            .tasks_in_column(column_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn task_by_id(&self, task_id: &str) -> Option<Task> {
        self.state.lock().await.board.task(task_id).cloned()
    }

    pub async fn total_tasks(&self) -> usize {
        self.state.lock().await.board.total_tasks()
    }

    pub async fn completed_tasks(&self) -> usize {
        self.state.lock().await.board.completed_tasks()
    }

    pub async fn progress_percentage(&self) -> u8 {
        self.state.lock().await.board.progress_percentage()
    }

    /// The snapshot the next save would write.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot()
    }

    /// Check that the flat task list and the columns agree.
    pub async fn verify(&self) -> std::result::Result<(), String> {
        self.state.lock().await.board.verify()
    }

    pub async fn view(&self) -> BoardView {
        let state = self.state.lock().await;
        BoardView {
            columns: state.board.columns(),
            tasks: state.board.tasks().to_vec(),
            dark_mode: state.dark_mode,
            error: self.error(),
            progress: state.board.progress_percentage(),
        }
    }
}
