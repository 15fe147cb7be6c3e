//! In-memory board model.
//!
//! Tasks are owned once, by the flat list, in creation order. Columns only
//! keep the ordered ids of the tasks they hold, so a task can never drift
//! out of sync with a copy of itself. Every mutation keeps the invariant
//! that each task id sits in exactly one column, the one its `column_id`
//! names.

use crate::error::{BoardError, Result};
use crate::snapshot::{Column, Snapshot};
use crate::task::{IdGenerator, NewTask, Task, TaskUpdate, DEFAULT_COLUMN};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// The fixed columns, in display order.
pub const SEEDED_COLUMNS: [(&str, &str); 3] = [
    ("todo", "A fazer"),
    ("in-progress", "Em desenvolvimento"),
    ("done", "Concluído"),
];

/// Column whose tasks count as completed
pub const DONE_COLUMN: &str = "done";

#[derive(Debug, Clone, PartialEq)]
struct ColumnSlot {
    id: String,
    title: String,
    task_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KanbanBoard {
    columns: Vec<ColumnSlot>,
    tasks: Vec<Task>,
    ids: IdGenerator,
}

impl Default for KanbanBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self {
            columns: SEEDED_COLUMNS
                .iter()
                .map(|(id, title)| ColumnSlot {
                    id: id.to_string(),
                    title: title.to_string(),
                    task_ids: Vec::new(),
                })
                .collect(),
            tasks: Vec::new(),
            ids: IdGenerator::default(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.id.as_str())
    }

    pub fn has_column(&self, id: &str) -> bool {
        self.columns.iter().any(|c| c.id == id)
    }

    /// Tasks of a column in column order; empty for unknown columns.
    pub fn tasks_in_column(&self, column_id: &str) -> Vec<&Task> {
        self.columns
            .iter()
            .find(|c| c.id == column_id)
            .map(|c| c.task_ids.iter().filter_map(|id| self.task(id)).collect())
            .unwrap_or_default()
    }

    pub fn column(&self, column_id: &str) -> Option<Column> {
        self.columns
            .iter()
            .find(|c| c.id == column_id)
            .map(|c| self.resolve(c))
    }

    /// All columns with their tasks resolved, in display order.
    pub fn columns(&self) -> Vec<Column> {
        self.columns.iter().map(|c| self.resolve(c)).collect()
    }

    fn resolve(&self, slot: &ColumnSlot) -> Column {
        Column::new(
            slot.id.clone(),
            slot.title.clone(),
            slot.task_ids
                .iter()
                .filter_map(|id| self.task(id).cloned())
                .collect(),
        )
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks_in_column(DONE_COLUMN).len()
    }

    /// Share of tasks in the done column, rounded to a whole percent.
    pub fn progress_percentage(&self) -> u8 {
        let total = self.total_tasks();
        if total == 0 {
            return 0;
        }
        (self.completed_tasks() as f64 * 100.0 / total as f64).round() as u8
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn add_task(&mut self, data: NewTask, now: DateTime<Utc>) -> Result<Task> {
        if data.title.trim().is_empty() {
            return Err(BoardError::operation("task title is required"));
        }
        let column_id = data.column().to_string();
        if !self.has_column(&column_id) {
            return Err(BoardError::ColumnNotFound { id: column_id });
        }

        let id = self
            .ids
            .next(now)
            .ok_or_else(|| BoardError::operation("task id space exhausted"))?;
        let task = Task {
            id,
            title: data.title,
            description: data.description,
            priority: data.priority.unwrap_or_default(),
            column_id: column_id.clone(),
            created_at: now,
            voice_transcript: data.voice_transcript,
        };

        self.tasks.push(task.clone());
        self.slot_mut(&column_id)?.task_ids.push(task.id.clone());
        Ok(task)
    }

    pub fn update_task(&mut self, id: &str, updates: &TaskUpdate) -> Result<Task> {
        if updates.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(BoardError::operation("task title is required"));
        }
        if let Some(column_id) = &updates.column_id {
            if !self.has_column(column_id) {
                return Err(BoardError::ColumnNotFound {
                    id: column_id.clone(),
                });
            }
        }

        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::TaskNotFound { id: id.to_string() })?;
        let previous_column = task.column_id.clone();
        task.merge(updates);
        let updated = task.clone();

        if updated.column_id != previous_column {
            self.detach(id);
            self.slot_mut(&updated.column_id)?
                .task_ids
                .push(id.to_string());
        }
        Ok(updated)
    }

    /// Move a task to the tail of `to`. The task is pulled out of whatever
    /// column holds it, so a stale `from` cannot leave a duplicate behind.
    pub fn move_task(&mut self, id: &str, from: &str, to: &str) -> Result<Task> {
        if !self.has_column(to) {
            return Err(BoardError::ColumnNotFound { id: to.to_string() });
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::TaskNotFound { id: id.to_string() })?;
        if task.column_id != from {
            tracing::debug!(task = id, from, actual = %task.column_id, "move source differs from task column");
        }
        task.column_id = to.to_string();
        let moved = task.clone();

        self.detach(id);
        self.slot_mut(to)?.task_ids.push(id.to_string());
        Ok(moved)
    }

    /// Remove a task everywhere. Returns false when it was not on the board.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed_from_columns = self.detach(id);
        before != self.tasks.len() || removed_from_columns
    }

    fn detach(&mut self, id: &str) -> bool {
        let mut removed = false;
        for column in &mut self.columns {
            let before = column.task_ids.len();
            column.task_ids.retain(|t| t != id);
            removed |= before != column.task_ids.len();
        }
        removed
    }

    fn slot_mut(&mut self, column_id: &str) -> Result<&mut ColumnSlot> {
        self.columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| BoardError::ColumnNotFound {
                id: column_id.to_string(),
            })
    }

    /// Check that the flat list and the columns agree.
    pub fn verify(&self) -> std::result::Result<(), String> {
        let mut placed = HashSet::new();
        for column in &self.columns {
            for id in &column.task_ids {
                if !placed.insert(id.as_str()) {
                    return Err(format!("task {} appears in more than one slot", id));
                }
                match self.task(id) {
                    None => return Err(format!("column {} holds unknown task {}", column.id, id)),
                    Some(task) if task.column_id != column.id => {
                        return Err(format!(
                            "task {} is in column {} but names {}",
                            id, column.id, task.column_id
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        if let Some(orphan) = self.tasks.iter().find(|t| !placed.contains(t.id.as_str())) {
            return Err(format!("task {} is in no column", orphan.id));
        }
        if placed.len() != self.tasks.len() {
            return Err("duplicate task ids in flat list".to_string());
        }
        Ok(())
    }

    // =========================================================================
    // Snapshot conversion
    // =========================================================================

    pub fn to_snapshot(&self, dark_mode: bool) -> Snapshot {
        Snapshot::new(self.columns(), self.tasks.clone(), dark_mode)
    }

    /// Rebuild a board from a stored snapshot, repairing whatever layout the
    /// record has: duplicated column copies, legacy id lists, tasks present
    /// only inside a column, or tasks pointing at unknown columns.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut board = Self::new();
        let mut seen = HashSet::new();

        for task in &snapshot.tasks {
            if seen.insert(task.id.clone()) {
                board.tasks.push(task.clone());
            }
        }

        // Copies living only inside a column are adopted into that column.
        for column in &snapshot.columns {
            if !board.has_column(&column.id) {
                tracing::debug!(column = %column.id, "ignoring unknown stored column");
                continue;
            }
            for copy in &column.tasks {
                if seen.insert(copy.id.clone()) {
                    let mut adopted = copy.clone();
                    adopted.column_id = column.id.clone();
                    board.tasks.push(adopted);
                }
            }
        }

        let known: HashSet<String> = board.column_ids().map(String::from).collect();
        for task in &mut board.tasks {
            if !known.contains(&task.column_id) {
                tracing::warn!(task = %task.id, column = %task.column_id, "task names unknown column, placing in {}", DEFAULT_COLUMN);
                task.column_id = DEFAULT_COLUMN.to_string();
            }
            board.ids.observe(&task.id);
        }

        let mut placed: HashSet<String> = HashSet::new();
        for slot_index in 0..board.columns.len() {
            let slot_id = board.columns[slot_index].id.clone();
            let stored_order: Vec<&String> = snapshot
                .columns
                .iter()
                .filter(|c| c.id == slot_id)
                .flat_map(|c| c.tasks.iter().map(|t| &t.id).chain(c.legacy_task_ids.iter()))
                .collect();
            let mut order = Vec::new();
            for id in stored_order {
                let belongs = board
                    .task(id)
                    .map(|t| t.column_id == slot_id)
                    .unwrap_or(false);
                if belongs && placed.insert(id.clone()) {
                    order.push(id.clone());
                }
            }
            board.columns[slot_index].task_ids = order;
        }

        let unplaced: Vec<(String, String)> = board
            .tasks
            .iter()
            .filter(|t| !placed.contains(&t.id))
            .map(|t| (t.id.clone(), t.column_id.clone()))
            .collect();
        for (id, column_id) in unplaced {
            if let Some(slot) = board.columns.iter_mut().find(|c| c.id == column_id) {
                slot.task_ids.push(id);
            }
        }

        board
    }
}
