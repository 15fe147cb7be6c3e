//! The persisted form of a board.
//!
//! Only the fields below survive a save/load cycle; anything else found in a
//! stored record is dropped when it is read back.

use crate::task::Task;
use serde::{Deserialize, Serialize};

/// Fixed key the board is stored under
pub const STORAGE_KEY: &str = "kanbanData";

/// Current schema version of the stored record
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Id-only layout written by older builds; read for ordering, never written.
    #[serde(default, rename = "taskIds", skip_serializing)]
    pub(crate) legacy_task_ids: Vec<String>,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            tasks,
            legacy_task_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dark_mode: bool,
}

fn legacy_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn new(columns: Vec<Column>, tasks: Vec<Task>, dark_mode: bool) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            columns,
            tasks,
            dark_mode,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// The snapshot as it will read back from storage.
    pub fn normalized(&self) -> Self {
        let mut clean = self.clone();
        for column in &mut clean.columns {
            column.legacy_task_ids.clear();
        }
        clean
    }
}
