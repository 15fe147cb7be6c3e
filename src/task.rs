use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column new tasks land in when none is given
pub const DEFAULT_COLUMN: &str = "todo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "m" | "" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_column")]
    pub column_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_transcript: Option<String>,
}

fn default_column() -> String {
    DEFAULT_COLUMN.to_string()
}

impl Task {
    /// Apply a partial update; fields left as `None` are kept.
    pub fn merge(&mut self, updates: &TaskUpdate) {
        if let Some(title) = &updates.title {
            self.title = title.clone();
        }
        if let Some(description) = &updates.description {
            self.description = description.clone();
        }
        if let Some(priority) = updates.priority {
            self.priority = priority;
        }
        if let Some(column_id) = &updates.column_id {
            self.column_id = column_id.clone();
        }
        if let Some(transcript) = &updates.voice_transcript {
            self.voice_transcript = Some(transcript.clone());
        }
    }
}

/// Input for creating a task. Missing priority and column fall back to
/// `medium` and `todo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub column_id: Option<String>,
    #[serde(default)]
    pub voice_transcript: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn in_column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }

    /// Task dictated by voice; the transcript is kept alongside the task.
    pub fn with_voice_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.voice_transcript = Some(transcript.into());
        self
    }

    pub fn column(&self) -> &str {
        self.column_id.as_deref().unwrap_or(DEFAULT_COLUMN)
    }
}

/// Partial task fields for `update_task`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub column_id: Option<String>,
    pub voice_transcript: Option<String>,
}

impl TaskUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }
}

/// Time-based task ids: milliseconds since the epoch, bumped past the last
/// issued value so two tasks created in the same millisecond never collide.
/// `next` returns `None` once the id space is used up.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn next(&mut self, now: DateTime<Utc>) -> Option<String> {
        let candidate = now.timestamp_millis();
        self.last = if candidate > self.last {
            candidate
        } else {
            self.last.checked_add(1)?
        };
        Some(self.last.to_string())
    }

    /// Make sure future ids sort after `id`. Non-numeric ids are ignored.
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }
}
